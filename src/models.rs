// src/models.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Roles in the memo workflow. Admin creates memos and gives final
/// verification, a Head owns memos for a department, Staff execute them.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Head,
    Staff,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Completion state of a memo, driven by staff actions. Head and Admin
/// verification live in separate flags on the memo so the two never
/// overwrite each other.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MemoStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum StaffStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: String,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub badges: Vec<String>,
}

/// A memo routed Admin -> Head -> Staff. `status` is the staff-side
/// completion state; `head_verified` and `admin_verified` are the two
/// verification flags.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub memo_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub skill_type: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// userId of the department head this memo is assigned to.
    pub assigned_to: String,
    #[serde(default)]
    pub staff_assigned: Vec<StaffAssignment>,
    pub status: MemoStatus,
    #[serde(default)]
    pub head_verified: bool,
    #[serde(default)]
    pub admin_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// A staff member's slice of a memo, embedded in `staff_assigned`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignment {
    pub user_id: String,
    pub name: String,
    pub status: StaffStatus,
    #[serde(default)]
    pub proof: Vec<ProofEntry>,
    #[serde(default)]
    pub comments: Vec<CommentEntry>,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StaffAssignment {
    /// A fresh assignment for a staff user. Replacing `staff_assigned`
    /// with a new one of these discards prior progress and evaluation.
    pub fn new(staff: &User) -> Self {
        StaffAssignment {
            user_id: staff.user_id.clone(),
            name: staff.name.clone(),
            status: StaffStatus::Pending,
            proof: Vec::new(),
            comments: Vec::new(),
            points: 0,
            rating: 0,
            badges: Vec::new(),
            completed_at: None,
        }
    }

    pub fn evaluated(&self) -> bool {
        self.points > 0 || self.rating > 0 || !self.badges.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProofEntry {
    pub name: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommentEntry {
    pub text: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_id: String,
    /// Recipient.
    pub user_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_spaces() {
        let json = serde_json::to_string(&MemoStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let back: MemoStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MemoStatus::InProgress);
    }

    #[test]
    fn memo_wire_format_is_camel_case() {
        let memo = Memo {
            memo_id: "m1".into(),
            title: "X".into(),
            description: "Y".into(),
            skill_type: Some("Technical".into()),
            priority: Some(Priority::High),
            deadline: None,
            assigned_to: "h1".into(),
            staff_assigned: vec![],
            status: MemoStatus::Pending,
            head_verified: false,
            admin_verified: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&memo).unwrap();
        assert!(value.get("assignedTo").is_some());
        assert!(value.get("staffAssigned").is_some());
        assert!(value.get("adminVerified").is_some());
        assert!(value.get("headVerified").is_some());
        assert!(value.get("skillType").is_some());
    }

    #[test]
    fn assignment_starts_unevaluated() {
        let staff = User {
            user_id: "s1".into(),
            name: "Nurse".into(),
            email: "n@h".into(),
            password: "pw".into(),
            role: Role::Staff,
            department: "Cardiology".into(),
            points: 40,
            rating: 4,
            badges: vec!["Star".into()],
        };
        let assignment = StaffAssignment::new(&staff);
        // Evaluation data never carries over from the user profile.
        assert!(!assignment.evaluated());
        assert_eq!(assignment.status, StaffStatus::Pending);
        assert!(assignment.completed_at.is_none());
    }
}
