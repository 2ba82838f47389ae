// src/lifecycle.rs
//
// Pure transition guards for the memo workflow. Handlers in memo.rs own the
// transitions themselves; everything that can be decided from the memo alone
// lives here.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{CommentEntry, Memo, MemoStatus, ProofEntry, StaffStatus};

/// A head may (re)assign staff while nobody is assigned yet, when the memo
/// has no deadline, or once the deadline has passed. Until then the current
/// assignment is locked.
pub fn can_assign(memo: &Memo, today: NaiveDate) -> bool {
    if memo.staff_assigned.is_empty() {
        return true;
    }
    match memo.deadline {
        None => true,
        Some(deadline) => today > deadline,
    }
}

/// Admin verification requires the department head to have verified first.
pub fn can_admin_verify(memo: &Memo) -> bool {
    memo.head_verified
}

/// Staff evaluation opens only after both verifications.
pub fn can_evaluate(memo: &Memo) -> bool {
    memo.head_verified && memo.admin_verified
}

/// Advance the calling staff member's own assignment and mirror the new
/// state onto the memo's completion status. Returns false when the caller
/// is not in `staff_assigned`; the memo is untouched in that case.
pub fn apply_staff_progress(
    memo: &mut Memo,
    staff_id: &str,
    status: StaffStatus,
    comment: Option<String>,
    proof_name: Option<String>,
    now: DateTime<Utc>,
) -> bool {
    let assignment = match memo.staff_assigned.iter_mut().find(|s| s.user_id == staff_id) {
        Some(a) => a,
        None => return false,
    };

    assignment.status = status;
    if let Some(text) = comment {
        assignment.comments.push(CommentEntry { text, date: now });
    }
    if let Some(name) = proof_name {
        assignment.proof.push(ProofEntry { name, date: now });
    }
    match status {
        StaffStatus::Completed => {
            assignment.completed_at = Some(now);
            memo.status = MemoStatus::Completed;
        }
        StaffStatus::InProgress => memo.status = MemoStatus::InProgress,
        StaffStatus::Pending => {}
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemoStatus, StaffAssignment, StaffStatus};
    use chrono::Utc;

    fn memo() -> Memo {
        Memo {
            memo_id: "m1".into(),
            title: "X".into(),
            description: "Y".into(),
            skill_type: None,
            priority: None,
            deadline: None,
            assigned_to: "head-1".into(),
            staff_assigned: vec![],
            status: MemoStatus::Pending,
            head_verified: false,
            admin_verified: false,
            created_at: Utc::now(),
        }
    }

    fn assigned(deadline: Option<NaiveDate>) -> Memo {
        let mut m = memo();
        m.deadline = deadline;
        m.staff_assigned.push(StaffAssignment {
            user_id: "s1".into(),
            name: "Nurse".into(),
            status: StaffStatus::Pending,
            proof: vec![],
            comments: vec![],
            points: 0,
            rating: 0,
            badges: vec![],
            completed_at: None,
        });
        m
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn unassigned_memo_is_always_assignable() {
        let mut m = memo();
        m.deadline = Some(day("2099-01-01"));
        assert!(can_assign(&m, day("2026-01-01")));
    }

    #[test]
    fn assigned_without_deadline_is_assignable() {
        assert!(can_assign(&assigned(None), day("2026-01-01")));
    }

    #[test]
    fn locked_until_deadline_passes() {
        let m = assigned(Some(day("2026-06-30")));
        assert!(!can_assign(&m, day("2026-06-01")));
        // Still the deadline day itself: locked.
        assert!(!can_assign(&m, day("2026-06-30")));
        assert!(can_assign(&m, day("2026-07-01")));
    }

    #[test]
    fn admin_verify_needs_head_verification() {
        let mut m = memo();
        assert!(!can_admin_verify(&m));
        m.head_verified = true;
        assert!(can_admin_verify(&m));
    }

    #[test]
    fn staff_completion_mirrors_onto_memo_status() {
        let mut m = assigned(None);
        let now = Utc::now();
        let ok = apply_staff_progress(
            &mut m,
            "s1",
            StaffStatus::Completed,
            Some("done, see attachment".into()),
            Some("xray.png".into()),
            now,
        );
        assert!(ok);
        let a = &m.staff_assigned[0];
        assert_eq!(a.status, StaffStatus::Completed);
        assert_eq!(a.completed_at, Some(now));
        assert_eq!(a.comments.len(), 1);
        assert_eq!(a.proof[0].name, "xray.png");
        assert_eq!(m.status, MemoStatus::Completed);
    }

    #[test]
    fn staff_start_moves_memo_in_progress() {
        let mut m = assigned(None);
        assert!(apply_staff_progress(&mut m, "s1", StaffStatus::InProgress, None, None, Utc::now()));
        assert_eq!(m.staff_assigned[0].status, StaffStatus::InProgress);
        assert!(m.staff_assigned[0].completed_at.is_none());
        assert_eq!(m.status, MemoStatus::InProgress);
    }

    #[test]
    fn unassigned_staff_cannot_progress() {
        let mut m = assigned(None);
        assert!(!apply_staff_progress(&mut m, "intruder", StaffStatus::Completed, None, None, Utc::now()));
        assert_eq!(m.status, MemoStatus::Pending);
    }

    #[test]
    fn head_verification_no_longer_collides_with_completion() {
        // The two facts live in separate fields; verifying does not erase
        // the staff-side completion state or vice versa.
        let mut m = assigned(None);
        apply_staff_progress(&mut m, "s1", StaffStatus::Completed, None, None, Utc::now());
        m.head_verified = true;
        assert_eq!(m.status, MemoStatus::Completed);
        assert!(m.head_verified);
        assert!(!m.admin_verified);
    }

    #[test]
    fn evaluation_needs_both_verifications() {
        let mut m = memo();
        assert!(!can_evaluate(&m));
        m.head_verified = true;
        assert!(!can_evaluate(&m));
        m.admin_verified = true;
        assert!(can_evaluate(&m));
        m.head_verified = false;
        assert!(!can_evaluate(&m));
    }
}
