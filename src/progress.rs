// src/progress.rs

use crate::models::{Memo, StaffStatus};

/// Lifecycle completion score in [0, 100], summed from seven weighted
/// checkpoints and capped:
///
///   head assigned 15 | head verified 15 | staff assigned 15
///   staff completed 20*frac | proof 15*frac | evaluated 15*frac
///   admin verified 5
///
/// The three fractional terms each round to nearest independently and
/// contribute 0 while no staff is assigned.
pub fn progress(memo: &Memo) -> u8 {
    let mut score: u32 = 0;

    if !memo.assigned_to.is_empty() {
        score += 15;
    }
    if memo.head_verified {
        score += 15;
    }

    let total = memo.staff_assigned.len();
    if total > 0 {
        score += 15;

        let completed = memo
            .staff_assigned
            .iter()
            .filter(|s| s.status == StaffStatus::Completed)
            .count();
        let with_proof = memo.staff_assigned.iter().filter(|s| !s.proof.is_empty()).count();
        let evaluated = memo.staff_assigned.iter().filter(|s| s.evaluated()).count();

        score += share(20.0, completed, total);
        score += share(15.0, with_proof, total);
        score += share(15.0, evaluated, total);
    }

    if memo.admin_verified {
        score += 5;
    }

    score.min(100) as u8
}

fn share(weight: f64, hits: usize, total: usize) -> u32 {
    (weight * hits as f64 / total as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemoStatus, ProofEntry, StaffAssignment};
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

    fn assignment(id: &str) -> StaffAssignment {
        StaffAssignment {
            user_id: id.into(),
            name: id.into(),
            status: StaffStatus::Pending,
            proof: vec![],
            comments: vec![],
            points: 0,
            rating: 0,
            badges: vec![],
            completed_at: None,
        }
    }

    #[test]
    fn fresh_memo_scores_fifteen() {
        // Create scenario: only the head-assigned checkpoint holds.
        assert_eq!(progress(&memo()), 15);
    }

    #[test]
    fn assigning_staff_adds_fifteen() {
        let mut m = memo();
        m.staff_assigned.push(assignment("s1"));
        assert_eq!(progress(&m), 30);
    }

    #[test]
    fn completion_with_proof_adds_both_fractions() {
        let mut m = memo();
        let mut a = assignment("s1");
        a.status = StaffStatus::Completed;
        a.proof.push(ProofEntry { name: "scan.pdf".into(), date: Utc::now() });
        m.staff_assigned.push(a);
        // 15 head + 15 staff + 20 completed + 15 proof
        assert_eq!(progress(&m), 65);
    }

    #[test]
    fn fully_closed_memo_hits_one_hundred() {
        let mut m = memo();
        let mut a = assignment("s1");
        a.status = StaffStatus::Completed;
        a.proof.push(ProofEntry { name: "scan.pdf".into(), date: Utc::now() });
        a.points = 80;
        m.staff_assigned.push(a);
        m.head_verified = true;
        m.admin_verified = true;
        assert_eq!(progress(&m), 100);
    }

    #[test]
    fn fractions_round_independently() {
        let mut m = memo();
        let mut done = assignment("s1");
        done.status = StaffStatus::Completed;
        m.staff_assigned.push(done);
        m.staff_assigned.push(assignment("s2"));
        m.staff_assigned.push(assignment("s3"));
        // 15 + 15 + round(20/3) = 37
        assert_eq!(progress(&m), 37);
    }

    #[test]
    fn admin_verification_adds_five() {
        let mut m = memo();
        m.head_verified = true;
        m.admin_verified = true;
        assert_eq!(progress(&m), 35);
    }

    #[test]
    fn monotone_as_checkpoints_flip() {
        let mut m = memo();
        let mut last = progress(&m);

        m.staff_assigned.push(assignment("s1"));
        let p = progress(&m);
        assert!(p >= last);
        last = p;

        m.staff_assigned[0].status = StaffStatus::Completed;
        let p = progress(&m);
        assert!(p >= last);
        last = p;

        m.staff_assigned[0]
            .proof
            .push(ProofEntry { name: "p".into(), date: Utc::now() });
        let p = progress(&m);
        assert!(p >= last);
        last = p;

        m.head_verified = true;
        let p = progress(&m);
        assert!(p >= last);
        last = p;

        m.admin_verified = true;
        let p = progress(&m);
        assert!(p >= last);
        last = p;

        m.staff_assigned[0].rating = 5;
        let p = progress(&m);
        assert!(p >= last);
        assert!(p <= 100);
    }
}
