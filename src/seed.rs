// src/seed.rs
//
// Known-good dataset inserted when the users collection is empty at
// startup, so a fresh deployment comes up with working logins and sample
// memos instead of an empty system.

use chrono::Utc;
use log::{error, info};
use mongodb::bson::doc;

use crate::db::MongoDB;
use crate::models::{Memo, MemoStatus, Priority, Role, User};

fn user(id: &str, name: &str, email: &str, password: &str, role: Role, department: &str) -> User {
    User {
        user_id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role,
        department: department.to_string(),
        points: 0,
        rating: 0,
        badges: vec![],
    }
}

pub fn seed_users() -> Vec<User> {
    vec![
        user("admin-1", "Dr. Asha Menon", "admin@hospital.org", "admin123", Role::Admin, "Administration"),
        user("head-cardio", "Dr. Ravi Kumar", "cardio.head@hospital.org", "head123", Role::Head, "Cardiology"),
        user("head-radio", "Dr. Leena Thomas", "radio.head@hospital.org", "head123", Role::Head, "Radiology"),
        user("staff-cardio-1", "Nurse Priya Nair", "cardio.staff1@hospital.org", "staff123", Role::Staff, "Cardiology"),
        user("staff-cardio-2", "Nurse Arun Das", "cardio.staff2@hospital.org", "staff123", Role::Staff, "Cardiology"),
        user("staff-radio-1", "Tech. Vivek Shah", "radio.staff1@hospital.org", "staff123", Role::Staff, "Radiology"),
    ]
}

pub fn seed_memos() -> Vec<Memo> {
    let blank = |id: &str, title: &str, description: &str, head: &str, priority: Priority| Memo {
        memo_id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        skill_type: Some("Technical".to_string()),
        priority: Some(priority),
        deadline: None,
        assigned_to: head.to_string(),
        staff_assigned: vec![],
        status: MemoStatus::Pending,
        head_verified: false,
        admin_verified: false,
        created_at: Utc::now(),
    };
    vec![
        blank(
            "memo-seed-1",
            "Quarterly defibrillator maintenance",
            "Inspect and log all ward defibrillators before the quarterly audit.",
            "head-cardio",
            Priority::High,
        ),
        blank(
            "memo-seed-2",
            "Radiology shift roster update",
            "Publish the updated night-shift roster for the imaging suite.",
            "head-radio",
            Priority::Medium,
        ),
    ]
}

pub async fn seed_if_empty(db: &MongoDB) {
    let users_collection = db.db.collection::<User>("users");
    let count = match users_collection.count_documents(doc! {}).await {
        Ok(count) => count,
        Err(e) => {
            error!("Could not check users collection, skipping seed: {}", e);
            return;
        }
    };
    if count > 0 {
        return;
    }

    info!("Users collection empty, inserting seed dataset");
    if let Err(e) = users_collection.insert_many(seed_users()).await {
        error!("Failed to seed users: {}", e);
        return;
    }
    let memos_collection = db.db.collection::<Memo>("memos");
    if let Err(e) = memos_collection.insert_many(seed_memos()).await {
        error!("Failed to seed memos: {}", e);
    }
}
