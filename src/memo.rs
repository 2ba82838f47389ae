// src/memo.rs
//
// Memo CRUD plus every lifecycle action. Transitions are guarded here
// (role, ownership, lifecycle.rs predicates) and each one fans out its
// notifications before responding.

use actix_web::{error::ErrorInternalServerError, web, Error, HttpRequest, HttpResponse};
use chrono::{NaiveDate, Utc};
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::{doc, to_bson, Bson};
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::{current_user, require_role};
use crate::lifecycle::{apply_staff_progress, can_admin_verify, can_assign, can_evaluate};
use crate::models::{Memo, MemoStatus, Priority, Role, StaffAssignment, StaffStatus, User};
use crate::notification::{
    admin_verified_message, evaluation_message, head_verified_message, memo_created_message,
    notify, staff_assigned_message, staff_progress_message, staff_recipients,
};
use crate::progress::progress;

/// A memo as the API returns it, with the derived progress score attached.
#[derive(Debug, Serialize)]
pub struct MemoView {
    #[serde(flatten)]
    pub memo: Memo,
    pub progress: u8,
}

impl From<Memo> for MemoView {
    fn from(memo: Memo) -> Self {
        let progress = progress(&memo);
        MemoView { memo, progress }
    }
}

fn memos(state: &AppState) -> Collection<Memo> {
    state.mongodb.db.collection("memos")
}

fn users(state: &AppState) -> Collection<User> {
    state.mongodb.db.collection("users")
}

async fn find_memo(state: &AppState, memo_id: &str) -> Result<Option<Memo>, Error> {
    memos(state)
        .find_one(doc! { "memoId": memo_id })
        .await
        .map_err(ErrorInternalServerError)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub skill_type: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_to: String,
}

/// CREATE a memo (Admin). Notifies the assigned department head.
pub async fn create_memo(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateMemoRequest>,
) -> Result<HttpResponse, Error> {
    if let Err(resp) = require_role(&req, Role::Admin) {
        return Ok(resp);
    }
    let payload = payload.into_inner();

    if payload.title.trim().is_empty()
        || payload.description.trim().is_empty()
        || payload.assigned_to.trim().is_empty()
    {
        return Ok(HttpResponse::BadRequest().body("Title, description and assignedTo are required"));
    }

    // assignedTo must reference a department head.
    let head = users(&data)
        .find_one(doc! { "userId": &payload.assigned_to, "role": "Head" })
        .await
        .map_err(ErrorInternalServerError)?;
    if head.is_none() {
        return Ok(HttpResponse::BadRequest().body("assignedTo must reference a department head"));
    }

    let new_memo = Memo {
        memo_id: Uuid::new_v4().to_string(),
        title: payload.title,
        description: payload.description,
        skill_type: payload.skill_type,
        priority: payload.priority,
        deadline: payload.deadline,
        assigned_to: payload.assigned_to,
        staff_assigned: vec![],
        status: MemoStatus::Pending,
        head_verified: false,
        admin_verified: false,
        created_at: Utc::now(),
    };

    memos(&data)
        .insert_one(&new_memo)
        .await
        .map_err(ErrorInternalServerError)?;
    info!("Memo created: {}", new_memo.memo_id);

    notify(&data, &new_memo.assigned_to, memo_created_message(&new_memo.title)).await;

    Ok(HttpResponse::Ok().json(MemoView::from(new_memo)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoQuery {
    /// Head dashboard: memos owned by this department head.
    pub assigned_to: Option<String>,
    /// Staff dashboard: memos where this staff member is assigned.
    pub staff_id: Option<String>,
}

/// LIST memos, optionally narrowed to one role's projection.
pub async fn list_memos(
    req: HttpRequest,
    data: web::Data<AppState>,
    query: web::Query<MemoQuery>,
) -> Result<HttpResponse, Error> {
    if current_user(&req).is_none() {
        return Ok(HttpResponse::Unauthorized().body("Unauthorized"));
    }

    let mut filter = doc! {};
    if let Some(assigned_to) = &query.assigned_to {
        filter.insert("assignedTo", assigned_to);
    }
    if let Some(staff_id) = &query.staff_id {
        filter.insert("staffAssigned.userId", staff_id);
    }

    let mut cursor = memos(&data).find(filter).await.map_err(ErrorInternalServerError)?;
    let mut views: Vec<MemoView> = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(memo) => views.push(MemoView::from(memo)),
            Err(e) => {
                error!("Error reading memos: {}", e);
                return Ok(HttpResponse::InternalServerError().body("Error reading memos"));
            }
        }
    }
    Ok(HttpResponse::Ok().json(views))
}

/// GET a single memo.
pub async fn get_memo(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    if current_user(&req).is_none() {
        return Ok(HttpResponse::Unauthorized().body("Unauthorized"));
    }
    match find_memo(&data, &path.into_inner()).await? {
        Some(memo) => Ok(HttpResponse::Ok().json(MemoView::from(memo))),
        None => Ok(HttpResponse::NotFound().body("Memo not found")),
    }
}

/// Distinguishes an absent field from an explicit null, so clearable
/// fields can actually be cleared over PATCH.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Absent = untouched, null = cleared.
    #[serde(default, deserialize_with = "double_option")]
    pub skill_type: Option<Option<String>>,
    pub priority: Option<Priority>,
    /// Absent = untouched, null = cleared (unlocks staff reassignment).
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<NaiveDate>>,
}

/// PATCH memo metadata (Admin). Lifecycle fields only move through the
/// action endpoints below.
pub async fn update_memo(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateMemoRequest>,
) -> Result<HttpResponse, Error> {
    if let Err(resp) = require_role(&req, Role::Admin) {
        return Ok(resp);
    }
    let memo_id = path.into_inner();

    let mut update_doc = doc! {};
    if let Some(title) = &payload.title {
        update_doc.insert("title", title);
    }
    if let Some(description) = &payload.description {
        update_doc.insert("description", description);
    }
    if let Some(skill_type) = &payload.skill_type {
        match skill_type {
            Some(s) => update_doc.insert("skillType", s),
            None => update_doc.insert("skillType", Bson::Null),
        };
    }
    if let Some(priority) = &payload.priority {
        update_doc.insert("priority", to_bson(priority).map_err(ErrorInternalServerError)?);
    }
    if let Some(deadline) = &payload.deadline {
        match deadline {
            Some(d) => update_doc.insert("deadline", to_bson(d).map_err(ErrorInternalServerError)?),
            None => update_doc.insert("deadline", Bson::Null),
        };
    }

    if update_doc.is_empty() {
        return Ok(HttpResponse::BadRequest().body("No fields to update"));
    }

    let res = memos(&data)
        .update_one(doc! { "memoId": &memo_id }, doc! { "$set": update_doc })
        .await
        .map_err(ErrorInternalServerError)?;
    if res.matched_count == 0 {
        return Ok(HttpResponse::NotFound().body("Memo not found"));
    }
    Ok(HttpResponse::Ok().body("Memo updated successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignStaffRequest {
    pub staff_id: String,
}

/// ASSIGN a staff member (Head, own memo). Replaces the whole assignment
/// list with a fresh singleton; reassignment is locked until the deadline
/// passes. Notifies the assigned staff.
pub async fn assign_staff(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<AssignStaffRequest>,
) -> Result<HttpResponse, Error> {
    let auth = match require_role(&req, Role::Head) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let mut memo = match find_memo(&data, &path.into_inner()).await? {
        Some(memo) => memo,
        None => return Ok(HttpResponse::NotFound().body("Memo not found")),
    };
    if memo.assigned_to != auth.user_id {
        return Ok(HttpResponse::Forbidden().body("Memo belongs to another department head"));
    }
    if !can_assign(&memo, Utc::now().date_naive()) {
        return Ok(HttpResponse::Conflict().body("Staff already assigned and deadline has not passed"));
    }

    let staff = match users(&data)
        .find_one(doc! { "userId": &payload.staff_id })
        .await
        .map_err(ErrorInternalServerError)?
    {
        Some(user) => user,
        None => return Ok(HttpResponse::BadRequest().body("Staff not found")),
    };
    if staff.role != Role::Staff {
        return Ok(HttpResponse::BadRequest().body("Assignee must have the Staff role"));
    }

    // Staff must belong to the head's own department.
    let head = match users(&data)
        .find_one(doc! { "userId": &auth.user_id })
        .await
        .map_err(ErrorInternalServerError)?
    {
        Some(user) => user,
        None => return Ok(HttpResponse::InternalServerError().body("Head record missing")),
    };
    if staff.department != head.department {
        return Ok(HttpResponse::BadRequest().body("Staff must belong to your department"));
    }

    memo.staff_assigned = vec![StaffAssignment::new(&staff)];
    let staff_bson = to_bson(&memo.staff_assigned).map_err(ErrorInternalServerError)?;
    memos(&data)
        .update_one(doc! { "memoId": &memo.memo_id }, doc! { "$set": { "staffAssigned": staff_bson } })
        .await
        .map_err(ErrorInternalServerError)?;
    info!("Memo {}: staff {} assigned", memo.memo_id, staff.user_id);

    notify(&data, &staff.user_id, staff_assigned_message(&memo.title)).await;

    Ok(HttpResponse::Ok().json(MemoView::from(memo)))
}

/// VERIFY a memo (Head, own memo). Unconditional, whatever the staff
/// completion state. Notifies every assigned staff member.
pub async fn verify_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let auth = match require_role(&req, Role::Head) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let mut memo = match find_memo(&data, &path.into_inner()).await? {
        Some(memo) => memo,
        None => return Ok(HttpResponse::NotFound().body("Memo not found")),
    };
    if memo.assigned_to != auth.user_id {
        return Ok(HttpResponse::Forbidden().body("Memo belongs to another department head"));
    }

    memos(&data)
        .update_one(doc! { "memoId": &memo.memo_id }, doc! { "$set": { "headVerified": true } })
        .await
        .map_err(ErrorInternalServerError)?;
    memo.head_verified = true;

    for user_id in staff_recipients(&memo) {
        notify(&data, &user_id, head_verified_message(&memo.title)).await;
    }

    Ok(HttpResponse::Ok().json(MemoView::from(memo)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffUpdateRequest {
    pub comment: Option<String>,
    pub proof_name: Option<String>,
}

/// START a task (Staff, self only). The body is optional since both fields
/// are. Notifies the department head.
pub async fn staff_start(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: Option<web::Json<StaffUpdateRequest>>,
) -> Result<HttpResponse, Error> {
    let payload = payload.map(|p| p.into_inner()).unwrap_or_default();
    staff_progress(req, data, path, payload, StaffStatus::InProgress).await
}

/// COMPLETE a task (Staff, self only), with optional comment and proof
/// file name. Notifies the department head.
pub async fn staff_complete(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: Option<web::Json<StaffUpdateRequest>>,
) -> Result<HttpResponse, Error> {
    let payload = payload.map(|p| p.into_inner()).unwrap_or_default();
    staff_progress(req, data, path, payload, StaffStatus::Completed).await
}

async fn staff_progress(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: StaffUpdateRequest,
    new_status: StaffStatus,
) -> Result<HttpResponse, Error> {
    let auth = match require_role(&req, Role::Staff) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let mut memo = match find_memo(&data, &path.into_inner()).await? {
        Some(memo) => memo,
        None => return Ok(HttpResponse::NotFound().body("Memo not found")),
    };

    if !apply_staff_progress(
        &mut memo,
        &auth.user_id,
        new_status,
        payload.comment,
        payload.proof_name,
        Utc::now(),
    ) {
        return Ok(HttpResponse::Forbidden().body("Not assigned to this memo"));
    }

    let staff_bson = to_bson(&memo.staff_assigned).map_err(ErrorInternalServerError)?;
    let status_bson = to_bson(&memo.status).map_err(ErrorInternalServerError)?;
    memos(&data)
        .update_one(
            doc! { "memoId": &memo.memo_id },
            doc! { "$set": { "staffAssigned": staff_bson, "status": status_bson } },
        )
        .await
        .map_err(ErrorInternalServerError)?;

    let staff_name = memo
        .staff_assigned
        .iter()
        .find(|s| s.user_id == auth.user_id)
        .map(|s| s.name.clone())
        .unwrap_or_default();
    notify(
        &data,
        &memo.assigned_to,
        staff_progress_message(&staff_name, &memo.title, new_status),
    )
    .await;

    Ok(HttpResponse::Ok().json(MemoView::from(memo)))
}

/// ADMIN-VERIFY a memo. Guarded on prior head verification. Notifies every
/// assigned staff member.
pub async fn admin_verify(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    if let Err(resp) = require_role(&req, Role::Admin) {
        return Ok(resp);
    }

    let mut memo = match find_memo(&data, &path.into_inner()).await? {
        Some(memo) => memo,
        None => return Ok(HttpResponse::NotFound().body("Memo not found")),
    };
    if !can_admin_verify(&memo) {
        return Ok(HttpResponse::Conflict().body("Department head has not verified this memo yet"));
    }

    memos(&data)
        .update_one(doc! { "memoId": &memo.memo_id }, doc! { "$set": { "adminVerified": true } })
        .await
        .map_err(ErrorInternalServerError)?;
    memo.admin_verified = true;

    for user_id in staff_recipients(&memo) {
        notify(&data, &user_id, admin_verified_message(&memo.title)).await;
    }

    Ok(HttpResponse::Ok().json(MemoView::from(memo)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub staff_id: String,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub badges: Vec<String>,
}

/// EVALUATE a staff member (Head, own memo, after both verifications).
/// Writes the evaluation onto the embedded assignment and mirrors the same
/// values onto the standalone user record. Notifies the evaluated staff.
pub async fn submit_evaluation(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<EvaluationRequest>,
) -> Result<HttpResponse, Error> {
    let auth = match require_role(&req, Role::Head) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let payload = payload.into_inner();

    let mut memo = match find_memo(&data, &path.into_inner()).await? {
        Some(memo) => memo,
        None => return Ok(HttpResponse::NotFound().body("Memo not found")),
    };
    if memo.assigned_to != auth.user_id {
        return Ok(HttpResponse::Forbidden().body("Memo belongs to another department head"));
    }
    if !can_evaluate(&memo) {
        return Ok(HttpResponse::Conflict()
            .body("Memo must be verified by both the department head and the admin before evaluation"));
    }

    let assignment = match memo.staff_assigned.iter_mut().find(|s| s.user_id == payload.staff_id) {
        Some(a) => a,
        None => return Ok(HttpResponse::NotFound().body("Staff not assigned to this memo")),
    };
    assignment.points = payload.points;
    assignment.rating = payload.rating;
    assignment.badges = payload.badges.clone();

    let staff_bson = to_bson(&memo.staff_assigned).map_err(ErrorInternalServerError)?;
    memos(&data)
        .update_one(doc! { "memoId": &memo.memo_id }, doc! { "$set": { "staffAssigned": staff_bson } })
        .await
        .map_err(ErrorInternalServerError)?;

    // Mirror onto the user profile.
    users(&data)
        .update_one(
            doc! { "userId": &payload.staff_id },
            doc! { "$set": {
                "points": payload.points,
                "rating": payload.rating,
                "badges": payload.badges.clone(),
            } },
        )
        .await
        .map_err(ErrorInternalServerError)?;
    info!("Memo {}: staff {} evaluated", memo.memo_id, payload.staff_id);

    notify(
        &data,
        &payload.staff_id,
        evaluation_message(&memo.title, payload.points, payload.rating, &payload.badges),
    )
    .await;

    Ok(HttpResponse::Ok().json(MemoView::from(memo)))
}
