use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures_util::StreamExt;
use log::error;
use mongodb::bson::doc;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::current_user;
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
}

/// GET /users with optional filters. `email` + `password` together are the
/// legacy plaintext login lookup (first result wins on the caller's side);
/// `role` and `department` serve the dashboards' staff/head pickers.
pub async fn list_users(data: web::Data<AppState>, query: web::Query<UserQuery>) -> impl Responder {
    let mut filter = doc! {};
    if let Some(email) = &query.email {
        filter.insert("email", email);
    }
    if let Some(password) = &query.password {
        filter.insert("password", password);
    }
    if let Some(role) = &query.role {
        filter.insert("role", role);
    }
    if let Some(department) = &query.department {
        filter.insert("department", department);
    }

    let users_collection = data.mongodb.db.collection::<User>("users");
    let mut cursor = match users_collection.find(filter).await {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching users: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching users");
        }
    };

    let mut users: Vec<User> = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => users.push(user),
            Err(e) => {
                error!("Error iterating users: {}", e);
                return HttpResponse::InternalServerError().body("Error iterating users");
            }
        }
    }

    HttpResponse::Ok().json(users)
}

pub async fn get_user_by_id(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    let users_collection = data.mongodb.db.collection::<User>("users");

    match users_collection.find_one(doc! { "userId": &user_id }).await {
        Ok(Some(user)) => HttpResponse::Ok().json(user),
        Ok(None) => HttpResponse::NotFound().body("User not found"),
        Err(e) => {
            error!("Error fetching user: {}", e);
            HttpResponse::InternalServerError().body("Error fetching user")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    pub points: Option<i32>,
    pub rating: Option<i32>,
    pub badges: Option<Vec<String>>,
}

/// PATCH /users/{id} — partial update. Role changes are deliberately not
/// accepted here; the workflow guards key off role.
pub async fn update_user(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> impl Responder {
    if current_user(&req).is_none() {
        return HttpResponse::Unauthorized().body("Unauthorized");
    }
    let user_id = path.into_inner();

    let mut update_doc = doc! {};
    if let Some(name) = &payload.name {
        update_doc.insert("name", name);
    }
    if let Some(email) = &payload.email {
        update_doc.insert("email", email);
    }
    if let Some(password) = &payload.password {
        update_doc.insert("password", password);
    }
    if let Some(department) = &payload.department {
        update_doc.insert("department", department);
    }
    if let Some(points) = payload.points {
        update_doc.insert("points", points);
    }
    if let Some(rating) = payload.rating {
        update_doc.insert("rating", rating);
    }
    if let Some(badges) = &payload.badges {
        update_doc.insert("badges", badges.clone());
    }

    if update_doc.is_empty() {
        return HttpResponse::BadRequest().body("No fields to update");
    }

    let users_collection = data.mongodb.db.collection::<User>("users");
    match users_collection
        .update_one(doc! { "userId": &user_id }, doc! { "$set": update_doc })
        .await
    {
        Ok(res) => {
            if res.matched_count == 0 {
                HttpResponse::NotFound().body("User not found")
            } else {
                HttpResponse::Ok().body("User updated successfully")
            }
        }
        Err(e) => {
            error!("Error updating user: {}", e);
            HttpResponse::InternalServerError().body("Error updating user")
        }
    }
}
