use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{error, info};
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::models::{Role, User};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// Authenticated identity, inserted into request extensions by the
/// Authentication middleware in main.rs. Handlers read their session
/// context from here instead of trusting anything client-supplied.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

// JWT Creation
pub fn create_jwt(user: &User, secret: &str) -> String {
    let expiration = Utc::now() + Duration::hours(24);
    let claims = Claims {
        sub: user.user_id.clone(),
        role: user.role,
        exp: expiration.timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
}

// JWT Validation
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn current_user(req: &HttpRequest) -> Option<AuthUser> {
    req.extensions().get::<AuthUser>().cloned()
}

/// Identity plus a role requirement; Err carries the ready-made refusal.
pub fn require_role(req: &HttpRequest, role: Role) -> Result<AuthUser, HttpResponse> {
    match current_user(req) {
        Some(user) if user.role == role => Ok(user),
        Some(_) => Err(HttpResponse::Forbidden().body("Insufficient role")),
        None => Err(HttpResponse::Unauthorized().body("Unauthorized")),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginInfo {
    pub email: String,
    pub password: String,
}

// Login Endpoint. Credentials are matched in plaintext against the stored
// user document, first result wins.
pub async fn login(data: web::Data<AppState>, login_info: web::Json<LoginInfo>) -> impl Responder {
    let users_collection = data.mongodb.db.collection::<User>("users");
    let filter = doc! { "email": &login_info.email, "password": &login_info.password };

    match users_collection.find_one(filter).await {
        Ok(Some(user)) => {
            info!("User {} logged in as {:?}", user.user_id, user.role);
            let token = create_jwt(&user, &data.config.jwt_secret);
            HttpResponse::Ok().json(serde_json::json!({ "token": token, "user": user }))
        }
        Ok(None) => HttpResponse::Unauthorized().body("Invalid credentials"),
        Err(e) => {
            error!("Error logging in: {}", e);
            HttpResponse::InternalServerError().body("Error logging in")
        }
    }
}
