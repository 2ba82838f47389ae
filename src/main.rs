// src/main.rs

mod app_state;
mod auth;
mod config;
mod db;
mod lifecycle;
mod memo;
mod models;
mod notification;
mod notify_server;
mod progress;
mod seed;
mod user_management;
mod ws;

use std::env;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix::Actor;
use actix_cors::Cors;
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http,
    middleware::Logger,
    web, App, Error, HttpMessage, HttpResponse, HttpServer,
};
use env_logger::Env;
use futures::future::{ok, Ready};

use crate::app_state::AppState;
use crate::auth::{login, validate_jwt, AuthUser};
use crate::memo::{
    admin_verify, assign_staff, create_memo, get_memo, list_memos, staff_complete, staff_start,
    submit_evaluation, update_memo, verify_task,
};
use crate::notification::{create_notification, list_notifications, mark_notification_read};
use crate::user_management::{get_user_by_id, list_users, update_user};
use crate::ws::ws_index;

#[derive(Debug)]
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware { service })
    }
}

pub struct AuthMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Extract "Bearer <token>" from the Authorization header if present.
        // Requests without a token pass through; role-gated handlers refuse
        // them when they find no AuthUser in the extensions.
        if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
            if let Ok(auth_str) = auth_header.to_str() {
                if auth_str.starts_with("Bearer ") {
                    let token = auth_str.trim_start_matches("Bearer ").trim().to_string();
                    match verify_token(&token) {
                        Ok(auth_user) => {
                            req.extensions_mut().insert(auth_user);
                        }
                        Err(e) => {
                            let (req_parts, _payload) = req.into_parts();
                            let resp = HttpResponse::Unauthorized()
                                .body(format!("Invalid token: {}", e))
                                .map_into_boxed_body();
                            let srv_resp = ServiceResponse::new(req_parts, resp);
                            return Box::pin(async move { Ok(srv_resp) });
                        }
                    }
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

fn verify_token(token: &str) -> Result<AuthUser, String> {
    let secret = env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string());
    match validate_jwt(token, &secret) {
        Ok(claims) => Ok(AuthUser { user_id: claims.sub, role: claims.role }),
        Err(e) => Err(format!("Token decode error: {}", e)),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let mongodb = Arc::new(db::MongoDB::init(&config.mongo_uri, &config.database_name).await);
    seed::seed_if_empty(&mongodb).await;

    // Start the notification hub actor for WebSocket pushes.
    let notifier = notify_server::NotificationServer::new().start();

    let bind_addr = config.bind_addr.clone();
    let frontend_origin = config.frontend_origin.clone();

    println!("Server running at http://{}", bind_addr);
    println!("Allowed CORS Origin: {}", frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication)
            .app_data(web::Data::new(AppState {
                notifier: notifier.clone(),
                mongodb: mongodb.clone(),
                config: config.clone(),
            }))
            .service(web::scope("/auth").route("/login", web::post().to(login)))
            // USERS
            .service(
                web::scope("/users")
                    .route("", web::get().to(list_users))
                    .route("/{user_id}", web::get().to(get_user_by_id))
                    .route("/{user_id}", web::patch().to(update_user)),
            )
            // MEMOS and lifecycle actions
            .service(
                web::scope("/memos")
                    .route("", web::get().to(list_memos))
                    .route("", web::post().to(create_memo))
                    .service(
                        web::scope("/{memo_id}")
                            .route("", web::get().to(get_memo))
                            .route("", web::patch().to(update_memo))
                            .route("/assign", web::post().to(assign_staff))
                            .route("/verify", web::post().to(verify_task))
                            .route("/start", web::post().to(staff_start))
                            .route("/complete", web::post().to(staff_complete))
                            .route("/admin-verify", web::post().to(admin_verify))
                            .route("/evaluate", web::post().to(submit_evaluation)),
                    ),
            )
            // NOTIFICATIONS
            .service(
                web::scope("/notifications")
                    .route("", web::get().to(list_notifications))
                    .route("", web::post().to(create_notification))
                    .route("/{notification_id}", web::patch().to(mark_notification_read)),
            )
            // WEBSOCKET route for live notification pushes
            .service(web::resource("/ws").route(web::get().to(ws_index)))
    })
    .bind(bind_addr)?
    .run()
    .await
}
