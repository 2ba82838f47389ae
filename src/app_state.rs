use crate::config::Config;
use crate::db::MongoDB;
use crate::notify_server::NotificationServer;
use actix::Addr;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub notifier: Addr<NotificationServer>,
    pub mongodb: Arc<MongoDB>,
    pub config: Config,
}
