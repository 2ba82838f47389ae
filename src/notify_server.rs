// src/notify_server.rs

use actix::prelude::*;
use log::info;
use std::collections::HashMap;

use crate::models::Notification;

/// A stored notification being pushed out to the recipient's live sessions.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct PushNotification {
    pub notification: Notification,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub user_id: String,
    pub addr: Recipient<PushNotification>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub user_id: String,
    pub addr: Recipient<PushNotification>,
}

/// Keeps the map of connected users to their open WebSocket sessions and
/// fans pushed notifications out to them. Delivery is best-effort: a user
/// with no open session simply misses the push and reads the stored
/// notification later.
pub struct NotificationServer {
    // Multiple connections per user (several tabs).
    sessions: HashMap<String, Vec<Recipient<PushNotification>>>,
}

impl NotificationServer {
    pub fn new() -> Self {
        NotificationServer { sessions: HashMap::new() }
    }
}

impl Actor for NotificationServer {
    type Context = Context<Self>;
}

impl Handler<Connect> for NotificationServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        info!("User {} connected (WS)", msg.user_id);
        self.sessions.entry(msg.user_id).or_default().push(msg.addr);
    }
}

impl Handler<Disconnect> for NotificationServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        info!("User {} disconnected (WS)", msg.user_id);
        if let Some(addrs) = self.sessions.get_mut(&msg.user_id) {
            // Remove only the connection that matches the provided address.
            addrs.retain(|a| a != &msg.addr);
            if addrs.is_empty() {
                self.sessions.remove(&msg.user_id);
            }
        }
    }
}

impl Handler<PushNotification> for NotificationServer {
    type Result = ();

    fn handle(&mut self, msg: PushNotification, _: &mut Context<Self>) {
        if let Some(addrs) = self.sessions.get(&msg.notification.user_id) {
            // Send to all active connections for that user.
            for addr in addrs {
                addr.do_send(msg.clone());
            }
        }
    }
}
