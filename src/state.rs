use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::Mutex as SessionMutex;

use crate::config::AppConfig;
use crate::models::DialogueSession;
use crate::services::chat::ChatProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub chat: Box<dyn ChatProvider>,
    sessions: Mutex<HashMap<i64, Arc<SessionMutex<DialogueSession>>>>,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig, chat: Box<dyn ChatProvider>) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config,
            chat,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The dialogue session for a chat, created on first use. Handlers hold
    /// the returned lock for the whole transition, so events for one chat
    /// are processed strictly one at a time while distinct chats proceed
    /// concurrently.
    pub fn session(&self, chat_id: i64) -> Arc<SessionMutex<DialogueSession>> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(chat_id)
            .or_insert_with(|| Arc::new(SessionMutex::new(DialogueSession::default())))
            .clone()
    }
}
