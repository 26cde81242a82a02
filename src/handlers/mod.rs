use axum::Json;
use chrono::Duration;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    database::{FileRepository, FolderRepository, MemoryStore, UserRepository},
    errors::Result,
    services::{Mailer, MediaManager},
    storage::{LocalStorage, Storage},
};

pub mod auth;
pub mod docs;
pub mod extract;
pub mod files;
pub mod folders;
pub mod health;
pub mod pages;
pub mod upload;
pub mod uploads;
pub mod user;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub media: Arc<MediaManager>,
    pub users: Arc<dyn UserRepository>,
    pub storage: Arc<dyn Storage>,
    pub mailer: Arc<dyn Mailer>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        config: Config,
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        users: Arc<dyn UserRepository>,
        storage: Arc<dyn Storage>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt_secret, Duration::hours(config.session_ttl_hours));

        Self {
            media: Arc::new(MediaManager::new(folders, files)),
            config: Arc::new(config),
            users,
            storage,
            mailer,
            jwt: Arc::new(jwt),
        }
    }

    /// State backed by the in-memory store and local storage under `config.upload_dir`.
    pub fn in_memory(config: Config, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(LocalStorage::new(&config.upload_dir)?);

        Ok(Self::new(config, store.clone(), store.clone(), store, storage, mailer))
    }
}

/// `{"success": true, "data": ...}`
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": data
    }))
}

/// `{"success": true, "message": ...}`
pub fn success_message(message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message
    }))
}
