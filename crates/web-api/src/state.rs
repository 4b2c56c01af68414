use std::sync::Arc;

use application::ChatHub;
use infrastructure::LocalObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<ChatHub>,
    pub attachments: Arc<LocalObjectStore>,
}

impl AppState {
    pub fn new(hub: Arc<ChatHub>, attachments: Arc<LocalObjectStore>) -> Self {
        Self { hub, attachments }
    }
}
