//! API shared state containing actor handles

use crate::actors::{coordinator::CoordinatorHandle, storage::StorageHandle};

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Handle to the coordinator receiving device events
    pub coordinator: CoordinatorHandle,

    /// Handle to the storage actor, absent when nothing is persisted
    pub storage: Option<StorageHandle>,
}

impl ApiState {
    pub fn new(coordinator: CoordinatorHandle, storage: Option<StorageHandle>) -> Self {
        Self {
            coordinator,
            storage,
        }
    }
}
