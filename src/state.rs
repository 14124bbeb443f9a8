use crate::errors::AppError;
use crate::storage::{persist_data, AppData};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Persists a mutated working copy, then publishes it to the shared
    /// state. A failed write leaves the in-memory data untouched, so a
    /// progress entry and its streak update land together or not at all.
    pub async fn commit(&self, guard: &mut AppData, next: AppData) -> Result<(), AppError> {
        persist_data(&self.data_path, &next).await?;
        *guard = next;
        Ok(())
    }
}
