use crate::kv::FileKvStore;
use crate::store::Store;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to the single store. Handlers hold the lock for a whole
/// operation, write-through included.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store<FileKvStore>>>,
}

impl AppState {
    pub fn new(store: Store<FileKvStore>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}
