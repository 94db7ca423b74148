//! Shared application state handed to the HTTP layer.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use crate::db::{self, DatabaseError};
use crate::notifications::NotificationCenter;

/// Everything a request handler needs: where the database lives and the
/// shared notification center. Handlers open a fresh connection per
/// request; SQLite serializes writers and the workload is a single
/// receptionist's admin panel.
pub struct AppState {
    pub db_path: PathBuf,
    pub notifications: Arc<NotificationCenter>,
}

impl AppState {
    pub fn new(db_path: PathBuf) -> Self {
        let notifications = Arc::new(NotificationCenter::new(db_path.clone()));
        Self {
            db_path,
            notifications,
        }
    }

    /// Opens a connection to the practice database, running any pending
    /// migrations.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_database(&self.db_path)
    }
}
