//! Profile and leave request persistence.
//!
//! Two backends sit behind [`Storage`]: a MySQL pool, and a local JSON
//! document used when no database is configured.

pub mod local;
pub mod mysql;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::model::hire_profile::HireProfile;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, StatusChange};
use crate::model::role::Role;
use crate::model::user::User;

pub use local::LocalStore;
pub use mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("local store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("local store document is invalid: {0}")]
    Document(#[from] serde_json::Error),

    #[error("stored record is invalid: {0}")]
    InvalidRecord(String),

    #[error("username already exists")]
    DuplicateUser,
}

pub enum Storage {
    MySql(MySqlStore),
    Local(LocalStore),
}

impl Storage {
    pub async fn open(config: &Config) -> Result<Self, StoreError> {
        match &config.database_url {
            Some(url) => {
                info!("Using MySQL store");
                Ok(Storage::MySql(MySqlStore::connect(url).await?))
            }
            None => {
                info!(path = ?config.local_store_path, "Using local store");
                Ok(Storage::Local(LocalStore::open(config.local_store_path.clone())?))
            }
        }
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<HireProfile>, StoreError> {
        match self {
            Storage::MySql(store) => store.get_profile(user_id).await,
            Storage::Local(store) => store.get_profile(user_id).await,
        }
    }

    /// Creates or overwrites the user's hire date.
    pub async fn put_profile(&self, user_id: &str, hire_date: NaiveDate) -> Result<(), StoreError> {
        match self {
            Storage::MySql(store) => store.put_profile(user_id, hire_date).await,
            Storage::Local(store) => store.put_profile(user_id, hire_date).await,
        }
    }

    pub async fn delete_profile(&self, user_id: &str) -> Result<(), StoreError> {
        match self {
            Storage::MySql(store) => store.delete_profile(user_id).await,
            Storage::Local(store) => store.delete_profile(user_id).await,
        }
    }

    /// Newest submission first.
    pub async fn list_requests(&self) -> Result<Vec<LeaveRequest>, StoreError> {
        match self {
            Storage::MySql(store) => store.list_requests().await,
            Storage::Local(store) => store.list_requests().await,
        }
    }

    pub async fn get_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        match self {
            Storage::MySql(store) => store.get_request(id).await,
            Storage::Local(store) => store.get_request(id).await,
        }
    }

    pub async fn append_request(&self, new: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        match self {
            Storage::MySql(store) => store.append_request(new).await,
            Storage::Local(store) => store.append_request(new).await,
        }
    }

    /// `false` when the request is missing or no longer pending.
    pub async fn update_status(&self, id: u64, change: &StatusChange) -> Result<bool, StoreError> {
        match self {
            Storage::MySql(store) => store.update_status(id, change).await,
            Storage::Local(store) => store.update_status(id, change).await,
        }
    }

    /// Withdraws a pending request owned by `submitted_by`.
    pub async fn remove_request(&self, id: u64, submitted_by: &str) -> Result<bool, StoreError> {
        match self {
            Storage::MySql(store) => store.remove_request(id, submitted_by).await,
            Storage::Local(store) => store.remove_request(id, submitted_by).await,
        }
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        match self {
            Storage::MySql(store) => store.find_user(username).await,
            Storage::Local(store) => store.find_user(username).await,
        }
    }

    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<u64, StoreError> {
        match self {
            Storage::MySql(store) => store.insert_user(username, password_hash, role).await,
            Storage::Local(store) => store.insert_user(username, password_hash, role).await,
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        match self {
            Storage::MySql(store) => store.list_users().await,
            Storage::Local(store) => store.list_users().await,
        }
    }

    /// `false` when no user has that id.
    pub async fn update_user_role(&self, id: u64, role: Role) -> Result<bool, StoreError> {
        match self {
            Storage::MySql(store) => store.update_user_role(id, role).await,
            Storage::Local(store) => store.update_user_role(id, role).await,
        }
    }

    pub async fn delete_user(&self, id: u64) -> Result<bool, StoreError> {
        match self {
            Storage::MySql(store) => store.delete_user(id).await,
            Storage::Local(store) => store.delete_user(id).await,
        }
    }
}
