use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::debug;

use super::StoreError;
use crate::leave::accrual::DATE_FORMAT;
use crate::model::hire_profile::HireProfile;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, StatusChange};
use crate::model::role::Role;
use crate::model::user::User;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Document {
    next_request_id: u64,
    next_user_id: u64,
    /// user id -> hire date text, as entered
    hire_dates: BTreeMap<String, String>,
    /// newest first
    requests: Vec<LeaveRequest>,
    users: Vec<User>,
}

/// Single JSON document guarded by one async lock.
///
/// A write edits a copy of the document, saves the copy, and only then
/// replaces the shared state, so a failed save leaves nothing behind.
/// Writers inside the process never interleave. Other processes sharing the
/// file are last-write-wins.
pub struct LocalStore {
    path: Option<PathBuf>,
    doc: RwLock<Document>,
}

impl LocalStore {
    /// Loads `path` if it exists. `None` keeps everything in memory.
    ///
    /// Runs once at startup, before the server takes requests.
    pub fn open(path: Option<PathBuf>) -> Result<Self, StoreError> {
        let doc = match &path {
            Some(p) if p.exists() => serde_json::from_slice(&fs::read(p)?)?,
            _ => Document::default(),
        };

        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    async fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.doc.read().await
    }

    async fn write<R>(
        &self,
        apply: impl FnOnce(&mut Document) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut current = self.doc.write().await;
        let mut next = current.clone();
        let result = apply(&mut next)?;

        if let Some(path) = &self.path {
            save(path, &next).await?;
        }
        *current = next;
        Ok(result)
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<HireProfile>, StoreError> {
        let doc = self.read().await;
        Ok(doc
            .hire_dates
            .get(user_id)
            .map(|raw| HireProfile::from_stored(user_id, Some(raw))))
    }

    pub async fn put_profile(&self, user_id: &str, hire_date: NaiveDate) -> Result<(), StoreError> {
        self.write(|doc| {
            doc.hire_dates
                .insert(user_id.to_string(), hire_date.format(DATE_FORMAT).to_string());
            Ok(())
        })
        .await
    }

    pub async fn delete_profile(&self, user_id: &str) -> Result<(), StoreError> {
        self.write(|doc| {
            doc.hire_dates.remove(user_id);
            Ok(())
        })
        .await
    }

    pub async fn list_requests(&self) -> Result<Vec<LeaveRequest>, StoreError> {
        Ok(self.read().await.requests.clone())
    }

    pub async fn get_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self.read().await.requests.iter().find(|r| r.id == id).cloned())
    }

    pub async fn append_request(&self, new: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        self.write(|doc| {
            doc.next_request_id += 1;
            let request = LeaveRequest::from_new(doc.next_request_id, new);
            doc.requests.insert(0, request.clone());
            Ok(request)
        })
        .await
    }

    pub async fn update_status(&self, id: u64, change: &StatusChange) -> Result<bool, StoreError> {
        self.write(|doc| {
            Ok(doc
                .requests
                .iter_mut()
                .find(|r| r.id == id)
                .is_some_and(|request| request.decide(change)))
        })
        .await
    }

    pub async fn remove_request(&self, id: u64, submitted_by: &str) -> Result<bool, StoreError> {
        self.write(|doc| {
            let before = doc.requests.len();
            doc.requests
                .retain(|r| !(r.id == id && r.submitted_by == submitted_by && r.is_pending()));
            Ok(doc.requests.len() != before)
        })
        .await
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()
            .await
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<u64, StoreError> {
        self.write(|doc| {
            if doc.users.iter().any(|u| u.username.eq_ignore_ascii_case(username)) {
                return Err(StoreError::DuplicateUser);
            }
            doc.next_user_id += 1;
            doc.users.push(User {
                id: doc.next_user_id,
                username: username.to_string(),
                password: password_hash.to_string(),
                role_id: role.id(),
            });
            Ok(doc.next_user_id)
        })
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users = self.read().await.users.clone();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    pub async fn update_user_role(&self, id: u64, role: Role) -> Result<bool, StoreError> {
        self.write(|doc| {
            Ok(match doc.users.iter_mut().find(|u| u.id == id) {
                Some(user) => {
                    user.role_id = role.id();
                    true
                }
                None => false,
            })
        })
        .await
    }

    pub async fn delete_user(&self, id: u64) -> Result<bool, StoreError> {
        self.write(|doc| {
            let before = doc.users.len();
            doc.users.retain(|u| u.id != id);
            Ok(doc.users.len() != before)
        })
        .await
    }
}

async fn save(path: &Path, doc: &Document) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(doc)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), "Local store flushed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::{LeaveStatus, LeaveType, leave_title};
    use chrono::Utc;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("hr-leave-{}.json", Uuid::new_v4()))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_request(user: &str) -> NewLeaveRequest {
        let start = date(2026, 1, 5);
        let end = date(2026, 1, 6);
        NewLeaveRequest {
            title: leave_title(&LeaveType::Annual, start, end),
            leave_type: LeaveType::Annual,
            start_date: start,
            end_date: end,
            reason: "trip".into(),
            submitted_by: user.into(),
            created_at: Utc::now(),
            image: None,
        }
    }

    fn change(status: LeaveStatus) -> StatusChange {
        StatusChange {
            status,
            actor: "admin".into(),
            at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn requests_are_listed_newest_first() {
        let store = LocalStore::open(None).unwrap();
        let first = store.append_request(new_request("jdoe")).await.unwrap();
        let second = store.append_request(new_request("asmith")).await.unwrap();

        let ids: Vec<u64> = store
            .list_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(first.status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn status_changes_only_once() {
        let store = LocalStore::open(None).unwrap();
        let request = store.append_request(new_request("jdoe")).await.unwrap();

        let rejected = change(LeaveStatus::Rejected);
        let approved = change(LeaveStatus::Approved);
        assert!(store.update_status(request.id, &rejected).await.unwrap());
        assert!(!store.update_status(request.id, &approved).await.unwrap());
        assert!(!store.update_status(999, &approved).await.unwrap());

        let stored = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Rejected);
        assert_eq!(stored.approver.as_deref(), Some("admin"));
        assert_eq!(stored.approved_at, None);
    }

    #[actix_web::test]
    async fn withdrawal_needs_owner_and_pending() {
        let store = LocalStore::open(None).unwrap();
        let mine = store.append_request(new_request("jdoe")).await.unwrap();
        let decided = store.append_request(new_request("jdoe")).await.unwrap();
        store
            .update_status(decided.id, &change(LeaveStatus::Approved))
            .await
            .unwrap();

        assert!(!store.remove_request(mine.id, "asmith").await.unwrap());
        assert!(!store.remove_request(decided.id, "jdoe").await.unwrap());
        assert!(store.remove_request(mine.id, "jdoe").await.unwrap());
        assert!(store.get_request(mine.id).await.unwrap().is_none());
        assert!(store.get_request(decided.id).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn profiles_are_overwritten_and_cleared() {
        let store = LocalStore::open(None).unwrap();
        assert!(store.get_profile("jdoe").await.unwrap().is_none());

        store.put_profile("jdoe", date(2024, 1, 15)).await.unwrap();
        store.put_profile("jdoe", date(2023, 6, 1)).await.unwrap();
        let profile = store.get_profile("jdoe").await.unwrap().unwrap();
        assert_eq!(profile.hire_date, Some(date(2023, 6, 1)));

        store.delete_profile("jdoe").await.unwrap();
        assert!(store.get_profile("jdoe").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn duplicate_usernames_are_refused() {
        let store = LocalStore::open(None).unwrap();
        assert_eq!(store.insert_user("Admin", "hash", Role::Admin).await.unwrap(), 1);
        assert!(matches!(
            store.insert_user("admin", "hash", Role::User).await,
            Err(StoreError::DuplicateUser)
        ));
        assert_eq!(store.find_user("ADMIN").await.unwrap().unwrap().role_id, 1);
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn users_change_role_and_are_removed() {
        let store = LocalStore::open(None).unwrap();
        let id = store.insert_user("jdoe", "hash", Role::User).await.unwrap();

        assert!(store.update_user_role(id, Role::Admin).await.unwrap());
        assert_eq!(store.find_user("jdoe").await.unwrap().unwrap().role_id, 1);
        assert!(!store.update_user_role(99, Role::Admin).await.unwrap());

        assert!(store.delete_user(id).await.unwrap());
        assert!(!store.delete_user(id).await.unwrap());
        assert!(store.find_user("jdoe").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn document_survives_reopen() {
        let path = temp_path();
        {
            let store = LocalStore::open(Some(path.clone())).unwrap();
            store.put_profile("jdoe", date(2024, 1, 15)).await.unwrap();
            store.append_request(new_request("jdoe")).await.unwrap();
        }

        let reopened = LocalStore::open(Some(path.clone())).unwrap();
        assert_eq!(reopened.list_requests().await.unwrap().len(), 1);
        let profile = reopened.get_profile("jdoe").await.unwrap().unwrap();
        assert!(profile.hire_date.is_some());
        let next = reopened.append_request(new_request("jdoe")).await.unwrap();
        assert_eq!(next.id, 2);

        let _ = fs::remove_file(path);
    }

    #[actix_web::test]
    async fn failed_save_leaves_state_untouched() {
        // a regular file where the store directory should be
        let blocker = temp_path();
        fs::write(&blocker, b"not a directory").unwrap();
        let store = LocalStore::open(Some(blocker.join("store.json"))).unwrap();

        assert!(matches!(
            store.put_profile("jdoe", date(2024, 1, 15)).await,
            Err(StoreError::Io(_))
        ));
        assert!(store.append_request(new_request("jdoe")).await.is_err());
        assert!(store.insert_user("jdoe", "hash", Role::User).await.is_err());

        assert!(store.get_profile("jdoe").await.unwrap().is_none());
        assert!(store.list_requests().await.unwrap().is_empty());
        assert!(store.find_user("jdoe").await.unwrap().is_none());

        let _ = fs::remove_file(blocker);
    }

    #[actix_web::test]
    async fn malformed_stored_hire_date_reads_as_absent() {
        let path = temp_path();
        let doc = serde_json::json!({ "hire_dates": { "jdoe": "soon" }, "requests": [] });
        fs::write(&path, doc.to_string()).unwrap();

        let store = LocalStore::open(Some(path.clone())).unwrap();
        let profile = store.get_profile("jdoe").await.unwrap().unwrap();
        assert_eq!(profile.hire_date, None);

        let _ = fs::remove_file(path);
    }
}
