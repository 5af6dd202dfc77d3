use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use super::StoreError;
use crate::leave::accrual::DATE_FORMAT;
use crate::model::hire_profile::HireProfile;
use crate::model::leave_request::{
    LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest, StatusChange,
};
use crate::model::role::Role;
use crate::model::user::User;

const LEAVE_COLUMNS: &str = r#"
    id, title, leave_type, start_date, end_date, reason, submitted_by,
    created_at, status, approver, approved_at, image
"#;

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    title: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<String>,
    submitted_by: String,
    created_at: DateTime<Utc>,
    status: String,
    approver: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    image: Option<String>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<LeaveStatus>().map_err(|_| {
            StoreError::InvalidRecord(format!(
                "leave request {} has status {:?}",
                row.id, row.status
            ))
        })?;

        Ok(LeaveRequest {
            id: row.id,
            title: row.title,
            leave_type: LeaveType::from(row.leave_type),
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason.unwrap_or_default(),
            submitted_by: row.submitted_by,
            created_at: row.created_at,
            status,
            approver: row.approver,
            approved_at: row.approved_at,
            image: row.image,
        })
    }
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = MySqlPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<HireProfile>, StoreError> {
        let row = sqlx::query_as::<_, (Option<String>,)>(
            "SELECT hire_date FROM hire_profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(raw,)| HireProfile::from_stored(user_id, raw.as_deref())))
    }

    pub async fn put_profile(&self, user_id: &str, hire_date: NaiveDate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO hire_profiles (user_id, hire_date)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE hire_date = VALUES(hire_date)
            "#,
        )
        .bind(user_id)
        .bind(hire_date.format(DATE_FORMAT).to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_profile(&self, user_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM hire_profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_requests(&self) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {} FROM leave_requests ORDER BY created_at DESC, id DESC",
            LEAVE_COLUMNS
        );
        sqlx::query_as::<_, LeaveRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }

    pub async fn get_request(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_COLUMNS);
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    pub async fn append_request(&self, new: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (title, leave_type, start_date, end_date, reason,
                 submitted_by, created_at, status, image)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(new.leave_type.as_str())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.reason)
        .bind(&new.submitted_by)
        .bind(new.created_at)
        .bind(LeaveStatus::Pending.as_ref())
        .bind(new.image.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(LeaveRequest::from_new(result.last_insert_id(), new))
    }

    pub async fn update_status(&self, id: u64, change: &StatusChange) -> Result<bool, StoreError> {
        let approved_at = match change.status {
            LeaveStatus::Approved => Some(change.at),
            _ => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approver = ?, approved_at = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(change.status.as_ref())
        .bind(&change.actor)
        .bind(approved_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_request(&self, id: u64, submitted_by: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM leave_requests
            WHERE id = ?
            AND submitted_by = ?
            AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(submitted_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, role_id
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("INSERT INTO users (username, password, role_id) VALUES (?, ?, ?)")
            .bind(username)
            .bind(password_hash)
            .bind(role.id())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.last_insert_id()),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
                Err(StoreError::DuplicateUser)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, password, role_id FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn update_user_role(&self, id: u64, role: Role) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET role_id = ? WHERE id = ?")
            .bind(role.id())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_user(&self, id: u64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
