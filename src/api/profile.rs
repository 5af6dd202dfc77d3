use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::leave::accrual::{BalanceSnapshot, compute_balances, months_elapsed, parse_date};
use crate::model::hire_profile::HireProfile;
use crate::store::Storage;
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct SetHireDate {
    /// `YYYY-MM-DD`; blank clears the hire date
    #[schema(example = "2024-01-15", format = "date")]
    pub hire_date: String,
}

#[derive(Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Compute balances as of this day instead of today
    #[param(example = "2024-11-15", value_type = Option<String>, format = "date")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = "2024-01-15", format = "date", value_type = String, nullable = true)]
    pub hire_date: Option<NaiveDate>,
    #[schema(example = "2024-11-15", format = "date", value_type = String)]
    pub as_of: NaiveDate,
    #[schema(example = 10)]
    pub months_elapsed: u32,
    pub balances: BalanceSnapshot,
}

impl BalanceResponse {
    pub fn compute(hire_date: Option<NaiveDate>, as_of: NaiveDate) -> Self {
        Self {
            hire_date,
            as_of,
            months_elapsed: hire_date.map_or(0, |hire| months_elapsed(hire, as_of)),
            balances: compute_balances(hire_date, as_of),
        }
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) async fn stored_hire_date(
    store: &Storage,
    user_id: &str,
) -> Result<Option<NaiveDate>, ApiError> {
    Ok(store
        .get_profile(user_id)
        .await?
        .and_then(|profile| profile.hire_date))
}

/// Current user's hire date
#[utoipa::path(
    get,
    path = "/api/profile/hire-date",
    responses(
        (status = 200, description = "Hire profile, hire_date is null when unset",
         body = HireProfile),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn get_hire_date(
    auth: AuthUser,
    store: web::Data<Storage>,
) -> Result<HttpResponse, ApiError> {
    let profile = store
        .get_profile(&auth.username)
        .await?
        .unwrap_or_else(|| HireProfile::from_stored(auth.username.clone(), None));

    Ok(HttpResponse::Ok().json(profile))
}

/// Save (or overwrite) the current user's hire date
#[utoipa::path(
    put,
    path = "/api/profile/hire-date",
    request_body = SetHireDate,
    responses(
        (status = 200, description = "Hire date saved, balances recomputed",
         body = BalanceResponse),
        (status = 400, description = "Hire date is not a YYYY-MM-DD date"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn put_hire_date(
    auth: AuthUser,
    store: web::Data<Storage>,
    payload: web::Json<SetHireDate>,
) -> Result<HttpResponse, ApiError> {
    let raw = payload.hire_date.trim();

    let hire_date = if raw.is_empty() {
        store.delete_profile(&auth.username).await?;
        info!(user = %auth.username, "Hire date cleared");
        None
    } else {
        let date = parse_date(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("hire_date must be YYYY-MM-DD, got {raw:?}"))
        })?;
        store.put_profile(&auth.username, date).await?;
        info!(user = %auth.username, %date, "Hire date saved");
        Some(date)
    };

    Ok(HttpResponse::Ok().json(BalanceResponse::compute(hire_date, today())))
}

/// Clear the current user's hire date
#[utoipa::path(
    delete,
    path = "/api/profile/hire-date",
    responses(
        (status = 204, description = "Hire date cleared"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn delete_hire_date(
    auth: AuthUser,
    store: web::Data<Storage>,
) -> Result<HttpResponse, ApiError> {
    store.delete_profile(&auth.username).await?;
    info!(user = %auth.username, "Hire date cleared");

    Ok(HttpResponse::NoContent().finish())
}

/// Accrued balances for the current user
#[utoipa::path(
    get,
    path = "/api/profile/balances",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Balances computed from the hire date",
         body = BalanceResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn get_balances(
    auth: AuthUser,
    store: web::Data<Storage>,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let hire_date = stored_hire_date(&store, &auth.username).await?;
    let as_of = query.as_of.unwrap_or_else(today);

    Ok(HttpResponse::Ok().json(BalanceResponse::compute(hire_date, as_of)))
}
