use crate::api::profile::{stored_hire_date, today};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::leave::attachment::{Attachment, body_limit, read_attachment, read_body};
use crate::leave::availability::Availability;
use crate::leave::validation::{LeaveDraft, validate};
use crate::model::leave_request::{LIST_FIELDS, LeaveRequest, LeaveStatus, StatusChange};
use crate::store::Storage;
use crate::utils::list_view::{SortKey, apply_filter, apply_sort};
use actix_web::error::PayloadError;
use actix_web::web::Bytes;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "Sick")]
    pub leave_type: Option<String>,
    #[schema(example = "2026-01-01", format = "date")]
    pub start_date: Option<String>,
    #[schema(example = "2026-01-03", format = "date")]
    pub end_date: Option<String>,
    #[schema(example = "Flu")]
    pub reason: Option<String>,
    /// Submit even though the requested days exceed the balance
    #[serde(default)]
    #[schema(example = false)]
    pub confirm_over_balance: bool,
    /// `data:image/<type>;base64,...`
    #[schema(nullable = true)]
    pub image: Option<String>,
}

impl CreateLeave {
    fn draft(&self) -> LeaveDraft {
        LeaveDraft {
            leave_type: self.leave_type.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            reason: self.reason.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreatedLeave {
    pub request: LeaveRequest,
    #[schema(example = 3)]
    pub requested_days: u64,
    /// Days available for the type, or `"unlimited"`
    #[schema(value_type = Object, example = json!(20))]
    pub available: Availability,
    /// True when the request went in over balance after confirmation
    pub over_balance: bool,
}

#[derive(Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// Filter by leave status
    #[param(example = "pending")]
    pub status: Option<String>,
    /// Case-insensitive match on title or submitter
    #[param(example = "sick")]
    pub search: Option<String>,
    /// One of name-asc, name-desc, date-newest, date-oldest
    #[param(example = "date-newest")]
    pub sort: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    #[schema(example = 1)]
    pub count: usize,
    pub data: Vec<LeaveRequest>,
}

fn parse_status(raw: Option<&str>) -> Result<Option<LeaveStatus>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Unknown status {s:?}"))),
    }
}

fn parse_sort(raw: Option<&str>) -> Result<Option<SortKey>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Unknown sort key {s:?}"))),
    }
}

/// Submit a leave request
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request form",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted, status pending",
         body = CreatedLeave),
        (status = 400, description = "Incomplete fields, reversed dates or unreadable attachment"),
        (status = 401, description = "Unauthorized"),
        (status = 408, description = "Request body with the attachment was not read in time"),
        (status = 409, description = "Over balance, resubmit with confirm_over_balance",
         body = Object,
         example = json!({
            "message": "requested days (5) exceed available balance (2.5). \
                        Resubmit with confirm_over_balance to proceed.",
            "error": "over_balance",
            "requested_days": 5,
            "available": 2.5
         })
        ),
        (status = 413, description = "Attachment too large")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(
    name = "create_leave",
    skip_all,
    fields(user = %auth.username, user_id = auth.user_id)
)]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<Storage>,
    config: web::Data<Config>,
    body: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let created = submit_leave(&auth, &store, &config, body).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Reads the form under the attachment timeout, then validates and stores it.
pub(crate) async fn submit_leave<S>(
    auth: &AuthUser,
    store: &Storage,
    config: &Config,
    body: S,
) -> Result<CreatedLeave, ApiError>
where
    S: Stream<Item = Result<Bytes, PayloadError>> + Unpin,
{
    let raw = read_attachment(
        read_body(body, body_limit(config.max_attachment_bytes)),
        config.attachment_timeout,
    )
    .await
    .inspect_err(|e| warn!(error = %e, "Submission body rejected"))?;
    let payload: CreateLeave = serde_json::from_slice(&raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid leave request body: {e}")))?;

    let hire_date = stored_hire_date(store, &auth.username).await?;

    let validated = validate(&payload.draft(), hire_date, today())?;
    let requested_days = validated.requested_days;
    let available = validated.available;
    let over_balance = validated.over_balance().is_some();

    let mut submission =
        validated.into_submission(payload.confirm_over_balance, &auth.username, Utc::now())?;

    if let Some(data_url) = payload.image {
        let attachment = Attachment::from_data_url(data_url, config.max_attachment_bytes)
            .inspect_err(|e| warn!(error = %e, "Attachment rejected"))?;
        submission.image = Some(attachment.into_data_url());
    }

    let request = store.append_request(submission).await?;
    info!(
        leave_id = request.id,
        requested_days, over_balance, "Leave request submitted"
    );

    Ok(CreatedLeave {
        request,
        requested_days,
        available,
        over_balance,
    })
}

/// List leave requests
///
/// Admins see every request, everyone else only their own.
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests, newest first unless sorted",
         body = LeaveListResponse),
        (status = 400, description = "Unknown status or sort key"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    store: web::Data<Storage>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    let status = parse_status(query.status.as_deref())?;
    let sort = parse_sort(query.sort.as_deref())?;

    let visible: Vec<LeaveRequest> = store
        .list_requests()
        .await?
        .into_iter()
        .filter(|r| auth.can_view(&r.submitted_by))
        .filter(|r| status.is_none_or(|s| r.status == s))
        .collect();

    let filtered = apply_filter(&visible, query.search.as_deref(), &LIST_FIELDS);
    let data = apply_sort(&filtered, sort, &LIST_FIELDS);

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        count: data.len(),
        data,
    }))
}

/// Get a leave request by id
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your request"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    store: web::Data<Storage>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let request = store
        .get_request(path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Leave request not found"))?;

    if !auth.can_view(&request.submitted_by) {
        return Err(ApiError::Forbidden("Not your leave request"));
    }

    Ok(HttpResponse::Ok().json(request))
}

async fn decide(
    auth: &AuthUser,
    store: &Storage,
    leave_id: u64,
    status: LeaveStatus,
) -> Result<(), ApiError> {
    auth.require_admin()?;

    let change = StatusChange {
        status,
        actor: auth.username.clone(),
        at: Utc::now(),
    };

    if store.update_status(leave_id, &change).await? {
        info!(leave_id, status = %status, actor = %auth.username, "Leave request decided");
        return Ok(());
    }

    match store.get_request(leave_id).await? {
        None => Err(ApiError::NotFound("Leave request not found")),
        Some(_) => Err(ApiError::BadRequest("Leave request already processed".into())),
    }
}

/// Approve a pending leave request (admin)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request already processed", body = Object,
         example = json!({
            "message": "Leave request already processed"
         })
        ),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    store: web::Data<Storage>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    decide(&auth, &store, path.into_inner(), LeaveStatus::Approved).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave approved"
    })))
}

/// Reject a pending leave request (admin)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    store: web::Data<Storage>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    decide(&auth, &store, path.into_inner(), LeaveStatus::Rejected).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave rejected"
    })))
}

/// Withdraw your own pending leave request
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to withdraw")
    ),
    responses(
        (status = 204, description = "Leave request withdrawn"),
        (status = 400, description = "Only your own pending requests can be withdrawn"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn withdraw_leave(
    auth: AuthUser,
    store: web::Data<Storage>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    if store.remove_request(leave_id, &auth.username).await? {
        info!(leave_id, user = %auth.username, "Leave request withdrawn");
        return Ok(HttpResponse::NoContent().finish());
    }

    match store.get_request(leave_id).await? {
        None => Err(ApiError::NotFound("Leave request not found")),
        Some(_) => Err(ApiError::BadRequest(
            "Only your own pending requests can be withdrawn".into(),
        )),
    }
}
