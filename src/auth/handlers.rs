use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::ApiError,
    model::role::Role,
    model::user::User,
    models::{LoginReqDto, UpdateRole, UserListResponse, UserReq, UserResponse},
    store::{Storage, StoreError},
};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "user")]
    pub role: String,
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(ApiError::BadRequest("Username or password required".into()));
    }

    let db_user = match store.find_user(user.username.trim()).await? {
        Some(found) => {
            debug!(user_id = found.id, "User found");
            found
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(ApiError::Unauthorized("Invalid credentials"));
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let Some(role) = Role::from_id(db_user.role_id) else {
        warn!(role_id = db_user.role_id, "Stored user has unknown role");
        return Err(ApiError::Unauthorized("Invalid role"));
    };

    let access_token = generate_access_token(
        db_user.id,
        &db_user.username,
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        role: role.as_str().to_string(),
    }))
}

/// Create a user account (admin only)
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = UserReq,
    responses(
        (status = 201, description = "User registered", body = Object, example = json!({
            "message": "User registered successfully",
            "id": 2
        })),
        (status = 400, description = "Missing fields or unknown role"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Username already taken")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn register(
    auth: AuthUser,
    user: web::Json<UserReq>,
    store: web::Data<Storage>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let username = user.username.trim();
    if username.is_empty() || user.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password must not be empty".into(),
        ));
    }
    let role = Role::from_id(user.role_id)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown role id {}", user.role_id)))?;

    let id = create_user(&store, username, &user.password, role).await?;
    info!(user_id = id, username, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "id": id
    })))
}

pub async fn create_user(
    store: &Storage,
    username: &str,
    password: &str,
    role: Role,
) -> Result<u64, ApiError> {
    let hashed = hash_password(password).map_err(|e| ApiError::Internal(e.to_string()))?;

    match store.insert_user(username, &hashed, role).await {
        Ok(id) => Ok(id),
        Err(StoreError::DuplicateUser) => Err(ApiError::Conflict("Username already taken")),
        Err(e) => Err(e.into()),
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            role: Role::from_id(user.role_id)
                .map_or("unknown", Role::as_str)
                .to_string(),
            username: user.username,
        }
    }
}

/// List user accounts (admin only)
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users, ordered by id", body = UserListResponse),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn list_users(
    auth: AuthUser,
    store: web::Data<Storage>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let data: Vec<UserResponse> = store
        .list_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(UserListResponse {
        count: data.len(),
        data,
    }))
}

/// Change a user's role (admin only)
#[utoipa::path(
    put,
    path = "/api/users/{user_id}/role",
    params(
        ("user_id" = u64, Path, description = "User id")
    ),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role changed"),
        (status = 400, description = "Unknown role id"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No such user")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
#[instrument(name = "update_user_role", skip(auth, store, body), fields(admin = %auth.username))]
pub async fn update_user_role(
    auth: AuthUser,
    user_id: web::Path<u64>,
    body: web::Json<UpdateRole>,
    store: web::Data<Storage>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = user_id.into_inner();
    let role = Role::from_id(body.role_id)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown role id {}", body.role_id)))?;

    if !store.update_user_role(id, role).await? {
        return Err(ApiError::NotFound("User not found"));
    }

    info!(user_id = id, role = role.as_str(), "User role changed");
    Ok(HttpResponse::Ok().json(json!({ "message": "Role updated" })))
}

/// Delete a user account (admin only)
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Admins cannot delete their own account"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No such user")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
#[instrument(name = "delete_user", skip(auth, store), fields(admin = %auth.username))]
pub async fn delete_user(
    auth: AuthUser,
    user_id: web::Path<u64>,
    store: web::Data<Storage>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = user_id.into_inner();
    if id == auth.user_id {
        return Err(ApiError::BadRequest("Cannot delete your own account".into()));
    }

    if !store.delete_user(id).await? {
        return Err(ApiError::NotFound("User not found"));
    }

    info!(user_id = id, "User deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Creates the configured admin account on first start.
pub async fn bootstrap_admin(store: &Storage, config: &Config) -> Result<(), ApiError> {
    let Some((username, password)) = &config.bootstrap_admin else {
        return Ok(());
    };

    if store.find_user(username).await?.is_some() {
        debug!(username = %username, "Bootstrap admin already present");
        return Ok(());
    }

    create_user(store, username, password, Role::Admin).await?;
    info!(username = %username, "Bootstrap admin created");
    Ok(())
}
