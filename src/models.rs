use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UserReq {
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "user123")]
    pub password: String,
    /// 1 = admin, 2 = user
    #[schema(example = 2)]
    pub role_id: u8,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "user123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
}

/// A user account as admins see it. The password hash never leaves the store.
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "user")]
    pub role: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    #[schema(example = 1)]
    pub count: usize,
    pub data: Vec<UserResponse>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRole {
    /// 1 = admin, 2 = user
    #[schema(example = 1)]
    pub role_id: u8,
}
