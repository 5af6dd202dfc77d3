use crate::api::leave_request::{CreateLeave, CreatedLeave, LeaveListResponse};
use crate::api::profile::{BalanceResponse, SetHireDate};
use crate::auth::handlers::LoginResponse;
use crate::leave::accrual::BalanceSnapshot;
use crate::model::hire_profile::HireProfile;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::models::{LoginReqDto, UpdateRole, UserListResponse, UserReq, UserResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Leave API",
        version = "1.0.0",
        description = r#"
## Leave entitlement and request tracking

### Key Features
- **Hire profile**: store a hire date, read balances accrued from it
- **Leave requests**: submit, list, approve, reject and withdraw

### Accrual
Balances grow with each whole month since the hire date:
sick 2 days/month, annual 1.5 days/month, compassionate 7 days per full quarter,
maternity 90 days/year pro-rated. Unpaid leave is unlimited.

### Security
Endpoints under `/api` need a **JWT Bearer** token from `/auth/login`.
Approving, rejecting and managing users are admin only.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::register,
        crate::auth::handlers::list_users,
        crate::auth::handlers::update_user_role,
        crate::auth::handlers::delete_user,

        crate::api::profile::get_hire_date,
        crate::api::profile::put_hire_date,
        crate::api::profile::delete_hire_date,
        crate::api::profile::get_balances,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::withdraw_leave
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            UserReq,
            UserResponse,
            UserListResponse,
            UpdateRole,
            HireProfile,
            SetHireDate,
            BalanceSnapshot,
            BalanceResponse,
            CreateLeave,
            CreatedLeave,
            LeaveRequest,
            LeaveStatus,
            LeaveListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sign in and user management"),
        (name = "Profile", description = "Hire date and accrued balances"),
        (name = "Leave", description = "Leave request APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_leave_paths_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leave"));
        assert!(doc.paths.paths.contains_key("/api/leave/{leave_id}/approve"));
        assert!(doc.paths.paths.contains_key("/api/profile/balances"));
        assert!(doc.paths.paths.contains_key("/api/users/{user_id}/role"));

        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
