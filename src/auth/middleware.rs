use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

/// Resolves the bearer token on `req` to the user it was issued for.
fn authenticate(req: &ServiceRequest) -> Result<AuthUser, ApiError> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| ApiError::Internal("App config missing".into()))?;

    let header = req
        .headers()
        .get("Authorization")
        .ok_or(ApiError::Unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header encoding"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized("Authorization header must start with Bearer"))?;

    let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
        debug!(error = %e, "Rejected token");
        ApiError::Unauthorized("Invalid or expired token")
    })?;

    let role = Role::from_id(claims.role).ok_or(ApiError::Unauthorized("Invalid role"))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
    })
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    match authenticate(&req) {
        Ok(user) => {
            debug!(user_id = user.user_id, role = user.role.as_str(), "Authenticated");
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(e) => Ok(req.error_response(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use actix_web::http::StatusCode;
    use actix_web::middleware::from_fn;
    use actix_web::test::{self, TestRequest};
    use actix_web::{App, HttpResponse, web};
    use serde_json::Value;

    async fn me(user: AuthUser) -> HttpResponse {
        HttpResponse::Ok().body(user.username)
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(Data::new(Config::for_tests(None)))
                    .service(
                        web::resource("/me")
                            .wrap(from_fn(auth_middleware))
                            .route(web::get().to(me)),
                    ),
            )
            .await
        };
    }

    async fn rejection(header: Option<String>) -> (StatusCode, Value) {
        let app = app!();
        let mut req = TestRequest::get().uri("/me");
        if let Some(value) = header {
            req = req.insert_header(("Authorization", value));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn missing_or_malformed_headers_are_unauthorized() {
        let (status, body) = rejection(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Missing Authorization header");

        let (status, body) = rejection(Some("Token abc".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authorization header must start with Bearer");

        let (status, body) = rejection(Some("Bearer abc".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid or expired token");
    }

    #[actix_web::test]
    async fn token_signed_with_another_secret_is_unauthorized() {
        let token = generate_access_token(2, "jdoe", Role::User, "other-secret", 900).unwrap();
        let (status, _) = rejection(Some(format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_token_reaches_the_handler_as_auth_user() {
        let app = app!();
        let token = generate_access_token(2, "jdoe", Role::User, "test-secret", 900).unwrap();
        let req = TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(&body[..], b"jdoe");
    }
}
