use crate::{model::role::Role, models::Claims};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    usize::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

pub fn generate_access_token(
    user_id: u64,
    username: &str,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = Claims {
        user_id,
        sub: username.to_string(),
        role: role.id(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_identity_and_role() {
        let token = generate_access_token(4, "jdoe", Role::User, "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 4);
        assert_eq!(claims.sub, "jdoe");
        assert_eq!(Role::from_id(claims.role), Some(Role::User));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(4, "jdoe", Role::Admin, "secret", 60).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
