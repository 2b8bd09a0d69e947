use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub email: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService;

impl JwtService {
    pub fn generate_access_token(
        user_id: &ObjectId,
        email: &str,
        is_admin: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let expiry = crate::config::Config::jwt_expiry();
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_hex(),
            email: email.to_string(),
            is_admin,
            exp: now + expiry,
            iat: now,
        };

        let secret = crate::config::Config::jwt_secret();
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn generate_refresh_token(
        user_id: &ObjectId,
        email: &str,
        is_admin: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let expiry = crate::config::Config::jwt_refresh_expiry();
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_hex(),
            email: email.to_string(),
            is_admin,
            exp: now + expiry,
            iat: now,
        };

        let secret = crate::config::Config::jwt_refresh_secret();
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn verify_token(token: &str, is_refresh: bool) -> Result<Claims, jsonwebtoken::errors::Error> {
        let secret = if is_refresh {
            crate::config::Config::jwt_refresh_secret()
        } else {
            crate::config::Config::jwt_secret()
        };

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_claim_round_trips() {
        let user_id = ObjectId::new();
        let token = JwtService::generate_access_token(&user_id, "admin@gharbhada.com", true)
            .expect("token generation");

        let claims = JwtService::verify_token(&token, false).expect("verification");
        assert_eq!(claims.sub, user_id.to_hex());
        assert_eq!(claims.email, "admin@gharbhada.com");
        assert!(claims.is_admin);
    }

    #[test]
    fn refresh_token_rejected_as_access_token() {
        let user_id = ObjectId::new();
        let refresh = JwtService::generate_refresh_token(&user_id, "user@example.com", false)
            .expect("token generation");

        assert!(JwtService::verify_token(&refresh, false).is_err());
    }
}
