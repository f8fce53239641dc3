use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shelf_kernel::settings::AuthSettings;
use time::{Duration, OffsetDateTime};

use crate::AuthError;

/// Identity carried inside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsData {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user id as a string.
    pub sub: String,
    pub data: ClaimsData,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 issuer and verifier sharing one secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(&settings.jwt_secret, settings.token_ttl_hours)
    }

    pub fn issue(&self, user_id: i64, username: &str) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id.to_string(),
            data: ClaimsData {
                id: user_id,
                username: username.to_string(),
            },
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Decode and check signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let tokens = TokenService::new("test-secret", 1);
        let token = tokens.issue(7, "ada").unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.data, ClaimsData { id: 7, username: "ada".to_string() });
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new("test-secret", -2);
        let token = tokens.issue(7, "ada").unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::Token(_))));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let issuer = TokenService::new("one-secret", 1);
        let verifier = TokenService::new("another-secret", 1);
        let token = issuer.issue(1, "ada").unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = TokenService::new("test-secret", 1);
        assert!(tokens.verify("not.a.token").is_err());
    }
}
