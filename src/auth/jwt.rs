use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::Role;

#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    expiry: Duration,
}

impl JwtService {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            expiry: Duration::minutes(config.jwt_expiry_minutes),
        })
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn generate_token(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        name: &str,
        role: Role,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + self.expiry;
        let claims = Claims {
            sub: user_id,
            sid: session_id,
            name: name.to_owned(),
            role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.clone()]);
        validation.set_issuer(&[self.issuer.clone()]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub sid: Uuid,
    pub name: String,
    pub role: Role,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, audience: &str) -> JwtService {
        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some(secret.to_string()),
            "JWT_AUDIENCE" => Some(audience.to_string()),
            _ => None,
        })
        .unwrap();
        JwtService::from_config(&config).unwrap()
    }

    #[test]
    fn token_round_trips_session_and_role() {
        let jwt = service("secret", "ragdesk-console");
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let token = jwt
            .generate_token(user_id, session_id, "김관리", Role::Master)
            .unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.sid, session_id);
        assert_eq!(claims.role, Role::Master);
        assert_eq!(claims.name, "김관리");
    }

    #[test]
    fn token_for_another_audience_is_rejected() {
        let issuing = service("secret", "other-console");
        let verifying = service("secret", "ragdesk-console");
        let token = issuing
            .generate_token(Uuid::new_v4(), Uuid::new_v4(), "user", Role::User)
            .unwrap();
        assert!(verifying.verify_token(&token).is_err());
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = service("one", "ragdesk-console")
            .generate_token(Uuid::new_v4(), Uuid::new_v4(), "user", Role::User)
            .unwrap();
        assert!(service("two", "ragdesk-console").verify_token(&token).is_err());
    }
}
