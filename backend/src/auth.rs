//! Credential checks and bearer tokens.
//!
//! Tokens are stateless HS256 JWTs carrying the user id and username. Every
//! user-scoped route decodes the token and then confirms the user still exists.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::models::User;
use crate::schema::users;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User id
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

impl SignupForm {
    fn validate(&self) -> Result<(), ApiError> {
        let required = [
            ("username", &self.username),
            ("password", &self.password),
            ("email", &self.email),
            ("name", &self.name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ApiError::Validation(format!("{} is required", field)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Result of a successful login.
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        Self {
            pool,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: Duration::seconds(config.token_ttl_secs),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub async fn signup(&self, form: SignupForm) -> Result<User, ApiError> {
        form.validate()?;
        let cost = self.bcrypt_cost;
        let user = db::run(&self.pool, move |conn| {
            let existing = users::table
                .filter(users::username.eq(&form.username).or(users::email.eq(&form.email)))
                .select(users::id)
                .first::<String>(conn)
                .optional()?;
            if existing.is_some() {
                return Err(ApiError::Conflict("User already exists".into()));
            }

            let user = User {
                id: Uuid::new_v4().to_string(),
                username: form.username,
                password_hash: bcrypt::hash(&form.password, cost)?,
                email: form.email,
                name: form.name,
                phone: form.phone,
                joined_at: Utc::now().naive_utc(),
            };
            // The unique indexes catch a concurrent signup that slipped past the check above.
            diesel::insert_into(users::table)
                .values(&user)
                .execute(conn)
                .map_err(|e| match ApiError::from(e) {
                    ApiError::Conflict(_) => ApiError::Conflict("User already exists".into()),
                    other => other,
                })?;
            Ok(user)
        })
        .await?;
        log::info!("Registered user {}", user.username);
        Ok(user)
    }

    pub async fn login(&self, form: LoginForm) -> Result<Session, ApiError> {
        let username = form.username.clone();
        let user = db::run(&self.pool, move |conn| {
            let user = users::table
                .filter(users::username.eq(&form.username))
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("User"))?;
            if !bcrypt::verify(&form.password, &user.password_hash)? {
                return Err(ApiError::Unauthorized("Invalid password".into()));
            }
            Ok(user)
        })
        .await
        .map_err(|e| {
            log::info!("Login rejected for {}: {}", username, e);
            e
        })?;

        let token = self.issue_token(&user, Utc::now())?;
        log::info!("User {} logged in", user.username);
        Ok(Session { token, user })
    }

    pub fn issue_token(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            iat: issued_at.timestamp().max(0) as usize,
            exp: (issued_at + self.token_ttl).timestamp().max(0) as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {}", e)))
    }

    /// Checks signature and expiry only; no identity lookup.
    pub fn decode_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("Token rejected: {}", e);
                ApiError::Forbidden("Invalid token".into())
            })
    }

    pub async fn verify(&self, token: &str) -> Result<User, ApiError> {
        let claims = self.decode_token(token)?;
        let user_id = claims.sub;
        db::run(&self.pool, move |conn| {
            users::table
                .find(&user_id)
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::Forbidden("Invalid token".into()))
        })
        .await
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let missing = || ApiError::Unauthorized("Token missing".into());
    let value = headers.get(header::AUTHORIZATION).ok_or_else(missing)?;
    let value = value.to_str().map_err(|_| missing())?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(missing()),
    }
}

/// Route layer that resolves the caller and stores the [`User`] in request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Owned so no borrow of the request is held across the lookup.
    let token = bearer_token(request.headers())?.to_owned();
    let user = state.auth.verify(&token).await?;
    log::debug!("Authenticated user {} for {}", user.username, request.uri().path());
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use diesel::r2d2::{ConnectionManager, Pool};

    fn service(secret: &str) -> AuthService {
        // Never connected: these tests exercise the pure token path only.
        let pool = Pool::builder()
            .max_size(1)
            .build_unchecked(ConnectionManager::new(":memory:"));
        AuthService {
            pool,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl: Duration::hours(1),
            bcrypt_cost: 4,
        }
    }

    fn user() -> User {
        User {
            id: "user-1".into(),
            username: "u1".into(),
            password_hash: String::new(),
            email: "u1@example.com".into(),
            name: "U One".into(),
            phone: "9876543210".into(),
            joined_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn fresh_token_decodes_to_user() {
        let auth = service("sectiona");
        let token = auth.issue_token(&user(), Utc::now()).unwrap();
        let claims = auth.decode_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "u1");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_is_forbidden_after_one_hour() {
        let auth = service("sectiona");
        let issued = Utc::now() - Duration::minutes(61);
        let token = auth.issue_token(&user(), issued).unwrap();
        assert!(matches!(auth.decode_token(&token), Err(ApiError::Forbidden(_))));

        let issued = Utc::now() - Duration::minutes(59);
        let token = auth.issue_token(&user(), issued).unwrap();
        assert!(auth.decode_token(&token).is_ok());
    }

    #[test]
    fn token_signed_with_other_key_is_forbidden() {
        let token = service("other").issue_token(&user(), Utc::now()).unwrap();
        assert!(matches!(service("sectiona").decode_token(&token), Err(ApiError::Forbidden(_))));
        assert!(matches!(service("sectiona").decode_token("garbage"), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(ApiError::Unauthorized(_))));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(bearer_token(&headers), Err(ApiError::Unauthorized(_))));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(bearer_token(&headers), Err(ApiError::Unauthorized(_))));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }

    #[test]
    fn signup_requires_identity_fields() {
        let form = SignupForm {
            username: "u1".into(),
            password: String::new(),
            email: "u1@example.com".into(),
            name: "U".into(),
            phone: String::new(),
        };
        assert!(matches!(form.validate(), Err(ApiError::Validation(_))));
    }
}
