// ABOUTME: JWT-based user authentication and authorization system
// ABOUTME: Handles password hashing, token generation, validation, and role checks
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! # Authentication and Session Management
//!
//! JWT-based authentication for the FitFlow server. Tokens are issued at
//! login, carry the user's role, and are validated on every authenticated
//! route. Passwords are stored as bcrypt hashes.

use crate::errors::{AppError, AppResult};
use crate::models::{Profile, UserRole};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `JWT` claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User email
    pub email: String,
    /// Authorization role at issue time
    pub role: UserRole,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Authentication result with user context
#[derive(Debug, Clone, Copy)]
pub struct AuthResult {
    /// Authenticated user `ID`
    pub user_id: Uuid,
    /// Role carried by the token
    pub role: UserRole,
}

impl AuthResult {
    /// Require a coach or admin role
    ///
    /// # Errors
    ///
    /// Returns a permission error for student tokens.
    pub fn require_staff(&self) -> AppResult<()> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(AppError::permission_denied("Coach access required"))
        }
    }

    /// Require the admin role
    ///
    /// # Errors
    ///
    /// Returns a permission error for non-admin tokens.
    pub fn require_admin(&self) -> AppResult<()> {
        if matches!(self.role, UserRole::Admin) {
            Ok(())
        } else {
            Err(AppError::permission_denied("Admin access required"))
        }
    }
}

/// Authentication manager for token issuing and validation
pub struct AuthManager {
    jwt_secret: Vec<u8>,
    expiry_hours: i64,
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub const fn new(jwt_secret: Vec<u8>, expiry_hours: i64) -> Self {
        Self {
            jwt_secret,
            expiry_hours,
        }
    }

    /// Hash a plaintext password for storage
    ///
    /// # Errors
    ///
    /// Returns an error if bcrypt hashing fails.
    pub fn hash_password(password: &str) -> AppResult<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// # Errors
    ///
    /// Returns an invalid-credentials error on mismatch or malformed hash.
    pub fn verify_password(password: &str, hash: &str) -> AppResult<()> {
        let ok = bcrypt::verify(password, hash)
            .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
        if ok {
            Ok(())
        } else {
            Err(AppError::auth_invalid("Invalid email or password"))
        }
    }

    /// Generate a JWT for an authenticated profile
    ///
    /// # Errors
    ///
    /// Returns an error if token encoding fails.
    pub fn generate_token(&self, profile: &Profile) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: profile.id.to_string(),
            email: profile.email.clone(),
            role: profile.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.jwt_secret),
        )
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))
    }

    /// Validate a JWT and return its claims
    ///
    /// # Errors
    ///
    /// Returns an auth error for expired, malformed, or tampered tokens.
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.jwt_secret),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::new(
                crate::errors::ErrorCode::AuthExpired,
                "Authentication token has expired",
            ),
            _ => AppError::auth_invalid(format!("Invalid token: {e}")),
        })
    }

    /// Authenticate a `Bearer` authorization header value
    ///
    /// # Errors
    ///
    /// Returns an auth error when the header is missing, malformed, or the
    /// token fails validation.
    pub fn authenticate(&self, auth_header: Option<&str>) -> AppResult<AuthResult> {
        let header = auth_header.ok_or_else(AppError::auth_required)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Authorization header must use Bearer scheme"))?;

        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| AppError::auth_invalid(format!("Invalid subject claim: {e}")))?;

        Ok(AuthResult {
            user_id,
            role: claims.role,
        })
    }
}
