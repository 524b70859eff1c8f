use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("username cannot be empty")]
    EmptyUsername,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password must be at least {min} characters", min = MIN_PASSWORD_LEN)]
    ShortPassword,
}

const MIN_PASSWORD_LEN: usize = 8;

//
// ─── USER TYPES ────────────────────────────────────────────────────────────────
//

/// Profile returned by `/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Validated registration request body.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    username: String,
    email: String,
    password: String,
}

impl Registration {
    /// Validates registration input.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError` on an empty username, a malformed email,
    /// or a password shorter than the minimum length.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, RegistrationError> {
        let username = username.into().trim().to_owned();
        if username.is_empty() {
            return Err(RegistrationError::EmptyUsername);
        }

        let email = email.into().trim().to_owned();
        // Full address validation is the backend's job; catch the obvious here.
        let looks_like_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !looks_like_email {
            return Err(RegistrationError::InvalidEmail);
        }

        let password = password.into();
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegistrationError::ShortPassword);
        }

        Ok(Self {
            username,
            email,
            password,
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
