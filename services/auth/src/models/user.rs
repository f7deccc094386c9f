//! User model and related functionality

use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user creation payload; `password` is plaintext and hashed on insert
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub role: Role,
}

/// User update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub mobile: Option<String>,
}

/// Public view of a user, never carries the credential hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            mobile: user.mobile.clone(),
            role: user.role,
            active: user.active,
            created_at: user.created_at,
        }
    }
}

/// Signup form; every field is optional so that a missing one maps to a
/// validation message instead of a deserialization rejection
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub mobile: Option<String>,
    pub role: Option<String>,
}

/// User login credentials
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Password change form
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}
