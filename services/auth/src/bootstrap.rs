//! Seed the first administrator account
//!
//! Self-service signup never grants `ADMIN`, so a fresh deployment needs
//! one admin created out of band. It is read from the environment at
//! startup and created only when no account with that email exists.

use anyhow::Result;
use common::Role;
use std::env;
use tracing::info;

use crate::{
    models::NewUser,
    repositories::UserRepository,
    validation::{normalize_email, validate_email, validate_mobile, validate_password},
};

/// Administrator described by `BOOTSTRAP_ADMIN_*` variables
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
}

impl BootstrapAdmin {
    /// Read the bootstrap admin from the environment
    ///
    /// Returns `Ok(None)` when `BOOTSTRAP_ADMIN_EMAIL` is unset.
    ///
    /// # Environment Variables
    /// - `BOOTSTRAP_ADMIN_EMAIL`: Admin login email
    /// - `BOOTSTRAP_ADMIN_PASSWORD`: Admin password (required with the email)
    /// - `BOOTSTRAP_ADMIN_NAME`: Display name (default: "Administrator")
    /// - `BOOTSTRAP_ADMIN_MOBILE`: Mobile number (default: "0000000000")
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(email) = env::var("BOOTSTRAP_ADMIN_EMAIL") else {
            return Ok(None);
        };

        let email = normalize_email(&email);
        validate_email(&email).map_err(anyhow::Error::msg)?;

        let password = env::var("BOOTSTRAP_ADMIN_PASSWORD").map_err(|_| {
            anyhow::anyhow!("BOOTSTRAP_ADMIN_PASSWORD must be set with BOOTSTRAP_ADMIN_EMAIL")
        })?;
        validate_password(&password).map_err(anyhow::Error::msg)?;

        let mobile =
            env::var("BOOTSTRAP_ADMIN_MOBILE").unwrap_or_else(|_| "0000000000".to_string());
        validate_mobile(&mobile).map_err(anyhow::Error::msg)?;

        Ok(Some(Self {
            name: env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
            email,
            mobile,
            password,
        }))
    }

    /// Create the admin unless its email or mobile is already registered
    ///
    /// Returns whether an account was created.
    pub async fn ensure(&self, users: &UserRepository) -> Result<bool> {
        if users
            .exists_by_email_or_mobile(&self.email, &self.mobile)
            .await?
        {
            info!("Bootstrap admin {} already present", self.email);
            return Ok(false);
        }

        users
            .create(&NewUser {
                name: self.name.clone(),
                email: self.email.clone(),
                mobile: self.mobile.clone(),
                password: self.password.clone(),
                role: Role::Admin,
            })
            .await?;

        info!("Created bootstrap admin {}", self.email);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::init_memory_pool;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            env::remove_var("BOOTSTRAP_ADMIN_EMAIL");
            env::remove_var("BOOTSTRAP_ADMIN_PASSWORD");
            env::remove_var("BOOTSTRAP_ADMIN_NAME");
            env::remove_var("BOOTSTRAP_ADMIN_MOBILE");
        }
    }

    #[test]
    #[serial]
    fn absent_without_email() {
        clear_env();
        assert!(BootstrapAdmin::from_env().unwrap().is_none());
    }

    #[test]
    #[serial]
    fn email_without_password_is_an_error() {
        clear_env();
        unsafe {
            env::set_var("BOOTSTRAP_ADMIN_EMAIL", "root@example.com");
        }
        assert!(BootstrapAdmin::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn reads_defaults() {
        clear_env();
        unsafe {
            env::set_var("BOOTSTRAP_ADMIN_EMAIL", " Root@Example.com ");
            env::set_var("BOOTSTRAP_ADMIN_PASSWORD", "correct-horse-1");
        }

        let admin = BootstrapAdmin::from_env().unwrap().unwrap();
        assert_eq!(admin.email, "root@example.com");
        assert_eq!(admin.name, "Administrator");
        assert_eq!(admin.mobile, "0000000000");
        clear_env();
    }

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let pool = init_memory_pool().await.unwrap();
        let users = UserRepository::new(pool);
        let admin = BootstrapAdmin {
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            mobile: "5550100".to_string(),
            password: "correct-horse-1".to_string(),
        };

        assert!(admin.ensure(&users).await.unwrap());
        assert!(!admin.ensure(&users).await.unwrap());

        let stored = users.find_by_email("root@example.com").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Admin);
    }
}
