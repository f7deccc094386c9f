//! Client session store
//!
//! [`SessionContext`] owns the most recently issued session and mirrors it
//! into a [`SessionStorage`] under [`SESSION_KEY`], so a restarted client
//! picks it up again in [`SessionContext::init`]. Consumers such as
//! [`ApiClient`](crate::api::ApiClient) and [`RouteGuard`](crate::guard::RouteGuard)
//! read it through the accessors and never touch the storage themselves.

use std::sync::{PoisonError, RwLock};

use common::Role;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    api::ApiClient,
    error::{ClientResult, StorageError},
    models::{SignupForm, UserProfile},
    roles::AllowedRoles,
    storage::SessionStorage,
};

/// Storage key of the persisted session record
pub const SESSION_KEY: &str = "user";

/// Issued credentials plus whatever profile fields could be fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// Source of the bearer token attached to outgoing requests
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

pub struct SessionContext<S: SessionStorage> {
    storage: S,
    current: RwLock<Option<Session>>,
}

impl<S: SessionStorage> SessionContext<S> {
    /// Empty context; call [`init`](Self::init) to restore a stored session
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
        }
    }

    /// Load the stored session, discarding a record that no longer parses
    pub fn init(&self) -> ClientResult<Option<Session>> {
        let restored = match self.storage.get(SESSION_KEY)? {
            None => None,
            Some(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(err) => {
                    warn!("Discarding unreadable stored session: {}", err);
                    self.storage.remove(SESSION_KEY)?;
                    None
                }
            },
        };

        self.replace(restored.clone());
        Ok(restored)
    }

    /// Sign in, then fetch the profile
    ///
    /// A failed profile fetch does not fail the login; the session then holds
    /// only the token and role.
    pub async fn login(
        &self,
        api: &ApiClient,
        email: &str,
        password: &str,
    ) -> ClientResult<Session> {
        let issued = api.login(email, password).await?;

        let user = match api.profile_with(&issued.token).await {
            Ok(profile) => Some(profile.user),
            Err(err) => {
                warn!("Signed in but could not load the profile: {}", err);
                None
            }
        };

        let session = Session {
            token: issued.token,
            role: issued.role,
            user,
        };
        self.establish(session.clone())?;
        info!("Signed in as {}", email);

        Ok(session)
    }

    /// Create an account and sign into it
    pub async fn register(&self, api: &ApiClient, form: SignupForm) -> ClientResult<Session> {
        api.signup(&form).await?;
        self.login(api, &form.email, &form.password).await
    }

    /// Persist `session` and make it current
    pub fn establish(&self, session: Session) -> ClientResult<()> {
        let record = serde_json::to_string(&session).map_err(StorageError::from)?;
        self.storage.set(SESSION_KEY, &record)?;
        self.replace(Some(session));
        Ok(())
    }

    /// Forget the session locally; the token simply stops being sent
    pub fn logout(&self) -> ClientResult<()> {
        self.replace(None);
        self.storage.remove(SESSION_KEY)?;
        Ok(())
    }

    pub fn session(&self) -> Option<Session> {
        self.read(|session| session.cloned())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|session| session.is_some())
    }

    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(|role| role.is_admin())
    }

    /// Whether the current role is in `allowed`; always false when signed out
    pub fn has_role(&self, allowed: impl Into<AllowedRoles>) -> bool {
        let allowed = allowed.into();
        self.role().is_some_and(|role| allowed.permits(role))
    }

    pub fn token(&self) -> Option<String> {
        self.read(|session| session.map(|s| s.token.clone()))
    }

    pub fn role(&self) -> Option<Role> {
        self.read(|session| session.map(|s| s.role))
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read(|session| session.and_then(|s| s.user.clone()))
    }

    fn read<T>(&self, f: impl FnOnce(Option<&Session>) -> T) -> T {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(current.as_ref())
    }

    fn replace(&self, session: Option<Session>) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = session;
    }
}

impl<S: SessionStorage> TokenSource for SessionContext<S> {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}
