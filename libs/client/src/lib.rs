//! StayBook client library
//!
//! Holds the signed-in session for a front end, persists it across restarts,
//! gates protected views by role and talks to both services over HTTP.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use client::{ApiClient, ClientConfig, FileStorage, SessionContext};
//!
//! # async fn run() -> client::ClientResult<()> {
//! let session = Arc::new(SessionContext::new(FileStorage::new("storage.json")));
//! session.init()?;
//!
//! let api = ApiClient::new(ClientConfig::from_env()).with_tokens(session.clone());
//! if !session.is_authenticated() {
//!     session.login(&api, "ada@example.com", "correct horse").await?;
//! }
//! let villas = api.villas(None).await?;
//! # let _ = villas;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod calendar;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod roles;
pub mod session;
pub mod storage;

pub use api::ApiClient;
pub use calendar::BookingCalendar;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, StorageError};
pub use guard::{GuardDecision, RouteGuard};
pub use roles::AllowedRoles;
pub use session::{Session, SessionContext, TokenSource, SESSION_KEY};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
