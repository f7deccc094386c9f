//! Rating models for the API service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub villa_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub score: i64,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRating {
    pub villa_id: Uuid,
    pub score: i64,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRating {
    pub score: Option<i64>,
    pub feedback: Option<String>,
}
