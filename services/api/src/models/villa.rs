//! Villa models for the API service

use chrono::{DateTime, Utc};
use common::DateRange;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Villa with its aggregate rating
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Villa {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub price_per_night: f64,
    pub image_urls: Vec<String>,
    pub average_rating: f64,
    pub total_ratings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a villa
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVilla {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub address: String,
    pub price_per_night: f64,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVilla {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub price_per_night: Option<f64>,
    pub image_urls: Option<Vec<String>>,
}

/// Sort order for villa listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VillaSort {
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
    Rating,
}

/// Query parameters for villa listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VillaQuery {
    /// Keyword matched against name, address and description
    pub q: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: Option<VillaSort>,
}

/// Nights of a villa held by pending or confirmed bookings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillaAvailability {
    pub villa_id: Uuid,
    pub booked: Vec<DateRange>,
}
