use crate::core::score::{self, Band};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PH_MIN: f64 = 0.0;
pub const PH_MAX: f64 = 14.0;

/// A stored row of the readings table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub id: i64,
    pub user_id: String,
    pub location: String,
    pub username: String,
    pub ph: f64,
    pub turbidity: f64,
    #[serde(default)]
    pub latitude: Option<f64>,
    // Older tables spell this column `latitute`. Migrated tables carry both.
    #[serde(default, rename = "latitute", skip_serializing)]
    pub legacy_latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Reading {
    pub fn wqi(&self) -> u8 {
        score::compute_wqi(self.ph, self.turbidity)
    }

    pub fn band(&self) -> Band {
        Band::for_score(self.wqi())
    }

    /// `(latitude, longitude)` when both are present and on the globe.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.or(self.legacy_latitude)?;
        let lng = self.longitude?;
        valid_coordinates(lat, lng).then_some((lat, lng))
    }
}

pub fn valid_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Location is required")]
    MissingLocation,
    #[error("pH must be between 0 and 14")]
    PhOutOfRange,
    #[error("Turbidity must be a positive number")]
    NegativeTurbidity,
}

/// What a user types into the upload form.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub location: String,
    pub ph: f64,
    pub turbidity: f64,
}

impl Measurement {
    pub fn new(location: impl Into<String>, ph: f64, turbidity: f64) -> Self {
        Self {
            location: location.into(),
            ph,
            turbidity,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.location.trim().is_empty() {
            return Err(ValidationError::MissingLocation);
        }
        // NaN fails `contains`, so it is rejected here too.
        if !(PH_MIN..=PH_MAX).contains(&self.ph) {
            return Err(ValidationError::PhOutOfRange);
        }
        if !(self.turbidity.is_finite() && self.turbidity >= 0.0) {
            return Err(ValidationError::NegativeTurbidity);
        }
        Ok(())
    }
}

/// Insert payload for the readings table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewReading {
    pub user_id: String,
    pub username: String,
    pub location: String,
    pub ph: f64,
    pub turbidity: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewReading {
    pub fn from_measurement(
        measurement: &Measurement,
        user_id: impl Into<String>,
        username: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            location: measurement.location.trim().to_string(),
            ph: measurement.ph,
            turbidity: measurement.turbidity,
            latitude,
            longitude,
        }
    }
}
