use crate::core::reading::{NewReading, Reading};
use crate::session::{Session, User};
use anyhow::Result;

pub mod opencage;
pub mod supabase;

/// The hosted readings table.
pub trait ReadingStore {
    /// Every reading, newest first.
    fn list_readings(&self) -> Result<Vec<Reading>>;
    fn insert_reading(&self, reading: &NewReading, session: &Session) -> Result<Reading>;
}

pub trait AuthProvider {
    fn sign_up(&self, email: &str, password: &str, name: Option<&str>) -> Result<SignUpOutcome>;
    fn sign_in(&self, email: &str, password: &str) -> Result<Session>;
    fn refresh(&self, refresh_token: &str) -> Result<Session>;
    fn sign_out(&self, session: &Session) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The account is usable immediately.
    SignedIn(Session),
    /// The provider sent a confirmation e-mail first.
    ConfirmationRequired(User),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

pub trait Geocoder {
    /// Best match for a free-text place name.
    fn forward(&self, place: &str) -> Result<Coordinates>;
}
