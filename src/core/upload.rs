use crate::core::reading::{Measurement, NewReading, Reading};
use crate::providers::{Geocoder, ReadingStore};
use crate::session::Session;
use anyhow::{Result, bail};
use log::info;

/// Validates, geocodes and stores one measurement on behalf of `session`'s user.
///
/// The measurement is validated here even when the caller already did, so a
/// bad form never reaches the geocoder or the store.
pub fn submit(
    store: &dyn ReadingStore,
    geocoder: &dyn Geocoder,
    session: Option<&Session>,
    measurement: &Measurement,
) -> Result<Reading> {
    let Some(session) = session else {
        bail!("Please sign in to upload data");
    };

    measurement.validate()?;

    let place = measurement.location.trim();
    let coordinates = geocoder.forward(place)?;
    info!(
        "geocoded {place:?} to {:.5}, {:.5}",
        coordinates.latitude, coordinates.longitude
    );

    let new = NewReading::from_measurement(
        measurement,
        session.user.id.as_str(),
        session.user.display_name(),
        coordinates.latitude,
        coordinates.longitude,
    );
    store.insert_reading(&new, session)
}
