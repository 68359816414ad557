use crate::config::GeocoderConfig;
use crate::providers::{Coordinates, Geocoder};
use crate::utils::http;
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;

/// OpenCage forward geocoding, restricted to one country.
pub struct OpenCageGeocoder {
    http: Client,
    base_url: String,
    api_key: String,
    country_code: String,
    limit: u8,
}

impl OpenCageGeocoder {
    pub fn from_config(cfg: &GeocoderConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());
        let Some(api_key) = api_key else {
            bail!("geocoding API key not configured (set OPENCAGE_API_KEY)");
        };

        Ok(Self {
            http: http::client()?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            country_code: cfg.country_code.clone(),
            limit: cfg.limit.max(1),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/geocode/v1/json", self.base_url)
    }
}

impl Geocoder for OpenCageGeocoder {
    fn forward(&self, place: &str) -> Result<Coordinates> {
        let url = self.endpoint();
        debug!("GET {url} q={place:?} countrycode={}", self.country_code);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", place),
                ("key", self.api_key.as_str()),
                ("countrycode", self.country_code.as_str()),
                ("limit", self.limit.to_string().as_str()),
            ])
            .send()
            .context("Geocoding service unavailable")?;

        check_status(response.status())?;

        let body: GeocodeResponse = response
            .json()
            .context("failed decoding geocoding response")?;
        first_match(body)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    #[serde(default)]
    formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

fn check_status(status: StatusCode) -> Result<()> {
    if !status.is_success() {
        warn!("geocoder answered {status}");
        bail!("Geocoding service unavailable");
    }
    Ok(())
}

fn first_match(body: GeocodeResponse) -> Result<Coordinates> {
    let Some(best) = body.results.into_iter().next() else {
        bail!("Location not found");
    };

    if let Some(formatted) = &best.formatted {
        debug!("geocoded to {formatted}");
    }
    Ok(Coordinates {
        latitude: best.geometry.lat,
        longitude: best.geometry.lng,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GeocodeResponse {
        serde_json::from_str(json).expect("valid geocode response")
    }

    #[test]
    fn takes_first_result_geometry() {
        let body = parse(
            r#"{"results":[
                {"formatted":"Pokhara, Nepal","geometry":{"lat":28.2096,"lng":83.9856}},
                {"formatted":"Elsewhere","geometry":{"lat":1.0,"lng":2.0}}
            ],"status":{"code":200,"message":"OK"}}"#,
        );
        assert_eq!(
            first_match(body).expect("match"),
            Coordinates {
                latitude: 28.2096,
                longitude: 83.9856
            }
        );
    }

    #[test]
    fn empty_results_mean_location_not_found() {
        let err = first_match(parse(r#"{"results":[]}"#)).expect_err("no match");
        assert_eq!(err.to_string(), "Location not found");

        let err = first_match(parse(r#"{"status":{"code":200}}"#)).expect_err("no match");
        assert_eq!(err.to_string(), "Location not found");
    }

    #[test]
    fn error_statuses_mean_service_unavailable() {
        assert!(check_status(StatusCode::OK).is_ok());
        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::PAYMENT_REQUIRED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = check_status(status).expect_err("error status");
            assert_eq!(err.to_string(), "Geocoding service unavailable");
        }
    }

    #[test]
    fn requires_api_key() {
        let err = OpenCageGeocoder::from_config(&GeocoderConfig::default())
            .err()
            .expect("missing key");
        assert!(err.to_string().contains("geocoding API key not configured"));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let cfg = GeocoderConfig {
            base_url: "https://geo.example/".to_string(),
            api_key: Some("k".to_string()),
            ..GeocoderConfig::default()
        };
        let geocoder = OpenCageGeocoder::from_config(&cfg).expect("geocoder builds");
        assert_eq!(geocoder.endpoint(), "https://geo.example/geocode/v1/json");
    }
}
