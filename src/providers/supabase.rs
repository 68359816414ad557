//! Supabase REST (PostgREST) storage and GoTrue auth over a blocking HTTP client.

use crate::config::StoreConfig;
use crate::core::reading::{NewReading, Reading};
use crate::providers::{AuthProvider, ReadingStore, SignUpOutcome};
use crate::session::{Session, User};
use crate::utils::http;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};

pub struct SupabaseClient {
    http: Client,
    url: String,
    anon_key: String,
    table: String,
}

impl SupabaseClient {
    pub fn from_config(cfg: &StoreConfig) -> Result<Self> {
        let (url, anon_key) = cfg.credentials()?;
        Ok(Self {
            http: http::client()?,
            url: url.to_string(),
            anon_key: anon_key.to_string(),
            table: cfg.table.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.url, endpoint)
    }

    /// Every request carries the project key; `bearer` is the user's token when signed in.
    fn with_keys(&self, request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(self.anon_key.as_str()))
    }

    fn token_grant(&self, grant_type: &str, body: Value, action: &str) -> Result<Session> {
        let url = self.auth_url("token");
        debug!("POST {url}?grant_type={grant_type}");
        let response = self
            .with_keys(self.http.post(&url), None)
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .with_context(|| format!("{action} request failed"))?;
        let token: TokenResponse = http::ensure_success(response, action)?
            .json()
            .with_context(|| format!("failed decoding {action} response"))?;
        Ok(token.into_session(Utc::now()))
    }
}

impl ReadingStore for SupabaseClient {
    fn list_readings(&self) -> Result<Vec<Reading>> {
        let url = self.table_url();
        debug!("GET {url}");
        let response = self
            .with_keys(self.http.get(&url), None)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .context("Failed to fetch readings")?;
        http::ensure_success(response, "fetching readings")?
            .json()
            .context("failed decoding readings")
    }

    fn insert_reading(&self, reading: &NewReading, session: &Session) -> Result<Reading> {
        let url = self.table_url();
        debug!("POST {url}");
        let response = self
            .with_keys(self.http.post(&url), Some(session.access_token.as_str()))
            .header("Prefer", "return=representation")
            .json(reading)
            .send()
            .context("Failed to upload data")?;
        let rows: Vec<Reading> = http::ensure_success(response, "uploading reading")?
            .json()
            .context("failed decoding inserted reading")?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("insert succeeded but the store returned no row"))
    }
}

impl AuthProvider for SupabaseClient {
    fn sign_up(&self, email: &str, password: &str, name: Option<&str>) -> Result<SignUpOutcome> {
        let url = self.auth_url("signup");
        debug!("POST {url}");
        let mut body = json!({ "email": email, "password": password });
        if let Some(name) = name {
            body["data"] = json!({ "name": name });
        }

        let response = self
            .with_keys(self.http.post(&url), None)
            .json(&body)
            .send()
            .context("sign up request failed")?;
        let value: Value = http::ensure_success(response, "sign up")?
            .json()
            .context("failed decoding sign up response")?;
        parse_sign_up(value, Utc::now())
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.token_grant(
            "password",
            json!({ "email": email, "password": password }),
            "sign in",
        )
    }

    fn refresh(&self, refresh_token: &str) -> Result<Session> {
        self.token_grant(
            "refresh_token",
            json!({ "refresh_token": refresh_token }),
            "session refresh",
        )
    }

    fn sign_out(&self, session: &Session) -> Result<()> {
        let url = self.auth_url("logout");
        debug!("POST {url}");
        let response = self
            .with_keys(self.http.post(&url), Some(session.access_token.as_str()))
            .send()
            .context("sign out request failed")?;
        http::ensure_success(response, "sign out")?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
            .or_else(|| self.expires_in.map(|seconds| now + Duration::seconds(seconds)));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<Value>,
}

impl From<AuthUser> for User {
    fn from(user: AuthUser) -> Self {
        let name = user
            .user_metadata
            .as_ref()
            .and_then(|metadata| metadata.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            id: user.id,
            email: user.email,
            name,
        }
    }
}

/// Sign-up answers with a token when auto-confirm is on, otherwise with the bare user.
fn parse_sign_up(value: Value, now: DateTime<Utc>) -> Result<SignUpOutcome> {
    if value.get("access_token").is_some() {
        let token: TokenResponse =
            serde_json::from_value(value).context("failed decoding sign up session")?;
        return Ok(SignUpOutcome::SignedIn(token.into_session(now)));
    }

    let user_value = value.get("user").cloned().unwrap_or(value);
    let user: AuthUser =
        serde_json::from_value(user_value).context("failed decoding signed up user")?;
    Ok(SignUpOutcome::ConfirmationRequired(user.into()))
}
