use crate::config::AuthConfig;
use crate::providers::AuthProvider;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl User {
    /// Name shown next to a reading: metadata name, then the e-mail local part.
    pub fn display_name(&self) -> String {
        let from_metadata = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let from_email = self
            .email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty());

        from_metadata
            .or(from_email)
            .unwrap_or("Anonymous")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) <= now)
    }
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(cfg: &AuthConfig) -> Result<Self> {
        if let Some(path) = &cfg.session_file {
            return Ok(Self::new(path));
        }

        let Some(config_dir) = dirs::config_dir() else {
            bail!("no user config directory found; set [auth].session_file");
        };
        Ok(Self::new(config_dir.join("nephranet").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading session file {}", self.path.display()))?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("failed parsing session file {}", self.path.display()))?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(session).context("failed to serialize session")?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed writing session file {}", self.path.display()))?;
        restrict_permissions(&self.path)?;
        debug!("session saved to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("failed removing session file {}", self.path.display()))?;
        Ok(true)
    }

    /// Stored session, refreshed through `auth` when its access token has expired.
    pub fn active(&self, auth: &dyn AuthProvider) -> Result<Option<Session>> {
        let Some(session) = self.load()? else {
            return Ok(None);
        };

        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            warn!("stored session expired and has no refresh token");
            return Ok(None);
        };

        info!("refreshing expired session for {}", session.user.id);
        match auth.refresh(refresh_token) {
            Ok(refreshed) => {
                self.save(&refreshed)?;
                Ok(Some(refreshed))
            }
            Err(err) => {
                warn!("session refresh failed: {err:#}");
                Ok(None)
            }
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed restricting permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
