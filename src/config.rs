use crate::utils::fs as fs_utils;
use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "nephranet.toml";
pub const DOTENV_FILES: [&str; 2] = [".env", ".env.local"];

const STORE_URL_KEYS: [&str; 2] = ["SUPABASE_URL", "VITE_SUPABASE_URL"];
const STORE_KEY_KEYS: [&str; 2] = ["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"];
const GEOCODER_KEY_KEYS: [&str; 2] = ["OPENCAGE_API_KEY", "VITE_OPENCAGE_API_KEY"];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub geocoder: GeocoderConfig,
    pub map: MapConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            table: "wqi_uploads".to_string(),
        }
    }
}

impl StoreConfig {
    /// Project URL and anon key, both required before any remote call.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (non_empty(&self.url), non_empty(&self.anon_key)) {
            (Some(url), Some(key)) => Ok((url.trim_end_matches('/'), key)),
            _ => bail!(
                "Missing Supabase environment variables (set SUPABASE_URL and SUPABASE_ANON_KEY or [store] in {})",
                CONFIG_FILE_NAME
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub session_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub country_code: String,
    pub limit: u8,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.opencagedata.com".to_string(),
            api_key: None,
            country_code: "np".to_string(),
            limit: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_latitude: 27.7172,
            center_longitude: 85.324,
            zoom: 8,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
                .to_string(),
        }
    }
}

pub fn load_config(cli_config_path: Option<&Path>, cwd: &Path) -> Result<LoadedConfig> {
    let mut loaded = read_layered(cli_config_path, cwd)?;

    let dotenv = fs_utils::read_dotenv_files(cwd, &DOTENV_FILES);
    apply_overrides(&mut loaded.config, |key| {
        std::env::var(key)
            .ok()
            .or_else(|| dotenv.get(key).cloned())
    });

    Ok(loaded)
}

fn read_layered(cli_config_path: Option<&Path>, cwd: &Path) -> Result<LoadedConfig> {
    if let Some(path) = cli_config_path {
        if !path.exists() {
            bail!(
                "config file not found at {} (passed with --config)",
                path.display()
            );
        }

        return Ok(LoadedConfig {
            config: read_config(path)?,
            source: Some(path.to_path_buf()),
        });
    }

    let local_path = cwd.join(CONFIG_FILE_NAME);
    if local_path.exists() {
        return Ok(LoadedConfig {
            config: read_config(&local_path)?,
            source: Some(local_path),
        });
    }

    Ok(LoadedConfig {
        config: Config::default(),
        source: None,
    })
}

/// Environment and dotenv values take precedence over the config file.
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let first = |keys: &[&str]| {
        keys.iter().find_map(|key| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .inspect(|_| debug!("using {key} from environment"))
        })
    };

    if let Some(url) = first(&STORE_URL_KEYS) {
        config.store.url = Some(url);
    }
    if let Some(key) = first(&STORE_KEY_KEYS) {
        config.store.anon_key = Some(key);
    }
    if let Some(key) = first(&GEOCODER_KEY_KEYS) {
        config.geocoder.api_key = Some(key);
    }
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!(
            "refusing to overwrite existing config file: {}",
            path.display()
        );
    }

    let content = default_config_toml()?;
    fs::write(path, content).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}

pub fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&Config::default()).context("failed to serialize default config")
}

fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed reading config file {}", path.display()))?;
    let config = toml::from_str::<Config>(&content)
        .with_context(|| format!("failed parsing config file {}", path.display()))?;
    Ok(config)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let rendered = default_config_toml().expect("default config serializes");
        let parsed: Config = toml::from_str(&rendered).expect("default config parses");
        assert_eq!(parsed.store.table, "wqi_uploads");
        assert_eq!(parsed.geocoder.country_code, "np");
        assert_eq!(parsed.geocoder.limit, 1);
        assert_eq!(parsed.map.zoom, 8);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[store]\nurl = \"https://demo.supabase.co\"\n\n[map]\nzoom = 11\n",
        )
        .expect("write config");

        let loaded = read_layered(None, dir.path()).expect("config loads");
        assert_eq!(loaded.config.store.url.as_deref(), Some("https://demo.supabase.co"));
        assert_eq!(loaded.config.store.table, "wqi_uploads");
        assert_eq!(loaded.config.map.zoom, 11);
        assert_eq!(loaded.config.map.center_latitude, 27.7172);
        assert!(loaded.source.is_some());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let err = read_layered(Some(&missing), dir.path()).expect_err("missing file fails");
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn refuses_to_overwrite_existing_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        write_default_config(&path).expect("first write succeeds");
        assert!(write_default_config(&path).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = Config::default();
        config.store.url = Some("https://file.supabase.co".to_string());

        apply_overrides(
            &mut config,
            lookup_from(&[
                ("VITE_SUPABASE_URL", "https://vite.supabase.co"),
                ("SUPABASE_ANON_KEY", "anon"),
                ("VITE_OPENCAGE_API_KEY", "geo"),
                ("OPENCAGE_API_KEY", "  "),
            ]),
        );

        assert_eq!(config.store.url.as_deref(), Some("https://vite.supabase.co"));
        assert_eq!(config.store.anon_key.as_deref(), Some("anon"));
        assert_eq!(config.geocoder.api_key.as_deref(), Some("geo"));
    }

    #[test]
    fn unprefixed_keys_win_over_vite_keys() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("SUPABASE_URL", "https://plain.supabase.co"),
                ("VITE_SUPABASE_URL", "https://vite.supabase.co"),
            ]),
        );
        assert_eq!(config.store.url.as_deref(), Some("https://plain.supabase.co"));
    }

    #[test]
    fn credentials_require_url_and_key() {
        let mut store = StoreConfig::default();
        assert!(store.credentials().is_err());

        store.url = Some("https://demo.supabase.co/".to_string());
        store.anon_key = Some("anon".to_string());
        let (url, key) = store.credentials().expect("credentials present");
        assert_eq!(url, "https://demo.supabase.co");
        assert_eq!(key, "anon");
    }
}
