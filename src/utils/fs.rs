use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotenvEntry {
    pub key: String,
    pub value: String,
}

/// Merged key/value pairs from dotenv files under `dir`; later files win.
pub fn read_dotenv_files(dir: &Path, names: &[&str]) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for name in names {
        let path = dir.join(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => continue,
        };

        debug!("reading credentials from {}", path.display());
        for entry in parse_dotenv(&content) {
            vars.insert(entry.key, entry.value);
        }
    }

    vars
}

pub fn parse_dotenv(content: &str) -> Vec<DotenvEntry> {
    let mut entries = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }

        entries.push(DotenvEntry {
            key: key.to_string(),
            value: parse_value(value_raw.trim()),
        });
    }

    entries
}

fn parse_value(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }

    // Unquoted values may carry a trailing ` # comment`.
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}
