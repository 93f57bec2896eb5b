//! Environment variable loading helpers.
//!
//! Keeps the fallback chains in one place so engine code never repeats
//! `or_else` lookups.

use std::env;
use std::path::Path;
use std::str::FromStr;

/// Load `.env` from the current directory into the process environment.
/// Variables that are already set are never overridden. Runs once per process.
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let dir = env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
        load_dotenv_from_dir(&dir);
    });
}

/// Load `<dir>/.env` into the process environment without overriding existing variables.
/// Returns the number of variables that were set.
pub fn load_dotenv_from_dir(dir: &Path) -> usize {
    let Ok(content) = std::fs::read_to_string(dir.join(".env")) else {
        return 0;
    };
    let mut applied = 0;
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            env::set_var(&key, &value);
            applied += 1;
        }
    }
    applied
}

/// Parse `.env` text into key/value pairs. Blank lines and `#` comments are skipped;
/// surrounding quotes are stripped and unquoted inline comments removed.
pub(crate) fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let mut value = value.trim();
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Read the primary variable or the first set alias; fall back to `default`.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// Read the primary variable or an alias; empty values count as unset.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// Parse a boolean variable: 0/false/no/off are false, any other value is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    let v = env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()));
    match v.as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

/// Parse a variable with `FromStr`. Unparseable values are logged and ignored.
pub fn env_parse<T: FromStr>(primary: &str) -> Option<T> {
    let raw = env_optional(primary, &[])?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {}", primary, raw);
            None
        }
    }
}
