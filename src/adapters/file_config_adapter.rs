//! INI file configuration adapter.

use crate::domain::error::BracketeerError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use std::str::FromStr;

/// `[section] key = value` lookups over one parsed INI document.
///
/// Section and key names are case-insensitive. A value that does not parse
/// as the requested type reads as absent, so the caller's default applies.
pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BracketeerError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path)
            .map_err(|reason| parse_error(&path.display().to_string(), reason))?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, BracketeerError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| parse_error("<string>", reason))?;
        Ok(Self { ini })
    }

    fn parsed<T: FromStr>(&self, section: &str, key: &str) -> Option<T> {
        self.ini.get(section, key)?.trim().parse().ok()
    }
}

fn parse_error(file: &str, reason: String) -> BracketeerError {
    BracketeerError::ConfigParse {
        file: file.to_string(),
        reason,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.parsed(section, key).unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.parsed(section, key).unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get(section, key)
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(default)
    }
}
