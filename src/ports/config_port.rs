//! Configuration access port trait.

use crate::domain::scope::parse_list;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Comma-separated list, or `default` when the key is absent or empty.
    fn get_list(&self, section: &str, key: &str, default: &[&str]) -> Vec<String> {
        match self.get_string(section, key).map(|raw| parse_list(&raw)) {
            Some(items) if !items.is_empty() => items,
            _ => default.iter().map(|s| s.to_string()).collect(),
        }
    }
}
