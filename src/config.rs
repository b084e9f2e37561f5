//! Layered configuration.
//!
//! Configuration is an explicit ordered merge of flat key=value layers,
//! last layer wins, applied once at startup into a single immutable
//! [`Config`]. A blank value in a later layer removes the key, which lets an
//! override file switch a compiled-in default off.

use std::collections::HashMap;

/// Compiled-in defaults, the first (lowest-precedence) layer.
pub const DEFAULT_PROPERTIES: &str = "\
cache-control.default=max-age=3600
cache-control.mime.text/html=no-cache
";

/// Optional per-collection configuration file name.
pub const CONTEXT_PARAM_FILE: &str = "context-param.properties";

/// Parses flat key=value property text, preserving order.
///
/// `#` and `!` lines are comments; the separator is the first `=` or `:`;
/// keys and values are trimmed. Lines without a separator are ignored.
pub fn parse_properties(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some(sep) = line.find(|c| c == '=' || c == ':') else { continue };
        let key = line[..sep].trim();
        let value = line[sep + 1..].trim();
        if key.is_empty() {
            continue;
        }
        pairs.push((key.to_string(), value.to_string()));
    }
    pairs
}

/// The frozen configuration value shared by all request handlers.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder { values: HashMap::new() }
    }

    /// A configuration built from the compiled-in defaults only.
    pub fn defaults() -> Config {
        Config::builder().layer(DEFAULT_PROPERTIES).build()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The cache-control value for a mime type: exact `cache-control.mime.<type>`,
    /// then the `<major>/*` wildcard, then `cache-control.default`.
    pub fn cache_control(&self, mime: &str) -> Option<&str> {
        if let Some(v) = self.get(&format!("cache-control.mime.{}", mime)) {
            return Some(v);
        }
        if let Some((major, _)) = mime.split_once('/') {
            if let Some(v) = self.get(&format!("cache-control.mime.{}/*", major)) {
                return Some(v);
            }
        }
        self.get("cache-control.default")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Accumulates layers in application order; built once, at startup.
pub struct ConfigBuilder {
    values: HashMap<String, String>,
}

impl ConfigBuilder {
    /// Applies one property layer. Later layers win; a blank value removes
    /// the key entirely.
    pub fn layer(mut self, text: &str) -> Self {
        for (key, value) in parse_properties(text) {
            if value.is_empty() {
                self.values.remove(&key);
            } else {
                self.values.insert(key, value);
            }
        }
        self
    }

    /// Sets a single value on top of whatever has been layered so far.
    pub fn set(mut self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn build(self) -> Config {
        Config { values: self.values }
    }
}
