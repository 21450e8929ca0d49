//! Typed configuration payloads
//!
//! A bundle maps a logical file name to one of two payload kinds:
//! - property sets, merged key by key
//! - flag lists, replaced as a whole

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NODE_PROPERTIES: &str = "node.properties";
pub const JVM_CONFIG: &str = "jvm.config";
pub const CONFIG_PROPERTIES: &str = "config.properties";

/// Files every validated bundle holds, in rendering order.
pub const REQUIRED_FILES: [&str; 3] = [NODE_PROPERTIES, JVM_CONFIG, CONFIG_PROPERTIES];

/// Key/value file. Keys are unique; insertion order is kept for output
/// but ignored by equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertySet {
    entries: Vec<(String, String)>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace in place, keeping the key's original position.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect()
    }
}

impl PartialEq for PropertySet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for PropertySet {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = PropertySet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Ordered flag file (`jvm.config`). Order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagList(Vec<String>);

impl FlagList {
    pub fn new(flags: Vec<String>) -> Self {
        Self(flags)
    }

    pub fn flags(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn render(&self) -> String {
        self.0.iter().map(|f| format!("{f}\n")).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for FlagList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "content")]
pub enum ConfigPayload {
    Properties(PropertySet),
    Flags(FlagList),
}

impl ConfigPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigPayload::Properties(_) => "property set",
            ConfigPayload::Flags(_) => "flag list",
        }
    }

    pub fn as_properties(&self) -> Option<&PropertySet> {
        match self {
            ConfigPayload::Properties(p) => Some(p),
            ConfigPayload::Flags(_) => None,
        }
    }

    pub fn as_flags(&self) -> Option<&FlagList> {
        match self {
            ConfigPayload::Flags(f) => Some(f),
            ConfigPayload::Properties(_) => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            ConfigPayload::Properties(p) => p.render(),
            ConfigPayload::Flags(f) => f.render(),
        }
    }
}

/// Per-host set of configuration files, keyed by logical file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigBundle {
    files: BTreeMap<String, ConfigPayload>,
}

impl ConfigBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file<S: Into<String>>(mut self, name: S, payload: ConfigPayload) -> Self {
        self.insert(name, payload);
        self
    }

    pub fn insert<S: Into<String>>(&mut self, name: S, payload: ConfigPayload) {
        self.files.insert(name.into(), payload);
    }

    pub fn get(&self, name: &str) -> Option<&ConfigPayload> {
        self.files.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ConfigPayload> {
        self.files.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn properties(&self, name: &str) -> Option<&PropertySet> {
        self.get(name).and_then(ConfigPayload::as_properties)
    }

    pub fn flags(&self, name: &str) -> Option<&FlagList> {
        self.get(name).and_then(ConfigPayload::as_flags)
    }

    /// `http-server.http.port` from `config.properties`, when set and numeric.
    pub fn http_port(&self) -> Option<u16> {
        self.properties(CONFIG_PROPERTIES)?
            .get("http-server.http.port")?
            .trim()
            .parse()
            .ok()
    }

    /// Per-file content for the file-writing side, required files first.
    pub fn render(&self) -> Vec<(String, String)> {
        let mut names: Vec<&str> = REQUIRED_FILES
            .iter()
            .copied()
            .filter(|n| self.contains(n))
            .collect();
        names.extend(self.file_names().filter(|n| !REQUIRED_FILES.contains(n)));

        names
            .into_iter()
            .filter_map(|n| self.get(n).map(|p| (n.to_string(), p.render())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_set_equality_ignores_order() {
        let a: PropertySet = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: PropertySet = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.render(), "x=1\ny=2\n");
        assert_eq!(b.render(), "y=2\nx=1\n");
    }

    #[test]
    fn test_property_insert_replaces_in_place() {
        let mut p: PropertySet = [("x", "1"), ("y", "2")].into_iter().collect();
        p.insert("x", "3");
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("x"), Some("3"));
        assert_eq!(p.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_flag_list_order_matters() {
        let a: FlagList = ["-server", "-Xmx2G"].into_iter().collect();
        let b: FlagList = ["-Xmx2G", "-server"].into_iter().collect();
        assert_ne!(a, b);
        assert_eq!(a.render(), "-server\n-Xmx2G\n");
    }

    #[test]
    fn test_bundle_render_order_and_port() {
        let bundle = ConfigBundle::new()
            .with_file(
                CONFIG_PROPERTIES,
                ConfigPayload::Properties(
                    [("http-server.http.port", "8090")].into_iter().collect(),
                ),
            )
            .with_file(JVM_CONFIG, ConfigPayload::Flags(["-server"].into_iter().collect()))
            .with_file(NODE_PROPERTIES, ConfigPayload::Properties(PropertySet::new()));

        let names: Vec<String> = bundle.render().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec![NODE_PROPERTIES, JVM_CONFIG, CONFIG_PROPERTIES]);
        assert_eq!(bundle.http_port(), Some(8090));
    }
}
