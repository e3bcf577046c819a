//! The configuration embedded in every concept database.
//!
//! A [`Configuration`] is a map of named sections, each mapping setting keys
//! to scalar values. On disk it is a plain JSON object of objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single scalar setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// One named group of settings (e.g. `linking`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section(BTreeMap<String, SettingValue>);

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut SettingValue> {
        self.0.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or replace a setting, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<SettingValue>,
    ) -> Option<SettingValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<SettingValue>> FromIterator<(K, V)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Named sections of settings owned by a concept database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<String, Section>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.0.get(name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.0.get_mut(name)
    }

    /// Add or replace a whole section.
    pub fn insert_section(&mut self, name: impl Into<String>, section: Section) {
        self.0.insert(name.into(), section);
    }

    pub fn remove_section(&mut self, name: &str) -> Option<Section> {
        self.0.remove(name)
    }

    /// Shorthand for `section(name)?.get(key)`.
    pub fn get(&self, section: &str, key: &str) -> Option<&SettingValue> {
        self.section(section)?.get(key)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_decode_to_narrowest_variant() {
        let section: Section =
            serde_json::from_str(r#"{"a": true, "b": 4, "c": 0.3, "d": "word"}"#).unwrap();
        assert_eq!(section.get("a"), Some(&SettingValue::Bool(true)));
        assert_eq!(section.get("b"), Some(&SettingValue::Integer(4)));
        assert_eq!(section.get("c"), Some(&SettingValue::Float(0.3)));
        assert_eq!(section.get("d"), Some(&SettingValue::Text("word".into())));
    }

    #[test]
    fn configuration_lookup() {
        let mut config = Configuration::new();
        config.insert_section("linking", [("train-enabled", false)].into_iter().collect());

        assert!(config.has_section("linking"));
        assert!(!config.has_section("general"));
        assert_eq!(
            config.get("linking", "train-enabled"),
            Some(&SettingValue::Bool(false))
        );
        assert_eq!(config.get("linking", "absent"), None);
        assert_eq!(config.get("general", "train-enabled"), None);
    }

    #[test]
    fn insert_returns_previous() {
        let mut section = Section::new();
        assert!(section.insert("minimum-name-length", 3_i64).is_none());
        let prev = section.insert("minimum-name-length", 2_i64);
        assert_eq!(prev, Some(SettingValue::Integer(3)));
        assert_eq!(section.len(), 1);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(SettingValue::Float(0.3).to_string(), "0.3");
        assert_eq!(SettingValue::Text("x".into()).to_string(), "\"x\"");
    }
}
