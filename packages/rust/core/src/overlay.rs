//! Configuration overlay applied to a concept database before packing.
//!
//! The policy is a declarative table of `(section, key, value)` entries
//! interpreted in declaration order. Each entry overwrites an existing
//! setting unconditionally; the overlay never creates sections or keys.
//!
//! There is no rollback: when an entry fails, every entry before it has
//! already been written and every entry after it is left untouched.

use tracing::{debug, instrument};

use modelpack_artifacts::{Configuration, SettingValue};
use modelpack_shared::{ModelPackError, Result};

/// Section holding named-entity-recognition settings.
pub const SECTION_NER: &str = "named-entity-recognition";
/// Section holding general settings.
pub const SECTION_GENERAL: &str = "general";
/// Section holding concept-linking settings.
pub const SECTION_LINKING: &str = "linking";

/// A constant-friendly setting value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
}

impl From<OverlayValue> for SettingValue {
    fn from(v: OverlayValue) -> Self {
        match v {
            OverlayValue::Bool(b) => SettingValue::Bool(b),
            OverlayValue::Integer(i) => SettingValue::Integer(i),
            OverlayValue::Float(f) => SettingValue::Float(f),
        }
    }
}

/// One overwrite: `config[section][key] = value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayEntry {
    pub section: &'static str,
    pub key: &'static str,
    pub value: OverlayValue,
}

impl OverlayEntry {
    pub const fn new(section: &'static str, key: &'static str, value: OverlayValue) -> Self {
        Self {
            section,
            key,
            value,
        }
    }
}

/// The settings every model pack is built with.
pub const DEFAULT_OVERLAY: &[OverlayEntry] = &[
    OverlayEntry::new(SECTION_NER, "minimum-name-length", OverlayValue::Integer(2)),
    OverlayEntry::new(SECTION_NER, "upper-case-limit-length", OverlayValue::Integer(3)),
    OverlayEntry::new(SECTION_GENERAL, "spell-check-enabled", OverlayValue::Bool(true)),
    OverlayEntry::new(SECTION_LINKING, "train-count-threshold", OverlayValue::Integer(10)),
    OverlayEntry::new(SECTION_LINKING, "similarity-threshold", OverlayValue::Float(0.3)),
    OverlayEntry::new(SECTION_LINKING, "train-enabled", OverlayValue::Bool(true)),
    OverlayEntry::new(SECTION_LINKING, "disambiguation-length-limit", OverlayValue::Integer(4)),
    OverlayEntry::new(SECTION_GENERAL, "full-unlink-enabled", OverlayValue::Bool(true)),
];

/// Interpreter over an ordered slice of [`OverlayEntry`].
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    entries: &'a [OverlayEntry],
}

impl Default for Overlay<'static> {
    fn default() -> Self {
        Self::default_policy()
    }
}

impl<'a> Overlay<'a> {
    pub const fn new(entries: &'a [OverlayEntry]) -> Self {
        Self { entries }
    }

    /// The built-in [`DEFAULT_OVERLAY`] policy.
    pub const fn default_policy() -> Overlay<'static> {
        Overlay::new(DEFAULT_OVERLAY)
    }

    pub fn entries(&self) -> &'a [OverlayEntry] {
        self.entries
    }

    /// Apply every entry to `config` in order, mutating it in place.
    ///
    /// Returns the same configuration that was passed in.
    #[instrument(skip_all, fields(entries = self.entries.len()))]
    pub fn apply<'c>(&self, config: &'c mut Configuration) -> Result<&'c mut Configuration> {
        for entry in self.entries {
            let section = config
                .section_mut(entry.section)
                .ok_or_else(|| ModelPackError::section_missing(entry.section))?;
            let slot = section
                .get_mut(entry.key)
                .ok_or_else(|| ModelPackError::key_missing(entry.section, entry.key))?;

            let value = SettingValue::from(entry.value);
            if *slot != value {
                debug!(
                    section = entry.section,
                    key = entry.key,
                    old = %slot,
                    new = %value,
                    "overriding setting"
                );
            }
            *slot = value;
        }
        Ok(config)
    }
}

/// Apply [`DEFAULT_OVERLAY`] to `config` in place.
pub fn apply_overlay(config: &mut Configuration) -> Result<&mut Configuration> {
    Overlay::default_policy().apply(config)
}
