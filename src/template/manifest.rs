//! Narrative manifest: which template serves which profile or data type
//!
//! The manifest is TOML written with dotted keys, one logical entry per name:
//!
//! ```toml
//! patient.profile = "http://hl7.org/fhir/profiles/Patient"
//! patient.narrative = "classpath:templates/patient.html"
//!
//! quantity.dtclass = "Quantity"
//! quantity.dtnarrative = "classpath:templates/quantity.html"
//! ```

use std::collections::BTreeMap;

use toml::{Table, Value};
use tracing::{debug, warn};

use crate::error::ConfigError;

use super::loader::ResourceLoader;

/// One logical manifest entry; either half of each pair may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestEntry {
    pub profile: Option<String>,
    pub narrative: Option<String>,
    pub dtclass: Option<String>,
    pub dtnarrative: Option<String>,
}

impl ManifestEntry {
    /// Profile identifier and template resource, when both are present and non-blank
    pub fn profile_pair(&self) -> Option<(&str, &str)> {
        Some((non_blank(&self.profile)?, non_blank(&self.narrative)?))
    }

    /// Data type name and template resource, when both are present and non-blank
    pub fn data_type_pair(&self) -> Option<(&str, &str)> {
        Some((non_blank(&self.dtclass)?, non_blank(&self.dtnarrative)?))
    }

    /// Collect the string fields of one entry table, skipping anything else
    fn from_table(name: &str, fields: Table) -> Self {
        let mut entry = Self::default();
        for (field, value) in fields {
            let slot = match field.as_str() {
                "profile" => &mut entry.profile,
                "narrative" => &mut entry.narrative,
                "dtclass" => &mut entry.dtclass,
                "dtnarrative" => &mut entry.dtnarrative,
                _ => {
                    debug!(entry = name, field = %field, "ignoring unknown manifest field");
                    continue;
                }
            };
            match value {
                Value::String(text) => *slot = Some(text),
                other => warn!(
                    entry = name,
                    field = %field,
                    "ignoring manifest field of type {}, expected a string",
                    other.type_str()
                ),
            }
        }
        entry
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Parsed manifest, entries ordered by name
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Parse a manifest from TOML text
    ///
    /// Only text that is not TOML fails; keys that are not entry tables and
    /// fields that are not strings are skipped.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let table: Table = content.parse()?;
        let mut entries = BTreeMap::new();
        for (name, value) in table {
            match value {
                Value::Table(fields) => {
                    let entry = ManifestEntry::from_table(&name, fields);
                    entries.insert(name, entry);
                }
                other => debug!(
                    key = %name,
                    "ignoring manifest key of type {}, not an entry",
                    other.type_str()
                ),
            }
        }
        Ok(Self { entries })
    }

    /// Load and parse a manifest resource
    pub fn load(loader: &dyn ResourceLoader, name: &str) -> Result<Self, ConfigError> {
        Self::parse(&loader.load(name)?)
    }

    /// Entries with a non-blank name
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries
            .iter()
            .filter(|(name, _)| !name.trim().is_empty())
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
