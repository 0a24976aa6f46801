//! Closed table of FHIR data types that can carry their own narrative template

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Data types with a registrable narrative template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Quantity,
    CodeableConcept,
    Coding,
    HumanName,
    Address,
    Identifier,
    Period,
    Reference,
}

impl DataType {
    /// Every data type, ordered so that longer names are tried before their suffixes
    pub const ALL: [DataType; 8] = [
        DataType::CodeableConcept,
        DataType::HumanName,
        DataType::Identifier,
        DataType::Reference,
        DataType::Quantity,
        DataType::Address,
        DataType::Period,
        DataType::Coding,
    ];

    /// Registry key for this data type
    pub fn canonical_name(self) -> &'static str {
        match self {
            DataType::Quantity => "Quantity",
            DataType::CodeableConcept => "CodeableConcept",
            DataType::Coding => "Coding",
            DataType::HumanName => "HumanName",
            DataType::Address => "Address",
            DataType::Identifier => "Identifier",
            DataType::Period => "Period",
            DataType::Reference => "Reference",
        }
    }

    /// Determine the data type of an embedded value
    ///
    /// The path hint wins when it carries a choice-type suffix (`valueQuantity`),
    /// otherwise the value's shape is matched against a fixed fingerprint table.
    pub fn infer(hint: Option<&str>, value: &Value) -> Option<DataType> {
        if let Some(hint) = hint {
            let from_hint = Self::ALL.into_iter().find(|dt| {
                let name = dt.canonical_name();
                hint.len() > name.len() && hint.ends_with(name)
            });
            if from_hint.is_some() {
                return from_hint;
            }
        }
        Self::from_shape(value)
    }

    fn from_shape(value: &Value) -> Option<DataType> {
        let object = value.as_object()?;
        let has = |key: &str| object.contains_key(key);

        if has("coding") {
            Some(DataType::CodeableConcept)
        } else if has("family") || has("given") {
            Some(DataType::HumanName)
        } else if has("line") || has("city") || has("postalCode") || has("country") {
            Some(DataType::Address)
        } else if object.get("value").is_some_and(Value::is_number) {
            Some(DataType::Quantity)
        } else if has("start") || has("end") {
            Some(DataType::Period)
        } else if has("reference") {
            Some(DataType::Reference)
        } else if has("system") && has("code") {
            Some(DataType::Coding)
        } else if has("system") && has("value") {
            Some(DataType::Identifier)
        } else {
            None
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Unrecognised data type name in a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDataType(pub String);

impl fmt::Display for UnknownDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown data type '{}'", self.0)
    }
}

impl std::error::Error for UnknownDataType {}

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|dt| dt.canonical_name() == name)
            .ok_or_else(|| UnknownDataType(name.to_string()))
    }
}
