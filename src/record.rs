//! Helpers for records held as JSON

use serde_json::Value;

/// Base of the default profile URL derived from a resource type
pub const PROFILE_BASE: &str = "http://hl7.org/fhir/profiles/";

/// Profile a record declares, or the default profile of its resource type
pub fn profile_of(record: &Value) -> Option<String> {
    let declared = record
        .pointer("/meta/profile/0")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty());
    if let Some(profile) = declared {
        return Some(profile.to_string());
    }

    record
        .get("resourceType")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .map(|t| format!("{PROFILE_BASE}{t}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_profile_wins() {
        let record = json!({
            "resourceType": "Patient",
            "meta": {"profile": ["http://example.org/StructureDefinition/my-patient"]}
        });
        assert_eq!(
            profile_of(&record).as_deref(),
            Some("http://example.org/StructureDefinition/my-patient")
        );
    }

    #[test]
    fn test_default_profile_from_type() {
        let record = json!({"resourceType": "Observation"});
        assert_eq!(
            profile_of(&record).as_deref(),
            Some("http://hl7.org/fhir/profiles/Observation")
        );
    }

    #[test]
    fn test_no_profile() {
        assert_eq!(profile_of(&json!({"id": "1"})), None);
        assert_eq!(profile_of(&json!("text")), None);
    }
}
