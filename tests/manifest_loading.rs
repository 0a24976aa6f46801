//! Integration tests for loading manifests and templates from disk

use std::fs;
use std::path::PathBuf;

use fhir_narrative::{ConfigError, NarrativeGenerator, NarrativeStatus, TemplateRegistry};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Scratch directory removed on drop
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "fhir-narrative-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(path.join("templates")).expect("Should create scratch dir");
        Self(path)
    }

    fn write(&self, name: &str, content: &str) {
        fs::write(self.0.join(name), content).expect("Should write file");
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[test]
fn test_manifest_from_directory() {
    let dir = ScratchDir::new("manifest");
    dir.write(
        "narratives.toml",
        r#"
practitioner.profile = "http://hl7.org/fhir/profiles/Practitioner"
practitioner.narrative = "templates/practitioner.html"

period.dtclass = "Period"
period.dtnarrative = "classpath:templates/period.html"
"#,
    );
    dir.write(
        "templates/practitioner.html",
        r#"<div><p th:narrative="${resource.period}"/></div>"#,
    );
    dir.write(
        "templates/period.html",
        "<div>[[resource.start]] to [[${resource.end} ?: 'now']]</div>",
    );

    let generator = NarrativeGenerator::from_manifest_file(&dir.0.join("narratives.toml"))
        .expect("Should load manifest");
    assert_eq!(
        generator.registry().profiles(),
        vec!["http://hl7.org/fhir/profiles/Practitioner"]
    );
    assert_eq!(generator.registry().data_types(), vec!["Period"]);

    let record = json!({"resourceType": "Practitioner", "period": {"start": "2001"}});
    let narrative = generator.generate(&record).unwrap();
    assert_eq!(narrative.status, NarrativeStatus::Generated);
    assert_eq!(narrative.div.as_str(), "<div><p>2001 to now</p></div>");
}

#[test]
fn test_missing_manifest_is_fatal() {
    let dir = ScratchDir::new("no-manifest");
    let err = TemplateRegistry::from_manifest_file(&dir.0.join("narratives.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ResourceNotFound { .. }));
}

#[test]
fn test_missing_template_file_is_fatal() {
    let dir = ScratchDir::new("missing-template");
    dir.write(
        "narratives.toml",
        r#"
patient.profile = "Patient"
patient.narrative = "templates/absent.html"
"#,
    );
    let err = TemplateRegistry::from_manifest_file(&dir.0.join("narratives.toml")).unwrap_err();
    assert!(err.to_string().contains("absent.html"));
}

#[test]
fn test_invalid_manifest() {
    let dir = ScratchDir::new("invalid");
    dir.write("narratives.toml", "patient.profile = ");
    let err = TemplateRegistry::from_manifest_file(&dir.0.join("narratives.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Manifest(_)));
}

#[test]
fn test_unknown_data_type_entry_is_skipped() {
    let dir = ScratchDir::new("unknown-dt");
    dir.write(
        "narratives.toml",
        r#"
money.dtclass = "Money"
money.dtnarrative = "templates/money.html"

quantity.dtclass = "Quantity"
quantity.dtnarrative = "templates/quantity.html"
"#,
    );
    dir.write("templates/quantity.html", "<div>[[resource.value]]</div>");
    let registry = TemplateRegistry::from_manifest_file(&dir.0.join("narratives.toml"))
        .expect("Unknown data types are not fatal");
    assert_eq!(registry.data_types(), vec!["Quantity"]);
}
