//! Template registry: profile and data type templates, fixed after construction

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::datatype::DataType;
use crate::error::ConfigError;

use super::loader::{BundledResources, DirectoryResources, ResourceLoader, BUNDLED_MANIFEST};
use super::manifest::Manifest;

/// Two-layer template mapping: profile -> template and data type -> template
#[derive(Debug, Default, Clone)]
pub struct TemplateRegistry {
    profiles: HashMap<String, String>,
    data_types: HashMap<String, String>,
}

impl TemplateRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a manifest, loading every referenced template
    ///
    /// Entries missing either half of a pair are skipped. Entries naming an
    /// unknown data type are logged and skipped. A template resource that cannot
    /// be loaded fails the build.
    pub fn build(manifest: &Manifest, loader: &dyn ResourceLoader) -> Result<Self, ConfigError> {
        let mut registry = Self::new();

        for (name, entry) in manifest.entries() {
            if entry.profile.is_some() {
                match entry.profile_pair() {
                    Some((profile, resource)) => {
                        let template = loader.load(resource)?;
                        registry.register_profile(profile, template)?;
                    }
                    None => debug!(entry = name, "skipping incomplete profile entry"),
                }
            }

            if let Some(class) = entry.dtclass.as_deref() {
                let data_type = match class.parse::<DataType>() {
                    Ok(data_type) => data_type,
                    Err(err) => {
                        warn!(entry = name, "{} identified in narrative manifest", err);
                        continue;
                    }
                };
                match entry.data_type_pair() {
                    Some((_, resource)) => {
                        let template = loader.load(resource)?;
                        registry.register_data_type(data_type, template)?;
                    }
                    None => debug!(entry = name, "skipping incomplete data type entry"),
                }
            }
        }

        debug!(
            profiles = registry.profiles.len(),
            data_types = registry.data_types.len(),
            "narrative template registry built"
        );
        Ok(registry)
    }

    /// Load a manifest by name through `loader` and build from it
    pub fn load(loader: &dyn ResourceLoader, manifest_name: &str) -> Result<Self, ConfigError> {
        let manifest = Manifest::load(loader, manifest_name)?;
        Self::build(&manifest, loader)
    }

    /// Registry built from the templates bundled with the crate
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::load(&BundledResources, BUNDLED_MANIFEST)
    }

    /// Registry built from a manifest file; template names resolve relative to its directory
    pub fn from_manifest_file(path: &Path) -> Result<Self, ConfigError> {
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::load(&DirectoryResources::new(root), &file_name)
    }

    /// Register a profile template
    pub fn register_profile(
        &mut self,
        profile: impl Into<String>,
        template: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let profile = profile.into();
        if self.profiles.contains_key(&profile) {
            return Err(ConfigError::Duplicate {
                kind: "profile",
                key: profile,
            });
        }
        self.profiles.insert(profile, template.into());
        Ok(())
    }

    /// Register a data type template under the data type's canonical name
    pub fn register_data_type(
        &mut self,
        data_type: DataType,
        template: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let key = data_type.canonical_name();
        if self.data_types.contains_key(key) {
            return Err(ConfigError::Duplicate {
                kind: "data type",
                key: key.to_string(),
            });
        }
        self.data_types.insert(key.to_string(), template.into());
        Ok(())
    }

    /// Template text for a profile
    pub fn profile_template(&self, profile: &str) -> Option<&str> {
        self.profiles.get(profile).map(String::as_str)
    }

    /// Template text for a canonical data type name
    pub fn data_type_template(&self, name: &str) -> Option<&str> {
        self.data_types.get(name).map(String::as_str)
    }

    pub fn contains_profile(&self, profile: &str) -> bool {
        self.profiles.contains_key(profile)
    }

    /// Registered profiles, sorted
    pub fn profiles(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered data type names, sorted
    pub fn data_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.data_types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::loader::MemoryResources;

    fn loader() -> MemoryResources {
        MemoryResources::new()
            .with("classpath:patient.html", "<div>[[resource.name]]</div>")
            .with("classpath:quantity.html", "<div>[[resource.value]]</div>")
            .with(
                "narratives.toml",
                r#"
patient.profile = "Patient"
patient.narrative = "classpath:patient.html"
quantity.dtclass = "Quantity"
quantity.dtnarrative = "classpath:quantity.html"
"#,
            )
    }

    #[test]
    fn test_build_registers_both_layers() {
        let registry = TemplateRegistry::load(&loader(), "narratives.toml").expect("Should build");
        assert_eq!(
            registry.profile_template("Patient"),
            Some("<div>[[resource.name]]</div>")
        );
        assert_eq!(
            registry.data_type_template("Quantity"),
            Some("<div>[[resource.value]]</div>")
        );
        assert_eq!(registry.profiles(), vec!["Patient"]);
        assert_eq!(registry.data_types(), vec!["Quantity"]);
    }

    #[test]
    fn test_lookup_absent_is_none() {
        let registry = TemplateRegistry::load(&loader(), "narratives.toml").expect("Should build");
        assert_eq!(registry.profile_template("Observation"), None);
        assert!(!registry.contains_profile("Observation"));
        assert_eq!(registry.data_type_template("HumanName"), None);
    }

    #[test]
    fn test_unknown_data_type_is_skipped() {
        let manifest = Manifest::parse(
            r#"
money.dtclass = "Money"
money.dtnarrative = "classpath:missing.html"
"#,
        )
        .expect("Should parse");
        // The missing template is never loaded because the entry is skipped first
        let registry = TemplateRegistry::build(&manifest, &loader()).expect("Should build");
        assert!(registry.data_types().is_empty());
    }

    #[test]
    fn test_missing_template_resource_is_fatal() {
        let manifest = Manifest::parse(
            r#"
patient.profile = "Patient"
patient.narrative = "classpath:nowhere.html"
"#,
        )
        .expect("Should parse");
        let err = TemplateRegistry::build(&manifest, &loader()).unwrap_err();
        assert!(matches!(err, ConfigError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let err = TemplateRegistry::load(&MemoryResources::new(), "narratives.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_duplicate_profile_rejected() {
        let manifest = Manifest::parse(
            r#"
a.profile = "Patient"
a.narrative = "classpath:patient.html"
b.profile = "Patient"
b.narrative = "classpath:patient.html"
"#,
        )
        .expect("Should parse");
        let err = TemplateRegistry::build(&manifest, &loader()).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { kind: "profile", .. }));
    }

    #[test]
    fn test_bundled_registry() {
        let registry = TemplateRegistry::bundled().expect("bundled manifest is valid");
        assert!(registry.contains_profile("http://hl7.org/fhir/profiles/Patient"));
        assert!(registry.data_type_template("Quantity").is_some());
        assert!(registry.data_type_template("CodeableConcept").is_some());
    }
}
