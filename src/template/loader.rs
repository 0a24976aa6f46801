//! Resource loading for manifests and template files

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Prefix marking a resource bundled with the crate
pub const CLASSPATH_PREFIX: &str = "classpath:";

/// Name of the bundled manifest
pub const BUNDLED_MANIFEST: &str = "classpath:narratives.toml";

/// Source of named text resources
pub trait ResourceLoader {
    /// Load a resource fully into memory
    fn load(&self, name: &str) -> Result<String, ConfigError>;
}

/// Strip the `classpath:` scheme and any leading slash
fn normalize(name: &str) -> &str {
    name.strip_prefix(CLASSPATH_PREFIX)
        .unwrap_or(name)
        .trim_start_matches('/')
}

/// Resources compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledResources;

const BUNDLED: &[(&str, &str)] = &[
    ("narratives.toml", include_str!("../../resources/narratives.toml")),
    (
        "templates/patient.html",
        include_str!("../../resources/templates/patient.html"),
    ),
    (
        "templates/observation.html",
        include_str!("../../resources/templates/observation.html"),
    ),
    (
        "templates/quantity.html",
        include_str!("../../resources/templates/quantity.html"),
    ),
    (
        "templates/codeableconcept.html",
        include_str!("../../resources/templates/codeableconcept.html"),
    ),
    (
        "templates/humanname.html",
        include_str!("../../resources/templates/humanname.html"),
    ),
];

impl ResourceLoader for BundledResources {
    fn load(&self, name: &str) -> Result<String, ConfigError> {
        let wanted = normalize(name);
        BUNDLED
            .iter()
            .find(|(path, _)| *path == wanted)
            .map(|(_, content)| content.to_string())
            .ok_or_else(|| ConfigError::ResourceNotFound {
                name: name.to_string(),
            })
    }
}

/// Resources read from a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a resource name to a path under the root
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        self.root.join(normalize(name))
    }
}

impl ResourceLoader for DirectoryResources {
    fn load(&self, name: &str) -> Result<String, ConfigError> {
        let path = self.resolve_path(name);
        std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ConfigError::ResourceNotFound {
                name: name.to_string(),
            },
            _ => ConfigError::Io { path, source },
        })
    }
}

/// In-memory resources, keyed by normalized name
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    resources: HashMap<String, String>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    pub fn insert(&mut self, name: &str, content: impl Into<String>) {
        self.resources
            .insert(normalize(name).to_string(), content.into());
    }
}

impl ResourceLoader for MemoryResources {
    fn load(&self, name: &str) -> Result<String, ConfigError> {
        self.resources
            .get(normalize(name))
            .cloned()
            .ok_or_else(|| ConfigError::ResourceNotFound {
                name: name.to_string(),
            })
    }
}
