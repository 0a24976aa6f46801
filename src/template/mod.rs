//! Template storage and lookup
//!
//! A manifest names, for each profile and data type, the template resource that
//! renders it. The registry loads every referenced template once and is
//! read-only afterwards; resolvers expose one layer of it to an engine.
//!
//! # Example
//!
//! ```text
//! patient.profile = "http://hl7.org/fhir/profiles/Patient"
//! patient.narrative = "classpath:templates/patient.html"
//! ```

pub mod loader;
pub mod manifest;
mod registry;
mod resolver;

pub use loader::{BundledResources, DirectoryResources, MemoryResources, ResourceLoader};
pub use manifest::{Manifest, ManifestEntry};
pub use registry::TemplateRegistry;
pub use resolver::{Layer, RegistryResolver, TemplateResolver};
