//! FHIR Narrative - template-driven XHTML narratives for FHIR records
//!
//! This library selects a template by the record's profile, renders it against
//! the record, renders embedded data type values (marked with `th:narrative`)
//! through their own templates, and normalizes the result.
//!
//! # Example
//!
//! ```rust
//! use fhir_narrative::{NarrativeGenerator, NarrativeStatus};
//! use serde_json::json;
//!
//! let generator = NarrativeGenerator::bundled().unwrap();
//! let patient = json!({
//!     "resourceType": "Patient",
//!     "gender": "female",
//!     "name": [{"family": "Doe", "given": ["Jane"]}]
//! });
//!
//! let narrative = generator.generate(&patient).unwrap();
//! assert_eq!(narrative.status, NarrativeStatus::Generated);
//! assert!(narrative.div.as_str().contains("<b>Jane Doe</b>"));
//! ```

pub mod config;
pub mod datatype;
pub mod engine;
pub mod error;
pub mod expr;
pub mod generator;
pub mod markup;
pub mod narrative;
pub mod record;
pub mod template;

pub use config::GeneratorConfig;
pub use datatype::DataType;
pub use engine::{ElementVisitor, NestedNarrativeVisitor, RenderContext, TemplateEngine};
pub use error::{ConfigError, EvalError, ExpressionError, NarrativeError, RenderError};
pub use generator::{normalize_whitespace, NarrativeGenerator};
pub use narrative::{Narrative, NarrativeStatus, Xhtml, NO_NARRATIVE};
pub use record::profile_of;
pub use template::{
    BundledResources, DirectoryResources, Manifest, MemoryResources, ResourceLoader,
    TemplateRegistry, TemplateResolver,
};

/// Generate a narrative for `record` with the bundled templates and default policy
///
/// # Example
///
/// ```rust
/// use fhir_narrative::{generate, NO_NARRATIVE};
/// use serde_json::json;
///
/// let narrative = generate(&json!({"resourceType": "Basic"})).unwrap();
/// assert_eq!(narrative.div.as_str(), NO_NARRATIVE);
/// ```
pub fn generate(record: &serde_json::Value) -> Result<Narrative, GenerateError> {
    let generator = NarrativeGenerator::bundled()?;
    Ok(generator.generate(record)?)
}

/// Errors from the one-shot [`generate`] entry point
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Narrative(#[from] NarrativeError),
}
