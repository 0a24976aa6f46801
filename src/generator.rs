//! Narrative generator: template selection, failure policy and output normalization

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::config::GeneratorConfig;
use crate::engine::{NestedNarrativeVisitor, RenderContext, TemplateEngine};
use crate::error::{ConfigError, NarrativeError, RenderError};
use crate::markup::{Fragment, Node};
use crate::narrative::Narrative;
use crate::record::profile_of;
use crate::template::{Layer, RegistryResolver, TemplateRegistry, TemplateResolver};

/// Generates narratives for records from a fixed template registry
///
/// The generator holds no per-call state; one instance can be shared across
/// threads and called concurrently.
#[derive(Debug, Clone)]
pub struct NarrativeGenerator {
    registry: Arc<TemplateRegistry>,
    profile_engine: TemplateEngine,
    config: GeneratorConfig,
}

impl NarrativeGenerator {
    /// Create a generator over `registry` with default failure handling
    pub fn new(registry: impl Into<Arc<TemplateRegistry>>) -> Self {
        let registry = registry.into();
        let datatype_engine = TemplateEngine::new(Arc::new(RegistryResolver::new(
            registry.clone(),
            Layer::DataType,
        )));
        let profile_engine = TemplateEngine::new(Arc::new(RegistryResolver::new(
            registry.clone(),
            Layer::Profile,
        )))
        .with_visitor(NestedNarrativeVisitor::new(datatype_engine));

        Self {
            registry,
            profile_engine,
            config: GeneratorConfig::default(),
        }
    }

    /// Generator over the templates bundled with the crate
    pub fn bundled() -> Result<Self, ConfigError> {
        Ok(Self::new(TemplateRegistry::bundled()?))
    }

    /// Generator over a manifest on disk
    pub fn from_manifest_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::new(TemplateRegistry::from_manifest_file(path)?))
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the resolver the profile engine reads templates from
    pub fn with_profile_resolver(mut self, resolver: Arc<dyn TemplateResolver>) -> Self {
        self.profile_engine = self.profile_engine.with_resolver(resolver);
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn config(&self) -> GeneratorConfig {
        self.config
    }

    pub fn ignore_failures(&self) -> bool {
        self.config.ignore_failures
    }

    pub fn set_ignore_failures(&mut self, ignore: bool) {
        self.config.ignore_failures = ignore;
    }

    pub fn ignore_missing_templates(&self) -> bool {
        self.config.ignore_missing_templates
    }

    pub fn set_ignore_missing_templates(&mut self, ignore: bool) {
        self.config.ignore_missing_templates = ignore;
    }

    /// Generate the narrative for `record` using the template of `profile`
    ///
    /// Returns the empty narrative for an unknown profile, for a template that
    /// renders nothing, or for a suppressed failure. Output that is not a single
    /// `<div>` element is a failure. An error is returned only when the matching
    /// policy is disabled.
    pub fn generate_narrative(
        &self,
        profile: &str,
        record: &Value,
    ) -> Result<Narrative, NarrativeError> {
        if !self.registry.contains_profile(profile) {
            if self.config.ignore_missing_templates {
                debug!(profile, "no narrative template for profile, returning empty narrative");
                return Ok(Narrative::empty());
            }
            return self.failure(
                profile,
                RenderError::MissingTemplate {
                    profile: profile.to_string(),
                },
            );
        }

        let narrative = self
            .profile_engine
            .render(profile, &RenderContext::new(record))
            .and_then(|markup| single_div(normalize_whitespace(&markup)));
        match narrative {
            Ok(Some(div)) => Ok(Narrative::generated(div)),
            Ok(None) => {
                debug!(profile, "template rendered nothing, returning empty narrative");
                Ok(Narrative::empty())
            }
            Err(err) => self.failure(profile, err),
        }
    }

    /// Generate using the profile the record declares
    pub fn generate(&self, record: &Value) -> Result<Narrative, NarrativeError> {
        let profile = profile_of(record).unwrap_or_default();
        self.generate_narrative(&profile, record)
    }

    /// Generate a narrative and store it under the record's `text` element
    pub fn populate(&self, record: &mut Value) -> Result<Narrative, NarrativeError> {
        let narrative = self.generate(record)?;
        if let Some(object) = record.as_object_mut() {
            object.insert("text".to_string(), narrative.to_json());
        }
        Ok(narrative)
    }

    fn failure(&self, profile: &str, err: RenderError) -> Result<Narrative, NarrativeError> {
        if self.config.ignore_failures {
            error!(profile, error = %err, "failed to generate narrative");
            return Ok(Narrative::empty());
        }
        Err(NarrativeError::Format {
            profile: profile.to_string(),
            source: err,
        })
    }
}

/// Extract the single `<div>` element of rendered markup
///
/// Whitespace-only text around the root is not part of the narrative. Markup
/// with no other nodes yields `None`.
fn single_div(markup: String) -> Result<Option<String>, RenderError> {
    let mut roots = Fragment::parse(&markup)?
        .nodes
        .into_iter()
        .filter(|node| match node {
            Node::Text(text) => !text.chars().all(is_markup_whitespace),
            Node::Element(_) => true,
        });
    let found = match (roots.next(), roots.next()) {
        (None, _) => return Ok(None),
        (Some(Node::Element(root)), None) if root.name == "div" => {
            return Ok(Some(Fragment::new(vec![Node::Element(root)]).to_markup()));
        }
        (Some(Node::Element(root)), None) => format!("<{}>", root.name),
        (Some(Node::Text(_)), None) => "text".to_string(),
        (Some(_), Some(_)) => format!("{} top-level nodes", 2 + roots.count()),
    };
    Err(RenderError::NotADiv { found })
}

/// Whitespace as matched by a `\s` regex class; no-break space is content
fn is_markup_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

/// Collapse whitespace runs, then drop spaces next to tag boundaries
///
/// Applied to the whole fragment, including text content.
pub fn normalize_whitespace(markup: &str) -> String {
    let mut collapsed = String::with_capacity(markup.len());
    let mut in_run = false;
    for c in markup.chars() {
        if is_markup_whitespace(c) {
            if !in_run {
                collapsed.push(' ');
            }
            in_run = true;
        } else {
            collapsed.push(c);
            in_run = false;
        }
    }

    collapsed.replace("> ", ">").replace(" <", "<")
}
