//! Template resolution by logical name, one resolver per registry layer

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use super::registry::TemplateRegistry;

/// Source of template text for an engine
///
/// Absence is not an error: resolvers hand back empty text for unknown names.
pub trait TemplateResolver: Send + Sync + fmt::Debug {
    fn resolve(&self, name: &str) -> &str;
}

/// Registry layer a resolver reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Profile,
    DataType,
}

/// Resolver backed by one layer of a shared registry
#[derive(Debug, Clone)]
pub struct RegistryResolver {
    registry: Arc<TemplateRegistry>,
    layer: Layer,
}

impl RegistryResolver {
    pub fn new(registry: Arc<TemplateRegistry>, layer: Layer) -> Self {
        Self { registry, layer }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }
}

impl TemplateResolver for RegistryResolver {
    fn resolve(&self, name: &str) -> &str {
        let found = match self.layer {
            Layer::Profile => self.registry.profile_template(name),
            Layer::DataType => self.registry.data_type_template(name),
        };

        match (found, self.layer) {
            (Some(template), _) => template,
            (None, Layer::Profile) => {
                info!(profile = name, "no narrative template for resource profile");
                ""
            }
            (None, Layer::DataType) => {
                warn!(data_type = name, "no narrative template registered for data type");
                ""
            }
        }
    }
}
