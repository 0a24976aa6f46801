//! Template engine: resolve, parse, evaluate and serialize
//!
//! An engine owns one resolver and an ordered list of element visitors. It keeps
//! no state between renders, so a single instance can serve concurrent callers.

mod dialect;
pub mod nested;
pub mod visitor;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::RenderError;
use crate::expr::Scope;
use crate::markup::{self, Fragment};
use crate::template::TemplateResolver;

pub use nested::{NestedNarrativeVisitor, NARRATIVE_ATTRIBUTE};
pub use visitor::ElementVisitor;

/// Conventional name the rendered value is bound under
pub const RESOURCE_VARIABLE: &str = "resource";

/// Per-render binding of exactly one named value
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    variable: Cow<'a, str>,
    value: Cow<'a, Value>,
}

impl<'a> RenderContext<'a> {
    /// Bind a borrowed value as `resource`
    pub fn new(value: &'a Value) -> Self {
        Self {
            variable: Cow::Borrowed(RESOURCE_VARIABLE),
            value: Cow::Borrowed(value),
        }
    }

    /// Bind an owned value as `resource`
    pub fn owned(value: Value) -> RenderContext<'static> {
        RenderContext {
            variable: Cow::Borrowed(RESOURCE_VARIABLE),
            value: Cow::Owned(value),
        }
    }

    /// Use a different variable name for the binding
    pub fn with_variable(mut self, variable: impl Into<Cow<'a, str>>) -> Self {
        self.variable = variable.into();
        self
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn scope(&self) -> Scope<'_> {
        Scope::new(&self.variable, &self.value)
    }
}

/// Template engine bound to one resolver and one set of visitors
#[derive(Clone)]
pub struct TemplateEngine {
    resolver: Arc<dyn TemplateResolver>,
    visitors: Vec<Arc<dyn ElementVisitor>>,
}

impl fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("resolver", &self.resolver)
            .field("visitors", &self.visitors)
            .finish()
    }
}

impl TemplateEngine {
    /// Create an engine with no visitors
    pub fn new(resolver: Arc<dyn TemplateResolver>) -> Self {
        Self {
            resolver,
            visitors: Vec::new(),
        }
    }

    /// Append a visitor; visitors are tried in registration order
    pub fn with_visitor(mut self, visitor: impl ElementVisitor + 'static) -> Self {
        self.visitors.push(Arc::new(visitor));
        self
    }

    /// Same visitors, different resolver
    pub fn with_resolver(&self, resolver: Arc<dyn TemplateResolver>) -> Self {
        Self {
            resolver,
            visitors: self.visitors.clone(),
        }
    }

    pub fn visitors(&self) -> usize {
        self.visitors.len()
    }

    /// Render the template named `key` against `context`
    ///
    /// Errors propagate; failure policy belongs to the caller.
    pub fn render(&self, key: &str, context: &RenderContext<'_>) -> Result<String, RenderError> {
        let template = self.resolver.resolve(key);
        let fragment = Fragment::parse(template)?;
        let rendered = self.process_nodes(fragment.nodes, &context.scope())?;
        Ok(markup::to_markup(&rendered))
    }

    /// Render template text directly, bypassing the resolver
    pub fn render_source(
        &self,
        template: &str,
        context: &RenderContext<'_>,
    ) -> Result<String, RenderError> {
        let fragment = Fragment::parse(template)?;
        let rendered = self.process_nodes(fragment.nodes, &context.scope())?;
        Ok(markup::to_markup(&rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::DataType;
    use crate::template::{Layer, RegistryResolver, TemplateRegistry};
    use serde_json::json;

    fn engine(template: &str) -> TemplateEngine {
        let mut registry = TemplateRegistry::new();
        registry.register_profile("T", template).unwrap();
        TemplateEngine::new(Arc::new(RegistryResolver::new(
            Arc::new(registry),
            Layer::Profile,
        )))
    }

    #[test]
    fn test_render_inline_expression() {
        let record = json!({"name": "Jane Doe"});
        let out = engine("<div>[[resource.name]]</div>")
            .render("T", &RenderContext::new(&record))
            .unwrap();
        assert_eq!(out, "<div>Jane Doe</div>");
    }

    #[test]
    fn test_render_missing_template_is_empty() {
        let out = engine("<div/>")
            .render("Other", &RenderContext::new(&json!({})))
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_render_propagates_failures() {
        let err = engine("<div>[[resource.a.b]]</div>")
            .render("T", &RenderContext::new(&json!({})))
            .unwrap_err();
        assert!(matches!(err, RenderError::Eval(_)));
    }

    #[test]
    fn test_owned_binding() {
        let context = RenderContext::owned(json!({"unit": "kg"}));
        assert_eq!(context.variable(), RESOURCE_VARIABLE);
        let out = engine("<p>[[resource.unit]]</p>").render("T", &context).unwrap();
        assert_eq!(out, "<p>kg</p>");
    }

    #[test]
    fn test_custom_variable_name() {
        let value = json!(5);
        let context = RenderContext::new(&value).with_variable("dose");
        let out = engine("<p>[[dose]]</p>").render("T", &context).unwrap();
        assert_eq!(out, "<p>5</p>");
    }

    #[test]
    fn test_with_resolver_keeps_visitors() {
        let mut registry = TemplateRegistry::new();
        registry
            .register_data_type(DataType::Quantity, "<div/>")
            .unwrap();
        let registry = Arc::new(registry);
        let datatype_engine = TemplateEngine::new(Arc::new(RegistryResolver::new(
            registry.clone(),
            Layer::DataType,
        )));
        let profile_engine = engine("<div/>").with_visitor(NestedNarrativeVisitor::new(datatype_engine));
        let swapped = profile_engine.with_resolver(Arc::new(RegistryResolver::new(
            registry,
            Layer::Profile,
        )));
        assert_eq!(swapped.visitors(), 1);
    }
}
