//! Nested narrative visitor: render embedded data type values in place

use tracing::warn;

use crate::datatype::DataType;
use crate::error::RenderError;
use crate::expr::{evaluate_ref, parse_expression, Scope};
use crate::markup::{Element, Fragment};

use super::visitor::ElementVisitor;
use super::{RenderContext, TemplateEngine};

/// Attribute marking an element whose content is an embedded value's narrative
pub const NARRATIVE_ATTRIBUTE: &str = "th:narrative";

/// Renders the value named by `th:narrative` with its data type template
///
/// The data type template's single root element is discarded; its children
/// become the children of the host element.
#[derive(Debug, Clone)]
pub struct NestedNarrativeVisitor {
    datatype_engine: TemplateEngine,
}

impl NestedNarrativeVisitor {
    /// `datatype_engine` must resolve templates by canonical data type name
    pub fn new(datatype_engine: TemplateEngine) -> Self {
        Self { datatype_engine }
    }
}

impl ElementVisitor for NestedNarrativeVisitor {
    fn attribute(&self) -> &str {
        NARRATIVE_ATTRIBUTE
    }

    fn apply(&self, element: &Element, scope: &Scope<'_>) -> Result<Fragment, RenderError> {
        let source = element.attribute(NARRATIVE_ATTRIBUTE).unwrap_or_default();
        let expr =
            parse_expression(source).map_err(|errors| RenderError::expression(source, errors))?;
        let value = evaluate_ref(&expr, scope)?;
        if value.is_null() {
            return Ok(Fragment::default());
        }

        let data_type = DataType::infer(expr.last_segment(), &value).ok_or_else(|| {
            warn!(expression = source, "unable to determine data type of embedded value");
            RenderError::UnknownDataType {
                expression: source.to_string(),
            }
        })?;

        let rendered = self
            .datatype_engine
            .render(data_type.canonical_name(), &RenderContext::new(&value))?;
        match Fragment::parse(&rendered)?.into_first_element() {
            Some(root) => Ok(Fragment::new(root.children)),
            None => {
                warn!(
                    data_type = %data_type,
                    "data type narrative produced no element, leaving host empty"
                );
                Ok(Fragment::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::template::{Layer, RegistryResolver, TemplateRegistry};

    fn profile_engine(profile_template: &str) -> TemplateEngine {
        let mut registry = TemplateRegistry::new();
        registry.register_profile("Obs", profile_template).unwrap();
        registry
            .register_data_type(
                DataType::Quantity,
                "<div>[[resource.value]] [[resource.unit]]</div>",
            )
            .unwrap();
        registry
            .register_data_type(
                DataType::CodeableConcept,
                "<div><span>[[resource.text]]</span></div>",
            )
            .unwrap();
        let registry = Arc::new(registry);
        let datatype_engine = TemplateEngine::new(Arc::new(RegistryResolver::new(
            registry.clone(),
            Layer::DataType,
        )));
        TemplateEngine::new(Arc::new(RegistryResolver::new(registry, Layer::Profile)))
            .with_visitor(NestedNarrativeVisitor::new(datatype_engine))
    }

    #[test]
    fn test_children_are_spliced_not_wrapped() {
        let record = json!({"valueQuantity": {"value": 5.2, "unit": "mmol/L"}});
        let out = profile_engine(r#"<td th:narrative="${resource.valueQuantity}">x</td>"#)
            .render("Obs", &RenderContext::new(&record))
            .unwrap();
        assert_eq!(out, "<td>5.2 mmol/L</td>");
    }

    #[test]
    fn test_siblings_render_independently() {
        let record = json!({
            "code": {"text": "Glucose", "coding": []},
            "valueQuantity": {"value": 6, "unit": "mmol/L"}
        });
        let out = profile_engine(
            r#"<tr><td th:narrative="${resource.code}"/><td th:narrative="${resource.valueQuantity}"/></tr>"#,
        )
        .render("Obs", &RenderContext::new(&record))
        .unwrap();
        assert_eq!(
            out,
            "<tr><td><span>Glucose</span></td><td>6 mmol/L</td></tr>"
        );
    }

    #[test]
    fn test_null_value_leaves_host_empty() {
        let out = profile_engine(r#"<td th:narrative="${resource.valueQuantity}">x</td>"#)
            .render("Obs", &RenderContext::new(&json!({})))
            .unwrap();
        assert_eq!(out, "<td></td>");
    }

    #[test]
    fn test_missing_data_type_template_leaves_host_empty() {
        let record = json!({"period": {"start": "2020"}});
        let out = profile_engine(r#"<td class="p" th:narrative="${resource.period}"/>"#)
            .render("Obs", &RenderContext::new(&record))
            .unwrap();
        assert_eq!(out, r#"<td class="p"></td>"#);
    }

    #[test]
    fn test_unknown_data_type_is_an_error() {
        let record = json!({"extra": {"foo": "bar"}});
        let err = profile_engine(r#"<td th:narrative="${resource.extra}"/>"#)
            .render("Obs", &RenderContext::new(&record))
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownDataType { .. }));
    }

    #[test]
    fn test_data_type_template_cannot_nest() {
        let mut registry = TemplateRegistry::new();
        registry
            .register_profile("Obs", r#"<td th:narrative="${resource.effectivePeriod}"/>"#)
            .unwrap();
        registry
            .register_data_type(
                DataType::Period,
                r#"<div><span th:narrative="${resource.start}"/></div>"#,
            )
            .unwrap();
        let registry = Arc::new(registry);
        let datatype_engine = TemplateEngine::new(Arc::new(RegistryResolver::new(
            registry.clone(),
            Layer::DataType,
        )));
        let engine = TemplateEngine::new(Arc::new(RegistryResolver::new(registry, Layer::Profile)))
            .with_visitor(NestedNarrativeVisitor::new(datatype_engine));

        let record = json!({"effectivePeriod": {"start": "2020"}});
        let err = engine
            .render("Obs", &RenderContext::new(&record))
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnhandledAttribute { ref attribute } if attribute == NARRATIVE_ATTRIBUTE
        ));
    }

    #[test]
    fn test_nested_content_is_not_reprocessed() {
        // The embedded text looks like an inline expression but is data
        let record = json!({"code": {"text": "[[resource.secret]]", "coding": []}, "secret": "no"});
        let out = profile_engine(r#"<p th:narrative="${resource.code}"/>"#)
            .render("Obs", &RenderContext::new(&record))
            .unwrap();
        assert_eq!(out, "<p><span>[[resource.secret]]</span></p>");
    }
}
