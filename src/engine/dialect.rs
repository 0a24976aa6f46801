//! Standard attribute processors (`th:*`) and inline text expressions

use std::borrow::Cow;

use serde_json::Value;

use crate::error::RenderError;
use crate::expr::{display, evaluate_ref, parse_expression, parse_iteration, truthy, Scope};
use crate::markup::{Element, Fragment, Node};

use super::nested::NARRATIVE_ATTRIBUTE;
use super::TemplateEngine;

const PREFIX: &str = "th:";
const NAMESPACE_DECLARATION: &str = "xmlns:th";
const BLOCK: &str = "th:block";

const EACH: &str = "th:each";
const IF: &str = "th:if";
const UNLESS: &str = "th:unless";
const REMOVE: &str = "th:remove";
const TEXT: &str = "th:text";
const UTEXT: &str = "th:utext";

/// What `th:remove` keeps of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    None,
    All,
    Body,
    Tag,
}

impl Removal {
    fn parse(value: &str) -> Result<Self, RenderError> {
        match value.trim() {
            "none" => Ok(Removal::None),
            "all" => Ok(Removal::All),
            "body" => Ok(Removal::Body),
            "tag" => Ok(Removal::Tag),
            other => Err(RenderError::InvalidAttribute {
                attribute: REMOVE.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Parse and evaluate an expression taken from template source
fn eval_source<'a>(source: &str, scope: &Scope<'a>) -> Result<Cow<'a, Value>, RenderError> {
    let expr = parse_expression(source).map_err(|errors| RenderError::expression(source, errors))?;
    Ok(evaluate_ref(&expr, scope)?)
}

impl TemplateEngine {
    pub(crate) fn process_nodes(
        &self,
        nodes: Vec<Node>,
        scope: &Scope<'_>,
    ) -> Result<Vec<Node>, RenderError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Text(text) => out.push(Node::Text(inline_text(&text, scope)?)),
                Node::Element(element) => self.process_element(element, scope, &mut out)?,
            }
        }
        Ok(out)
    }

    fn process_element(
        &self,
        mut element: Element,
        scope: &Scope<'_>,
        out: &mut Vec<Node>,
    ) -> Result<(), RenderError> {
        // Iteration runs first; every copy is processed with the item bound
        if let Some(header) = element.remove_attribute(EACH) {
            let iteration =
                parse_iteration(&header).map_err(|errors| RenderError::expression(&header, errors))?;
            let source = evaluate_ref(&iteration.source, scope)?;
            let items: &[Value] = match &*source {
                Value::Array(items) => items.as_slice(),
                Value::Null => &[],
                single => std::slice::from_ref(single),
            };
            for item in items {
                let item_scope = scope.child(&iteration.variable, item);
                self.process_element(element.clone(), &item_scope, out)?;
            }
            return Ok(());
        }

        if let Some(condition) = element.remove_attribute(IF) {
            if !truthy(&*eval_source(&condition, scope)?) {
                return Ok(());
            }
        }
        if let Some(condition) = element.remove_attribute(UNLESS) {
            if truthy(&*eval_source(&condition, scope)?) {
                return Ok(());
            }
        }

        let removal = match element.remove_attribute(REMOVE) {
            Some(value) => Removal::parse(&value)?,
            None => Removal::None,
        };
        if removal == Removal::All {
            return Ok(());
        }

        let mut children_final = false;
        if let Some(visitor) = self.visitors.iter().find(|v| v.matches(&element)) {
            let fragment = visitor.apply(&element, scope)?;
            element.remove_attribute(visitor.attribute());
            element.children = fragment.nodes;
            children_final = true;
        } else if element.has_attribute(NARRATIVE_ATTRIBUTE) {
            // Data type templates render without the nested processor
            return Err(RenderError::UnhandledAttribute {
                attribute: NARRATIVE_ATTRIBUTE.to_string(),
            });
        }

        let text = element.remove_attribute(TEXT);
        let utext = element.remove_attribute(UTEXT);
        if !children_final {
            if let Some(source) = text {
                let value = eval_source(&source, scope)?;
                element.children = vec![Node::Text(display(&value))];
                children_final = true;
            } else if let Some(source) = utext {
                let value = eval_source(&source, scope)?;
                element.children = Fragment::parse(&display(&value))?.nodes;
                children_final = true;
            }
        }

        self.process_attributes(&mut element, scope)?;

        if !children_final {
            let children = std::mem::take(&mut element.children);
            element.children = self.process_nodes(children, scope)?;
        }

        if element.name == BLOCK || removal == Removal::Tag {
            out.extend(element.children);
        } else {
            if removal == Removal::Body {
                element.children.clear();
            }
            out.push(Node::Element(element));
        }
        Ok(())
    }

    /// Evaluate remaining `th:<attr>` attributes into plain `<attr>` values
    fn process_attributes(&self, element: &mut Element, scope: &Scope<'_>) -> Result<(), RenderError> {
        element.remove_attribute(NAMESPACE_DECLARATION);

        let dynamic: Vec<(String, String)> = element
            .attributes
            .iter()
            .filter(|(name, _)| name.starts_with(PREFIX))
            .cloned()
            .collect();

        for (name, source) in dynamic {
            element.remove_attribute(&name);
            let target = &name[PREFIX.len()..];
            let value = eval_source(&source, scope)?;
            if value.is_null() {
                element.remove_attribute(target);
            } else {
                element.set_attribute(target, display(&value));
            }
        }
        Ok(())
    }
}

/// Replace every `[[expr]]` in a text node with the expression's display value
fn inline_text(text: &str, scope: &Scope<'_>) -> Result<String, RenderError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("[[") {
        let body = &rest[start + 2..];
        let Some(end) = inline_end(body) else {
            break;
        };
        out.push_str(&rest[..start]);
        let value = eval_source(&body[..end], scope)?;
        out.push_str(&display(&value));
        rest = &body[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Position of the `]]` closing an inline expression, skipping index brackets
fn inline_end(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' if depth > 0 => depth -= 1,
            b']' if bytes.get(i + 1) == Some(&b']') => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::engine::{RenderContext, TemplateEngine};
    use crate::error::RenderError;
    use crate::template::{Layer, RegistryResolver, TemplateRegistry};

    fn render(template: &str, record: serde_json::Value) -> Result<String, RenderError> {
        let engine = TemplateEngine::new(Arc::new(RegistryResolver::new(
            Arc::new(TemplateRegistry::new()),
            Layer::Profile,
        )));
        engine.render_source(template, &RenderContext::new(&record))
    }

    #[test]
    fn test_inline_with_index_brackets() {
        let out = render(
            "<p>[[resource.name[0]]] and [[resource.name[1]]]</p>",
            json!({"name": ["a", "b"]}),
        )
        .unwrap();
        assert_eq!(out, "<p>a and b</p>");
    }

    #[test]
    fn test_narrative_attribute_without_visitor_fails() {
        let err = render(
            r#"<div><span th:narrative="${resource.code}">x</span></div>"#,
            json!({"code": {"text": "a"}}),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RenderError::UnhandledAttribute { ref attribute } if attribute == "th:narrative"
        ));

        // Removed before any processing, so nothing is rejected
        let out = render(
            r#"<div><span th:if="${resource.none}" th:narrative="${resource.code}"/></div>"#,
            json!({}),
        )
        .unwrap();
        assert_eq!(out, "<div></div>");
    }

    #[test]
    fn test_unterminated_inline_is_literal() {
        let out = render("<p>[[resource.name</p>", json!({})).unwrap();
        assert_eq!(out, "<p>[[resource.name</p>");
    }

    #[test]
    fn test_inline_output_is_escaped() {
        let out = render("<p>[[resource.note]]</p>", json!({"note": "<b>x</b>"})).unwrap();
        assert_eq!(out, "<p>&lt;b&gt;x&lt;/b&gt;</p>");
    }

    #[test]
    fn test_each_repeats_element() {
        let out = render(
            r#"<ul><li th:each="n : ${resource.names}" th:text="${n}">x</li></ul>"#,
            json!({"names": ["a", "b", "c"]}),
        )
        .unwrap();
        assert_snapshot!(out, @"<ul><li>a</li><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn test_each_over_null_renders_nothing() {
        let out = render(
            r#"<ul><li th:each="n : ${resource.names}">[[n]]</li></ul>"#,
            json!({}),
        )
        .unwrap();
        assert_eq!(out, "<ul></ul>");
    }

    #[test]
    fn test_each_over_scalar_runs_once() {
        let out = render(
            r#"<p th:each="n : ${resource.name}">[[n]]</p>"#,
            json!({"name": "solo"}),
        )
        .unwrap();
        assert_eq!(out, "<p>solo</p>");
    }

    #[test]
    fn test_each_scope_reaches_outer_binding() {
        let out = render(
            r#"<p th:each="g : ${resource.given}">[[g]] [[resource.family]]</p>"#,
            json!({"given": ["Jane"], "family": "Doe"}),
        )
        .unwrap();
        assert_eq!(out, "<p>Jane Doe</p>");
    }

    #[test]
    fn test_if_and_unless() {
        let template = r#"<div><b th:if="${resource.active}">on</b><i th:unless="${resource.active}">off</i></div>"#;
        assert_eq!(
            render(template, json!({"active": true})).unwrap(),
            "<div><b>on</b></div>"
        );
        assert_eq!(
            render(template, json!({"active": false})).unwrap(),
            "<div><i>off</i></div>"
        );
    }

    #[test]
    fn test_text_replaces_children_and_utext_parses() {
        let out = render(
            r#"<div><span th:text="${resource.a}">placeholder</span><span th:utext="${resource.b}"></span></div>"#,
            json!({"a": "<x>", "b": "<em>y</em>"}),
        )
        .unwrap();
        assert_eq!(out, "<div><span>&lt;x&gt;</span><span><em>y</em></span></div>");
    }

    #[test]
    fn test_dynamic_attribute_and_namespace_removal() {
        let out = render(
            r#"<div xmlns:th="http://www.thymeleaf.org"><a th:href="${resource.url}" th:title="${resource.missing}" title="old">link</a></div>"#,
            json!({"url": "http://example.org/?a=1&b=2"}),
        )
        .unwrap();
        assert_eq!(out, r#"<div><a href="http://example.org/?a=1&amp;b=2">link</a></div>"#);
    }

    #[test]
    fn test_block_and_remove() {
        let out = render(
            r#"<div><th:block>[[resource.a]]</th:block><p th:remove="tag">t</p><p th:remove="body">b</p><p th:remove="all">gone</p></div>"#,
            json!({"a": "A"}),
        )
        .unwrap();
        assert_eq!(out, "<div>At<p></p></div>");
    }

    #[test]
    fn test_invalid_remove_value() {
        let err = render(r#"<p th:remove="some">x</p>"#, json!({})).unwrap_err();
        assert!(matches!(err, RenderError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_expression_syntax_error_propagates() {
        let err = render(r#"<p th:text="${resource.}">x</p>"#, json!({})).unwrap_err();
        assert!(matches!(err, RenderError::Expression { .. }));
    }

    #[test]
    fn test_removed_branch_is_not_evaluated() {
        // The failing expression sits inside an element whose condition is false
        let out = render(
            r#"<div><p th:if="${resource.flag}">[[resource.a.b.c]]</p></div>"#,
            json!({"flag": false}),
        )
        .unwrap();
        assert_eq!(out, "<div></div>");
    }
}
