//! Element visitor hook for extending template processing

use std::fmt;

use crate::error::RenderError;
use crate::expr::Scope;
use crate::markup::{Element, Fragment};

/// Extension invoked on elements carrying a trigger attribute
///
/// When a visitor matches, the engine removes the trigger attribute and
/// replaces the element's children with the returned fragment. The returned
/// nodes are final output and are not processed again.
pub trait ElementVisitor: Send + Sync + fmt::Debug {
    /// Attribute that triggers this visitor
    fn attribute(&self) -> &str;

    fn matches(&self, element: &Element) -> bool {
        element.has_attribute(self.attribute())
    }

    /// Produce the replacement children for `element`
    fn apply(&self, element: &Element, scope: &Scope<'_>) -> Result<Fragment, RenderError>;
}
