//! XHTML fragments: parsing templates and writing rendered output

pub mod dom;
pub mod writer;

pub use dom::{Element, Fragment, Node};
pub use writer::{to_markup, MarkupWriter};
