//! HTML fragment handling for the editor: tokenizer, mutable arena DOM, fragment builder and
//! serializer.
pub mod debug;
pub mod dom;

mod dom_builder;
mod entities;
mod serialize;
mod tokenizer;
mod types;

pub use crate::dom::{Ancestors, Descendants, Dom, DomError, NodeData, NodeId};
pub use crate::dom_builder::{parse_fragment, parse_fragment_into};
pub use crate::serialize::{inner_html, outer_html};
pub use crate::tokenizer::{is_void_element, tokenize};
pub use crate::types::{AtomId, AtomTable, Token, TokenStream};
