//! # Tabula Paste
//!
//! Clipboard handling for tables.
//!
//! [`normalize`] turns parsed markup into a [`Fragment`] of lines tagged
//! with row-group and content ids, ready for the editor's paste mutation.
//! [`to_markup`] goes the other way for copy, wrapping tables in a
//! temporary marker so a round trip through the clipboard is not
//! normalized twice.

pub mod markup;
pub mod normalize;
pub mod serialize;

pub use markup::{MarkupElement, MarkupNode};
pub use normalize::{carries_model_markers, normalize, PasteContext, TEMPORARY_MARKER};
pub use serialize::to_markup;

pub use tabula_model::Fragment;
