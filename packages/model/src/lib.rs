//! # Tabula Model
//!
//! Document tree for rich-text tables.
//!
//! ```text
//! Root
//!  ├─ Paragraph
//!  └─ Table
//!      ├─ ColumnGroup ─ Column*
//!      └─ Body ─ Row* ─ Cell* ─ Block+
//! ```
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Containment, the attribute schema and merge identity of every
//! kind come from a single capability table ([`KindSpec`]), so structural
//! rules are data rather than per-type behavior.
//!
//! Rowspan is encoded by absence: a cell spanning `n` rows has no sibling
//! node at its column position in the following `n - 1` rows.

pub mod attributes;
pub mod error;
pub mod fragment;
pub mod ids;
pub mod kind;
pub mod lines;
pub mod tree;

pub use attributes::Attributes;
pub use error::{ModelError, ModelResult};
pub use fragment::{ColumnHint, Fragment, FragmentItem, FragmentLine, TableFragment, TemporaryMarker};
pub use ids::{generate_id, EntropySource, IdGenerator, SeededEntropy, SystemEntropy};
pub use kind::{KindSpec, NodeKind};
pub use lines::{InsertValue, Line, Location};
pub use tree::{Document, Node, NodeId};
