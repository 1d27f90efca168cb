//! # Tabula Editor
//!
//! Structural editing engine for tables in a rich-text document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: arena tree, kinds, attribute schema  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: TableDocument + mutations           │
//! │  - Grid index and balancing                 │
//! │  - Row / column / table / cell operations   │
//! │  - Post-effects (empty tables, rebalance)   │
//! │  - Line diff → change-log for the host      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host editor: applies insert/retain/delete   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: the grid and the line view are derived
//! 2. **Guards before edits**: an operation either bails out untouched or
//!    runs to completion
//! 3. **No holes**: row and column edits adjust spans to keep coverage
//!
//! ## Usage
//!
//! ```rust
//! use tabula_editor::{EngineConfig, Mutation, TableDocument};
//!
//! let mut doc = TableDocument::seeded(EngineConfig::default(), 42);
//! let result = doc
//!     .apply(Mutation::InsertTable { position: 0, rows: 3, columns: 3 })
//!     .unwrap();
//! let table = result.inserted.unwrap();
//!
//! doc.apply(Mutation::InsertRow { table, index: 1, offset: 0 }).unwrap();
//! assert_eq!(doc.tree().rows(table).len(), 4);
//! ```

pub mod builder;
pub mod cells;
pub mod changes;
pub mod columns;
pub mod config;
pub mod context;
mod document;
mod errors;
pub mod geometry;
pub mod grid;
mod mutations;
mod post_effects;
pub mod rows;
pub mod tables;

pub use changes::{AttributeChanges, Delta, DeltaOp, LineContent};
pub use config::{EngineConfig, DEFAULT_CONFIG_NAME};
pub use context::EditContext;
pub use document::TableDocument;
pub use errors::EditorError;
pub use geometry::{resolve_column_boundary, BoundaryMatch, TableGeometry};
pub use grid::{
    balance, coalesce, find_row_with_matching_column_count, merge_eligible, GridIndex, Slot,
};
pub use mutations::{ColumnTarget, Mutation, MutationError, MutationResult, Outcome};
pub use post_effects::{PostEffect, PostEffectEngine, RebalanceAfterColumnEdit, RemoveEmptyTables};

// Re-export model types for convenience
pub use tabula_model::{Document, Fragment, NodeId, NodeKind};
