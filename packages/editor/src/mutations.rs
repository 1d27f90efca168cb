//! # Table Mutations
//!
//! Structural operations on tables, expressed as serializable intents.
//!
//! ## Semantics
//!
//! - Every mutation is validated against the document before it runs:
//!   referenced nodes must exist and be of the expected kind.
//! - An empty target set (no rows, no cells) is a silent no-op, reported
//!   through `applied: false` rather than an error.
//! - Removing every row or every cell of a table removes the table.
//! - Row and column edits preserve grid coverage: rowspans and colspans are
//!   adjusted instead of leaving holes or overlaps.

use crate::changes::Delta;
use crate::context::EditContext;
use crate::{builder, cells, columns, rows, tables};
use serde::{Deserialize, Serialize};
use tabula_model::{Attributes, Document, Fragment, ModelError, NodeId, NodeKind};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert a `rows` x `columns` table at a document offset
    InsertTable {
        position: usize,
        rows: usize,
        columns: usize,
    },

    DeleteTable {
        table: NodeId,
    },

    /// Insert a row at `index + offset` (offset 0 above, 1 below)
    InsertRow {
        table: NodeId,
        index: usize,
        offset: usize,
    },

    DeleteRows {
        rows: Vec<NodeId>,
    },

    /// Insert a column at a boundary coordinate or at the end
    InsertColumn {
        table: NodeId,
        at: ColumnTarget,
        /// Column widths as measured by the UI, overriding stored hints
        #[serde(default)]
        widths: Option<Vec<f32>>,
    },

    /// Delete the selected cells of a column
    DeleteColumn {
        cells: Vec<NodeId>,
    },

    /// Set cell formats; an empty value removes the key
    FormatCell {
        cell: NodeId,
        attributes: Attributes,
    },

    FormatTable {
        table: NodeId,
        attributes: Attributes,
    },

    ResizeColumn {
        table: NodeId,
        column: usize,
        width: f32,
    },

    ResizeRow {
        row: NodeId,
        height: f32,
    },

    /// Merge a rectangular selection into its top-left cell
    MergeCells {
        cells: Vec<NodeId>,
    },

    /// Split a spanning cell back into 1x1 cells
    SplitCell {
        cell: NodeId,
    },

    /// Pad short rows until the table is rectangular
    Balance {
        table: NodeId,
    },

    /// Insert normalized clipboard content at a document offset
    Paste {
        position: usize,
        fragment: Fragment,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ColumnTarget {
    Append,
    /// Horizontal coordinate of the boundary to insert at
    At(f32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// What an operation did, before change-log computation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub applied: bool,
    /// Offset to place the selection at
    pub cursor: Option<usize>,
    pub table_removed: bool,
    /// Primary node created by the operation
    pub inserted: Option<NodeId>,
}

impl Outcome {
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn applied() -> Self {
        Self {
            applied: true,
            ..Self::default()
        }
    }

    pub fn with_cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_inserted(mut self, node: NodeId) -> Self {
        self.inserted = Some(node);
        self
    }

    /// Fold the outcome of a secondary mutation into this one
    pub fn absorb(&mut self, secondary: Outcome) {
        if !secondary.applied {
            return;
        }
        self.applied = true;
        self.table_removed |= secondary.table_removed;
        if secondary.cursor.is_some() {
            self.cursor = secondary.cursor;
        }
    }
}

/// Result reported to the host for one applied mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    pub version: u64,
    pub applied: bool,
    pub changes: Delta,
    pub cursor: Option<usize>,
    pub table_removed: bool,
    pub inserted: Option<NodeId>,
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertTable { .. } => "insert-table",
            Mutation::DeleteTable { .. } => "delete-table",
            Mutation::InsertRow { .. } => "insert-row",
            Mutation::DeleteRows { .. } => "delete-rows",
            Mutation::InsertColumn { .. } => "insert-column",
            Mutation::DeleteColumn { .. } => "delete-column",
            Mutation::FormatCell { .. } => "format-cell",
            Mutation::FormatTable { .. } => "format-table",
            Mutation::ResizeColumn { .. } => "resize-column",
            Mutation::ResizeRow { .. } => "resize-row",
            Mutation::MergeCells { .. } => "merge-cells",
            Mutation::SplitCell { .. } => "split-cell",
            Mutation::Balance { .. } => "balance",
            Mutation::Paste { .. } => "paste",
        }
    }

    /// Apply mutation with validation
    pub fn apply(&self, ctx: &mut EditContext) -> Result<Outcome, MutationError> {
        self.validate(ctx.doc)?;

        match self {
            Mutation::InsertTable {
                position,
                rows,
                columns,
            } => tables::insert_table(ctx, *position, *rows, *columns),
            Mutation::DeleteTable { table } => tables::delete_table(ctx, *table),
            Mutation::InsertRow {
                table,
                index,
                offset,
            } => rows::insert_row(ctx, *table, *index, *offset),
            Mutation::DeleteRows { rows } => rows::delete_rows(ctx, rows),
            Mutation::InsertColumn { table, at, widths } => {
                columns::insert_column(ctx, *table, *at, widths.as_deref())
            }
            Mutation::DeleteColumn { cells } => columns::delete_column(ctx, cells),
            Mutation::FormatCell { cell, attributes } => cells::format(ctx, *cell, attributes),
            Mutation::FormatTable { table, attributes } => cells::format(ctx, *table, attributes),
            Mutation::ResizeColumn {
                table,
                column,
                width,
            } => columns::resize_column(ctx, *table, *column, *width),
            Mutation::ResizeRow { row, height } => rows::resize_row(ctx, *row, *height),
            Mutation::MergeCells { cells } => cells::merge_cells(ctx, cells),
            Mutation::SplitCell { cell } => cells::split_cell(ctx, *cell),
            Mutation::Balance { table } => tables::balance_table(ctx, *table),
            Mutation::Paste { position, fragment } => builder::paste(ctx, *position, fragment),
        }
    }

    /// Validate a mutation without applying it
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::InsertTable { .. } | Mutation::Paste { .. } => Ok(()),
            Mutation::DeleteTable { table }
            | Mutation::InsertRow { table, .. }
            | Mutation::InsertColumn { table, .. }
            | Mutation::FormatTable { table, .. }
            | Mutation::ResizeColumn { table, .. }
            | Mutation::Balance { table } => expect(doc, *table, NodeKind::Table),
            Mutation::DeleteRows { rows } => expect_all(doc, rows, NodeKind::Row),
            Mutation::ResizeRow { row, .. } => expect(doc, *row, NodeKind::Row),
            Mutation::DeleteColumn { cells } | Mutation::MergeCells { cells } => {
                expect_all(doc, cells, NodeKind::Cell)
            }
            Mutation::FormatCell { cell, .. } | Mutation::SplitCell { cell } => {
                expect(doc, *cell, NodeKind::Cell)
            }
        }
    }
}

fn expect(doc: &Document, id: NodeId, kind: NodeKind) -> Result<(), MutationError> {
    let node = doc.get(id).ok_or(MutationError::NodeNotFound(id))?;
    if node.kind() != kind {
        return Err(ModelError::wrong_kind(id, kind, node.kind()).into());
    }
    if doc.offset(id).is_none() {
        return Err(MutationError::InvalidStructure(format!(
            "{} {} is not attached to the document",
            kind, id
        )));
    }
    Ok(())
}

fn expect_all(doc: &Document, ids: &[NodeId], kind: NodeKind) -> Result<(), MutationError> {
    ids.iter().try_for_each(|id| expect(doc, *id, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_missing_node() {
        let doc = Document::new();
        let mutation = Mutation::DeleteTable { table: doc.root() };
        assert!(matches!(
            mutation.validate(&doc),
            Err(MutationError::Model(ModelError::WrongKind { .. }))
        ));

        let orphan = serde_json::from_str::<NodeId>("99").unwrap();
        let mutation = Mutation::SplitCell { cell: orphan };
        assert_eq!(mutation.validate(&doc), Err(MutationError::NodeNotFound(orphan)));
    }

    #[test]
    fn test_empty_targets_validate() {
        let doc = Document::new();
        assert!(Mutation::DeleteRows { rows: vec![] }.validate(&doc).is_ok());
        assert!(Mutation::DeleteColumn { cells: vec![] }.validate(&doc).is_ok());
    }

    #[test]
    fn test_serde_shape() {
        let mutation: Mutation = serde_json::from_str(
            r#"{"InsertColumn": {"table": 4, "at": {"at": 120.5}}}"#,
        )
        .unwrap();
        assert_eq!(
            mutation,
            Mutation::InsertColumn {
                table: serde_json::from_str("4").unwrap(),
                at: ColumnTarget::At(120.5),
                widths: None,
            }
        );

        let append: ColumnTarget = serde_json::from_str(r#""append""#).unwrap();
        assert_eq!(append, ColumnTarget::Append);
    }
}
