//! Whole-table operations

use crate::context::EditContext;
use crate::grid;
use crate::mutations::{MutationError, Outcome};
use tabula_model::attributes::{self, format_length, WIDTH};
use tabula_model::{Attributes, Document, NodeId, NodeKind};
use tracing::{debug, info};

/// Insert an empty `rows` x `columns` table at a document offset.
///
/// Tables are placed among the root's children: an offset inside a
/// top-level node lands after that node.
pub fn insert_table(
    ctx: &mut EditContext,
    position: usize,
    rows: usize,
    columns: usize,
) -> Result<Outcome, MutationError> {
    if rows == 0 || columns == 0 {
        debug!(rows, columns, "Ignoring empty table insert");
        return Ok(Outcome::noop());
    }

    let table = ctx.doc.create(NodeKind::Table, Attributes::new())?;
    let group = ctx.doc.create(NodeKind::ColumnGroup, Attributes::new())?;
    let width = format_length(ctx.config.default_column_width);
    for _ in 0..columns {
        let column = ctx
            .doc
            .create(NodeKind::Column, attributes::from_pairs([(WIDTH, width.as_str())]))?;
        ctx.doc.append(group, column)?;
    }
    let body = ctx.doc.create(NodeKind::Body, Attributes::new())?;
    ctx.doc.append(table, group)?;
    ctx.doc.append(table, body)?;

    for _ in 0..rows {
        let (row, row_id) = ctx.new_row()?;
        for _ in 0..columns {
            let cell = ctx.new_cell(&row_id, 1)?;
            ctx.doc.append(row, cell)?;
        }
        ctx.doc.append(body, row)?;
    }

    let root = ctx.doc.root();
    let index = root_index_at(ctx.doc, position);
    ctx.doc.insert(root, index, table)?;

    let cursor = ctx
        .doc
        .offset(table)
        .map(|offset| offset + ctx.doc.len(table));
    info!(table = %table, rows, columns, "Inserted table");
    Ok(Outcome::applied().with_cursor(cursor).with_inserted(table))
}

/// Remove a table with all its content.
///
/// The cursor lands where the table started. A document or cell left
/// without lines gets an empty one back.
pub fn delete_table(ctx: &mut EditContext, table: NodeId) -> Result<Outcome, MutationError> {
    let offset = ctx.doc.offset(table).unwrap_or(0);
    let parent = ctx.doc.parent(table);
    ctx.doc.remove(table)?;

    match parent {
        Some(cell) if ctx.doc.is_kind(cell, NodeKind::Cell) && ctx.doc.children(cell).is_empty() => {
            let content_id = ctx.ids.cell_id();
            let block = ctx.doc.create_text(
                NodeKind::Block,
                "",
                attributes::from_pairs([(attributes::CELL, content_id.as_str())]),
            )?;
            ctx.doc.append(cell, block)?;
        }
        _ => {}
    }

    let root = ctx.doc.root();
    if ctx.doc.children(root).is_empty() {
        let paragraph = ctx.doc.create_text(NodeKind::Paragraph, "", Attributes::new())?;
        ctx.doc.append(root, paragraph)?;
    }

    let cursor = offset.min(ctx.doc.document_len().saturating_sub(1));
    info!(table = %table, "Deleted table");
    Ok(Outcome {
        applied: true,
        cursor: Some(cursor),
        table_removed: true,
        inserted: None,
    })
}

pub fn balance_table(ctx: &mut EditContext, table: NodeId) -> Result<Outcome, MutationError> {
    let Some(body) = ctx.doc.body(table) else {
        return Ok(Outcome::noop());
    };
    let created = grid::balance(ctx, body)?;
    if created.is_empty() {
        Ok(Outcome::noop())
    } else {
        Ok(Outcome::applied())
    }
}

/// Index among the root's children at which to insert top-level content
pub(crate) fn root_index_at(doc: &Document, position: usize) -> usize {
    let children = doc.children(doc.root());
    let mut start = 0;
    for (i, child) in children.iter().enumerate() {
        if position <= start {
            return i;
        }
        let len = doc.len(*child);
        if position < start + len {
            return i + 1;
        }
        start += len;
    }
    children.len()
}
