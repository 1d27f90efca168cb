//! Column insertion, deletion and resizing

use crate::context::EditContext;
use crate::geometry::{resolve_column_boundary, BoundaryMatch, TableGeometry};
use crate::grid::GridIndex;
use crate::mutations::{ColumnTarget, MutationError, Outcome};
use crate::{rows, tables};
use std::collections::HashSet;
use tabula_model::attributes::{self, format_length, COLSPAN, WIDTH};
use tabula_model::{Attributes, NodeId, NodeKind};
use tracing::{debug, info, warn};

/// Where a new cell goes within one row
enum Placement {
    Before(NodeId),
    Append,
    /// A cell straddles the boundary; widen it instead
    Widen(NodeId),
}

/// Insert a column at a boundary coordinate or at the end of the table.
///
/// A coordinate that matches no boundary within the configured tolerance
/// leaves the table untouched.
pub fn insert_column(
    ctx: &mut EditContext,
    table: NodeId,
    at: ColumnTarget,
    widths: Option<&[f32]>,
) -> Result<Outcome, MutationError> {
    let Some(body) = ctx.doc.body(table) else {
        return Ok(Outcome::noop());
    };
    let layout = GridIndex::build(ctx.doc, body);
    if layout.height() == 0 {
        return Ok(Outcome::noop());
    }

    let tolerance = ctx.config.boundary_tolerance;
    let geometry = match widths {
        Some(widths) => TableGeometry::from_widths(widths),
        None => TableGeometry::from_hints(ctx.doc, table, layout.width(), ctx.config.default_column_width),
    };

    let column = match at {
        ColumnTarget::Append => layout.width(),
        ColumnTarget::At(x) => match geometry.boundary_near(x, tolerance) {
            Some(boundary) => boundary.min(layout.width()),
            None if x >= geometry.total_width() - tolerance => layout.width(),
            None => {
                debug!(table = %table, x, "No column boundary near coordinate");
                return Ok(Outcome::noop());
            }
        },
    };

    let mut widened = HashSet::new();
    let mut created = 0;
    for (r, &row) in layout.rows().iter().enumerate() {
        let resolved = match at {
            ColumnTarget::Append => BoundaryMatch::Unresolved,
            ColumnTarget::At(x) => resolve_column_boundary(ctx.doc, &layout, &geometry, row, x, tolerance),
        };

        let placement = match resolved {
            BoundaryMatch::Leading(cell) if layout.origin(cell).map(|(_, c)| c) == Some(column) => {
                Placement::Before(cell)
            }
            BoundaryMatch::Tail(_) if layout.slot(r, column).is_none() => Placement::Append,
            _ if column >= layout.width() => Placement::Append,
            _ => match layout.slot(r, column) {
                Some(slot) if slot.column < column => Placement::Widen(slot.cell),
                _ => match layout.first_cell_from(ctx.doc, row, column) {
                    Some(cell) => Placement::Before(cell),
                    None => Placement::Append,
                },
            },
        };

        match placement {
            Placement::Widen(cell) => {
                if widened.insert(cell) {
                    let colspan = ctx.doc.span(cell, COLSPAN) + 1;
                    ctx.doc.set_attribute(cell, COLSPAN, colspan.to_string())?;
                }
            }
            Placement::Before(reference) => {
                let row_id = ctx.row_id_of(row);
                let cell = ctx.new_cell(&row_id, 1)?;
                ctx.doc.insert_before(reference, cell)?;
                created += 1;
            }
            Placement::Append => {
                let row_id = ctx.row_id_of(row);
                let cell = ctx.new_cell(&row_id, 1)?;
                ctx.doc.append(row, cell)?;
                created += 1;
            }
        }
    }

    insert_column_hint(ctx, table, column)?;

    info!(table = %table, column, created, widened = widened.len(), "Inserted column");
    Ok(Outcome::applied())
}

fn insert_column_hint(ctx: &mut EditContext, table: NodeId, column: usize) -> Result<(), MutationError> {
    let group = match ctx.doc.column_group(table) {
        Some(group) => group,
        None => {
            let group = ctx.doc.create(NodeKind::ColumnGroup, Attributes::new())?;
            ctx.doc.insert(table, 0, group)?;
            group
        }
    };
    let width = format_length(ctx.config.default_column_width);
    let hint = ctx
        .doc
        .create(NodeKind::Column, attributes::from_pairs([(WIDTH, width.as_str())]))?;
    ctx.doc.insert(group, column, hint)?;
    Ok(())
}

/// Delete the targeted cells of a column.
///
/// Targeting every cell of the table removes the table. Rows left without
/// cells are removed; remaining rows are not padded unless rebalancing is
/// configured.
pub fn delete_column(ctx: &mut EditContext, targets: &[NodeId]) -> Result<Outcome, MutationError> {
    let Some(&first) = targets.first() else {
        return Ok(Outcome::noop());
    };
    let Some(table) = ctx.doc.closest(first, NodeKind::Table) else {
        return Ok(Outcome::noop());
    };
    if targets
        .iter()
        .any(|cell| ctx.doc.closest(*cell, NodeKind::Table) != Some(table))
    {
        return Err(MutationError::InvalidStructure(
            "column cells must belong to one table".to_string(),
        ));
    }

    let selected: HashSet<NodeId> = targets.iter().copied().collect();
    if ctx.doc.cells(table).iter().all(|cell| selected.contains(cell)) {
        info!(table = %table, "Column delete covers the whole table");
        return tables::delete_table(ctx, table);
    }

    let Some(body) = ctx.doc.body(table) else {
        return Ok(Outcome::noop());
    };
    let layout = GridIndex::build(ctx.doc, body);
    let emptied_columns: Vec<usize> = (0..layout.width())
        .filter(|&c| {
            (0..layout.height()).all(|r| layout.slot(r, c).is_some_and(|slot| selected.contains(&slot.cell)))
        })
        .collect();

    let cursor = targets.iter().filter_map(|cell| ctx.doc.offset(*cell)).min();
    let touched_rows: Vec<NodeId> = layout
        .rows()
        .iter()
        .copied()
        .filter(|row| ctx.doc.children(*row).iter().any(|cell| selected.contains(cell)))
        .collect();

    for &cell in &selected {
        ctx.doc.remove(cell)?;
    }

    for row in touched_rows {
        if ctx.doc.children(row).is_empty() {
            rows::remove_row(ctx, body, row)?;
        }
    }

    if let Some(group) = ctx.doc.column_group(table) {
        let hints = ctx.doc.children(group).to_vec();
        for &c in emptied_columns.iter().rev() {
            match hints.get(c) {
                Some(&hint) => ctx.doc.remove(hint)?,
                None => warn!(table = %table, column = c, "Missing column hint"),
            }
        }
    }

    info!(table = %table, cells = selected.len(), "Deleted column cells");
    let cursor = cursor.map(|c| c.min(ctx.doc.document_len().saturating_sub(1)));
    Ok(Outcome::applied().with_cursor(cursor))
}

/// Set a column's width hint and re-derive the width of cells over it
pub fn resize_column(
    ctx: &mut EditContext,
    table: NodeId,
    column: usize,
    width: f32,
) -> Result<Outcome, MutationError> {
    let Some(group) = ctx.doc.column_group(table) else {
        return Ok(Outcome::noop());
    };
    let Some(&hint) = ctx.doc.children(group).get(column) else {
        debug!(table = %table, column, "No such column");
        return Ok(Outcome::noop());
    };
    ctx.doc.set_attribute(hint, WIDTH, format_length(width))?;

    let Some(body) = ctx.doc.body(table) else {
        return Ok(Outcome::applied());
    };
    let layout = GridIndex::build(ctx.doc, body);
    let geometry = TableGeometry::from_hints(ctx.doc, table, layout.width(), ctx.config.default_column_width);
    for cell in layout.cells_in_column(column) {
        let Some((_, origin)) = layout.origin(cell) else {
            continue;
        };
        let span = ctx.doc.span(cell, COLSPAN);
        let cell_width = geometry.span_width(origin, span);
        ctx.doc.set_attribute(cell, WIDTH, format_length(cell_width))?;
    }

    Ok(Outcome::applied())
}
