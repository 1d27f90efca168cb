//! Row insertion and deletion with rowspan bookkeeping

use crate::context::{row_group_id, EditContext};
use crate::grid::{self, GridIndex};
use crate::mutations::{MutationError, Outcome};
use crate::tables;
use std::collections::{BTreeMap, HashSet};
use tabula_model::attributes::{format_length, COLSPAN, HEIGHT, ROW, ROWSPAN};
use tabula_model::{NodeId, NodeKind};
use tracing::{debug, info};

/// Insert a row at position `index + offset` of the table's body.
///
/// The new row mirrors the column structure of the nearest row above that
/// has the table's full column count. Cells spanning across the insertion
/// boundary grow by one row instead of receiving a new cell.
pub fn insert_row(
    ctx: &mut EditContext,
    table: NodeId,
    index: usize,
    offset: usize,
) -> Result<Outcome, MutationError> {
    let Some(body) = ctx.doc.body(table) else {
        debug!(table = %table, "Table has no body");
        return Ok(Outcome::noop());
    };
    let rows = ctx.doc.children(body).to_vec();
    if rows.is_empty() {
        return Ok(Outcome::noop());
    }

    let target = index.saturating_add(offset).min(rows.len());
    let reference = rows[target.saturating_sub(1)];
    let canonical = grid::canonical_column_count(ctx.doc, body);
    let template = if grid::column_count(ctx.doc, reference) == canonical {
        reference
    } else {
        grid::find_row_with_matching_column_count(ctx.doc, reference, canonical).unwrap_or(rows[0])
    };

    let layout = GridIndex::build(ctx.doc, body);
    let (row, row_id) = ctx.new_row()?;
    let mut extended = HashSet::new();

    for cell in ctx.doc.children(template).to_vec() {
        let Some((_, column)) = layout.origin(cell) else {
            continue;
        };
        let colspan = ctx.doc.span(cell, COLSPAN);

        let spanning = if target < layout.height() {
            (column..column + colspan).find_map(|c| layout.spanning_into(target, c))
        } else {
            None
        };

        match spanning {
            Some(spanning) => {
                if extended.insert(spanning) {
                    let rowspan = ctx.doc.span(spanning, ROWSPAN) + 1;
                    ctx.doc.set_attribute(spanning, ROWSPAN, rowspan.to_string())?;
                }
            }
            None => {
                let new_cell = ctx.new_cell(&row_id, colspan)?;
                ctx.doc.append(row, new_cell)?;
            }
        }
    }

    match rows.get(target) {
        Some(&next) => ctx.doc.insert_before(next, row)?,
        None => ctx.doc.append(body, row)?,
    }

    info!(
        table = %table,
        at = target,
        cells = ctx.doc.children(row).len(),
        extended = extended.len(),
        "Inserted row"
    );
    Ok(Outcome::applied()
        .with_cursor(ctx.doc.offset(row))
        .with_inserted(row))
}

/// Delete rows, shrinking rowspans that cross them.
///
/// Targets covering a whole table remove that table instead.
pub fn delete_rows(ctx: &mut EditContext, targets: &[NodeId]) -> Result<Outcome, MutationError> {
    if targets.is_empty() {
        return Ok(Outcome::noop());
    }

    let mut by_body: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for &row in targets {
        if let Some(body) = ctx.doc.parent(row) {
            let group = by_body.entry(body).or_default();
            if !group.contains(&row) {
                group.push(row);
            }
        }
    }

    let cursor = targets.iter().filter_map(|row| ctx.doc.offset(*row)).min();
    let mut outcome = Outcome::applied().with_cursor(cursor);

    for (body, rows) in by_body {
        let covers_table = ctx
            .doc
            .children(body)
            .iter()
            .all(|row| rows.contains(row));
        if covers_table {
            if let Some(table) = ctx.doc.parent(body) {
                outcome.absorb(tables::delete_table(ctx, table)?);
            }
            continue;
        }

        for row in rows {
            remove_row(ctx, body, row)?;
        }
    }

    if let Some(cursor) = outcome.cursor {
        outcome.cursor = Some(cursor.min(ctx.doc.document_len().saturating_sub(1)));
    }
    Ok(outcome)
}

/// Remove one row from a body that keeps at least one other row.
///
/// Cells from earlier rows spanning into it lose a row. Cells originating
/// in it that span further move down into the next row.
pub(crate) fn remove_row(ctx: &mut EditContext, body: NodeId, row: NodeId) -> Result<(), MutationError> {
    let layout = GridIndex::build(ctx.doc, body);
    let Some(r) = layout.row_index(row) else {
        return Ok(());
    };

    for cell in layout.covering(r) {
        let rowspan = ctx.doc.span(cell, ROWSPAN).saturating_sub(1).max(1);
        ctx.doc.set_attribute(cell, ROWSPAN, rowspan.to_string())?;
    }

    if let Some(&next) = layout.rows().get(r + 1) {
        let next_id = row_group_id(ctx.doc, next);
        for cell in ctx.doc.children(row).to_vec() {
            let rowspan = ctx.doc.span(cell, ROWSPAN).min(layout.height() - r);
            if rowspan < 2 {
                continue;
            }
            let Some((_, column)) = layout.origin(cell) else {
                continue;
            };

            let before = ctx
                .doc
                .children(next)
                .iter()
                .copied()
                .find(|c| layout.origin(*c).is_some_and(|(_, col)| col > column));

            ctx.doc.detach(cell)?;
            ctx.doc.set_attribute(cell, ROWSPAN, (rowspan - 1).to_string())?;
            if let Some(next_id) = &next_id {
                ctx.doc.set_attribute(cell, ROW, next_id.as_str())?;
            }
            match before {
                Some(before) => ctx.doc.insert_before(before, cell)?,
                None => ctx.doc.append(next, cell)?,
            }
            debug!(cell = %cell, "Carried spanning cell into next row");
        }
    }

    ctx.doc.remove(row)?;
    debug!(row = %row, "Removed row");
    Ok(())
}

/// Set the height of every cell in a row
pub fn resize_row(ctx: &mut EditContext, row: NodeId, height: f32) -> Result<Outcome, MutationError> {
    let cells: Vec<NodeId> = ctx
        .doc
        .children(row)
        .iter()
        .copied()
        .filter(|cell| ctx.doc.is_kind(*cell, NodeKind::Cell))
        .collect();
    if cells.is_empty() {
        return Ok(Outcome::noop());
    }

    let value = format_length(height);
    for cell in cells {
        ctx.doc.set_attribute(cell, HEIGHT, value.as_str())?;
    }
    Ok(Outcome::applied())
}
