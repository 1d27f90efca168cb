//! Cell formatting, merging and splitting

use crate::context::EditContext;
use crate::grid::GridIndex;
use crate::mutations::{MutationError, Outcome};
use std::collections::HashSet;
use tabula_model::attributes::{CELL, COLSPAN, ROWSPAN};
use tabula_model::{Attributes, NodeId, NodeKind};
use tracing::{debug, info};

/// Apply formats to a cell or table; an empty value removes the key.
///
/// Every format is checked before any is written, so a rejected set leaves
/// the node untouched.
pub fn format(ctx: &mut EditContext, node: NodeId, formats: &Attributes) -> Result<Outcome, MutationError> {
    for (key, value) in formats.iter().filter(|(_, value)| !value.is_empty()) {
        ctx.doc.check_attribute(node, key, value)?;
    }

    let mut changed = false;
    for (key, value) in formats {
        if value.is_empty() {
            changed |= ctx.doc.remove_attribute(node, key)?.is_some();
        } else if ctx.doc.attribute(node, key) != Some(value.as_str()) {
            ctx.doc.set_attribute(node, key, value.as_str())?;
            changed = true;
        }
    }
    Ok(if changed { Outcome::applied() } else { Outcome::noop() })
}

/// Merge a rectangular selection of cells into its top-left cell.
///
/// Content blocks of the other cells move into the surviving cell and adopt
/// its content id; empty blocks are dropped. Selections that are not an
/// exact rectangle are ignored.
pub fn merge_cells(ctx: &mut EditContext, targets: &[NodeId]) -> Result<Outcome, MutationError> {
    let selected: HashSet<NodeId> = targets.iter().copied().collect();
    if selected.len() < 2 {
        return Ok(Outcome::noop());
    }
    let Some(body) = targets.first().and_then(|cell| ctx.doc.closest(*cell, NodeKind::Body)) else {
        return Ok(Outcome::noop());
    };
    if targets.iter().any(|cell| ctx.doc.closest(*cell, NodeKind::Body) != Some(body)) {
        return Ok(Outcome::noop());
    }

    let layout = GridIndex::build(ctx.doc, body);
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for &cell in &selected {
        let Some((r, c)) = layout.origin(cell) else {
            return Ok(Outcome::noop());
        };
        let rowspan = ctx.doc.span(cell, ROWSPAN).min(layout.height() - r);
        let colspan = ctx.doc.span(cell, COLSPAN);
        let (top, left, bottom, right) = bounds.unwrap_or((r, c, r + rowspan, c + colspan));
        bounds = Some((top.min(r), left.min(c), bottom.max(r + rowspan), right.max(c + colspan)));
    }
    let Some((top, left, bottom, right)) = bounds else {
        return Ok(Outcome::noop());
    };

    let exact = (top..bottom).all(|r| {
        (left..right).all(|c| layout.slot(r, c).is_some_and(|slot| selected.contains(&slot.cell)))
    });
    if !exact {
        debug!("Merge selection is not rectangular");
        return Ok(Outcome::noop());
    }

    let Some(anchor) = layout.slot(top, left).map(|slot| slot.cell) else {
        return Ok(Outcome::noop());
    };
    let content_id = ctx.content_id_of(anchor);

    let mut others: Vec<NodeId> = selected.iter().copied().filter(|cell| *cell != anchor).collect();
    others.sort_by_key(|cell| layout.origin(*cell));

    for cell in others {
        for block in ctx.doc.children(cell).to_vec() {
            let empty = ctx.doc.is_kind(block, NodeKind::Block) && ctx.doc.text(block) == Some("");
            if empty {
                continue;
            }
            ctx.doc.detach(block)?;
            if ctx.doc.is_kind(block, NodeKind::Block) {
                ctx.doc.set_attribute(block, CELL, content_id.as_str())?;
            }
            ctx.doc.append(anchor, block)?;
        }
        ctx.doc.remove(cell)?;
    }

    ctx.doc.set_attribute(anchor, COLSPAN, (right - left).to_string())?;
    ctx.doc.set_attribute(anchor, ROWSPAN, (bottom - top).to_string())?;

    info!(cell = %anchor, rows = bottom - top, columns = right - left, "Merged cells");
    Ok(Outcome::applied()
        .with_cursor(ctx.doc.offset(anchor))
        .with_inserted(anchor))
}

/// Split a spanning cell into 1x1 cells covering the same area
pub fn split_cell(ctx: &mut EditContext, cell: NodeId) -> Result<Outcome, MutationError> {
    let Some(body) = ctx.doc.closest(cell, NodeKind::Body) else {
        return Ok(Outcome::noop());
    };
    let layout = GridIndex::build(ctx.doc, body);
    let Some((top, left)) = layout.origin(cell) else {
        return Ok(Outcome::noop());
    };
    let colspan = ctx.doc.span(cell, COLSPAN);
    let rowspan = ctx.doc.span(cell, ROWSPAN).min(layout.height() - top);
    if colspan == 1 && rowspan == 1 {
        return Ok(Outcome::noop());
    }

    ctx.doc.set_attribute(cell, COLSPAN, "1")?;
    ctx.doc.set_attribute(cell, ROWSPAN, "1")?;

    let origin_row = layout.rows()[top];
    let row_id = ctx.row_id_of(origin_row);
    let mut anchor = cell;
    for _ in 1..colspan {
        let fresh = ctx.new_cell(&row_id, 1)?;
        ctx.doc.insert_after(anchor, fresh)?;
        anchor = fresh;
    }

    for &row in &layout.rows()[top + 1..top + rowspan] {
        let row_id = ctx.row_id_of(row);
        let before = layout.first_cell_from(ctx.doc, row, left + 1);
        for _ in 0..colspan {
            let fresh = ctx.new_cell(&row_id, 1)?;
            match before {
                Some(before) => ctx.doc.insert_before(before, fresh)?,
                None => ctx.doc.append(row, fresh)?,
            }
        }
    }

    info!(cell = %cell, rows = rowspan, columns = colspan, "Split cell");
    Ok(Outcome::applied().with_cursor(ctx.doc.offset(cell)))
}
