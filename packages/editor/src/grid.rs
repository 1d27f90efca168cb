//! Grid consistency engine.
//!
//! Rows and cells are stored as a plain tree; the 2D layout only exists
//! implicitly through `colspan` and `rowspan`. [`GridIndex`] materializes
//! that layout with the usual HTML slot algorithm so edits can ask which
//! cell occupies a given (row, column) position. It is rebuilt for every
//! operation and never persisted.

use crate::context::{row_group_id, EditContext};
use std::collections::HashMap;
use tabula_model::attributes::{COLSPAN, ROW, ROWSPAN, WIDTH};
use tabula_model::{Document, ModelResult, NodeId, NodeKind};
use tracing::debug;

/// Occupant of a grid position, with the cell's origin coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub cell: NodeId,
    pub row: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct GridIndex {
    rows: Vec<NodeId>,
    slots: Vec<Vec<Option<Slot>>>,
    origins: HashMap<NodeId, (usize, usize)>,
    width: usize,
}

impl GridIndex {
    /// Lay out every row of a table body.
    ///
    /// Rowspans running past the last row are clipped.
    pub fn build(doc: &Document, body: NodeId) -> Self {
        let rows = doc.children(body).to_vec();
        let height = rows.len();
        let mut slots: Vec<Vec<Option<Slot>>> = vec![Vec::new(); height];
        let mut origins = HashMap::new();

        for (r, row) in rows.iter().enumerate() {
            let mut column = 0;
            for &cell in doc.children(*row) {
                while slots[r].get(column).is_some_and(Option::is_some) {
                    column += 1;
                }

                let colspan = doc.span(cell, COLSPAN);
                let rowspan = doc.span(cell, ROWSPAN).min(height - r);
                let end = column.saturating_add(colspan);
                origins.insert(cell, (r, column));

                for line in &mut slots[r..r + rowspan] {
                    if line.len() < end {
                        line.resize(end, None);
                    }
                    for slot in &mut line[column..end] {
                        if slot.is_none() {
                            *slot = Some(Slot { cell, row: r, column });
                        }
                    }
                }
                column = end;
            }
        }

        let width = slots.iter().map(Vec::len).max().unwrap_or(0);
        for line in &mut slots {
            line.resize(width, None);
        }

        Self {
            rows,
            slots,
            origins,
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }

    pub fn row_index(&self, row: NodeId) -> Option<usize> {
        self.rows.iter().position(|r| *r == row)
    }

    pub fn slot(&self, row: usize, column: usize) -> Option<Slot> {
        self.slots.get(row)?.get(column).copied().flatten()
    }

    /// Origin (row, column) of a cell
    pub fn origin(&self, cell: NodeId) -> Option<(usize, usize)> {
        self.origins.get(&cell).copied()
    }

    /// Occupied positions of a row, own cells and inherited rowspans alike
    pub fn filled(&self, row: usize) -> usize {
        self.slots
            .get(row)
            .map(|line| line.iter().filter(|slot| slot.is_some()).count())
            .unwrap_or(0)
    }

    pub fn is_rectangular(&self) -> bool {
        (0..self.height()).all(|r| self.filled(r) == self.width)
    }

    /// Cells occupying `row` that originate in an earlier row, in column
    /// order. These are exactly the cells spanning the boundary above `row`.
    pub fn covering(&self, row: usize) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for slot in self.slots.get(row).into_iter().flatten().flatten() {
            if slot.row < row && !out.contains(&slot.cell) {
                out.push(slot.cell);
            }
        }
        out
    }

    /// Cell reaching into `row` from above at `column`
    pub fn spanning_into(&self, row: usize, column: usize) -> Option<NodeId> {
        self.slot(row, column)
            .filter(|slot| slot.row < row)
            .map(|slot| slot.cell)
    }

    /// Every distinct cell whose slots intersect a column
    pub fn cells_in_column(&self, column: usize) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for r in 0..self.height() {
            if let Some(slot) = self.slot(r, column) {
                if !out.contains(&slot.cell) {
                    out.push(slot.cell);
                }
            }
        }
        out
    }

    /// First cell of `row` whose origin column is at or after `column`
    pub fn first_cell_from(&self, doc: &Document, row: NodeId, column: usize) -> Option<NodeId> {
        doc.children(row)
            .iter()
            .copied()
            .find(|cell| self.origin(*cell).is_some_and(|(_, c)| c >= column))
    }
}

/// Sum of colspans over a row's own cells
pub fn column_count(doc: &Document, row: NodeId) -> usize {
    doc.children(row)
        .iter()
        .map(|cell| doc.span(*cell, COLSPAN))
        .sum()
}

/// Column count of the body's first row, the table's reference width
pub fn canonical_column_count(doc: &Document, body: NodeId) -> usize {
    doc.first_child(body)
        .map(|row| column_count(doc, row))
        .unwrap_or(0)
}

/// Walk backwards from `start` (inclusive) to the nearest row whose own
/// colspan sum equals `target`
pub fn find_row_with_matching_column_count(
    doc: &Document,
    start: NodeId,
    target: usize,
) -> Option<NodeId> {
    let mut cursor = Some(start);
    while let Some(row) = cursor {
        if column_count(doc, row) == target {
            return Some(row);
        }
        cursor = doc.previous_sibling(row);
    }
    None
}

/// Pad every short row with cells until the grid is rectangular.
///
/// New cells copy the formats of the row's first cell except width and
/// spans, take the row's group id and get a fresh content id. Returns the
/// created cells.
pub fn balance(ctx: &mut EditContext, body: NodeId) -> ModelResult<Vec<NodeId>> {
    let grid = GridIndex::build(ctx.doc, body);
    let width = grid.width();
    let mut created = Vec::new();

    for (r, &row) in grid.rows().iter().enumerate() {
        let missing = width - grid.filled(r);
        if missing == 0 {
            continue;
        }

        let row_id = row_group_id(ctx.doc, row).unwrap_or_else(|| ctx.ids.row_id());
        let mut template = ctx
            .doc
            .first_child(row)
            .and_then(|cell| ctx.doc.get(cell))
            .map(|cell| cell.attributes().clone())
            .unwrap_or_default();
        template.remove(WIDTH);
        template.remove(COLSPAN);
        template.remove(ROWSPAN);
        template.insert(ROW.to_string(), row_id);

        for _ in 0..missing {
            let cell = ctx.new_cell_with(template.clone())?;
            ctx.doc.append(row, cell)?;
            created.push(cell);
        }
        debug!(row = %row, added = missing, "Padded short row");
    }

    Ok(created)
}

/// Whether two adjacent siblings are fragments of one logical node.
///
/// Both must be of the same kind and every boundary child (first and last of
/// each) must carry the same identity attribute.
pub fn merge_eligible(doc: &Document, a: NodeId, b: NodeId) -> bool {
    let (Some(kind_a), Some(kind_b)) = (doc.kind(a), doc.kind(b)) else {
        return false;
    };
    if kind_a != kind_b || doc.next_sibling(a) != Some(b) {
        return false;
    }

    let identity = |node: Option<NodeId>| -> Option<&str> {
        let node = node?;
        let key = doc.kind(node)?.spec().identity?;
        doc.attribute(node, key)
    };

    let Some(head) = identity(doc.first_child(a)) else {
        return false;
    };
    [doc.last_child(a), doc.first_child(b), doc.last_child(b)]
        .into_iter()
        .all(|child| identity(child) == Some(head))
}

/// Merge runs of eligible siblings under `parent`, returning merge count
pub fn coalesce(doc: &mut Document, parent: NodeId) -> ModelResult<usize> {
    let mut merged = 0;
    let mut index = 0;
    loop {
        let children = doc.children(parent);
        if index + 1 >= children.len() {
            break;
        }
        let (a, b) = (children[index], children[index + 1]);
        if merge_eligible(doc, a, b) {
            doc.move_children(b, a)?;
            doc.remove(b)?;
            merged += 1;
        } else {
            index += 1;
        }
    }
    Ok(merged)
}

/// Coalesce rows of a body, then the cells of each remaining row
pub fn coalesce_body(doc: &mut Document, body: NodeId) -> ModelResult<usize> {
    let mut merged = coalesce(doc, body)?;
    for row in doc.children(body).to_vec() {
        if doc.is_kind(row, NodeKind::Row) {
            merged += coalesce(doc, row)?;
        }
    }
    Ok(merged)
}
