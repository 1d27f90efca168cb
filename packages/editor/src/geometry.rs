//! Horizontal geometry of a table.
//!
//! Column boundaries come either from measured widths supplied by the UI or
//! from the width hints stored on the column nodes.

use crate::grid::GridIndex;
use tabula_model::attributes::{parse_length, COLSPAN, WIDTH};
use tabula_model::{Document, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub struct TableGeometry {
    /// `columns + 1` ascending boundary positions, starting at 0
    edges: Vec<f32>,
}

/// Result of matching a coordinate against one row's cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMatch {
    /// The coordinate sits on this cell's left edge
    Leading(NodeId),
    /// The coordinate sits at or past the right edge of the row's last cell
    Tail(NodeId),
    Unresolved,
}

impl TableGeometry {
    pub fn from_widths(widths: &[f32]) -> Self {
        let mut edges = Vec::with_capacity(widths.len() + 1);
        let mut x = 0.0;
        edges.push(x);
        for width in widths {
            x += width.max(0.0);
            edges.push(x);
        }
        Self { edges }
    }

    /// Geometry from the table's column hints, padded to `columns` with the
    /// default width
    pub fn from_hints(doc: &Document, table: NodeId, columns: usize, default_width: f32) -> Self {
        let hints: Vec<f32> = doc
            .column_group(table)
            .map(|group| {
                doc.children(group)
                    .iter()
                    .map(|column| {
                        doc.attribute(*column, WIDTH)
                            .and_then(parse_length)
                            .unwrap_or(default_width)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let widths: Vec<f32> = (0..columns.max(hints.len()))
            .map(|i| hints.get(i).copied().unwrap_or(default_width))
            .collect();
        Self::from_widths(&widths)
    }

    pub fn columns(&self) -> usize {
        self.edges.len() - 1
    }

    /// Position of boundary `index`, clamped to the right edge
    pub fn edge(&self, index: usize) -> f32 {
        self.edges[index.min(self.edges.len() - 1)]
    }

    pub fn total_width(&self) -> f32 {
        self.edge(self.columns())
    }

    /// Width covered by `span` columns starting at `column`
    pub fn span_width(&self, column: usize, span: usize) -> f32 {
        self.edge(column + span) - self.edge(column)
    }

    /// Left and right edge of a laid-out cell
    pub fn cell_edges(&self, doc: &Document, grid: &GridIndex, cell: NodeId) -> Option<(f32, f32)> {
        let (_, column) = grid.origin(cell)?;
        let span = doc.span(cell, COLSPAN);
        Some((self.edge(column), self.edge(column + span)))
    }

    /// First boundary within `tolerance` of `x`
    pub fn boundary_near(&self, x: f32, tolerance: f32) -> Option<usize> {
        self.edges.iter().position(|edge| (edge - x).abs() <= tolerance)
    }
}

/// Match a horizontal coordinate to a cell boundary within one row.
///
/// The first cell whose left edge lies within `tolerance` wins. Failing
/// that, a coordinate at or past the last cell's right edge (less the
/// tolerance) matches the row's tail.
pub fn resolve_column_boundary(
    doc: &Document,
    grid: &GridIndex,
    geometry: &TableGeometry,
    row: NodeId,
    x: f32,
    tolerance: f32,
) -> BoundaryMatch {
    let cells = doc.children(row);
    for &cell in cells {
        if let Some((left, _)) = geometry.cell_edges(doc, grid, cell) {
            if (left - x).abs() <= tolerance {
                return BoundaryMatch::Leading(cell);
            }
        }
    }

    if let Some(&last) = cells.last() {
        if let Some((_, right)) = geometry.cell_edges(doc, grid, last) {
            if x >= right - tolerance {
                return BoundaryMatch::Tail(last);
            }
        }
    }

    BoundaryMatch::Unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_model::attributes::{from_pairs, ROW};
    use tabula_model::{Attributes, NodeKind};

    fn three_columns(doc: &mut Document) -> (NodeId, NodeId, NodeId) {
        let table = doc.create(NodeKind::Table, Attributes::new()).unwrap();
        let group = doc.create(NodeKind::ColumnGroup, Attributes::new()).unwrap();
        for width in ["50", "100"] {
            let column = doc.create(NodeKind::Column, from_pairs([(WIDTH, width)])).unwrap();
            doc.append(group, column).unwrap();
        }
        let body = doc.create(NodeKind::Body, Attributes::new()).unwrap();
        let row = doc.create(NodeKind::Row, from_pairs([(ROW, "row-a")])).unwrap();
        for c in 0..3 {
            let cell = doc
                .create_cell(from_pairs([(ROW, "row-a")]), &format!("cell-{}", c))
                .unwrap();
            doc.append(row, cell).unwrap();
        }
        doc.append(table, group).unwrap();
        doc.append(table, body).unwrap();
        doc.append(body, row).unwrap();
        (table, body, row)
    }

    #[test]
    fn test_hints_padded_with_default_width() {
        let mut doc = Document::new();
        let (table, _, _) = three_columns(&mut doc);
        let geometry = TableGeometry::from_hints(&doc, table, 3, 80.0);
        assert_eq!(geometry.columns(), 3);
        assert_eq!(geometry.edge(1), 50.0);
        assert_eq!(geometry.edge(2), 150.0);
        assert_eq!(geometry.total_width(), 230.0);
    }

    #[test]
    fn test_resolve_within_tolerance() {
        let mut doc = Document::new();
        let (table, body, row) = three_columns(&mut doc);
        let grid = GridIndex::build(&doc, body);
        let geometry = TableGeometry::from_hints(&doc, table, 3, 100.0);
        let cells = doc.children(row).to_vec();

        assert_eq!(
            resolve_column_boundary(&doc, &grid, &geometry, row, 51.5, 2.0),
            BoundaryMatch::Leading(cells[1])
        );
        assert_eq!(
            resolve_column_boundary(&doc, &grid, &geometry, row, 52.0, 2.0),
            BoundaryMatch::Leading(cells[1])
        );
        assert_eq!(
            resolve_column_boundary(&doc, &grid, &geometry, row, 53.0, 2.0),
            BoundaryMatch::Unresolved
        );
        assert_eq!(
            resolve_column_boundary(&doc, &grid, &geometry, row, 249.0, 2.0),
            BoundaryMatch::Tail(cells[2])
        );
    }

    #[test]
    fn test_boundary_near() {
        let geometry = TableGeometry::from_widths(&[100.0, 100.0]);
        assert_eq!(geometry.boundary_near(101.0, 2.0), Some(1));
        assert_eq!(geometry.boundary_near(150.0, 2.0), None);
        assert_eq!(geometry.boundary_near(-1.0, 2.0), Some(0));
    }
}
