//! Conversion of normalized clipboard fragments into document nodes.
//!
//! A table fragment arrives as a flat list of lines, one per cell block.
//! Each line first becomes its own row/cell/block chain; adjacent chains
//! sharing a row or cell identity are then coalesced back into one row or
//! cell, ids are replaced with fresh ones and the grid is balanced.

use crate::context::EditContext;
use crate::grid::{self, GridIndex};
use crate::mutations::{MutationError, Outcome};
use crate::tables::root_index_at;
use std::collections::HashMap;
use tabula_model::attributes::{self, format_length, CELL, ROW, WIDTH};
use tabula_model::{
    Attributes, Fragment, FragmentItem, FragmentLine, NodeId, NodeKind, TableFragment,
};
use tracing::{debug, info, warn};

/// Build a detached table from a fragment, `None` when it has no lines
pub fn build_table(ctx: &mut EditContext, fragment: &TableFragment) -> Result<Option<NodeId>, MutationError> {
    if fragment.lines.is_empty() {
        return Ok(None);
    }

    let table = ctx
        .doc
        .create(NodeKind::Table, accepted(NodeKind::Table, &fragment.marker.attributes))?;
    let body = ctx.doc.create(NodeKind::Body, Attributes::new())?;
    ctx.doc.append(table, body)?;

    let mut row_ids: HashMap<String, String> = HashMap::new();
    let mut cell_ids: HashMap<(String, String), String> = HashMap::new();

    for (index, line) in fragment.lines.iter().enumerate() {
        let source_row = line.attributes.get(ROW).cloned().unwrap_or_default();
        let source_cell = line
            .attributes
            .get(CELL)
            .cloned()
            .unwrap_or_else(|| index.to_string());

        let row_id = row_ids
            .entry(source_row.clone())
            .or_insert_with(|| ctx.ids.row_id())
            .clone();
        let content_id = cell_ids
            .entry((source_row, source_cell))
            .or_insert_with(|| ctx.ids.cell_id())
            .clone();

        let row = ctx
            .doc
            .create(NodeKind::Row, attributes::from_pairs([(ROW, row_id.as_str())]))?;
        let mut cell_attributes = accepted(NodeKind::Cell, &line.attributes);
        cell_attributes.insert(ROW.to_string(), row_id);
        let cell = ctx.doc.create(NodeKind::Cell, cell_attributes)?;

        let mut block_attributes = accepted(NodeKind::Block, &line.attributes);
        block_attributes.insert(CELL.to_string(), content_id);
        for text in split_lines(&line.text) {
            let block = ctx.doc.create_text(NodeKind::Block, text, block_attributes.clone())?;
            ctx.doc.append(cell, block)?;
        }

        ctx.doc.append(row, cell)?;
        ctx.doc.append(body, row)?;
    }

    let merged = grid::coalesce_body(ctx.doc, body)?;

    let width = GridIndex::build(ctx.doc, body).width();
    let group = ctx.doc.create(NodeKind::ColumnGroup, Attributes::new())?;
    for i in 0..width.max(fragment.columns.len()) {
        let hint = fragment
            .columns
            .get(i)
            .and_then(|column| column.width)
            .filter(|width| *width > 0.0)
            .unwrap_or(ctx.config.default_column_width);
        let column = ctx.doc.create(
            NodeKind::Column,
            attributes::from_pairs([(WIDTH, format_length(hint).as_str())]),
        )?;
        ctx.doc.append(group, column)?;
    }
    ctx.doc.insert(table, 0, group)?;

    let padded = grid::balance(ctx, body)?;
    debug!(
        lines = fragment.lines.len(),
        merged,
        padded = padded.len(),
        "Built table from fragment"
    );
    Ok(Some(table))
}

/// Insert normalized clipboard content at a document offset.
///
/// Inside a cell only loose lines are taken: they become blocks of that
/// cell. Elsewhere tables and lines are placed among the root's children.
pub fn paste(ctx: &mut EditContext, position: usize, fragment: &Fragment) -> Result<Outcome, MutationError> {
    if fragment.is_empty() {
        return Ok(Outcome::noop());
    }

    let location = ctx
        .doc
        .locate(position)
        .filter(|_| position < ctx.doc.document_len());
    let in_cell = location.filter(|location| ctx.doc.is_kind(location.line, NodeKind::Block));
    if let Some(location) = in_cell {
        return paste_into_cell(ctx, location.line, fragment);
    }

    let root = ctx.doc.root();
    let mut index = root_index_at(ctx.doc, position);
    let mut last = None;
    for item in &fragment.items {
        let nodes: Vec<NodeId> = match item {
            FragmentItem::Table(table) => build_table(ctx, table)?.into_iter().collect(),
            FragmentItem::Line(line) => paragraphs(ctx, line)?,
        };
        for node in nodes {
            ctx.doc.insert(root, index, node)?;
            index += 1;
            last = Some(node);
        }
    }

    let Some(last) = last else {
        return Ok(Outcome::noop());
    };
    let cursor = ctx.doc.offset(last).map(|offset| offset + ctx.doc.len(last));
    info!(items = fragment.items.len(), "Pasted fragment");
    Ok(Outcome::applied().with_cursor(cursor))
}

fn paste_into_cell(ctx: &mut EditContext, block: NodeId, fragment: &Fragment) -> Result<Outcome, MutationError> {
    if fragment.tables().next().is_some() {
        warn!("Dropping tables pasted inside a cell");
    }

    let content_id = ctx
        .doc
        .attribute(block, CELL)
        .map(str::to_string)
        .unwrap_or_else(|| ctx.ids.cell_id());

    let mut anchor = block;
    for line in fragment.loose_lines() {
        let mut block_attributes = accepted(NodeKind::Block, &line.attributes);
        block_attributes.insert(CELL.to_string(), content_id.clone());
        for text in split_lines(&line.text) {
            let fresh = ctx.doc.create_text(NodeKind::Block, text, block_attributes.clone())?;
            ctx.doc.insert_after(anchor, fresh)?;
            anchor = fresh;
        }
    }

    if anchor == block {
        return Ok(Outcome::noop());
    }
    let cursor = ctx.doc.offset(anchor).map(|offset| offset + ctx.doc.len(anchor));
    Ok(Outcome::applied().with_cursor(cursor))
}

fn paragraphs(ctx: &mut EditContext, line: &FragmentLine) -> Result<Vec<NodeId>, MutationError> {
    let formats = accepted(NodeKind::Paragraph, &line.attributes);
    split_lines(&line.text)
        .map(|text| {
            ctx.doc
                .create_text(NodeKind::Paragraph, text, formats.clone())
                .map_err(MutationError::from)
        })
        .collect()
}

/// Attributes a kind accepts with a valid value; others are dropped
fn accepted(kind: NodeKind, source: &Attributes) -> Attributes {
    source
        .iter()
        .filter(|(key, value)| {
            kind.accepts_attribute(key) && attributes::validate_value(key, value).is_ok()
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Text lines of a fragment line; a single trailing newline terminates the
/// line rather than opening a new one
fn split_lines<'a>(text: &'a str) -> impl Iterator<Item = &'a str> {
    text.strip_suffix('\n').unwrap_or(text).split('\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tabula_model::attributes::{from_pairs, COLSPAN};
    use tabula_model::{ColumnHint, Document, IdGenerator};

    fn line(text: &str, row: &str, cell: &str) -> FragmentLine {
        FragmentLine::new(text, from_pairs([(ROW, row), (CELL, cell)]))
    }

    #[test]
    fn test_lines_coalesce_into_rows_and_cells() {
        let mut doc = Document::new();
        let mut ids = IdGenerator::seeded(3);
        let config = EngineConfig::default();
        let mut ctx = EditContext::new(&mut doc, &mut ids, &config);

        let fragment = TableFragment {
            lines: vec![
                line("a", "row-1", "cell-1"),
                line("a2", "row-1", "cell-1"),
                line("b", "row-1", "cell-2"),
                line("c", "row-2", "cell-1"),
            ],
            ..TableFragment::default()
        };
        let table = build_table(&mut ctx, &fragment).unwrap().unwrap();

        let rows = doc.rows(table).to_vec();
        assert_eq!(rows.len(), 2);
        assert_eq!(doc.children(rows[0]).len(), 2);
        assert_eq!(doc.children(doc.children(rows[0])[0]).len(), 2);
        // second row padded to two columns
        assert_eq!(doc.children(rows[1]).len(), 2);

        let row_id = doc.attribute(rows[0], ROW).unwrap();
        assert_ne!(row_id, "row-1");
        assert_eq!(doc.column_group(table).map(|g| doc.children(g).len()), Some(2));
    }

    #[test]
    fn test_column_hints_become_columns() {
        let mut doc = Document::new();
        let mut ids = IdGenerator::seeded(3);
        let config = EngineConfig::default();
        let mut ctx = EditContext::new(&mut doc, &mut ids, &config);

        let fragment = TableFragment {
            columns: vec![
                ColumnHint { width: None, synthetic: true },
                ColumnHint { width: Some(40.0), synthetic: false },
            ],
            lines: vec![FragmentLine::new(
                "wide",
                from_pairs([(ROW, "row-1"), (CELL, "cell-1"), (COLSPAN, "2")]),
            )],
            ..TableFragment::default()
        };
        let table = build_table(&mut ctx, &fragment).unwrap().unwrap();

        let group = doc.column_group(table).unwrap();
        let widths: Vec<_> = doc
            .children(group)
            .iter()
            .map(|c| doc.attribute(*c, WIDTH).unwrap().to_string())
            .collect();
        assert_eq!(widths, vec!["100", "40"]);
    }

    #[test]
    fn test_paste_lines_inside_cell() {
        let mut doc = Document::new();
        let mut ids = IdGenerator::seeded(3);
        let config = EngineConfig::default();
        let mut ctx = EditContext::new(&mut doc, &mut ids, &config);

        let table = crate::tables::insert_table(&mut ctx, 1, 1, 1).unwrap().inserted.unwrap();
        let cell = doc.cells(table)[0];
        let block = doc.children(cell)[0];
        let position = doc.offset(block).unwrap();

        let fragment = Fragment {
            items: vec![FragmentItem::Line(FragmentLine::new(
                "Title",
                from_pairs([("header", "1")]),
            ))],
        };
        let mut ctx = EditContext::new(&mut doc, &mut ids, &config);
        let outcome = paste(&mut ctx, position, &fragment).unwrap();

        assert!(outcome.applied);
        let blocks = doc.children(cell).to_vec();
        assert_eq!(blocks.len(), 2);
        assert_eq!(doc.attribute(blocks[1], "header"), Some("1"));
        assert_eq!(doc.attribute(blocks[1], CELL), doc.attribute(blocks[0], CELL));
    }
}
