//! Markup emitted when table content is copied back out of the editor.
//!
//! Tables are wrapped with [`TEMPORARY_MARKER`] and their rows tagged with
//! row-group ids, so pasting the output back in is recognized by
//! [`normalize`](crate::normalize) and left to the host's own handling.

use crate::markup::MarkupNode;
use crate::normalize::TEMPORARY_MARKER;
use tabula_model::attributes::{format_length, Attributes, CELL, HEADER, LIST, ROW, WIDTH};
use tabula_model::{Fragment, FragmentItem, FragmentLine, TableFragment};

pub fn to_markup(fragment: &Fragment) -> Vec<MarkupNode> {
    fragment
        .items
        .iter()
        .map(|item| match item {
            FragmentItem::Table(table) => table_markup(table),
            FragmentItem::Line(line) => line_markup(line, &Attributes::new()),
        })
        .collect()
}

fn table_markup(table: &TableFragment) -> MarkupNode {
    let mut attributes = table.marker.attributes.clone();
    attributes.insert(TEMPORARY_MARKER.to_string(), "true".to_string());

    let mut children = Vec::new();
    if !table.columns.is_empty() {
        let cols = table
            .columns
            .iter()
            .map(|column| {
                let mut col = Attributes::new();
                if let Some(width) = column.width {
                    col.insert(WIDTH.to_string(), format_length(width));
                }
                MarkupNode::element("col", col, Vec::new())
            })
            .collect();
        children.push(MarkupNode::element("colgroup", Attributes::new(), cols));
    }

    let rows = group_by(&table.lines, ROW)
        .into_iter()
        .map(|(row_id, lines)| {
            let cells = group_by(&lines, CELL)
                .into_iter()
                .map(|(_, cell_lines)| cell_markup(&cell_lines))
                .collect();
            let mut row = Attributes::new();
            if let Some(id) = row_id {
                row.insert(ROW.to_string(), id);
            }
            MarkupNode::element("tr", row, cells)
        })
        .collect();
    children.push(MarkupNode::element("tbody", Attributes::new(), rows));

    MarkupNode::element("table", attributes, children)
}

/// A `td` carrying the cell attributes of its first line; block formats
/// stay on the paragraphs
fn cell_markup(lines: &[FragmentLine]) -> MarkupNode {
    let mut cell = lines
        .first()
        .map(|line| line.attributes.clone())
        .unwrap_or_default();
    cell.remove(HEADER);
    cell.remove(LIST);

    let blocks = lines
        .iter()
        .map(|line| {
            let mut block = Attributes::new();
            if let Some(id) = line.attributes.get(CELL) {
                block.insert(CELL.to_string(), id.clone());
            }
            line_markup(line, &block)
        })
        .collect();
    MarkupNode::element("td", cell, blocks)
}

fn line_markup(line: &FragmentLine, attributes: &Attributes) -> MarkupNode {
    let tag = match (line.attributes.get(HEADER), line.attributes.get(LIST)) {
        (Some(level), _) => format!("h{}", level),
        (None, Some(_)) => "li".to_string(),
        (None, None) => "p".to_string(),
    };
    let mut attributes = attributes.clone();
    if let Some(kind) = line.attributes.get(LIST) {
        attributes.insert(LIST.to_string(), kind.clone());
    }
    MarkupNode::element(&tag, attributes, text_nodes(&line.text))
}

/// Text split on line breaks, with `<br>` between the pieces
fn text_nodes(text: &str) -> Vec<MarkupNode> {
    let mut nodes = Vec::new();
    for (index, piece) in text.split('\n').enumerate() {
        if index > 0 {
            nodes.push(MarkupNode::element("br", Attributes::new(), Vec::new()));
        }
        if !piece.is_empty() {
            nodes.push(MarkupNode::text(piece));
        }
    }
    nodes
}

/// Consecutive runs of lines sharing the value of `key`
fn group_by(lines: &[FragmentLine], key: &str) -> Vec<(Option<String>, Vec<FragmentLine>)> {
    let mut groups: Vec<(Option<String>, Vec<FragmentLine>)> = Vec::new();
    for line in lines {
        let value = line.attributes.get(key).cloned();
        match groups.last_mut() {
            Some((current, members)) if *current == value => members.push(line.clone()),
            _ => groups.push((value, vec![line.clone()])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, PasteContext};
    use tabula_model::attributes::from_pairs;
    use tabula_model::{ColumnHint, TemporaryMarker};

    fn cell_line(text: &str, row: &str, cell: &str) -> FragmentLine {
        FragmentLine::new(text, from_pairs([(ROW, row), (CELL, cell)]))
    }

    fn sample() -> Fragment {
        Fragment {
            items: vec![FragmentItem::Table(TableFragment {
                marker: TemporaryMarker {
                    attributes: from_pairs([("border", "1")]),
                },
                columns: vec![
                    ColumnHint {
                        width: Some(80.0),
                        synthetic: false,
                    },
                    ColumnHint {
                        width: Some(120.0),
                        synthetic: false,
                    },
                ],
                lines: vec![
                    cell_line("a", "row-1", "cell-1"),
                    cell_line("a2", "row-1", "cell-1"),
                    cell_line("b", "row-1", "cell-2"),
                    cell_line("c", "row-2", "cell-3"),
                    cell_line("d", "row-2", "cell-4"),
                ],
            })],
        }
    }

    #[test]
    fn test_table_structure() {
        let markup = to_markup(&sample());
        assert_eq!(markup.len(), 1);

        let table = markup[0].as_element().unwrap();
        assert!(table.is("table"));
        assert_eq!(table.attribute(TEMPORARY_MARKER), Some("true"));
        assert_eq!(table.attribute("border"), Some("1"));

        let colgroup = table.elements().find(|e| e.is("colgroup")).unwrap();
        let widths: Vec<_> = colgroup.elements().map(|c| c.attribute(WIDTH)).collect();
        assert_eq!(widths, vec![Some("80"), Some("120")]);

        let tbody = table.elements().find(|e| e.is("tbody")).unwrap();
        let rows: Vec<_> = tbody.elements().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].attribute(ROW), Some("row-1"));

        let cells: Vec<_> = rows[0].elements().collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].elements().count(), 2);
        assert_eq!(cells[0].text_content(), "aa2");
    }

    #[test]
    fn test_output_is_not_re_pasted() {
        let markup = to_markup(&sample());
        assert!(normalize(&markup, &PasteContext::default()).is_empty());
    }

    #[test]
    fn test_loose_lines() {
        let fragment = Fragment {
            items: vec![
                FragmentItem::Line(FragmentLine::new("Title", from_pairs([(HEADER, "2")]))),
                FragmentItem::Line(FragmentLine::new("item", from_pairs([(LIST, "bullet")]))),
                FragmentItem::Line(FragmentLine::new("one\ntwo", Attributes::new())),
            ],
        };

        let markup = to_markup(&fragment);
        let tags: Vec<_> = markup
            .iter()
            .map(|node| node.as_element().unwrap().tag.clone())
            .collect();
        assert_eq!(tags, vec!["h2", "li", "p"]);
        assert_eq!(markup[2].as_element().unwrap().text_content(), "one\ntwo");
    }
}
