//! Conversion of pasted markup into attribute-tagged fragment lines.
//!
//! Rows are numbered by their 1-based position in the table and cells by
//! their 1-based position among sibling cells of the same tag. The editor
//! later remaps these positional ids to fresh unique ones.

use crate::markup::{MarkupElement, MarkupNode};
use tabula_model::attributes::{
    self, parse_length, Attributes, BORDER, CELL, CELL_SPACING, COLSPAN, HEADER, HEIGHT, LIST,
    ROW, ROWSPAN, STYLE, WIDTH,
};
use tabula_model::{ColumnHint, Fragment, FragmentItem, FragmentLine, TableFragment, TemporaryMarker};
use tracing::debug;

/// Attribute placed on the temporary table wrapper
pub const TEMPORARY_MARKER: &str = "data-table-temporary";

const TABLE_ATTRIBUTES: &[&str] = &[BORDER, CELL_SPACING, STYLE];
const CELL_ATTRIBUTES: &[&str] = &[WIDTH, HEIGHT, COLSPAN, ROWSPAN, STYLE];
const ROW_GROUPS: &[&str] = &["thead", "tbody", "tfoot"];
const BLOCKS: &[&str] = &["p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre"];

/// Where the paste lands
#[derive(Debug, Clone, Default)]
pub struct PasteContext {
    /// Formats of the cell the cursor is in, if any
    pub surrounding_cell: Option<Attributes>,
}

impl PasteContext {
    pub fn in_cell(attributes: Attributes) -> Self {
        Self {
            surrounding_cell: Some(attributes),
        }
    }
}

/// Normalize a pasted markup forest.
///
/// Content that already carries this model's markers, or a table pasted
/// into a cell, yields an empty fragment.
pub fn normalize(nodes: &[MarkupNode], context: &PasteContext) -> Fragment {
    if nodes.iter().any(carries_model_markers) {
        debug!("Skipping already normalized table content");
        return Fragment::default();
    }
    if context.surrounding_cell.is_some() && nodes.iter().any(|node| node.any_element(&|e| e.is("table"))) {
        debug!("Skipping table pasted inside a cell");
        return Fragment::default();
    }

    let mut items = Vec::new();
    let mut inline = String::new();
    for node in nodes {
        match node {
            MarkupNode::Element(element) if element.is("table") => {
                flush_inline(&mut inline, &mut items, context);
                items.push(FragmentItem::Table(normalize_table(element)));
            }
            MarkupNode::Element(element) if is_block(element) || is_list(element) => {
                flush_inline(&mut inline, &mut items, context);
                let mut lines = Vec::new();
                block_lines(element, &Attributes::new(), &mut lines);
                items.extend(
                    lines
                        .into_iter()
                        .map(|line| FragmentItem::Line(with_cell(line, context))),
                );
            }
            MarkupNode::Element(element) => inline.push_str(&element.text_content()),
            MarkupNode::Text { text } => inline.push_str(text),
        }
    }
    flush_inline(&mut inline, &mut items, context);

    Fragment { items }
}

/// Whether a subtree was produced by this model rather than pasted from
/// outside: a temporary table wrapper or a row tagged with a row-group id
pub fn carries_model_markers(node: &MarkupNode) -> bool {
    node.any_element(&|element| {
        element.attribute(TEMPORARY_MARKER).is_some() || (element.is("tr") && element.attribute(ROW).is_some())
    })
}

fn flush_inline(inline: &mut String, items: &mut Vec<FragmentItem>, context: &PasteContext) {
    let text = collapse_whitespace(inline);
    inline.clear();
    if text.is_empty() {
        return;
    }
    items.push(FragmentItem::Line(with_cell(
        FragmentLine::new(text, Attributes::new()),
        context,
    )));
}

/// Merge the surrounding cell's formats under the line's own
fn with_cell(mut line: FragmentLine, context: &PasteContext) -> FragmentLine {
    if let Some(cell) = &context.surrounding_cell {
        for (key, value) in cell {
            line.attributes.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    line
}

fn normalize_table(table: &MarkupElement) -> TableFragment {
    let marker = TemporaryMarker {
        attributes: pick(table, TABLE_ATTRIBUTES),
    };

    let mut columns = Vec::new();
    let mut rows = Vec::new();
    collect_table_parts(table, &mut columns, &mut rows);

    let mut lines = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let row_id = format!("row-{}", index + 1);
        normalize_row(row, &row_id, &mut lines);
    }

    debug!(rows = rows.len(), columns = columns.len(), lines = lines.len(), "Normalized table");
    TableFragment {
        marker,
        columns,
        lines,
    }
}

fn collect_table_parts<'a>(
    element: &'a MarkupElement,
    columns: &mut Vec<ColumnHint>,
    rows: &mut Vec<&'a MarkupElement>,
) {
    for child in element.elements() {
        if child.is("tr") {
            rows.push(child);
        } else if child.is("col") {
            expand_column(child, columns);
        } else if child.is("colgroup") || ROW_GROUPS.iter().any(|tag| child.is(tag)) {
            collect_table_parts(child, columns, rows);
        }
    }
}

/// A `<col span=N>` yields `N - 1` synthetic columns followed by the
/// explicit one carrying the width hint
fn expand_column(col: &MarkupElement, columns: &mut Vec<ColumnHint>) {
    let span = attributes::span(&col.attributes, "span");
    for _ in 1..span {
        columns.push(ColumnHint {
            width: None,
            synthetic: true,
        });
    }
    columns.push(ColumnHint {
        width: col.attribute(WIDTH).and_then(parse_length),
        synthetic: false,
    });
}

fn normalize_row(row: &MarkupElement, row_id: &str, lines: &mut Vec<FragmentLine>) {
    let mut td_position = 0;
    let mut th_position = 0;

    for cell in row.elements() {
        let header = cell.is("th");
        if !header && !cell.is("td") {
            continue;
        }
        let position = if header {
            th_position += 1;
            th_position
        } else {
            td_position += 1;
            td_position
        };

        let content_id = cell
            .find_attribute(CELL)
            .map(str::to_string)
            .unwrap_or_else(|| format!("cell-{}-{}", cell.tag, position));
        let mut cell_attributes = pick(cell, CELL_ATTRIBUTES);
        cell_attributes.insert(
            ROW.to_string(),
            cell.attribute(ROW).unwrap_or(row_id).to_string(),
        );
        cell_attributes.insert(CELL.to_string(), content_id);

        let mut cell_lines = Vec::new();
        cell_content(cell, &cell_attributes, &mut cell_lines);
        if cell_lines.is_empty() {
            cell_lines.push(FragmentLine::new("", cell_attributes.clone()));
        }
        if header {
            if let Some(last) = cell_lines.last_mut() {
                if !last.text.ends_with('\n') {
                    last.text.push('\n');
                }
            }
        }
        lines.extend(cell_lines);
    }
}

/// Lines of a cell: block children each become a line, runs of inline
/// content between them are gathered into one
fn cell_content(cell: &MarkupElement, base: &Attributes, lines: &mut Vec<FragmentLine>) {
    let mut inline = String::new();
    let flush = |inline: &mut String, lines: &mut Vec<FragmentLine>| {
        let text = collapse_whitespace(inline);
        inline.clear();
        if !text.is_empty() {
            lines.push(FragmentLine::new(text, base.clone()));
        }
    };

    for child in &cell.children {
        match child {
            MarkupNode::Element(element) if element.is("table") => {
                debug!("Ignoring table nested in pasted cell");
            }
            MarkupNode::Element(element) if is_block(element) || is_list(element) => {
                flush(&mut inline, lines);
                block_lines(element, base, lines);
            }
            MarkupNode::Element(element) if element.is("br") => inline.push('\n'),
            MarkupNode::Element(element) => inline.push_str(&element.text_content()),
            MarkupNode::Text { text } => inline.push_str(text),
        }
    }
    flush(&mut inline, lines);
}

/// Lines of a block-level element, with header and list formats
fn block_lines(element: &MarkupElement, base: &Attributes, lines: &mut Vec<FragmentLine>) {
    if is_list(element) {
        let kind = if element.is("ol") { "ordered" } else { "bullet" };
        for item in element.elements().filter(|e| e.is("li")) {
            let mut attributes = base.clone();
            attributes.insert(LIST.to_string(), kind.to_string());
            lines.push(FragmentLine::new(collapse_whitespace(&item.text_content()), attributes));
        }
        return;
    }

    let mut attributes = base.clone();
    if let Some(level) = heading_level(element) {
        attributes.insert(HEADER.to_string(), level.to_string());
    }
    if element.is("li") {
        attributes.insert(LIST.to_string(), "bullet".to_string());
    }
    lines.push(FragmentLine::new(collapse_whitespace(&element.text_content()), attributes));
}

fn is_block(element: &MarkupElement) -> bool {
    BLOCKS.iter().any(|tag| element.is(tag))
}

fn is_list(element: &MarkupElement) -> bool {
    element.is("ul") || element.is("ol")
}

fn heading_level(element: &MarkupElement) -> Option<u8> {
    let tag = element.tag.to_ascii_lowercase();
    let level = tag.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

fn pick(element: &MarkupElement, keys: &[&str]) -> Attributes {
    keys.iter()
        .filter_map(|key| {
            element
                .attribute(key)
                .map(|value| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// Collapse whitespace runs within each line and trim the ends; explicit
/// line breaks survive
fn collapse_whitespace(text: &str) -> String {
    text.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_model::attributes::from_pairs;

    fn el(tag: &str, attributes: &[(&str, &str)], children: Vec<MarkupNode>) -> MarkupNode {
        MarkupNode::element(tag, from_pairs(attributes.iter().copied()), children)
    }

    fn text(value: &str) -> MarkupNode {
        MarkupNode::text(value)
    }

    fn lines(fragment: &Fragment) -> Vec<FragmentLine> {
        fragment.tables().flat_map(|t| t.lines.clone()).collect()
    }

    #[test]
    fn test_row_and_cell_ids_are_positional() {
        let table = el(
            "table",
            &[("border", "1")],
            vec![el(
                "tbody",
                &[],
                vec![
                    el("tr", &[], vec![el("td", &[], vec![text("a")]), el("td", &[], vec![text("b")])]),
                    el("tr", &[], vec![el("td", &[("colspan", "2")], vec![text("c")])]),
                ],
            )],
        );

        let fragment = normalize(&[table], &PasteContext::default());
        let table = fragment.tables().next().unwrap();
        assert_eq!(table.marker.attributes, from_pairs([("border", "1")]));

        let lines = &table.lines;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].attributes.get(ROW).unwrap(), "row-1");
        assert_eq!(lines[1].attributes.get(CELL).unwrap(), "cell-td-2");
        assert_eq!(lines[2].attributes.get(ROW).unwrap(), "row-2");
        assert_eq!(lines[2].attributes.get(COLSPAN).unwrap(), "2");
        assert_eq!(lines[2].text, "c");
    }

    #[test]
    fn test_header_cells_end_with_line_break() {
        let table = el(
            "table",
            &[],
            vec![el(
                "tr",
                &[],
                vec![el("th", &[], vec![text("Name")]), el("td", &[], vec![text("x")])],
            )],
        );

        let lines = lines(&normalize(&[table], &PasteContext::default()));
        assert_eq!(lines[0].text, "Name\n");
        assert_eq!(lines[0].attributes.get(CELL).unwrap(), "cell-th-1");
        assert_eq!(lines[1].text, "x");
        assert_eq!(lines[1].attributes.get(CELL).unwrap(), "cell-td-1");
    }

    #[test]
    fn test_col_span_expansion() {
        let table = el(
            "table",
            &[],
            vec![
                el("colgroup", &[], vec![el("col", &[("span", "3"), ("width", "40")], vec![])]),
                el("tr", &[], vec![el("td", &[], vec![])]),
            ],
        );

        let fragment = normalize(&[table], &PasteContext::default());
        let columns = &fragment.tables().next().unwrap().columns;
        assert_eq!(columns.len(), 3);
        assert!(columns[0].synthetic && columns[1].synthetic);
        assert_eq!(columns[0].width, None);
        assert_eq!(columns[2].width, Some(40.0));
        assert!(!columns[2].synthetic);
    }

    #[test]
    fn test_col_span_is_clamped() {
        let table = el(
            "table",
            &[],
            vec![
                el("col", &[("span", "4294967295")], vec![]),
                el("tr", &[], vec![el("td", &[], vec![])]),
            ],
        );

        let fragment = normalize(&[table], &PasteContext::default());
        let columns = &fragment.tables().next().unwrap().columns;
        assert_eq!(columns.len(), attributes::MAX_COLSPAN);
    }

    #[test]
    fn test_empty_cell_yields_one_line() {
        let table = el("table", &[], vec![el("tr", &[], vec![el("td", &[], vec![text("  ")])])]);
        let lines = lines(&normalize(&[table], &PasteContext::default()));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "");
    }

    #[test]
    fn test_block_children_become_lines() {
        let table = el(
            "table",
            &[],
            vec![el(
                "tr",
                &[],
                vec![el(
                    "td",
                    &[],
                    vec![
                        el("h2", &[], vec![text("Title")]),
                        el("p", &[], vec![text("  body\n text ")]),
                        el("ul", &[], vec![el("li", &[], vec![text("one")])]),
                    ],
                )],
            )],
        );

        let lines = lines(&normalize(&[table], &PasteContext::default()));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].attributes.get(HEADER).unwrap(), "2");
        assert_eq!(lines[1].text, "body\ntext");
        assert_eq!(lines[2].attributes.get(LIST).unwrap(), "bullet");
        assert!(lines.iter().all(|l| l.attributes.get(CELL).unwrap() == "cell-td-1"));
    }

    #[test]
    fn test_nested_content_marker_wins() {
        let table = el(
            "table",
            &[],
            vec![el(
                "tr",
                &[],
                vec![el("td", &[], vec![el("p", &[("data-cell", "cell-keep")], vec![text("k")])])],
            )],
        );

        let lines = lines(&normalize(&[table], &PasteContext::default()));
        assert_eq!(lines[0].attributes.get(CELL).unwrap(), "cell-keep");
    }

    #[test]
    fn test_loop_guard() {
        let marked = el(
            "table",
            &[(TEMPORARY_MARKER, "true")],
            vec![el("tr", &[], vec![el("td", &[], vec![text("a")])])],
        );
        assert!(normalize(&[marked], &PasteContext::default()).is_empty());

        let tagged_row = el(
            "table",
            &[],
            vec![el("tr", &[("data-row", "row-x")], vec![el("td", &[], vec![])])],
        );
        assert!(normalize(&[tagged_row], &PasteContext::default()).is_empty());
    }

    #[test]
    fn test_table_inside_cell_is_discarded() {
        let table = el("table", &[], vec![el("tr", &[], vec![el("td", &[], vec![text("a")])])]);
        let context = PasteContext::in_cell(from_pairs([(ROW, "row-1"), (CELL, "cell-1")]));
        assert!(normalize(&[table], &context).is_empty());
    }

    #[test]
    fn test_headers_inside_cell_get_cell_formats() {
        let context = PasteContext::in_cell(from_pairs([(ROW, "row-9"), (CELL, "cell-9")]));
        let nodes = vec![
            el("h1", &[], vec![text("Heading")]),
            el("ol", &[], vec![el("li", &[], vec![text("first")])]),
        ];

        let fragment = normalize(&nodes, &context);
        let lines: Vec<_> = fragment.loose_lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].attributes.get(HEADER).unwrap(), "1");
        assert_eq!(lines[0].attributes.get(ROW).unwrap(), "row-9");
        assert_eq!(lines[1].attributes.get(LIST).unwrap(), "ordered");
        assert_eq!(lines[1].attributes.get(CELL).unwrap(), "cell-9");
    }
}
