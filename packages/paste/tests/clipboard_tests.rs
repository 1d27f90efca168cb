//! Clipboard markup as delivered by a host, read from JSON

use tabula_model::attributes::{CELL, COLSPAN, ROW, WIDTH};
use tabula_paste::{normalize, to_markup, MarkupNode, PasteContext};

fn parse(json: &str) -> Vec<MarkupNode> {
    serde_json::from_str(json).expect("markup json")
}

const SPREADSHEET_TABLE: &str = r#"[
    {"type": "element", "tag": "TABLE", "attributes": {"border": "1", "class": "grid"}, "children": [
        {"type": "element", "tag": "colgroup", "children": [
            {"type": "element", "tag": "col", "attributes": {"span": "2", "width": "64"}},
            {"type": "element", "tag": "col", "attributes": {"width": "90"}}
        ]},
        {"type": "element", "tag": "thead", "children": [
            {"type": "element", "tag": "tr", "children": [
                {"type": "element", "tag": "th", "attributes": {"colspan": "3"}, "children": [
                    {"type": "text", "text": "Quarterly   totals"}
                ]}
            ]}
        ]},
        {"type": "element", "tag": "tbody", "children": [
            {"type": "element", "tag": "tr", "children": [
                {"type": "element", "tag": "td", "attributes": {"width": "64"}, "children": [{"type": "text", "text": "Q1"}]},
                {"type": "element", "tag": "td", "children": [{"type": "text", "text": "10"}]},
                {"type": "element", "tag": "td", "children": []}
            ]}
        ]}
    ]}
]"#;

#[test]
fn test_spreadsheet_table() {
    let fragment = normalize(&parse(SPREADSHEET_TABLE), &PasteContext::default());
    let table = fragment.tables().next().expect("table");

    assert_eq!(table.marker.attributes.get("border").map(String::as_str), Some("1"));
    assert!(!table.marker.attributes.contains_key("class"));

    let widths: Vec<_> = table.columns.iter().map(|c| c.width).collect();
    assert_eq!(widths, vec![None, Some(64.0), Some(90.0)]);

    let lines = &table.lines;
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0].text, "Quarterly totals\n");
    assert_eq!(lines[0].attributes.get(COLSPAN).map(String::as_str), Some("3"));
    assert_eq!(lines[0].attributes.get(ROW).map(String::as_str), Some("row-1"));
    assert_eq!(lines[1].attributes.get(ROW).map(String::as_str), Some("row-2"));
    assert_eq!(lines[1].attributes.get(WIDTH).map(String::as_str), Some("64"));
    assert_eq!(lines[3].text, "");
    assert_eq!(lines[3].attributes.get(CELL).map(String::as_str), Some("cell-td-3"));
}

#[test]
fn test_copy_then_paste_is_recognized() {
    let fragment = normalize(&parse(SPREADSHEET_TABLE), &PasteContext::default());
    let copied = to_markup(&fragment);

    let json = serde_json::to_string(&copied).expect("serialize");
    let reparsed = parse(&json);
    assert!(normalize(&reparsed, &PasteContext::default()).is_empty());
}

#[test]
fn test_loose_text_around_table() {
    let json = r#"[
        {"type": "text", "text": "before "},
        {"type": "element", "tag": "b", "children": [{"type": "text", "text": "bold"}]},
        {"type": "element", "tag": "table", "children": [
            {"type": "element", "tag": "tr", "children": [
                {"type": "element", "tag": "td", "children": [{"type": "text", "text": "x"}]}
            ]}
        ]},
        {"type": "element", "tag": "p", "children": [{"type": "text", "text": "after"}]}
    ]"#;

    let fragment = normalize(&parse(json), &PasteContext::default());
    assert_eq!(fragment.items.len(), 3);

    let loose: Vec<_> = fragment.loose_lines().map(|l| l.text.as_str()).collect();
    assert_eq!(loose, vec!["before bold", "after"]);
}
