//! Attribute-tagged content produced by paste normalization.
//!
//! A fragment is not yet part of any document. The editor turns it into
//! validated nodes, so nothing here is checked against the schema.

use crate::attributes::Attributes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub items: Vec<FragmentItem>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableFragment> {
        self.items.iter().filter_map(|item| match item {
            FragmentItem::Table(table) => Some(table),
            FragmentItem::Line(_) => None,
        })
    }

    pub fn loose_lines(&self) -> impl Iterator<Item = &FragmentLine> {
        self.items.iter().filter_map(|item| match item {
            FragmentItem::Line(line) => Some(line),
            FragmentItem::Table(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FragmentItem {
    Table(TableFragment),
    Line(FragmentLine),
}

/// One table's worth of normalized content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableFragment {
    pub marker: TemporaryMarker,
    #[serde(default)]
    pub columns: Vec<ColumnHint>,
    pub lines: Vec<FragmentLine>,
}

/// Placeholder for table-level attributes pending conversion into a
/// validated table node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporaryMarker {
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnHint {
    pub width: Option<f32>,
    /// Expanded from a spanning `<col>`
    #[serde(default)]
    pub synthetic: bool,
}

/// Text of one line plus the formats it carries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentLine {
    pub text: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl FragmentLine {
    pub fn new(text: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            text: text.into(),
            attributes,
        }
    }
}
