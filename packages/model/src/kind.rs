//! Closed set of node kinds and their capability table.

use crate::attributes::{
    BORDER, CELL, CELL_SPACING, COLSPAN, HEADER, HEIGHT, LIST, ROW, ROWSPAN, STYLE, WIDTH,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Host document root
    Root,
    /// Host text line outside any table
    Paragraph,
    Table,
    ColumnGroup,
    Column,
    Body,
    Row,
    Cell,
    /// Content block inside a cell
    Block,
}

/// Static capabilities of a node kind
#[derive(Debug)]
pub struct KindSpec {
    pub name: &'static str,
    /// Kinds allowed to hold this kind as a direct child
    pub parents: &'static [NodeKind],
    /// Recognized attribute keys
    pub attributes: &'static [&'static str],
    /// Leaf kinds occupy exactly one line of the document
    pub line: bool,
    /// Attribute a parent compares across its children for merge eligibility
    pub identity: Option<&'static str>,
}

static ROOT: KindSpec = KindSpec {
    name: "root",
    parents: &[],
    attributes: &[],
    line: false,
    identity: None,
};

static PARAGRAPH: KindSpec = KindSpec {
    name: "paragraph",
    parents: &[NodeKind::Root],
    attributes: &[HEADER, LIST],
    line: true,
    identity: None,
};

static TABLE: KindSpec = KindSpec {
    name: "table",
    parents: &[NodeKind::Root, NodeKind::Cell],
    attributes: &[BORDER, CELL_SPACING, STYLE, WIDTH],
    line: false,
    identity: None,
};

static COLUMN_GROUP: KindSpec = KindSpec {
    name: "column-group",
    parents: &[NodeKind::Table],
    attributes: &[],
    line: false,
    identity: None,
};

static COLUMN: KindSpec = KindSpec {
    name: "column",
    parents: &[NodeKind::ColumnGroup],
    attributes: &[WIDTH],
    line: true,
    identity: None,
};

static BODY: KindSpec = KindSpec {
    name: "body",
    parents: &[NodeKind::Table],
    attributes: &[],
    line: false,
    identity: None,
};

static ROW_SPEC: KindSpec = KindSpec {
    name: "row",
    parents: &[NodeKind::Body],
    attributes: &[ROW],
    line: false,
    identity: Some(ROW),
};

static CELL_SPEC: KindSpec = KindSpec {
    name: "cell",
    parents: &[NodeKind::Row],
    attributes: &[ROW, WIDTH, HEIGHT, COLSPAN, ROWSPAN, STYLE],
    line: false,
    identity: Some(ROW),
};

static BLOCK: KindSpec = KindSpec {
    name: "block",
    parents: &[NodeKind::Cell],
    attributes: &[CELL, HEADER, LIST],
    line: true,
    identity: Some(CELL),
};

impl NodeKind {
    pub fn spec(self) -> &'static KindSpec {
        match self {
            NodeKind::Root => &ROOT,
            NodeKind::Paragraph => &PARAGRAPH,
            NodeKind::Table => &TABLE,
            NodeKind::ColumnGroup => &COLUMN_GROUP,
            NodeKind::Column => &COLUMN,
            NodeKind::Body => &BODY,
            NodeKind::Row => &ROW_SPEC,
            NodeKind::Cell => &CELL_SPEC,
            NodeKind::Block => &BLOCK,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn can_contain(self, child: NodeKind) -> bool {
        child.spec().parents.contains(&self)
    }

    pub fn accepts_attribute(self, key: &str) -> bool {
        self.spec().attributes.contains(&key)
    }

    /// Whether this kind is a single document line
    pub fn is_line(self) -> bool {
        self.spec().line
    }

    /// Whether this kind holds editable text
    pub fn has_text(self) -> bool {
        matches!(self, NodeKind::Paragraph | NodeKind::Block)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
