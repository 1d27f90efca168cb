//! Flattened, line-oriented view of a document.
//!
//! The host editor sees the document as a sequence of lines: paragraphs,
//! column embeds and cell content blocks. Each line carries the merged
//! formats the host needs to rebuild the structure around it.

use crate::attributes::{self, Attributes, TABLE_COL, WIDTH};
use crate::kind::NodeKind;
use crate::tree::{Document, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertValue {
    /// Line text including its trailing newline
    Text(String),
    /// Single-unit embed
    Embed(Attributes),
}

impl InsertValue {
    pub fn len(&self) -> usize {
        match self {
            InsertValue::Text(text) => text.chars().count(),
            InsertValue::Embed(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One document line with its formats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: NodeId,
    pub insert: InsertValue,
    pub attributes: Attributes,
}

impl Line {
    pub fn len(&self) -> usize {
        self.insert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insert.is_empty()
    }
}

/// A document offset resolved to a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: NodeId,
    /// Offset inside the line
    pub offset: usize,
}

impl Document {
    /// All lines in document order
    pub fn lines(&self) -> Vec<Line> {
        let mut out = Vec::new();
        for id in self.descendants(self.root()) {
            if let Some(line) = self.line(id) {
                out.push(line);
            }
        }
        out
    }

    /// Lines belonging to one subtree
    pub fn lines_of(&self, id: NodeId) -> Vec<Line> {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter_map(|d| self.line(d))
            .collect()
    }

    /// Snapshot of a single line node, `None` for containers
    pub fn line(&self, id: NodeId) -> Option<Line> {
        let node = self.get(id)?;
        match node.kind() {
            NodeKind::Paragraph => Some(Line {
                id,
                insert: InsertValue::Text(format!("{}\n", node.text())),
                attributes: self.formats(id),
            }),
            NodeKind::Block => {
                let mut attributes = self
                    .parent(id)
                    .map(|cell| self.formats(cell))
                    .unwrap_or_default();
                attributes.extend(self.formats(id));
                Some(Line {
                    id,
                    insert: InsertValue::Text(format!("{}\n", node.text())),
                    attributes,
                })
            }
            NodeKind::Column => {
                let width = node.attribute(WIDTH).unwrap_or_default().to_string();
                let attributes = self
                    .closest(id, NodeKind::Table)
                    .map(|table| self.formats(table))
                    .unwrap_or_default();
                Some(Line {
                    id,
                    insert: InsertValue::Embed(attributes::from_pairs([(TABLE_COL, width.as_str())])),
                    attributes,
                })
            }
            _ => None,
        }
    }

    /// Resolve an offset to the line containing it.
    ///
    /// Offsets at or past the end resolve to the end of the last line.
    pub fn locate(&self, offset: usize) -> Option<Location> {
        let mut start = 0;
        let mut last = None;
        for id in self.descendants(self.root()) {
            let Some(kind) = self.kind(id) else { continue };
            if !kind.is_line() {
                continue;
            }
            let len = self.len(id);
            if offset < start + len {
                return Some(Location {
                    line: id,
                    offset: offset - start,
                });
            }
            start += len;
            last = Some((id, len));
        }
        last.map(|(line, len)| Location {
            line,
            offset: len.saturating_sub(1),
        })
    }
}
