use crate::config::EngineConfig;
use tabula_model::attributes::{self, Attributes, COLSPAN, ROW, ROWSPAN};
use tabula_model::{Document, IdGenerator, ModelResult, NodeId, NodeKind};

/// Everything a structural operation may touch
pub struct EditContext<'a> {
    pub doc: &'a mut Document,
    pub ids: &'a mut IdGenerator,
    pub config: &'a EngineConfig,
}

impl<'a> EditContext<'a> {
    pub fn new(doc: &'a mut Document, ids: &'a mut IdGenerator, config: &'a EngineConfig) -> Self {
        Self { doc, ids, config }
    }

    /// Detached 1-row cell belonging to `row_id`, with a fresh content id
    pub fn new_cell(&mut self, row_id: &str, colspan: usize) -> ModelResult<NodeId> {
        let colspan = colspan.max(1).to_string();
        let attributes = attributes::from_pairs([
            (ROW, row_id),
            (COLSPAN, colspan.as_str()),
            (ROWSPAN, "1"),
        ]);
        self.new_cell_with(attributes)
    }

    /// Detached cell with the given attributes and a fresh content id
    pub fn new_cell_with(&mut self, attributes: Attributes) -> ModelResult<NodeId> {
        let content_id = self.ids.cell_id();
        self.doc.create_cell(attributes, &content_id)
    }

    /// Detached row carrying a fresh row id
    pub fn new_row(&mut self) -> ModelResult<(NodeId, String)> {
        let row_id = self.ids.row_id();
        let row = self
            .doc
            .create(NodeKind::Row, attributes::from_pairs([(ROW, row_id.as_str())]))?;
        Ok((row, row_id))
    }

    /// Row-group id of a row: its own marker, else its first cell's
    pub fn row_id_of(&mut self, row: NodeId) -> String {
        row_group_id(self.doc, row).unwrap_or_else(|| self.ids.row_id())
    }

    /// Content id of a cell's first block, or a fresh one
    pub fn content_id_of(&mut self, cell: NodeId) -> String {
        self.doc
            .first_child(cell)
            .and_then(|block| self.doc.attribute(block, attributes::CELL))
            .map(str::to_string)
            .unwrap_or_else(|| self.ids.cell_id())
    }
}

pub fn row_group_id(doc: &Document, row: NodeId) -> Option<String> {
    doc.attribute(row, ROW)
        .or_else(|| doc.first_child(row).and_then(|cell| doc.attribute(cell, ROW)))
        .map(str::to_string)
}
