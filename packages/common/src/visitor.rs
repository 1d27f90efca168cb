use tabula_model::{Document, NodeId, NodeKind};

/// Visitor pattern for traversing document nodes immutably
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_paragraph(&mut self, _doc: &Document, _paragraph: NodeId) {
        // Leaf node, no children to walk
    }

    fn visit_table(&mut self, doc: &Document, table: NodeId) {
        walk_children(self, doc, table);
    }

    fn visit_column(&mut self, _doc: &Document, _column: NodeId) {
        // Leaf node, no children to walk
    }

    fn visit_row(&mut self, doc: &Document, row: NodeId) {
        walk_children(self, doc, row);
    }

    fn visit_cell(&mut self, doc: &Document, cell: NodeId) {
        walk_children(self, doc, cell);
    }

    fn visit_block(&mut self, _doc: &Document, _block: NodeId) {
        // Leaf node, no children to walk
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    walk_children(visitor, doc, doc.root());
}

/// Dispatch a single node to the matching visit_* method
pub fn walk_node<V: Visitor>(visitor: &mut V, doc: &Document, node: NodeId) {
    match doc.kind(node) {
        Some(NodeKind::Paragraph) => visitor.visit_paragraph(doc, node),
        Some(NodeKind::Table) => visitor.visit_table(doc, node),
        Some(NodeKind::Column) => visitor.visit_column(doc, node),
        Some(NodeKind::Row) => visitor.visit_row(doc, node),
        Some(NodeKind::Cell) => visitor.visit_cell(doc, node),
        Some(NodeKind::Block) => visitor.visit_block(doc, node),
        // Column groups and bodies are transparent
        Some(NodeKind::Root | NodeKind::ColumnGroup | NodeKind::Body) => {
            walk_children(visitor, doc, node)
        }
        None => {}
    }
}

pub fn walk_children<V: Visitor>(visitor: &mut V, doc: &Document, node: NodeId) {
    for child in doc.children(node) {
        walk_node(visitor, doc, *child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_model::attributes::{from_pairs, ROW};
    use tabula_model::Attributes;

    #[derive(Default)]
    struct Counter {
        tables: usize,
        rows: usize,
        cells: usize,
        blocks: usize,
        paragraphs: usize,
    }

    impl Visitor for Counter {
        fn visit_paragraph(&mut self, _doc: &Document, _paragraph: NodeId) {
            self.paragraphs += 1;
        }

        fn visit_table(&mut self, doc: &Document, table: NodeId) {
            self.tables += 1;
            walk_children(self, doc, table);
        }

        fn visit_row(&mut self, doc: &Document, row: NodeId) {
            self.rows += 1;
            walk_children(self, doc, row);
        }

        fn visit_cell(&mut self, doc: &Document, cell: NodeId) {
            self.cells += 1;
            walk_children(self, doc, cell);
        }

        fn visit_block(&mut self, _doc: &Document, _block: NodeId) {
            self.blocks += 1;
        }
    }

    #[test]
    fn test_counts_every_node_kind() {
        let mut doc = Document::new();
        let table = doc.create(NodeKind::Table, Attributes::new()).unwrap();
        let body = doc.create(NodeKind::Body, Attributes::new()).unwrap();
        doc.append(table, body).unwrap();
        for r in 0..2 {
            let id = format!("row-{}", r);
            let row = doc
                .create(NodeKind::Row, from_pairs([(ROW, id.as_str())]))
                .unwrap();
            doc.append(body, row).unwrap();
            for c in 0..3 {
                let cell = doc
                    .create_cell(Attributes::new(), &format!("cell-{}{}", r, c))
                    .unwrap();
                doc.append(row, cell).unwrap();
            }
        }
        let root = doc.root();
        doc.append(root, table).unwrap();

        let mut counter = Counter::default();
        counter.visit_document(&doc);

        assert_eq!(counter.paragraphs, 1);
        assert_eq!(counter.tables, 1);
        assert_eq!(counter.rows, 2);
        assert_eq!(counter.cells, 6);
        assert_eq!(counter.blocks, 6);
    }
}
