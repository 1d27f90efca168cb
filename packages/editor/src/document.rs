//! # Document Handle
//!
//! `TableDocument` owns a document tree together with its id generator,
//! engine configuration and post-effects, and is the single entry point the
//! host uses to apply mutations.
//!
//! ## Lifecycle
//!
//! ```text
//! snapshot lines → validate → apply → post-effects → snapshot lines → diff
//!                                                                      ↓
//!                                                   MutationResult { version, changes }
//! ```

use crate::changes::Delta;
use crate::config::EngineConfig;
use crate::context::EditContext;
use crate::post_effects::PostEffectEngine;
use crate::{EditorError, Mutation, MutationResult};
use tabula_common::{walk_children, Visitor};
use tabula_model::attributes::{CELL, ROW};
use tabula_model::{Document, IdGenerator, Line, NodeId};
use tracing::{debug, info};

/// Editable document with table support
#[derive(Debug)]
pub struct TableDocument {
    /// Current version number (increments on each applied mutation)
    pub version: u64,

    tree: Document,
    ids: IdGenerator,
    config: EngineConfig,
    effects: PostEffectEngine,
}

impl TableDocument {
    /// Empty document with entropy-backed ids
    pub fn new(config: EngineConfig) -> Self {
        Self::from_tree(Document::new(), config, IdGenerator::default())
    }

    /// Empty document with deterministic ids
    pub fn seeded(config: EngineConfig, seed: u64) -> Self {
        Self::from_tree(Document::new(), config, IdGenerator::seeded(seed))
    }

    /// Wrap an existing tree. Row and content ids already present are
    /// reserved so generated ids never collide with them.
    pub fn from_tree(tree: Document, config: EngineConfig, ids: IdGenerator) -> Self {
        let mut ids = ids
            .with_length(config.id_length)
            .with_retry_limit(config.id_retry_limit);

        let mut collector = IdCollector::default();
        collector.visit_document(&tree);
        debug!(reserved = collector.ids.len(), "Reserved existing ids");
        for id in collector.ids {
            ids.reserve(id);
        }

        Self {
            version: 0,
            tree,
            ids,
            config,
            effects: PostEffectEngine::new(),
        }
    }

    pub fn tree(&self) -> &Document {
        &self.tree
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lines(&self) -> Vec<Line> {
        self.tree.lines()
    }

    /// Top-level tables in document order
    pub fn tables(&self) -> Vec<NodeId> {
        self.tree.tables()
    }

    /// Apply a mutation and report the resulting change-log
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        let before = self.tree.lines();

        let mut ctx = EditContext::new(&mut self.tree, &mut self.ids, &self.config);
        let (outcome, secondary) = self.effects.apply_with_effects(&mutation, &mut ctx)?;

        if !outcome.applied {
            debug!(mutation = mutation.name(), "Mutation was a no-op");
            return Ok(MutationResult {
                version: self.version,
                applied: false,
                changes: Delta::new(),
                cursor: None,
                table_removed: false,
                inserted: None,
            });
        }

        self.version += 1;
        let changes = Delta::diff(&before, &self.tree.lines());
        info!(
            mutation = mutation.name(),
            version = self.version,
            secondary = secondary.len(),
            ops = changes.ops.len(),
            "Applied mutation"
        );

        Ok(MutationResult {
            version: self.version,
            applied: true,
            changes,
            cursor: outcome.cursor,
            table_removed: outcome.table_removed,
            inserted: outcome.inserted,
        })
    }
}

impl Default for TableDocument {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Gathers every row and content id in a tree
#[derive(Default)]
struct IdCollector {
    ids: Vec<String>,
}

impl IdCollector {
    fn collect(&mut self, doc: &Document, node: NodeId, key: &str) {
        if let Some(id) = doc.attribute(node, key) {
            self.ids.push(id.to_string());
        }
    }
}

impl Visitor for IdCollector {
    fn visit_row(&mut self, doc: &Document, row: NodeId) {
        self.collect(doc, row, ROW);
        walk_children(self, doc, row);
    }

    fn visit_cell(&mut self, doc: &Document, cell: NodeId) {
        self.collect(doc, cell, ROW);
        walk_children(self, doc, cell);
    }

    fn visit_block(&mut self, doc: &Document, block: NodeId) {
        self.collect(doc, block, CELL);
    }
}
