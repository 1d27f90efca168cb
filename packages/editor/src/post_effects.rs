//! # Post-Effect System
//!
//! Mutations trigger cascading effects to keep tables well formed.
//!
//! When a mutation is applied, it may leave the document in a state that
//! needs a follow-up change. For example:
//! - Deleting rows or cells may leave a table with an empty body
//! - Column edits may leave rows of unequal width
//!
//! Effects inspect the document after the primary mutation and return
//! secondary mutations. Secondary mutations do not trigger further effects.

use crate::config::EngineConfig;
use crate::context::EditContext;
use crate::grid::GridIndex;
use crate::mutations::{Mutation, MutationError, Outcome};
use tabula_model::{Document, NodeKind};
use tracing::debug;

/// Post-effect that can be triggered by a mutation
pub trait PostEffect: std::fmt::Debug {
    /// Analyze the mutation and generate secondary mutations if needed
    fn analyze(&self, mutation: &Mutation, doc: &Document, config: &EngineConfig) -> Vec<Mutation>;
}

/// Delete tables whose body no longer holds any row
#[derive(Debug)]
pub struct RemoveEmptyTables;

impl PostEffect for RemoveEmptyTables {
    fn analyze(&self, mutation: &Mutation, doc: &Document, _config: &EngineConfig) -> Vec<Mutation> {
        match mutation {
            Mutation::DeleteRows { .. } | Mutation::DeleteColumn { .. } | Mutation::MergeCells { .. } => doc
                .descendants_of_kind(doc.root(), NodeKind::Table)
                .into_iter()
                .filter(|table| doc.rows(*table).is_empty())
                .map(|table| Mutation::DeleteTable { table })
                .collect(),
            _ => vec![],
        }
    }
}

/// Pad irregular tables after column edits, when configured
#[derive(Debug)]
pub struct RebalanceAfterColumnEdit;

impl PostEffect for RebalanceAfterColumnEdit {
    fn analyze(&self, mutation: &Mutation, doc: &Document, config: &EngineConfig) -> Vec<Mutation> {
        if !config.balance_after_column_edit {
            return vec![];
        }
        match mutation {
            Mutation::InsertColumn { .. } | Mutation::DeleteColumn { .. } => doc
                .descendants_of_kind(doc.root(), NodeKind::Table)
                .into_iter()
                .filter(|table| {
                    doc.body(*table)
                        .is_some_and(|body| !GridIndex::build(doc, body).is_rectangular())
                })
                .map(|table| Mutation::Balance { table })
                .collect(),
            _ => vec![],
        }
    }
}

/// Post-effect engine that applies all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(RemoveEmptyTables), Box::new(RebalanceAfterColumnEdit)],
        }
    }

    /// Analyze a mutation and generate all secondary mutations
    pub fn analyze(&self, mutation: &Mutation, doc: &Document, config: &EngineConfig) -> Vec<Mutation> {
        let mut secondary_mutations = Vec::new();

        for effect in &self.effects {
            let mut effect_mutations = effect.analyze(mutation, doc, config);
            secondary_mutations.append(&mut effect_mutations);
        }

        secondary_mutations
    }

    /// Apply a mutation with all its post-effects, returning the combined
    /// outcome and the secondary mutations that ran
    pub fn apply_with_effects(
        &self,
        mutation: &Mutation,
        ctx: &mut EditContext,
    ) -> Result<(Outcome, Vec<Mutation>), MutationError> {
        let mut outcome = mutation.apply(ctx)?;
        if !outcome.applied {
            return Ok((outcome, vec![]));
        }

        let secondary = self.analyze(mutation, ctx.doc, ctx.config);
        for secondary_mutation in &secondary {
            debug!(
                primary = mutation.name(),
                secondary = secondary_mutation.name(),
                "Applying post-effect"
            );
            outcome.absorb(secondary_mutation.apply(ctx)?);
        }

        Ok((outcome, secondary))
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutations::ColumnTarget;
    use tabula_model::{Attributes, IdGenerator};

    #[test]
    fn test_post_effect_engine_creation() {
        let engine = PostEffectEngine::new();
        assert_eq!(engine.effects.len(), 2);
    }

    #[test]
    fn test_empty_body_triggers_table_delete() {
        let mut doc = Document::new();
        let table = doc.create(NodeKind::Table, Attributes::new()).unwrap();
        let body = doc.create(NodeKind::Body, Attributes::new()).unwrap();
        doc.append(table, body).unwrap();
        let root = doc.root();
        doc.append(root, table).unwrap();

        let engine = PostEffectEngine::new();
        let secondary = engine.analyze(
            &Mutation::DeleteRows { rows: vec![] },
            &doc,
            &EngineConfig::default(),
        );
        assert_eq!(secondary, vec![Mutation::DeleteTable { table }]);
    }

    #[test]
    fn test_nested_empty_table_is_deleted() {
        let mut doc = Document::new();
        let mut ids = IdGenerator::seeded(5);
        let config = EngineConfig::default();
        let mut ctx = EditContext::new(&mut doc, &mut ids, &config);
        let outer = crate::tables::insert_table(&mut ctx, 0, 1, 1)
            .unwrap()
            .inserted
            .unwrap();

        let cell = doc.cells(outer)[0];
        let nested = doc.create(NodeKind::Table, Attributes::new()).unwrap();
        let body = doc.create(NodeKind::Body, Attributes::new()).unwrap();
        doc.append(nested, body).unwrap();
        doc.append(cell, nested).unwrap();

        let engine = PostEffectEngine::new();
        let secondary = engine.analyze(
            &Mutation::DeleteRows { rows: vec![] },
            &doc,
            &config,
        );
        assert_eq!(secondary, vec![Mutation::DeleteTable { table: nested }]);
    }

    #[test]
    fn test_rebalance_is_opt_in() {
        let mut doc = Document::new();
        let mut ids = IdGenerator::seeded(5);
        let config = EngineConfig::default();
        let mut ctx = EditContext::new(&mut doc, &mut ids, &config);
        let table = crate::tables::insert_table(&mut ctx, 0, 2, 2)
            .unwrap()
            .inserted
            .unwrap();

        let mutation = Mutation::InsertColumn {
            table,
            at: ColumnTarget::Append,
            widths: None,
        };
        let engine = PostEffectEngine::new();
        assert!(engine.analyze(&mutation, &doc, &config).is_empty());
    }

    #[test]
    fn test_noop_skips_effects() {
        let mut doc = Document::new();
        let mut ids = IdGenerator::seeded(5);
        let config = EngineConfig::default();
        let mut ctx = EditContext::new(&mut doc, &mut ids, &config);

        let engine = PostEffectEngine::new();
        let (outcome, secondary) = engine
            .apply_with_effects(&Mutation::DeleteRows { rows: vec![] }, &mut ctx)
            .unwrap();
        assert!(!outcome.applied);
        assert!(secondary.is_empty());
    }
}
