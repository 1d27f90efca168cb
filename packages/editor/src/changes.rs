//! Change-log handed to the host editor after every mutation.
//!
//! Changes are expressed as insert / retain / delete operations over the
//! line view of the document. The log is produced by diffing line snapshots
//! taken before and after a mutation, keyed by node identity, so every
//! structural edit yields a log without each operation emitting its own.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tabula_model::{Attributes, InsertValue, Line};

/// Attribute changes of a retained line; `None` removes the key
pub type AttributeChanges = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeltaOp {
    Insert {
        insert: InsertValue,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: Attributes,
    },
    Delete {
        delete: usize,
    },
    Retain {
        retain: usize,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: AttributeChanges,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub ops: Vec<DeltaOp>,
}

/// Line content without node identity, as reconstructed by [`Delta::replay`]
#[derive(Debug, Clone, PartialEq)]
pub struct LineContent {
    pub insert: InsertValue,
    pub attributes: Attributes,
}

impl From<&Line> for LineContent {
    fn from(line: &Line) -> Self {
        Self {
            insert: line.insert.clone(),
            attributes: line.attributes.clone(),
        }
    }
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn insert(&mut self, insert: InsertValue, attributes: Attributes) {
        self.ops.push(DeltaOp::Insert { insert, attributes });
    }

    pub fn delete(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        if let Some(DeltaOp::Delete { delete }) = self.ops.last_mut() {
            *delete += count;
            return;
        }
        self.ops.push(DeltaOp::Delete { delete: count });
    }

    pub fn retain(&mut self, count: usize, attributes: AttributeChanges) {
        if count == 0 {
            return;
        }
        if attributes.is_empty() {
            if let Some(DeltaOp::Retain {
                retain,
                attributes: previous,
            }) = self.ops.last_mut()
            {
                if previous.is_empty() {
                    *retain += count;
                    return;
                }
            }
        }
        self.ops.push(DeltaOp::Retain {
            retain: count,
            attributes,
        });
    }

    /// Drop a trailing plain retain, which carries no information
    pub fn chop(mut self) -> Self {
        if let Some(DeltaOp::Retain { attributes, .. }) = self.ops.last() {
            if attributes.is_empty() {
                self.ops.pop();
            }
        }
        self
    }

    /// Compute the operations turning `before` into `after`.
    ///
    /// Lines are matched by node id. A line whose node survives but moved
    /// backwards is emitted as a delete followed by a re-insert.
    pub fn diff(before: &[Line], after: &[Line]) -> Delta {
        let before_ids: HashSet<_> = before.iter().map(|line| line.id).collect();
        let after_ids: HashSet<_> = after.iter().map(|line| line.id).collect();
        let mut relocated = HashSet::new();
        let mut delta = Delta::new();

        let (mut i, mut j) = (0, 0);
        while i < before.len() || j < after.len() {
            if let Some(old) = before.get(i) {
                if !after_ids.contains(&old.id) {
                    delta.delete(old.len());
                    i += 1;
                    continue;
                }
            }
            if let Some(new) = after.get(j) {
                if !before_ids.contains(&new.id) || relocated.contains(&new.id) {
                    delta.insert(new.insert.clone(), new.attributes.clone());
                    j += 1;
                    continue;
                }
            }

            match (before.get(i), after.get(j)) {
                (Some(old), Some(new)) if old.id == new.id => {
                    if old.insert == new.insert {
                        delta.retain(old.len(), attribute_changes(&old.attributes, &new.attributes));
                    } else {
                        delta.delete(old.len());
                        delta.insert(new.insert.clone(), new.attributes.clone());
                    }
                    i += 1;
                    j += 1;
                }
                (Some(old), _) => {
                    relocated.insert(old.id);
                    delta.delete(old.len());
                    i += 1;
                }
                (None, Some(new)) => {
                    delta.insert(new.insert.clone(), new.attributes.clone());
                    j += 1;
                }
                (None, None) => break,
            }
        }

        delta.chop()
    }

    /// Apply the operations to a line snapshot.
    ///
    /// Works at line granularity: returns `None` when a retain or delete
    /// would split a line or run past the end.
    pub fn replay(&self, before: &[Line]) -> Option<Vec<LineContent>> {
        let mut out = Vec::with_capacity(before.len());
        let mut lines = before.iter();

        for op in &self.ops {
            match op {
                DeltaOp::Insert { insert, attributes } => out.push(LineContent {
                    insert: insert.clone(),
                    attributes: attributes.clone(),
                }),
                DeltaOp::Delete { delete } => {
                    let mut remaining = *delete;
                    while remaining > 0 {
                        remaining = remaining.checked_sub(lines.next()?.len())?;
                    }
                }
                DeltaOp::Retain { retain, attributes } => {
                    let mut remaining = *retain;
                    while remaining > 0 {
                        let line = lines.next()?;
                        remaining = remaining.checked_sub(line.len())?;
                        let mut content = LineContent::from(line);
                        for (key, value) in attributes {
                            match value {
                                Some(value) => {
                                    content.attributes.insert(key.clone(), value.clone());
                                }
                                None => {
                                    content.attributes.remove(key);
                                }
                            }
                        }
                        out.push(content);
                    }
                }
            }
        }

        out.extend(lines.map(LineContent::from));
        Some(out)
    }
}

fn attribute_changes(before: &Attributes, after: &Attributes) -> AttributeChanges {
    let mut changes = AttributeChanges::new();
    for (key, value) in after {
        if before.get(key) != Some(value) {
            changes.insert(key.clone(), Some(value.clone()));
        }
    }
    for key in before.keys() {
        if !after.contains_key(key) {
            changes.insert(key.clone(), None);
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_model::attributes::from_pairs;
    use tabula_model::{Document, NodeKind};

    fn line(doc: &mut Document, text: &str, attributes: Attributes) -> Line {
        let id = doc.create_text(NodeKind::Paragraph, text, Attributes::new()).unwrap();
        Line {
            id,
            insert: InsertValue::Text(format!("{}\n", text)),
            attributes,
        }
    }

    #[test]
    fn test_identical_snapshots_produce_empty_delta() {
        let mut doc = Document::new();
        let lines = vec![line(&mut doc, "a", Attributes::new())];
        assert!(Delta::diff(&lines, &lines).is_empty());
    }

    #[test]
    fn test_insert_between_retains() {
        let mut doc = Document::new();
        let a = line(&mut doc, "a", Attributes::new());
        let b = line(&mut doc, "bb", Attributes::new());
        let c = line(&mut doc, "c", Attributes::new());

        let before = vec![a.clone(), c.clone()];
        let after = vec![a, b, c];
        let delta = Delta::diff(&before, &after);

        assert_eq!(
            delta.ops,
            vec![
                DeltaOp::Retain {
                    retain: 2,
                    attributes: AttributeChanges::new()
                },
                DeltaOp::Insert {
                    insert: InsertValue::Text("bb\n".to_string()),
                    attributes: Attributes::new()
                },
            ]
        );
        assert_eq!(
            delta.replay(&before).unwrap(),
            after.iter().map(LineContent::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_attribute_change_is_a_retain() {
        let mut doc = Document::new();
        let old = line(&mut doc, "x", from_pairs([("rowspan", "3"), ("width", "10")]));
        let mut new = old.clone();
        new.attributes = from_pairs([("rowspan", "2")]);

        let delta = Delta::diff(&[old.clone()], &[new.clone()]);
        let mut expected = AttributeChanges::new();
        expected.insert("rowspan".to_string(), Some("2".to_string()));
        expected.insert("width".to_string(), None);
        assert_eq!(
            delta.ops,
            vec![DeltaOp::Retain {
                retain: 2,
                attributes: expected
            }]
        );
        assert_eq!(delta.replay(&[old]).unwrap(), vec![LineContent::from(&new)]);
    }

    #[test]
    fn test_moved_line_is_deleted_and_reinserted() {
        let mut doc = Document::new();
        let a = line(&mut doc, "a", Attributes::new());
        let b = line(&mut doc, "b", Attributes::new());

        let before = vec![a.clone(), b.clone()];
        let after = vec![b, a];
        let delta = Delta::diff(&before, &after);

        assert_eq!(
            delta.replay(&before).unwrap(),
            after.iter().map(LineContent::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_replay_rejects_split_lines() {
        let mut doc = Document::new();
        let a = line(&mut doc, "abc", Attributes::new());
        let mut delta = Delta::new();
        delta.delete(2);
        assert!(delta.replay(&[a]).is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let mut delta = Delta::new();
        delta.retain(3, AttributeChanges::new());
        delta.delete(2);
        delta.insert(InsertValue::Text("\n".to_string()), from_pairs([("data-row", "row-1")]));

        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ops": [
                    {"retain": 3},
                    {"delete": 2},
                    {"insert": "\n", "attributes": {"data-row": "row-1"}}
                ]
            })
        );

        let parsed: Delta = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, delta);
    }
}
