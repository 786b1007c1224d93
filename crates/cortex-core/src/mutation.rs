//! # Mutation Gateway
//!
//! The only write path into a loaded graph. Writes are strict and fail
//! closed:
//!
//! 1. The raw fields are checked against the record schema.
//! 2. Integrity is checked against the in-memory graph.
//! 3. One JSON line is appended to the target shard.
//! 4. Only then are the graph and the search index updated.
//!
//! A rejected write leaves the shard files, the graph and the index exactly
//! as they were.

use crate::graph::KnowledgeGraph;
use crate::primitives::TIMESTAMP_FORMAT;
use crate::search::Searcher;
use crate::storage::{Layout, append_record};
use crate::{CortexError, Endpoint, Entity, Relation};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};

const ENTITY_FIELDS: &[&str] = &["id", "type", "name", "desc", "tags", "updated_at"];
const RELATION_FIELDS: &[&str] = &["src", "rel", "dst", "context", "created_at"];

// =============================================================================
// SCHEMA
// =============================================================================

/// Field access with schema errors attributed to one record kind.
struct Fields<'a> {
    record: &'static str,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn new(
        record: &'static str,
        value: &'a Value,
        allowed: &[&str],
    ) -> Result<Self, CortexError> {
        let fields = Self {
            record,
            map: value
                .as_object()
                .ok_or_else(|| CortexError::schema(record, "expected a JSON object"))?,
        };
        if let Some(unknown) = fields.map.keys().find(|k| !allowed.contains(&k.as_str())) {
            return Err(CortexError::schema(record, format!("unexpected field '{}'", unknown)));
        }
        Ok(fields)
    }

    fn error(&self, reason: String) -> CortexError {
        CortexError::schema(self.record, reason)
    }

    /// A string field that must be present. Blank values are rejected
    /// unless `allow_blank` is set.
    fn required(&self, key: &str, allow_blank: bool) -> Result<String, CortexError> {
        let value = self
            .optional(key)?
            .ok_or_else(|| self.error(format!("missing required field '{}'", key)))?;
        if !allow_blank && value.trim().is_empty() {
            return Err(self.error(format!("field '{}' must not be empty", key)));
        }
        Ok(value)
    }

    /// A string field that may be absent or `null`.
    fn optional(&self, key: &str) -> Result<Option<String>, CortexError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.error(format!("field '{}' must be a string", key))),
        }
    }

    /// An optional array of strings.
    fn string_list(&self, key: &str) -> Result<Vec<String>, CortexError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.error(format!("field '{}' must contain only strings", key)))
                })
                .collect(),
            Some(_) => Err(self.error(format!("field '{}' must be an array of strings", key))),
        }
    }
}

fn stamp(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

// =============================================================================
// GATEWAY
// =============================================================================

/// Validated insertion of entities and relations.
pub struct MutationGateway;

impl MutationGateway {
    /// Build an entity from raw fields.
    ///
    /// `id`, `type` and `name` must be non-blank strings, `desc` a string,
    /// `tags` an optional string array. A missing `updated_at` is stamped
    /// with `now`.
    pub fn entity_from_fields(fields: &Value, now: NaiveDateTime) -> Result<Entity, CortexError> {
        let fields = Fields::new("entity", fields, ENTITY_FIELDS)?;
        Ok(Entity {
            id: fields.required("id", false)?,
            kind: fields.required("type", false)?,
            name: fields.required("name", false)?,
            desc: fields.required("desc", true)?,
            tags: fields.string_list("tags")?,
            updated_at: fields.optional("updated_at")?.unwrap_or_else(|| stamp(now)),
        })
    }

    /// Build a relation from raw fields.
    ///
    /// `src`, `rel` and `dst` must be non-blank strings. A missing
    /// `created_at` is stamped with `now`.
    pub fn relation_from_fields(
        fields: &Value,
        now: NaiveDateTime,
    ) -> Result<Relation, CortexError> {
        let fields = Fields::new("relation", fields, RELATION_FIELDS)?;
        Ok(Relation {
            src: fields.required("src", false)?,
            rel: fields.required("rel", false)?,
            dst: fields.required("dst", false)?,
            context: fields.optional("context")?.unwrap_or_default(),
            created_at: fields.optional("created_at")?.unwrap_or_else(|| stamp(now)),
        })
    }

    /// Add a new entity to the shard named by `category`.
    ///
    /// Rejects an `id` that already exists; this gateway never overwrites.
    pub fn add_entity(
        layout: &Layout,
        graph: &mut KnowledgeGraph,
        searcher: &mut Searcher,
        category: &str,
        fields: &Value,
        now: NaiveDateTime,
    ) -> Result<Entity, CortexError> {
        let entity = Self::entity_from_fields(fields, now)?;
        let shard = layout.entity_shard_path(category)?;

        if graph.contains_entity(&entity.id) {
            return Err(CortexError::DuplicateEntity(entity.id));
        }

        append_record(&shard, &entity)?;
        searcher.insert(&entity);
        graph.upsert_entity(entity.clone());

        tracing::info!(id = %entity.id, shard = %shard.display(), "entity committed");
        Ok(entity)
    }

    /// Add a new relation to the monthly shard for `now`.
    ///
    /// Both endpoints must already exist and the triple must be new.
    pub fn add_relation(
        layout: &Layout,
        graph: &mut KnowledgeGraph,
        fields: &Value,
        now: NaiveDateTime,
    ) -> Result<Relation, CortexError> {
        let relation = Self::relation_from_fields(fields, now)?;

        if !graph.contains_entity(&relation.src) {
            return Err(CortexError::UnknownEndpoint {
                endpoint: Endpoint::Source,
                id: relation.src,
            });
        }
        if !graph.contains_entity(&relation.dst) {
            return Err(CortexError::UnknownEndpoint {
                endpoint: Endpoint::Destination,
                id: relation.dst,
            });
        }
        let key = relation.key();
        if graph.contains_relation(&key) {
            return Err(CortexError::DuplicateRelation(key));
        }

        let shard = layout.relation_shard_path(now.date());
        append_record(&shard, &relation)?;
        graph.insert_relation(relation.clone());

        tracing::info!(relation = %key, shard = %shard.display(), "relation committed");
        Ok(relation)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchMode;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-03-14T15:09:26", "%Y-%m-%dT%H:%M:%S").expect("now")
    }

    #[test]
    fn entity_fields_are_checked() {
        let ok = json!({"id": "rust", "type": "tech", "name": "Rust", "desc": "", "tags": ["lang"]});
        let entity = MutationGateway::entity_from_fields(&ok, now()).expect("valid");
        assert_eq!(entity.tags, vec!["lang".to_string()]);
        assert_eq!(entity.updated_at, "2025-03-14T15:09:26.000000");

        let cases = [
            json!("not an object"),
            json!({"type": "tech", "name": "Rust", "desc": ""}),
            json!({"id": "  ", "type": "tech", "name": "Rust", "desc": ""}),
            json!({"id": 7, "type": "tech", "name": "Rust", "desc": ""}),
            json!({"id": "rust", "type": "tech", "name": "Rust"}),
            json!({"id": "rust", "type": "tech", "name": "Rust", "desc": "", "tags": "lang"}),
            json!({"id": "rust", "type": "tech", "name": "Rust", "desc": "", "tags": [1]}),
            json!({"id": "rust", "type": "tech", "name": "Rust", "desc": "", "colour": "red"}),
        ];
        for case in cases {
            let err = MutationGateway::entity_from_fields(&case, now()).expect_err("rejected");
            assert!(matches!(err, CortexError::Schema { record: "entity", .. }), "{case}");
        }
    }

    #[test]
    fn explicit_timestamps_are_kept() {
        let fields = json!({"src": "a", "rel": "r", "dst": "b", "created_at": "2020-01-01"});
        let relation = MutationGateway::relation_from_fields(&fields, now()).expect("valid");
        assert_eq!(relation.created_at, "2020-01-01");
        assert!(relation.context.is_empty());
    }

    #[test]
    fn relation_rejection_leaves_everything_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(dir.path());
        let mut graph = KnowledgeGraph::new();
        let mut searcher = Searcher::build(&graph, SearchMode::Indexed);

        let a = json!({"id": "a", "type": "t", "name": "A", "desc": ""});
        MutationGateway::add_entity(&layout, &mut graph, &mut searcher, "things", &a, now())
            .expect("add a");

        let dangling = json!({"src": "a", "rel": "r", "dst": "nope"});
        let err = MutationGateway::add_relation(&layout, &mut graph, &dangling, now())
            .expect_err("dangling");
        assert!(matches!(
            err,
            CortexError::UnknownEndpoint { endpoint: Endpoint::Destination, .. }
        ));
        assert_eq!(graph.relation_count(), 0);
        assert!(!layout.relations_dir().exists());
    }

    #[test]
    fn accepted_writes_land_on_disk_and_in_memory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(dir.path());
        let mut graph = KnowledgeGraph::new();
        let mut searcher = Searcher::build(&graph, SearchMode::Indexed);

        for id in ["a", "b"] {
            let fields = json!({"id": id, "type": "t", "name": id, "desc": "searchable"});
            MutationGateway::add_entity(&layout, &mut graph, &mut searcher, "t/x", &fields, now())
                .expect("add");
        }
        let rel = json!({"src": "a", "rel": "r", "dst": "b", "context": "test"});
        MutationGateway::add_relation(&layout, &mut graph, &rel, now()).expect("relate");

        assert_eq!(searcher.search(&graph, "searchable"), vec!["a", "b"]);
        assert!(layout.entities_dir().join("t/x.jsonl").is_file());
        let shard = layout.relations_dir().join("2025-03.jsonl");
        let content = std::fs::read_to_string(shard).expect("read shard");
        assert_eq!(content.lines().count(), 1);

        let dup = MutationGateway::add_relation(&layout, &mut graph, &rel, now());
        assert!(matches!(dup, Err(CortexError::DuplicateRelation(_))));
        let again = json!({"id": "a", "type": "t", "name": "A2", "desc": ""});
        let dup = MutationGateway::add_entity(&layout, &mut graph, &mut searcher, "t/x", &again, now());
        assert!(matches!(dup, Err(CortexError::DuplicateEntity(id)) if id == "a"));
    }
}
