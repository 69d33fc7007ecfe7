//! In-process `TableStore` + `ObjectStore`.
//!
//! Used by tests and the `memory` backend. A store built with [`MemoryStore::recording`]
//! keeps a journal of every call, and a failure can be injected per operation kind.

use crate::error::StoreError;
use crate::storage::query::{Column, Predicate, Select, Selected};
use crate::storage::{public_object_address, ObjectStore, StoredObject, TableStore, UploadResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
    Delete,
    Upload,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    /// Table name, or `bucket/name` for object operations.
    pub target: String,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<JsonValue>>,
    next_ids: HashMap<String, i64>,
    objects: HashMap<(String, String), StoredObject>,
    journal: Option<Vec<StoreCall>>,
    failing: HashSet<StoreOp>,
}

impl MemoryState {
    fn record(&mut self, op: StoreOp, target: &str) -> Result<(), StoreError> {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(StoreCall {
                op,
                target: target.to_string(),
            });
        }
        if self.failing.contains(&op) {
            return Err(StoreError::Status {
                status: 503,
                body: format!("injected {:?} failure", op),
            });
        }
        Ok(())
    }

    fn assign_id(&mut self, table: &str, row: &mut Map<String, JsonValue>) {
        let next = self.next_ids.entry(table.to_string()).or_insert(1);
        match row.get("id").and_then(|v| v.as_i64()) {
            Some(id) => *next = (*next).max(id + 1),
            None => {
                row.insert("id".to_string(), JsonValue::from(*next));
                *next += 1;
            }
        }
        if !row.contains_key("created_at") {
            row.insert(
                "created_at".to_string(),
                JsonValue::from(Utc::now().to_rfc3339()),
            );
        }
    }
}

pub struct MemoryStore {
    base_url: String,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Like [`MemoryStore::new`], but every call is journaled for [`MemoryStore::calls`].
    pub fn recording(base_url: impl Into<String>) -> Self {
        let state = MemoryState {
            journal: Some(Vec::new()),
            ..Default::default()
        };
        Self {
            base_url: base_url.into(),
            state: Mutex::new(state),
        }
    }

    /// Loads rows without touching the journal.
    pub async fn seed(&self, table: &str, rows: Vec<JsonValue>) {
        let mut state = self.state.lock().await;
        for row in rows {
            if let JsonValue::Object(mut obj) = row {
                state.assign_id(table, &mut obj);
                state
                    .tables
                    .entry(table.to_string())
                    .or_default()
                    .push(JsonValue::Object(obj));
            }
        }
    }

    pub async fn rows(&self, table: &str) -> Vec<JsonValue> {
        let state = self.state.lock().await;
        state.tables.get(table).cloned().unwrap_or_default()
    }

    /// Journaled calls, oldest first. Always empty unless built with `recording`.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.journal.clone().unwrap_or_default()
    }

    pub async fn clear_calls(&self) {
        if let Some(journal) = self.state.lock().await.journal.as_mut() {
            journal.clear();
        }
    }

    /// Makes every later call of kind `op` fail with a 503 status error.
    pub async fn fail_on(&self, op: StoreOp) {
        self.state.lock().await.failing.insert(op);
    }
}

/// Orders two JSON scalars: numbers numerically, RFC3339 strings chronologically,
/// other strings lexically. Mismatched kinds are incomparable.
fn compare_json(lhs: &JsonValue, rhs: &JsonValue) -> Option<Ordering> {
    match (lhs, rhs) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (JsonValue::String(a), JsonValue::String(b)) => {
            match (
                DateTime::parse_from_rfc3339(a),
                DateTime::parse_from_rfc3339(b),
            ) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        (JsonValue::Bool(a), JsonValue::Bool(b)) => Some(a.cmp(b)),
        (JsonValue::Null, JsonValue::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn kind_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Bool(_) => 0,
        JsonValue::Number(_) => 1,
        JsonValue::String(_) => 2,
        JsonValue::Array(_) => 3,
        JsonValue::Object(_) => 4,
        JsonValue::Null => 5,
    }
}

/// Total order used for `ORDER BY`. Nulls sort after every value (so they land last
/// ascending and first descending), mismatched kinds sort by kind, and RFC3339
/// strings sort before other strings.
fn sort_cmp(lhs: &JsonValue, rhs: &JsonValue) -> Ordering {
    match (lhs, rhs) {
        (JsonValue::Number(a), JsonValue::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.total_cmp(&b)
        }
        (JsonValue::String(a), JsonValue::String(b)) => {
            match (
                DateTime::parse_from_rfc3339(a),
                DateTime::parse_from_rfc3339(b),
            ) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => a.cmp(b),
            }
        }
        (JsonValue::Bool(a), JsonValue::Bool(b)) => a.cmp(b),
        _ => kind_rank(lhs).cmp(&kind_rank(rhs)),
    }
}

fn matches(row: &JsonValue, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Compare {
            field,
            comparator,
            value,
        } => {
            let actual = row.get(field).unwrap_or(&JsonValue::Null);
            if value.is_null() {
                let is_null = actual.is_null();
                return if comparator.accepts(Ordering::Equal) {
                    is_null
                } else {
                    !is_null
                };
            }
            if actual.is_null() {
                return false;
            }
            compare_json(actual, value)
                .map(|ord| comparator.accepts(ord))
                .unwrap_or(false)
        }
        Predicate::AnyOf(groups) => groups
            .iter()
            .any(|group| group.iter().all(|p| matches(row, p))),
    }
}

fn project(
    tables: &HashMap<String, Vec<JsonValue>>,
    row: &JsonValue,
    columns: &[Column],
) -> JsonValue {
    let mut out = Map::new();
    for column in columns {
        match column {
            Column::All => {
                if let Some(obj) = row.as_object() {
                    out.extend(obj.clone());
                }
            }
            Column::Field(name) => {
                out.insert(
                    name.clone(),
                    row.get(name).cloned().unwrap_or(JsonValue::Null),
                );
            }
            Column::Embed {
                relation,
                foreign_key,
                columns,
            } => {
                let related = row.get(foreign_key).and_then(|fk| {
                    tables.get(relation)?.iter().find(|r| {
                        r.get("id")
                            .map(|id| compare_json(id, fk) == Some(Ordering::Equal))
                            .unwrap_or(false)
                    })
                });
                let embedded = related
                    .map(|r| project(tables, r, columns))
                    .unwrap_or(JsonValue::Null);
                out.insert(relation.clone(), embedded);
            }
        }
    }
    JsonValue::Object(out)
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, query: &Select) -> Result<Selected, StoreError> {
        let mut state = self.state.lock().await;
        state.record(StoreOp::Select, &query.table)?;

        let mut matching: Vec<&JsonValue> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.predicates.iter().all(|p| matches(row, p)))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            matching.sort_by(|a, b| {
                let av = a.get(&order.field).unwrap_or(&JsonValue::Null);
                let bv = b.get(&order.field).unwrap_or(&JsonValue::Null);
                let ord = sort_cmp(av, bv);
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let count = query.count.then_some(matching.len() as u64);

        let window: Vec<&JsonValue> = match query.range {
            Some(range) => matching
                .into_iter()
                .skip(range.from as usize)
                .take(range.limit() as usize)
                .collect(),
            None => matching,
        };

        let rows = window
            .into_iter()
            .map(|row| project(&state.tables, row, &query.columns))
            .collect();

        Ok(Selected { rows, count })
    }

    async fn insert(&self, table: &str, rows: &[JsonValue]) -> Result<Vec<JsonValue>, StoreError> {
        let mut state = self.state.lock().await;
        state.record(StoreOp::Insert, table)?;

        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let mut obj = row
                .as_object()
                .cloned()
                .ok_or_else(|| StoreError::MalformedRow("Record must be a JSON object".to_string()))?;
            state.assign_id(table, &mut obj);
            inserted.push(JsonValue::Object(obj));
        }
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn update(
        &self,
        table: &str,
        patch: &JsonValue,
        predicates: &[Predicate],
    ) -> Result<Vec<JsonValue>, StoreError> {
        let mut state = self.state.lock().await;
        state.record(StoreOp::Update, table)?;

        let fields = patch
            .as_object()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| StoreError::MalformedRow("update requires at least one field".to_string()))?;

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut() {
                if !predicates.iter().all(|p| matches(row, p)) {
                    continue;
                }
                if let Some(obj) = row.as_object_mut() {
                    for (k, v) in fields {
                        obj.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(
        &self,
        table: &str,
        predicates: &[Predicate],
    ) -> Result<Vec<JsonValue>, StoreError> {
        let mut state = self.state.lock().await;
        state.record(StoreOp::Delete, table)?;

        let mut deleted = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| {
                if predicates.iter().all(|p| matches(row, p)) {
                    deleted.push(row.clone());
                    false
                } else {
                    true
                }
            });
        }
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        object: StoredObject,
    ) -> Result<UploadResult, StoreError> {
        let mut state = self.state.lock().await;
        state.record(StoreOp::Upload, &format!("{}/{}", bucket, name))?;

        let key = (bucket.to_string(), name.to_string());
        if state.objects.contains_key(&key) {
            return Err(StoreError::Status {
                status: 409,
                body: "The resource already exists".to_string(),
            });
        }
        state.objects.insert(key, object);
        Ok(UploadResult {
            public_address: self.public_address(bucket, name),
        })
    }

    async fn download(&self, bucket: &str, name: &str) -> Result<Option<StoredObject>, StoreError> {
        let mut state = self.state.lock().await;
        state.record(StoreOp::Download, &format!("{}/{}", bucket, name))?;
        Ok(state
            .objects
            .get(&(bucket.to_string(), name.to_string()))
            .cloned())
    }

    fn public_address(&self, bucket: &str, name: &str) -> String {
        public_object_address(&self.base_url, bucket, name)
    }
}
