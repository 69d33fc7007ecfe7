//! Declarative table queries shared by every store backend.
//!
//! A `Select` describes projection, predicates, ordering and an inclusive row window.
//! Backends translate it into SQL (`PgTableStore`), PostgREST query parameters
//! (`RestStore`) or evaluate it directly (`MemoryStore`).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use utoipa::ToSchema;

/// Supported comparison operators for a single-field predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    #[default]
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Neq => "<>",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
        }
    }

    /// Operator name in PostgREST filter syntax (`field=gte.value`).
    pub fn as_rest(&self) -> &'static str {
        match self {
            Comparator::Eq => "eq",
            Comparator::Neq => "neq",
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
        }
    }

    /// Whether `lhs.cmp(rhs) == ordering` satisfies this comparator.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Neq => ordering != Ordering::Equal,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Gte => ordering != Ordering::Less,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Lte => ordering != Ordering::Greater,
        }
    }
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Every column of the queried table (`*`).
    All,
    Field(String),
    /// A to-one related row, nested under the relation's name.
    /// `foreign_key` is the column on the queried table pointing at the relation's primary key.
    Embed {
        relation: String,
        foreign_key: String,
        columns: Vec<Column>,
    },
}

impl Column {
    pub fn field(name: impl Into<String>) -> Self {
        Column::Field(name.into())
    }

    pub fn embed(relation: &str, foreign_key: &str, columns: Vec<Column>) -> Self {
        Column::Embed {
            relation: relation.to_string(),
            foreign_key: foreign_key.to_string(),
            columns,
        }
    }

    pub fn fields(names: &[&str]) -> Vec<Column> {
        names.iter().map(|n| Column::field(*n)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        field: String,
        comparator: Comparator,
        value: JsonValue,
    },
    /// Disjunction of conjunctions: `(a AND b) OR (c AND d)`.
    AnyOf(Vec<Vec<Predicate>>),
}

impl Predicate {
    pub fn compare(field: &str, comparator: Comparator, value: impl Into<JsonValue>) -> Self {
        Predicate::Compare {
            field: field.to_string(),
            comparator,
            value: value.into(),
        }
    }

    pub fn eq(field: &str, value: impl Into<JsonValue>) -> Self {
        Self::compare(field, Comparator::Eq, value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub field: String,
    pub ascending: bool,
}

/// Inclusive row window, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: u64,
    pub to: u64,
}

impl RowRange {
    pub fn limit(&self) -> u64 {
        self.to.saturating_sub(self.from) + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub columns: Vec<Column>,
    pub predicates: Vec<Predicate>,
    pub order: Option<Order>,
    pub range: Option<RowRange>,
    /// Also report the number of rows matching `predicates`, ignoring `range`.
    pub count: bool,
}

impl Select {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: vec![Column::All],
            predicates: Vec::new(),
            order: None,
            range: None,
            count: false,
        }
    }

    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order(mut self, field: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            field: field.to_string(),
            ascending,
        });
        self
    }

    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range = Some(RowRange { from, to });
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }
}

/// Rows returned by a select, plus the exact match count when it was requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selected {
    pub rows: Vec<JsonValue>,
    pub count: Option<u64>,
}

/// Identifier check applied before any name is spliced into SQL or a URL.
pub fn validate_ident(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
