//! `TableStore` backed by PostgreSQL.
//!
//! Queries are assembled with `sqlx::QueryBuilder`. Identifiers are validated and
//! double-quoted (the schema uses camelCase columns); every bound value is cast to the
//! column type declared by the table's `TableModel`, and rows come back through
//! `row_to_json` so the service layer sees the same JSON shape as with other backends.

use crate::domain::model::{ModelRegistry, TableModel};
use crate::error::StoreError;
use crate::storage::query::{validate_ident, Column, Comparator, Predicate, Select, Selected};
use crate::storage::TableStore;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::sync::Arc;

#[derive(Clone)]
pub struct PgTableStore {
    pool: PgPool,
    registry: Arc<ModelRegistry>,
}

impl PgTableStore {
    pub fn new(pool: PgPool, registry: Arc<ModelRegistry>) -> Self {
        Self { pool, registry }
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        registry: Arc<ModelRegistry>,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool, registry))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates every registered table that does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for sql in self.registry.get_all_create_table_sql() {
            sqlx::query(sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn model(&self, table: &str) -> Result<Arc<dyn TableModel>, StoreError> {
        self.registry
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }
}

fn quote(ident: &str) -> Result<String, StoreError> {
    if !validate_ident(ident) {
        return Err(StoreError::InvalidIdentifier(ident.to_string()));
    }
    Ok(format!("\"{}\"", ident))
}

/// Binds one JSON scalar and casts it to `sql_type` when the column type is known.
fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &JsonValue, sql_type: Option<&str>) {
    match value {
        JsonValue::Null => {
            qb.push("NULL");
        }
        JsonValue::Bool(b) => {
            qb.push_bind(*b);
        }
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                qb.push_bind(i);
            } else if let Some(f) = n.as_f64() {
                qb.push_bind(f);
            } else {
                qb.push_bind(n.to_string());
            }
        }
        JsonValue::String(s) => {
            qb.push_bind(s.clone());
        }
        other => {
            qb.push_bind(other.clone());
        }
    }
    if let Some(t) = sql_type {
        qb.push("::").push(t);
    }
}

fn push_projection(
    qb: &mut QueryBuilder<'_, Postgres>,
    registry: &ModelRegistry,
    table: &str,
    columns: &[Column],
) -> Result<(), StoreError> {
    let qt = quote(table)?;
    for (idx, column) in columns.iter().enumerate() {
        if idx > 0 {
            qb.push(", ");
        }
        match column {
            Column::All => {
                qb.push(&qt).push(".*");
            }
            Column::Field(name) => {
                qb.push(&qt).push(".").push(quote(name)?);
            }
            Column::Embed {
                relation,
                foreign_key,
                columns,
            } => {
                let related = registry
                    .get(relation)
                    .ok_or_else(|| StoreError::UnknownTable(relation.clone()))?;
                let qr = quote(relation)?;
                let alias = quote(&format!("embed_{}", relation))?;
                qb.push("(SELECT row_to_json(").push(&alias).push(") FROM (SELECT ");
                push_projection(qb, registry, relation, columns)?;
                qb.push(" FROM ")
                    .push(&qr)
                    .push(" WHERE ")
                    .push(&qr)
                    .push(".")
                    .push(quote(related.primary_key_field())?)
                    .push(" = ")
                    .push(&qt)
                    .push(".")
                    .push(quote(foreign_key)?)
                    .push(") ")
                    .push(&alias)
                    .push(") AS ")
                    .push(&qr);
            }
        }
    }
    Ok(())
}

fn push_condition(
    qb: &mut QueryBuilder<'_, Postgres>,
    model: &dyn TableModel,
    predicate: &Predicate,
) -> Result<(), StoreError> {
    match predicate {
        Predicate::Compare {
            field,
            comparator,
            value,
        } => {
            let column = format!("{}.{}", quote(model.table_name())?, quote(field)?);
            if value.is_null() {
                qb.push(&column);
                if *comparator == Comparator::Neq {
                    qb.push(" IS NOT NULL");
                } else {
                    qb.push(" IS NULL");
                }
                return Ok(());
            }
            qb.push(&column).push(" ").push(comparator.as_sql()).push(" ");
            push_value(qb, value, model.column_type(field));
        }
        Predicate::AnyOf(groups) => {
            if groups.is_empty() {
                qb.push("FALSE");
                return Ok(());
            }
            qb.push("(");
            for (gi, group) in groups.iter().enumerate() {
                if gi > 0 {
                    qb.push(" OR ");
                }
                qb.push("(");
                if group.is_empty() {
                    qb.push("TRUE");
                }
                for (pi, p) in group.iter().enumerate() {
                    if pi > 0 {
                        qb.push(" AND ");
                    }
                    push_condition(qb, model, p)?;
                }
                qb.push(")");
            }
            qb.push(")");
        }
    }
    Ok(())
}

fn push_where(
    qb: &mut QueryBuilder<'_, Postgres>,
    model: &dyn TableModel,
    predicates: &[Predicate],
) -> Result<(), StoreError> {
    for (idx, predicate) in predicates.iter().enumerate() {
        qb.push(if idx == 0 { " WHERE " } else { " AND " });
        push_condition(qb, model, predicate)?;
    }
    Ok(())
}

fn object_of<'a>(row: &'a JsonValue) -> Result<&'a serde_json::Map<String, JsonValue>, StoreError> {
    row.as_object()
        .ok_or_else(|| StoreError::MalformedRow("Record must be a JSON object".to_string()))
}

/// `SELECT row_to_json(q) AS record FROM (SELECT ... ) q`
pub(crate) fn build_select<'a>(
    registry: &ModelRegistry,
    model: &dyn TableModel,
    query: &Select,
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    let qt = quote(&query.table)?;
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT row_to_json(q) AS record FROM (SELECT ");
    push_projection(&mut qb, registry, &query.table, &query.columns)?;
    qb.push(" FROM ").push(&qt);
    push_where(&mut qb, model, &query.predicates)?;
    if let Some(order) = &query.order {
        qb.push(" ORDER BY ")
            .push(&qt)
            .push(".")
            .push(quote(&order.field)?)
            .push(if order.ascending { " ASC" } else { " DESC" });
    }
    if let Some(range) = query.range {
        qb.push(" LIMIT ")
            .push_bind(range.limit() as i64)
            .push(" OFFSET ")
            .push_bind(range.from as i64);
    }
    qb.push(") q");
    Ok(qb)
}

pub(crate) fn build_count<'a>(
    model: &dyn TableModel,
    query: &Select,
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM ");
    qb.push(quote(&query.table)?);
    push_where(&mut qb, model, &query.predicates)?;
    Ok(qb)
}

pub(crate) fn build_insert<'a>(
    model: &dyn TableModel,
    row: &JsonValue,
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    let qt = quote(model.table_name())?;
    let record = object_of(row)?;
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO ");
    qb.push(&qt);
    if record.is_empty() {
        qb.push(" DEFAULT VALUES");
    } else {
        let columns = record
            .keys()
            .map(|k| quote(k))
            .collect::<Result<Vec<_>, _>>()?;
        qb.push(" (").push(columns.join(", ")).push(") VALUES (");
        for (idx, (col, value)) in record.iter().enumerate() {
            if idx > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value, model.column_type(col));
        }
        qb.push(")");
    }
    qb.push(" RETURNING row_to_json(").push(&qt).push(".*) AS record");
    Ok(qb)
}

pub(crate) fn build_update<'a>(
    model: &dyn TableModel,
    patch: &JsonValue,
    predicates: &[Predicate],
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    let qt = quote(model.table_name())?;
    let record = object_of(patch)?;
    if record.is_empty() {
        return Err(StoreError::MalformedRow(
            "update requires at least one field".to_string(),
        ));
    }
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE ");
    qb.push(&qt).push(" SET ");
    for (idx, (col, value)) in record.iter().enumerate() {
        if idx > 0 {
            qb.push(", ");
        }
        qb.push(quote(col)?).push(" = ");
        push_value(&mut qb, value, model.column_type(col));
    }
    push_where(&mut qb, model, predicates)?;
    qb.push(" RETURNING row_to_json(").push(&qt).push(".*) AS record");
    Ok(qb)
}

pub(crate) fn build_delete<'a>(
    model: &dyn TableModel,
    predicates: &[Predicate],
) -> Result<QueryBuilder<'a, Postgres>, StoreError> {
    let qt = quote(model.table_name())?;
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("DELETE FROM ");
    qb.push(&qt);
    push_where(&mut qb, model, predicates)?;
    qb.push(" RETURNING row_to_json(").push(&qt).push(".*) AS record");
    Ok(qb)
}

fn records(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<JsonValue>, StoreError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(row.try_get::<JsonValue, _>("record")?);
    }
    Ok(out)
}

#[async_trait]
impl TableStore for PgTableStore {
    async fn select(&self, query: &Select) -> Result<Selected, StoreError> {
        let model = self.model(&query.table)?;
        let mut qb = build_select(&self.registry, model.as_ref(), query)?;
        let rows = records(qb.build().fetch_all(&self.pool).await?)?;

        let count = if query.count {
            let mut cq = build_count(model.as_ref(), query)?;
            let n: i64 = cq.build_query_scalar().fetch_one(&self.pool).await?;
            Some(n.max(0) as u64)
        } else {
            None
        };

        Ok(Selected { rows, count })
    }

    async fn insert(&self, table: &str, rows: &[JsonValue]) -> Result<Vec<JsonValue>, StoreError> {
        let model = self.model(table)?;
        let mut inserted = Vec::with_capacity(rows.len());
        let mut transaction = self.pool.begin().await?;
        for row in rows {
            let mut qb = build_insert(model.as_ref(), row)?;
            let record = qb.build().fetch_one(&mut *transaction).await?;
            inserted.push(record.try_get::<JsonValue, _>("record")?);
        }
        transaction.commit().await?;
        Ok(inserted)
    }

    async fn update(
        &self,
        table: &str,
        patch: &JsonValue,
        predicates: &[Predicate],
    ) -> Result<Vec<JsonValue>, StoreError> {
        let model = self.model(table)?;
        let mut qb = build_update(model.as_ref(), patch, predicates)?;
        records(qb.build().fetch_all(&self.pool).await?)
    }

    async fn delete(
        &self,
        table: &str,
        predicates: &[Predicate],
    ) -> Result<Vec<JsonValue>, StoreError> {
        let model = self.model(table)?;
        let mut qb = build_delete(model.as_ref(), predicates)?;
        records(qb.build().fetch_all(&self.pool).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bookings() -> (ModelRegistry, Arc<dyn TableModel>) {
        let reg = ModelRegistry::admin();
        let model = reg.get("bookings").unwrap();
        (reg, model)
    }

    #[test]
    fn select_renders_embeds_filters_order_and_window() {
        let (reg, model) = bookings();
        let query = Select::from("bookings")
            .columns(vec![
                Column::field("id"),
                Column::field("startDate"),
                Column::embed("cabins", "cabinId", Column::fields(&["name"])),
            ])
            .filter(Predicate::compare("totalPrice", Comparator::Gte, 100))
            .order("created_at", false)
            .range(9, 18);
        let qb = build_select(&reg, model.as_ref(), &query).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT row_to_json(q) AS record FROM (SELECT \"bookings\".\"id\", \"bookings\".\"startDate\", \
             (SELECT row_to_json(\"embed_cabins\") FROM (SELECT \"cabins\".\"name\" FROM \"cabins\" \
             WHERE \"cabins\".\"id\" = \"bookings\".\"cabinId\") \"embed_cabins\") AS \"cabins\" \
             FROM \"bookings\" WHERE \"bookings\".\"totalPrice\" >= $1::float8 \
             ORDER BY \"bookings\".\"created_at\" DESC LIMIT $2 OFFSET $3) q"
        );
    }

    #[test]
    fn any_of_renders_grouped_disjunction() {
        let (reg, model) = bookings();
        let query = Select::from("bookings").filter(Predicate::AnyOf(vec![
            vec![
                Predicate::eq("status", "unconfirmed"),
                Predicate::eq("startDate", "2024-05-01T00:00:00.000Z"),
            ],
            vec![Predicate::eq("status", "checked-in")],
        ]));
        let qb = build_select(&reg, model.as_ref(), &query).unwrap();
        assert!(qb.sql().contains(
            "WHERE ((\"bookings\".\"status\" = $1::text AND \"bookings\".\"startDate\" = $2::timestamptz) \
             OR (\"bookings\".\"status\" = $3::text))"
        ));
    }

    #[test]
    fn null_comparisons_use_is_null() {
        let (_, model) = bookings();
        let query = Select::from("bookings").filter(Predicate::eq("observations", JsonValue::Null));
        let qb = build_count(model.as_ref(), &query).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM \"bookings\" WHERE \"bookings\".\"observations\" IS NULL"
        );
    }

    #[test]
    fn insert_and_update_cast_known_columns() {
        let reg = ModelRegistry::admin();
        let cabins = reg.get("cabins").unwrap();
        let qb = build_insert(cabins.as_ref(), &json!({"name": "001", "maxCapacity": 2})).unwrap();
        assert_eq!(
            qb.sql(),
            "INSERT INTO \"cabins\" (\"maxCapacity\", \"name\") VALUES ($1::int4, $2::text) \
             RETURNING row_to_json(\"cabins\".*) AS record"
        );

        let qb = build_update(cabins.as_ref(), &json!({"discount": 25}), &[Predicate::eq("id", 7)])
            .unwrap();
        assert_eq!(
            qb.sql(),
            "UPDATE \"cabins\" SET \"discount\" = $1::int4 WHERE \"cabins\".\"id\" = $2::int8 \
             RETURNING row_to_json(\"cabins\".*) AS record"
        );
    }

    #[test]
    fn rejects_unsafe_identifiers_and_empty_patches() {
        let (reg, model) = bookings();
        let query = Select::from("bookings").filter(Predicate::eq("id; DROP TABLE x", 1));
        assert!(matches!(
            build_select(&reg, model.as_ref(), &query),
            Err(StoreError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            build_update(model.as_ref(), &json!({}), &[]),
            Err(StoreError::MalformedRow(_))
        ));
    }
}
