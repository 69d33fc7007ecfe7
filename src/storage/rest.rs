//! Client for a hosted backend-as-a-service exposing PostgREST tables
//! (`/rest/v1/{table}`) and object storage (`/storage/v1/object/...`).

use crate::error::StoreError;
use crate::storage::query::{validate_ident, Column, Comparator, Predicate, Select, Selected};
use crate::storage::{public_object_address, ObjectStore, StoredObject, TableStore, UploadResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value as JsonValue;
use std::time::Duration;

#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> Result<String, StoreError> {
        if !validate_ident(table) {
            return Err(StoreError::InvalidIdentifier(table.to_string()));
        }
        Ok(format!("{}/rest/v1/{}", self.base_url, table))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, StoreError> {
        let resp = self.authorize(req).send().await?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status { status, body })
    }

    async fn mutate(&self, req: RequestBuilder) -> Result<Vec<JsonValue>, StoreError> {
        let resp = self
            .send(req.header("Prefer", "return=representation"))
            .await?;
        Ok(resp.json().await?)
    }
}

pub(crate) fn render_columns(columns: &[Column]) -> Result<String, StoreError> {
    let mut parts = Vec::with_capacity(columns.len());
    for column in columns {
        match column {
            Column::All => parts.push("*".to_string()),
            Column::Field(name) => {
                if !validate_ident(name) {
                    return Err(StoreError::InvalidIdentifier(name.clone()));
                }
                parts.push(name.clone());
            }
            Column::Embed {
                relation, columns, ..
            } => {
                if !validate_ident(relation) {
                    return Err(StoreError::InvalidIdentifier(relation.clone()));
                }
                parts.push(format!("{}({})", relation, render_columns(columns)?));
            }
        }
    }
    Ok(parts.join(","))
}

fn scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Values inside logic trees (`or=(...)`) must be quoted when they contain reserved characters.
fn logic_scalar(value: &JsonValue) -> String {
    let raw = scalar(value);
    if raw.chars().any(|c| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | ' ')) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

fn null_operator(comparator: Comparator) -> &'static str {
    if comparator == Comparator::Neq {
        "not.is.null"
    } else {
        "is.null"
    }
}

fn render_condition(predicate: &Predicate) -> Result<String, StoreError> {
    match predicate {
        Predicate::Compare {
            field,
            comparator,
            value,
        } => {
            if !validate_ident(field) {
                return Err(StoreError::InvalidIdentifier(field.clone()));
            }
            if value.is_null() {
                return Ok(format!("{}.{}", field, null_operator(*comparator)));
            }
            Ok(format!("{}.{}.{}", field, comparator.as_rest(), logic_scalar(value)))
        }
        Predicate::AnyOf(groups) => Ok(format!("or({})", render_groups(groups)?)),
    }
}

fn render_groups(groups: &[Vec<Predicate>]) -> Result<String, StoreError> {
    let mut rendered = Vec::with_capacity(groups.len());
    for group in groups {
        let conds = group
            .iter()
            .map(render_condition)
            .collect::<Result<Vec<_>, _>>()?;
        if conds.len() == 1 {
            rendered.extend(conds);
        } else {
            rendered.push(format!("and({})", conds.join(",")));
        }
    }
    Ok(rendered.join(","))
}

/// Horizontal filters as `(key, value)` query parameters.
pub(crate) fn filter_params(predicates: &[Predicate]) -> Result<Vec<(String, String)>, StoreError> {
    let mut params = Vec::with_capacity(predicates.len());
    for predicate in predicates {
        match predicate {
            Predicate::Compare {
                field,
                comparator,
                value,
            } => {
                if !validate_ident(field) {
                    return Err(StoreError::InvalidIdentifier(field.clone()));
                }
                let rhs = if value.is_null() {
                    null_operator(*comparator).to_string()
                } else {
                    format!("{}.{}", comparator.as_rest(), scalar(value))
                };
                params.push((field.clone(), rhs));
            }
            Predicate::AnyOf(groups) => {
                params.push(("or".to_string(), format!("({})", render_groups(groups)?)));
            }
        }
    }
    Ok(params)
}

pub(crate) fn select_params(query: &Select) -> Result<Vec<(String, String)>, StoreError> {
    let mut params = vec![("select".to_string(), render_columns(&query.columns)?)];
    params.extend(filter_params(&query.predicates)?);
    if let Some(order) = &query.order {
        if !validate_ident(&order.field) {
            return Err(StoreError::InvalidIdentifier(order.field.clone()));
        }
        let dir = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.field, dir)));
    }
    Ok(params)
}

/// Total from `Content-Range: 0-9/42` (or `*/42`).
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

#[async_trait]
impl TableStore for RestStore {
    async fn select(&self, query: &Select) -> Result<Selected, StoreError> {
        let mut req = self
            .client
            .get(self.table_url(&query.table)?)
            .query(&select_params(query)?);
        if let Some(range) = query.range {
            req = req
                .header("Range-Unit", "items")
                .header("Range", format!("{}-{}", range.from, range.to));
        }
        if query.count {
            req = req.header("Prefer", "count=exact");
        }

        let resp = self.authorize(req).send().await?;
        // Offset past the last row: PostgREST answers 416 but still reports the total.
        if resp.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Selected {
                rows: Vec::new(),
                count: content_range_total(resp.headers()),
            });
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        let count = if query.count {
            content_range_total(resp.headers())
        } else {
            None
        };
        let rows: Vec<JsonValue> = resp.json().await?;
        Ok(Selected { rows, count })
    }

    async fn insert(&self, table: &str, rows: &[JsonValue]) -> Result<Vec<JsonValue>, StoreError> {
        let req = self.client.post(self.table_url(table)?).json(rows);
        self.mutate(req).await
    }

    async fn update(
        &self,
        table: &str,
        patch: &JsonValue,
        predicates: &[Predicate],
    ) -> Result<Vec<JsonValue>, StoreError> {
        let req = self
            .client
            .patch(self.table_url(table)?)
            .query(&filter_params(predicates)?)
            .json(patch);
        self.mutate(req).await
    }

    async fn delete(
        &self,
        table: &str,
        predicates: &[Predicate],
    ) -> Result<Vec<JsonValue>, StoreError> {
        let req = self
            .client
            .delete(self.table_url(table)?)
            .query(&filter_params(predicates)?);
        self.mutate(req).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let req = self.client.get(format!("{}/rest/v1/", self.base_url));
        self.send(req).await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for RestStore {
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        object: StoredObject,
    ) -> Result<UploadResult, StoreError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, name);
        let req = self
            .client
            .post(url)
            .header(CONTENT_TYPE, object.content_type)
            .body(object.bytes);
        self.send(req).await?;
        Ok(UploadResult {
            public_address: self.public_address(bucket, name),
        })
    }

    async fn download(&self, bucket: &str, name: &str) -> Result<Option<StoredObject>, StoreError> {
        let resp = self
            .client
            .get(self.public_address(bucket, name))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = resp.bytes().await?.to_vec();
        Ok(Some(StoredObject {
            content_type,
            bytes,
        }))
    }

    fn public_address(&self, bucket: &str, name: &str) -> String {
        public_object_address(&self.base_url, bucket, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn select_params_render_embeds_filters_and_order() {
        let query = Select::from("bookings")
            .columns(vec![
                Column::field("id"),
                Column::field("created_at"),
                Column::embed("cabins", "cabinId", Column::fields(&["name"])),
                Column::embed("guests", "guestId", Column::fields(&["fullName", "email"])),
            ])
            .filter(Predicate::compare("totalPrice", Comparator::Gte, 500))
            .order("created_at", false);
        let params = select_params(&query).unwrap();
        assert_eq!(
            params,
            vec![
                (
                    "select".to_string(),
                    "id,created_at,cabins(name),guests(fullName,email)".to_string()
                ),
                ("totalPrice".to_string(), "gte.500".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn any_of_renders_or_tree_with_quoted_values() {
        let params = filter_params(&[Predicate::AnyOf(vec![
            vec![
                Predicate::eq("status", "unconfirmed"),
                Predicate::eq("startDate", "2024-05-01T00:00:00.000Z"),
            ],
            vec![
                Predicate::eq("status", "checked-in"),
                Predicate::eq("endDate", "2024-05-01T00:00:00.000Z"),
            ],
        ])])
        .unwrap();
        assert_eq!(
            params,
            vec![(
                "or".to_string(),
                "(and(status.eq.unconfirmed,startDate.eq.\"2024-05-01T00:00:00.000Z\"),\
                 and(status.eq.checked-in,endDate.eq.\"2024-05-01T00:00:00.000Z\"))"
                    .to_string()
            )]
        );
    }

    #[test]
    fn null_values_use_is_operator() {
        let params = filter_params(&[
            Predicate::eq("observations", JsonValue::Null),
            Predicate::compare("image", Comparator::Neq, JsonValue::Null),
        ])
        .unwrap();
        assert_eq!(params[0].1, "is.null");
        assert_eq!(params[1].1, "not.is.null");
    }

    #[test]
    fn content_range_total_parses_both_forms() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("0-9/42"));
        assert_eq!(content_range_total(&headers), Some(42));
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("*/0"));
        assert_eq!(content_range_total(&headers), Some(0));
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("0-9/*"));
        assert_eq!(content_range_total(&headers), None);
    }

    #[test]
    fn rejects_bad_identifiers() {
        let query = Select::from("bookings").order("created_at; --", true);
        assert!(matches!(
            select_params(&query),
            Err(StoreError::InvalidIdentifier(_))
        ));
    }
}
