//! Declarative booking list requests and their translation into a store `Select`.

use crate::domain::model::BOOKINGS;
use crate::error::AdminError;
use crate::storage::query::{Column, Comparator, Predicate, RowRange, Select};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::num::NonZeroU32;
use utoipa::ToSchema;

/// Columns of the bookings list; the plain ones double as the sortable allow-list.
pub const LIST_FIELDS: &[&str] = &[
    "id",
    "created_at",
    "startDate",
    "endDate",
    "numNights",
    "numGuests",
    "status",
    "totalPrice",
];

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuerySpec {
    #[serde(default)]
    pub filter: Option<BookingFilter>,
    #[serde(default)]
    pub sort_by: Option<BookingSort>,
    #[serde(default)]
    #[schema(value_type = Option<u32>)]
    pub page: Option<NonZeroU32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingFilter {
    pub field: String,
    #[serde(default)]
    pub method: Comparator,
    #[schema(value_type = Object)]
    pub value: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingSort {
    /// A display label ("Sort by date") or a column name.
    pub field: String,
    /// Missing or null means ascending.
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    #[serde(other)]
    Desc,
}

/// Immutable display-label → column mapping for the sort selector.
#[derive(Debug, Clone, PartialEq)]
pub struct SortFieldMap {
    labels: HashMap<String, String>,
    sortable: Vec<String>,
}

impl SortFieldMap {
    pub fn new<L, S>(labels: L, sortable: S) -> Self
    where
        L: IntoIterator<Item = (String, String)>,
        S: IntoIterator<Item = String>,
    {
        Self {
            labels: labels.into_iter().collect(),
            sortable: sortable.into_iter().collect(),
        }
    }

    /// Maps a label to its column (unknown labels pass through as column names),
    /// then checks the column against the sortable allow-list.
    pub fn resolve(&self, field: &str) -> Result<&str, AdminError> {
        let column = self
            .labels
            .get(field)
            .map(String::as_str)
            .unwrap_or(field);
        self.sortable
            .iter()
            .find(|c| c.as_str() == column)
            .map(String::as_str)
            .ok_or_else(|| AdminError::InvalidSortField(column.to_string()))
    }
}

impl Default for SortFieldMap {
    fn default() -> Self {
        let labels = [
            ("Sort by amount (high first)", "totalPrice"),
            ("Sort by amount (low first)", "totalPrice"),
            ("Sort by date", "created_at"),
            ("Sort by date (earlier first)", "created_at"),
            ("Sort by date (recent first)", "created_at"),
        ];
        Self::new(
            labels
                .iter()
                .map(|(l, c)| (l.to_string(), c.to_string())),
            LIST_FIELDS.iter().map(|f| f.to_string()),
        )
    }
}

/// How a page number becomes a row window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationMode {
    /// `from = (page - 1) * (page_size - 1)`: consecutive pages overlap by one row
    /// per page. This is what the dashboard has always shipped.
    #[default]
    Legacy,
    /// `from = (page - 1) * page_size`.
    Standard,
}

impl PaginationMode {
    /// Inclusive window `[from, from + page_size - 1]`.
    pub fn window(&self, page: NonZeroU32, page_size: u32) -> RowRange {
        let page_size = u64::from(page_size.max(1));
        let index = u64::from(page.get()) - 1;
        let from = match self {
            PaginationMode::Legacy => index * (page_size - 1),
            PaginationMode::Standard => index * page_size,
        };
        RowRange {
            from,
            to: from + page_size - 1,
        }
    }
}

impl std::str::FromStr for PaginationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(PaginationMode::Legacy),
            "standard" => Ok(PaginationMode::Standard),
            other => Err(format!("unknown pagination mode: {}", other)),
        }
    }
}

/// Query-builder configuration, passed in rather than held globally.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingQueryConfig {
    pub sort_fields: SortFieldMap,
    pub page_size: u32,
    pub pagination: PaginationMode,
}

impl Default for BookingQueryConfig {
    fn default() -> Self {
        Self {
            sort_fields: SortFieldMap::default(),
            page_size: DEFAULT_PAGE_SIZE,
            pagination: PaginationMode::default(),
        }
    }
}

impl BookingQueryConfig {
    /// Builds the bookings list query. Fails before touching any store when the
    /// sort field is not allowed.
    pub fn build_list_query(&self, spec: &BookingQuerySpec) -> Result<Select, AdminError> {
        let sort = match &spec.sort_by {
            Some(sort) => Some((
                self.sort_fields.resolve(&sort.field)?,
                sort.direction.unwrap_or_default(),
            )),
            None => None,
        };

        let mut columns = Column::fields(LIST_FIELDS);
        columns.push(Column::embed("cabins", "cabinId", Column::fields(&["name"])));
        columns.push(Column::embed(
            "guests",
            "guestId",
            Column::fields(&["fullName", "email"]),
        ));

        let mut query = Select::from(BOOKINGS).columns(columns).with_count();

        if let Some(filter) = &spec.filter {
            query = query.filter(Predicate::compare(
                &filter.field,
                filter.method,
                filter.value.clone(),
            ));
        }

        // Pagination only applies together with an explicit sort.
        if let Some((column, direction)) = sort {
            query = query.order(column, direction == SortDirection::Asc);
            if let Some(page) = spec.page {
                let window = self.pagination.window(page, self.page_size);
                query = query.range(window.from, window.to);
            }
        }

        Ok(query)
    }
}
