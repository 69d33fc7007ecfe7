use crate::app::logged;
use crate::domain::booking::{
    Booking, BookingDetail, BookingPatch, BookingSales, BookingStatus, BookingSummary, Stay,
    TodayActivity,
};
use crate::domain::booking_query::{BookingQueryConfig, BookingQuerySpec};
use crate::domain::model::BOOKINGS;
use crate::error::AdminError;
use crate::infra::clock::{end_of_day, format_timestamp, start_of_day, Clock};
use crate::storage::{decode_rows, decode_single, Column, Comparator, Predicate, Select, TableStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// One window of the bookings list and the number of bookings matching the filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingPage {
    pub rows: Vec<BookingSummary>,
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

#[derive(Clone)]
pub struct BookingService {
    tables: Arc<dyn TableStore>,
    config: Arc<BookingQueryConfig>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(
        tables: Arc<dyn TableStore>,
        config: Arc<BookingQueryConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tables,
            config,
            clock,
        }
    }

    pub fn query_config(&self) -> &BookingQueryConfig {
        &self.config
    }

    pub async fn list_bookings(&self, spec: &BookingQuerySpec) -> Result<BookingPage, AdminError> {
        let query = self.config.build_list_query(spec)?;
        let selected = self
            .tables
            .select(&query)
            .await
            .map_err(logged("loading bookings", AdminError::BookingsLoadFailed))?;
        let total_count = selected.count.unwrap_or(selected.rows.len() as u64);
        let rows = decode_rows(selected.rows)
            .map_err(logged("decoding bookings", AdminError::BookingsLoadFailed))?;
        Ok(BookingPage { rows, total_count })
    }

    pub async fn get_booking(&self, id: i64) -> Result<BookingDetail, AdminError> {
        let query = Select::from(BOOKINGS)
            .columns(vec![
                Column::All,
                Column::embed("cabins", "cabinId", vec![Column::All]),
                Column::embed("guests", "guestId", vec![Column::All]),
            ])
            .filter(Predicate::eq("id", id));
        let selected = self
            .tables
            .select(&query)
            .await
            .map_err(logged("loading booking", AdminError::BookingNotFound))?;
        decode_single(selected.rows).map_err(logged("loading booking", AdminError::BookingNotFound))
    }

    /// Bookings created between `date` and the end of today, for sales statistics.
    pub async fn get_bookings_created_after(
        &self,
        date: DateTime<Utc>,
    ) -> Result<Vec<BookingSales>, AdminError> {
        let until = end_of_day(self.clock.now());
        let query = Select::from(BOOKINGS)
            .columns(Column::fields(&["created_at", "totalPrice", "extrasPrice"]))
            .filter(Predicate::compare(
                "created_at",
                Comparator::Gte,
                format_timestamp(date),
            ))
            .filter(Predicate::compare(
                "created_at",
                Comparator::Lte,
                format_timestamp(until),
            ));
        self.load(&query, "loading bookings created after date").await
    }

    /// Stays whose start date lies between `date` and today.
    pub async fn get_stays_starting_after(
        &self,
        date: DateTime<Utc>,
    ) -> Result<Vec<Stay>, AdminError> {
        let today = start_of_day(self.clock.now());
        let query = Select::from(BOOKINGS)
            .columns(vec![
                Column::All,
                Column::embed("guests", "guestId", Column::fields(&["fullName"])),
            ])
            .filter(Predicate::compare(
                "startDate",
                Comparator::Gte,
                format_timestamp(date),
            ))
            .filter(Predicate::compare(
                "startDate",
                Comparator::Lte,
                format_timestamp(today),
            ));
        self.load(&query, "loading stays").await
    }

    /// Arrivals still unconfirmed and departures still checked in, for today.
    pub async fn get_todays_activity(&self) -> Result<Vec<TodayActivity>, AdminError> {
        let today = format_timestamp(start_of_day(self.clock.now()));
        let query = Select::from(BOOKINGS)
            .columns(vec![
                Column::All,
                Column::embed(
                    "guests",
                    "guestId",
                    Column::fields(&["fullName", "nationality", "countryFlag"]),
                ),
            ])
            .filter(Predicate::AnyOf(vec![
                vec![
                    Predicate::eq("status", BookingStatus::Unconfirmed.as_str()),
                    Predicate::eq("startDate", today.clone()),
                ],
                vec![
                    Predicate::eq("status", BookingStatus::CheckedIn.as_str()),
                    Predicate::eq("endDate", today),
                ],
            ]))
            .order("created_at", true);
        self.load(&query, "loading today's activity").await
    }

    pub async fn update_booking(
        &self,
        id: i64,
        patch: &BookingPatch,
    ) -> Result<Booking, AdminError> {
        let rows = self
            .tables
            .update(BOOKINGS, &patch.to_row(), &[Predicate::eq("id", id)])
            .await
            .map_err(logged("updating booking", AdminError::BookingUpdateFailed))?;
        decode_single(rows).map_err(logged("updating booking", AdminError::BookingUpdateFailed))
    }

    pub async fn delete_booking(&self, id: i64) -> Result<(), AdminError> {
        self.tables
            .delete(BOOKINGS, &[Predicate::eq("id", id)])
            .await
            .map_err(logged("deleting booking", AdminError::BookingDeleteFailed))?;
        Ok(())
    }

    async fn load<T: serde::de::DeserializeOwned>(
        &self,
        query: &Select,
        context: &'static str,
    ) -> Result<Vec<T>, AdminError> {
        let selected = self
            .tables
            .select(query)
            .await
            .map_err(logged(context, AdminError::BookingsLoadFailed))?;
        decode_rows(selected.rows).map_err(logged(context, AdminError::BookingsLoadFailed))
    }
}
