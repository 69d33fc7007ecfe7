//! Booking list windows and counts, driven through the public service API.

use chrono::{Duration, TimeZone, Utc};
use hotel_admin::domain::booking_query::{BookingQueryConfig, BookingQuerySpec, PaginationMode};
use hotel_admin::storage::{MemoryStore, StoreOp};
use hotel_admin::{AdminError, BookingService, FixedClock};
use serde_json::json;
use std::sync::Arc;

async fn seeded_store(bookings: i64) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::recording("http://localhost:3000"));
    let first = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let rows = (1..=bookings)
        .map(|id| {
            let created = first + Duration::days(id);
            json!({
                "id": id,
                "created_at": created.to_rfc3339(),
                "startDate": (created + Duration::days(10)).to_rfc3339(),
                "endDate": (created + Duration::days(12)).to_rfc3339(),
                "numNights": 2, "numGuests": 1,
                "cabinPrice": 300.0, "extrasPrice": 0.0, "totalPrice": 300.0 + id as f64,
                "status": if id % 3 == 0 { "checked-out" } else { "unconfirmed" },
                "hasBreakfast": false, "isPaid": false, "observations": null,
                "cabinId": null, "guestId": null
            })
        })
        .collect();
    store.seed("bookings", rows).await;
    store
}

fn service(store: Arc<MemoryStore>, pagination: PaginationMode) -> BookingService {
    let config = BookingQueryConfig {
        pagination,
        ..Default::default()
    };
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    BookingService::new(store, Arc::new(config), Arc::new(clock))
}

fn spec(value: serde_json::Value) -> BookingQuerySpec {
    serde_json::from_value(value).unwrap()
}

fn ids(page: &hotel_admin::BookingPage) -> Vec<i64> {
    page.rows.iter().map(|b| b.id).collect()
}

#[tokio::test]
async fn test_legacy_second_page_overlaps_first() -> anyhow::Result<()> {
    let store = seeded_store(25).await;
    let bookings = service(store, PaginationMode::Legacy);

    let first = bookings
        .list_bookings(&spec(json!({"sortBy": {"field": "Sort by date"}, "page": 1})))
        .await?;
    let second = bookings
        .list_bookings(&spec(json!({"sortBy": {"field": "Sort by date"}, "page": 2})))
        .await?;

    assert_eq!(ids(&first), (1..=10).collect::<Vec<_>>());
    // Window 9..=18 starts on the last row of page one.
    assert_eq!(ids(&second), (10..=19).collect::<Vec<_>>());
    assert_eq!(second.total_count, 25);
    Ok(())
}

#[tokio::test]
async fn test_standard_pages_do_not_overlap() -> anyhow::Result<()> {
    let store = seeded_store(25).await;
    let bookings = service(store, PaginationMode::Standard);

    let third = bookings
        .list_bookings(&spec(json!({"sortBy": {"field": "Sort by date"}, "page": 3})))
        .await?;
    assert_eq!(ids(&third), (21..=25).collect::<Vec<_>>());
    assert_eq!(third.total_count, 25);
    Ok(())
}

#[tokio::test]
async fn test_page_without_sort_returns_everything() -> anyhow::Result<()> {
    let store = seeded_store(25).await;
    let bookings = service(store, PaginationMode::Legacy);

    let page = bookings.list_bookings(&spec(json!({"page": 2}))).await?;
    assert_eq!(page.rows.len(), 25);
    assert_eq!(page.total_count, 25);
    Ok(())
}

#[tokio::test]
async fn test_count_follows_filter_not_window() -> anyhow::Result<()> {
    let store = seeded_store(25).await;
    let bookings = service(store, PaginationMode::Legacy);

    let page = bookings
        .list_bookings(&spec(json!({
            "filter": {"field": "status", "value": "checked-out"},
            "sortBy": {"field": "Sort by amount (high first)", "direction": "desc"},
            "page": 1
        })))
        .await?;
    assert_eq!(page.total_count, 8);
    assert_eq!(page.rows.len(), 8);
    assert_eq!(page.rows[0].id, 24);

    let page = bookings
        .list_bookings(&spec(json!({
            "filter": {"field": "totalPrice", "method": "gte", "value": 320.0}
        })))
        .await?;
    assert_eq!(page.total_count, 6);
    Ok(())
}

#[tokio::test]
async fn test_rejected_sort_field_never_queries() -> anyhow::Result<()> {
    let store = seeded_store(3).await;
    let bookings = service(store.clone(), PaginationMode::Legacy);

    let res = bookings
        .list_bookings(&spec(json!({"sortBy": {"field": "cabins.name"}, "page": 1})))
        .await;
    assert_eq!(res, Err(AdminError::InvalidSortField("cabins.name".to_string())));
    assert!(store.calls().await.is_empty());

    bookings
        .list_bookings(&spec(json!({"sortBy": {"field": "numNights"}})))
        .await?;
    let ops: Vec<StoreOp> = store.calls().await.iter().map(|c| c.op).collect();
    assert_eq!(ops, vec![StoreOp::Select]);
    Ok(())
}
