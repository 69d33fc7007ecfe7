//! End-to-end test of the HTTP surface against the in-memory backend.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{TimeZone, Utc};
use hotel_admin::domain::booking_query::BookingQueryConfig;
use hotel_admin::infra::backend::memory_store;
use hotel_admin::{transport, FixedClock, Services};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> anyhow::Result<Self> {
        // Bind first so uploaded objects get addresses pointing back at this server.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(memory_store(&base_url).await);
        store
            .seed(
                "guests",
                vec![json!({"id": 1, "fullName": "Jonas Schmedtmann", "email": "hello@jonas.io",
                            "nationality": "Portugal", "countryFlag": "pt.svg"})],
            )
            .await;
        store
            .seed(
                "cabins",
                vec![json!({"id": 1, "name": "001", "maxCapacity": 2, "regularPrice": 250,
                            "discount": 0, "description": "Small cabin", "image": null})],
            )
            .await;
        store
            .seed(
                "bookings",
                vec![
                    json!({"id": 1, "created_at": "2024-05-01T08:00:00Z",
                           "startDate": "2024-05-03T00:00:00Z", "endDate": "2024-05-06T00:00:00Z",
                           "numNights": 3, "numGuests": 2, "cabinPrice": 750.0, "extrasPrice": 0.0,
                           "totalPrice": 750.0, "status": "unconfirmed", "hasBreakfast": false,
                           "isPaid": false, "observations": null, "cabinId": 1, "guestId": 1}),
                    json!({"id": 2, "created_at": "2024-04-20T08:00:00Z",
                           "startDate": "2024-04-28T00:00:00Z", "endDate": "2024-05-03T00:00:00Z",
                           "numNights": 5, "numGuests": 1, "cabinPrice": 1250.0, "extrasPrice": 75.0,
                           "totalPrice": 1325.0, "status": "checked-in", "hasBreakfast": true,
                           "isPaid": true, "observations": null, "cabinId": 1, "guestId": 1}),
                ],
            )
            .await;

        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap());
        let services = Services::new(
            store.clone(),
            store,
            BookingQueryConfig::default(),
            Arc::new(clock),
        );
        let router = transport::http::create_router(transport::http::AppState { services });
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> anyhow::Result<(u16, JsonValue)> {
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.json::<JsonValue>().await?;
        Ok((status, body))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_and_settings() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = server.send(server.client.get(server.url("/health"))).await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = server
        .send(server.client.get(server.url("/api/settings")))
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["maxGuestsPerBooking"], 8);

    let (status, body) = server
        .send(
            server
                .client
                .patch(server.url("/api/settings"))
                .json(&json!({"breakfastPrice": 20.0})),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["breakfastPrice"], 20.0);
    assert_eq!(body["data"]["minBookingLength"], 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_booking_endpoints() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = server
        .send(
            server
                .client
                .post(server.url("/api/bookings/query"))
                .json(&json!({"sortBy": {"field": "Sort by date (recent first)", "direction": "desc"},
                               "page": 1})),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalCount"], 2);
    assert_eq!(body["data"]["rows"][0]["id"], 1);
    assert_eq!(body["data"]["rows"][0]["guests"]["fullName"], "Jonas Schmedtmann");

    let (status, body) = server
        .send(
            server
                .client
                .post(server.url("/api/bookings/query"))
                .json(&json!({"sortBy": {"field": "observations"}})),
        )
        .await?;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);

    let resp = server
        .client
        .post(server.url("/api/bookings/query"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);

    let (status, body) = server
        .send(server.client.get(server.url("/api/bookings/2")))
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["cabins"]["name"], "001");
    assert_eq!(body["data"]["guests"]["email"], "hello@jonas.io");

    let (status, _) = server
        .send(server.client.get(server.url("/api/bookings/42")))
        .await?;
    assert_eq!(status, 404);

    let (status, body) = server
        .send(server.client.get(server.url("/api/activity/today")))
        .await?;
    assert_eq!(status, 200);
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 1]);

    let (status, body) = server
        .send(
            server
                .client
                .get(server.url("/api/bookings/created-after"))
                .query(&[("date", "2024-04-25T00:00:00Z")]),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = server
        .send(
            server
                .client
                .get(server.url("/api/stays/starting-after"))
                .query(&[("date", "2024-04-25T00:00:00Z")]),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = server
        .send(server.client.get(server.url("/api/bookings/created-after")))
        .await?;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));

    let (status, body) = server
        .send(
            server
                .client
                .get(server.url("/api/stays/starting-after"))
                .query(&[("date", "yesterday")]),
        )
        .await?;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);

    let (status, body) = server
        .send(
            server
                .client
                .patch(server.url("/api/bookings/1"))
                .json(&json!({"status": "checked-in", "isPaid": true})),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "checked-in");

    let (status, _) = server
        .send(server.client.delete(server.url("/api/bookings/1")))
        .await?;
    assert_eq!(status, 200);
    let (status, _) = server
        .send(server.client.get(server.url("/api/bookings/1")))
        .await?;
    assert_eq!(status, 404);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cabin_upload_is_served_back() -> anyhow::Result<()> {
    let server = TestServer::start().await?;
    let image = vec![0x89, b'P', b'N', b'G', 1, 2, 3];

    let (status, body) = server
        .send(server.client.post(server.url("/api/cabins")).json(&json!({
            "name": "002", "maxCapacity": 4, "regularPrice": 400, "discount": 50,
            "description": "Family cabin",
            "image": {"upload": {"file_name": "cabin-002.png", "content_type": "image/png",
                                 "data_base64": BASE64.encode(&image)}}
        })))
        .await?;
    assert_eq!(status, 200);
    let cabin = &body["data"][0];
    let address = cabin["image"].as_str().unwrap().to_string();
    let prefix = server.url("/storage/v1/object/public/cabin-images/");
    assert!(address.starts_with(&prefix), "{}", address);
    assert!(address.ends_with("-cabin-002.png"));

    let resp = server.client.get(&address).send().await?;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "image/png"
    );
    assert_eq!(resp.bytes().await?.to_vec(), image);

    let id = cabin["id"].as_i64().unwrap();
    let (status, body) = server
        .send(
            server
                .client
                .put(server.url(&format!("/api/cabins/{}", id)))
                .json(&json!({
                    "name": "002", "maxCapacity": 5, "regularPrice": 400, "discount": 0,
                    "description": "Family cabin", "image": {"stored": address}
                })),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["maxCapacity"], 5);
    assert_eq!(body["data"][0]["image"], address.as_str());

    let (status, body) = server
        .send(server.client.post(server.url("/api/cabins")).json(&json!({
            "name": "003", "maxCapacity": 2, "regularPrice": 100, "discount": 101,
            "description": "x", "image": {"stored": address}
        })))
        .await?;
    assert_eq!(status, 400);
    assert_eq!(
        body["error"],
        "discount: Discount should be less than regular price"
    );

    let (status, body) = server
        .send(server.client.get(server.url("/api/cabins")))
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = server
        .send(server.client.delete(server.url(&format!("/api/cabins/{}", id))))
        .await?;
    assert_eq!(status, 200);

    let (status, _) = server
        .send(
            server
                .client
                .get(server.url("/storage/v1/object/public/cabin-images/missing.png")),
        )
        .await?;
    assert_eq!(status, 404);
    Ok(())
}
