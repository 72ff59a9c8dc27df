use std::collections::HashSet;
use std::time::Duration;

use skudrive_driver::config::ErrorPolicy;
use skudrive_driver::error::DriverError;
use skudrive_driver::http::HttpLookup;
use skudrive_driver::load::{LoadDriver, LoadSummary};
use skudrive_test::server::LookupServer;
use skudrive_types::Sku;
use skudrive_types::sku::{SKU_LEN, SKU_PREFIX};

fn remote(url: &str) -> HttpLookup {
    HttpLookup::new(url, Duration::from_secs(5)).unwrap()
}

/// An endpoint on which nothing listens.
fn closed_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/product")
}

#[tokio::test]
async fn sends_exactly_the_requested_number_of_lookups() {
    skudrive_test::tracing::init();
    let server = LookupServer::new().await;

    let driver = LoadDriver::builder(remote(&server.url("/product")))
        .seed(Some(3))
        .build()
        .unwrap();
    let summary = driver.run(50, 500_000).await.unwrap();

    assert_eq!(
        summary,
        LoadSummary {
            requests: 50,
            failures: 0
        }
    );

    let received = server.received();
    assert_eq!(received.len(), 50);
    for raw in &received {
        assert_eq!(raw.len(), SKU_LEN);
        assert!(raw.starts_with(SKU_PREFIX));
        let sku: Sku = raw.parse().unwrap();
        assert!(sku.number() < 500_000);
    }
}

#[tokio::test]
async fn lookups_are_sequential_by_default() {
    let server = LookupServer::with_delay(Duration::from_millis(5)).await;

    let driver = LoadDriver::builder(remote(&server.url("/product")))
        .build()
        .unwrap();
    driver.run(20, 100).await.unwrap();

    assert_eq!(server.received().len(), 20);
    assert_eq!(server.max_in_flight(), 1);
}

#[tokio::test]
async fn concurrency_bounds_lookups_in_flight() {
    let server = LookupServer::with_delay(Duration::from_millis(50)).await;

    let driver = LoadDriver::builder(remote(&server.url("/product")))
        .concurrency(4)
        .build()
        .unwrap();
    let summary = driver.run(20, 100).await.unwrap();

    assert_eq!(summary.requests, 20);
    assert_eq!(server.received().len(), 20);
    assert!(server.max_in_flight() <= 4);
    assert!(server.max_in_flight() >= 2);
}

#[tokio::test]
async fn small_keyspace_covers_every_identifier() {
    let server = LookupServer::new().await;

    let driver = LoadDriver::builder(remote(&server.url("/product")))
        .seed(Some(11))
        .build()
        .unwrap();
    driver.run(200, 3).await.unwrap();

    let distinct: HashSet<_> = server.received().into_iter().collect();
    let expected: HashSet<_> = ["THING-00000000", "THING-00000001", "THING-00000002"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(distinct, expected);
}

#[tokio::test]
async fn same_seed_same_identifiers() {
    let first = LookupServer::new().await;
    let second = LookupServer::new().await;

    for server in [&first, &second] {
        LoadDriver::builder(remote(&server.url("/product")))
            .seed(Some(99))
            .build()
            .unwrap()
            .run(30, 1_000_000)
            .await
            .unwrap();
    }

    assert_eq!(first.received(), second.received());
}

#[tokio::test]
async fn unknown_products_count_as_completed_lookups() {
    skudrive_test::tracing::init();
    // Default shape of a real run: a small seeded table behind a much larger keyspace.
    let server = LookupServer::with_catalog(10).await;

    let driver = LoadDriver::builder(remote(&server.url("/product")))
        .seed(Some(5))
        .error_policy(ErrorPolicy::Abort)
        .build()
        .unwrap();
    let summary = driver.run(40, 1_000_000).await.unwrap();

    assert_eq!(
        summary,
        LoadSummary {
            requests: 40,
            failures: 0
        }
    );
    let received = server.received();
    assert_eq!(received.len(), 40);
    assert!(
        received
            .iter()
            .any(|raw| raw.parse::<Sku>().unwrap().number() >= 10)
    );
}

#[tokio::test]
async fn network_failures_do_not_stop_the_run() {
    skudrive_test::tracing::init();

    let driver = LoadDriver::builder(remote(&closed_endpoint()))
        .build()
        .unwrap();
    let summary = driver.run(5, 100).await.unwrap();

    assert_eq!(
        summary,
        LoadSummary {
            requests: 5,
            failures: 5
        }
    );
}

#[tokio::test]
async fn abort_policy_stops_at_first_failure() {
    let driver = LoadDriver::builder(remote(&closed_endpoint()))
        .error_policy(ErrorPolicy::Abort)
        .build()
        .unwrap();

    let err = driver.run(5, 100).await.unwrap_err();
    assert!(matches!(err, DriverError::Lookup(_)));
}
