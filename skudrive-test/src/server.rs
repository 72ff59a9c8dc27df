//! Exposes an in-process product lookup server for use in integration tests.
//!
//! The server answers `GET /product?sku=<SKU>` with a JSON product for identifiers in its catalog,
//! `404 Not Found` with an empty body for well-formed identifiers outside of it, and
//! `400 Bad Request` otherwise. It records every identifier it receives along with the highest
//! number of requests it ever handled at the same time.
//!
//! ```
//! use skudrive_test::server::LookupServer;
//!
//! #[tokio::main]
//! async fn main() {
//!    let server = LookupServer::new().await;
//!    let url = server.url("/product");
//!    // use the URL in tests...
//! }
//! ```

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use skudrive_types::{Price, Product, Sku};

#[derive(Debug, Default)]
struct Recorder {
    skus: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Clone, Debug)]
struct ServerState {
    recorder: Arc<Recorder>,
    delay: Duration,
    catalog: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    sku: String,
}

async fn lookup(State(state): State<ServerState>, Query(params): Query<LookupParams>) -> Response {
    let recorder = &state.recorder;
    let current = recorder.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    recorder.max_in_flight.fetch_max(current, Ordering::SeqCst);
    recorder.skus.lock().unwrap().push(params.sku.clone());

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    recorder.in_flight.fetch_sub(1, Ordering::SeqCst);

    match params.sku.parse::<Sku>() {
        Ok(sku) if state.catalog.is_some_and(|items| sku.number() >= items) => {
            StatusCode::NOT_FOUND.into_response()
        }
        Ok(sku) => {
            let price = Price::from_cents(Price::MIN.cents() + sku.number() % 1_000_000);
            Json(Product::regular(sku, price)).into_response()
        }
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}

/// An in-process product lookup server for use in integration tests.
///
/// It listens on a random available port on localhost and stops when dropped.
#[derive(Debug)]
pub struct LookupServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    recorder: Arc<Recorder>,
}

impl LookupServer {
    /// Starts a server that answers immediately and knows every well-formed identifier.
    pub async fn new() -> Self {
        Self::start(Duration::ZERO, None).await
    }

    /// Starts a server that waits for `delay` before answering each request.
    pub async fn with_delay(delay: Duration) -> Self {
        Self::start(delay, None).await
    }

    /// Starts a server that only knows the products `THING-00000000` up to, but excluding, `items`.
    ///
    /// This mirrors a product API in front of a table seeded with `items` products. Lookups for any
    /// other well-formed identifier get `404 Not Found`.
    pub async fn with_catalog(items: u64) -> Self {
        Self::start(Duration::ZERO, Some(items)).await
    }

    async fn start(delay: Duration, catalog: Option<u64>) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let recorder = Arc::new(Recorder::default());
        let state = ServerState {
            recorder: Arc::clone(&recorder),
            delay,
            catalog,
        };
        let app = Router::new()
            .route("/product", get(lookup))
            .with_state(state);

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            handle,
            socket,
            recorder,
        }
    }

    /// Returns a full URL pointing to the given path.
    ///
    /// This URL uses the IPv4 loopback address as hostname.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://{}/{}", self.socket, path)
    }

    /// Returns the raw `sku` parameters of all lookups received so far.
    pub fn received(&self) -> Vec<String> {
        self.recorder.skus.lock().unwrap().clone()
    }

    /// Returns the highest number of lookups that were handled concurrently.
    pub fn max_in_flight(&self) -> usize {
        self.recorder.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Drop for LookupServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
