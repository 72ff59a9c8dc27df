//! Exposes an in-process server speaking the DynamoDB JSON 1.0 protocol.
//!
//! Requests are dispatched on the operation named in the `X-Amz-Target` header. Each operation
//! answers with a canned response, `200 {}` unless configured otherwise. Errors are sent the way
//! DynamoDB sends them: a `400` with the exception name in `__type`.
//!
//! ```
//! use skudrive_test::dynamodb::DynamoDbStub;
//!
//! #[tokio::main]
//! async fn main() {
//!    let stub = DynamoDbStub::new().await;
//!    stub.fail("DeleteTable", "ResourceNotFoundException");
//!    let endpoint = stub.url();
//!    // point a DynamoDB client at the endpoint...
//! }
//! ```

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};

const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const ERROR_NAMESPACE: &str = "com.amazonaws.dynamodb.v20120810";

#[derive(Debug, Default)]
struct StubState {
    responses: Mutex<HashMap<String, (StatusCode, Value)>>,
    requests: Mutex<Vec<(String, Value)>>,
}

async fn dispatch(State(state): State<Arc<StubState>>, headers: HeaderMap, body: String) -> Response {
    let operation = headers
        .get("x-amz-target")
        .and_then(|value| value.to_str().ok())
        .and_then(|target| target.rsplit('.').next())
        .unwrap_or_default()
        .to_owned();
    let request = serde_json::from_str(&body).unwrap_or(Value::Null);
    state
        .requests
        .lock()
        .unwrap()
        .push((operation.clone(), request));

    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .get(&operation)
        .cloned()
        .unwrap_or((StatusCode::OK, json!({})));

    (status, [(header::CONTENT_TYPE, CONTENT_TYPE)], body.to_string()).into_response()
}

/// An in-process DynamoDB endpoint with canned responses.
///
/// It listens on a random available port on localhost and stops when dropped.
#[derive(Debug)]
pub struct DynamoDbStub {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    state: Arc<StubState>,
}

impl DynamoDbStub {
    /// Starts a stub that answers every operation with `200 {}`.
    pub async fn new() -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/", post(dispatch))
            .with_state(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            handle,
            socket,
            state,
        }
    }

    /// Returns the endpoint URL to configure on the DynamoDB client.
    pub fn url(&self) -> String {
        format!("http://{}", self.socket)
    }

    /// Answers `operation`, such as `"CreateTable"`, with `200` and the given JSON body.
    pub fn respond(&self, operation: &str, body: Value) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(operation.to_owned(), (StatusCode::OK, body));
    }

    /// Answers `operation` with a `400` carrying the given exception, such as
    /// `"ResourceNotFoundException"`.
    pub fn fail(&self, operation: &str, exception: &str) {
        let body = json!({
            "__type": format!("{ERROR_NAMESPACE}#{exception}"),
            "message": format!("{exception} raised by stub"),
        });
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(operation.to_owned(), (StatusCode::BAD_REQUEST, body));
    }

    /// Returns the operation name and JSON body of all requests received so far.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for DynamoDbStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
