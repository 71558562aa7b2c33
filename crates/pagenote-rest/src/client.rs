//! Connection parameters and the two terminal actions.

use std::{fmt, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    envelope::Envelope,
    error::RestError,
    http_client::{HttpRequest, HttpResponse, Transport, UreqTransport},
    query::{spec::table_url, Query, QuerySpec},
};

/// Holds the base endpoint and auth headers, and mints [`Query`] objects.
///
/// Immutable after construction and cheap to clone; clones share the same
/// transport.
#[derive(Clone)]
pub struct Client {
    url: String,
    key: String,
    headers: Arc<[(String, String)]>,
    transport: Arc<dyn Transport>,
}

/// Creates a client using the default `ureq` transport.
pub fn create_client(url: &str, key: &str) -> Client {
    Client::new(url, key)
}

impl Client {
    pub fn new(url: &str, key: &str) -> Self {
        Self::with_transport(url, key, Arc::new(UreqTransport::default()))
    }

    /// Creates a client that sends every request through `transport`.
    ///
    /// One trailing slash is stripped from `url`; nothing else is checked.
    /// A malformed URL or key only shows up as an error on the first request.
    pub fn with_transport(url: &str, key: &str, transport: Arc<dyn Transport>) -> Self {
        let url = url.strip_suffix('/').unwrap_or(url).to_string();
        let headers: Arc<[(String, String)]> = Arc::from(vec![
            ("apikey".to_string(), key.to_string()),
            ("Authorization".to_string(), format!("Bearer {key}")),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Prefer".to_string(), "return=representation".to_string()),
        ]);

        Self {
            url,
            key: key.to_string(),
            headers,
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Starts a query against `table`.
    pub fn from(&self, table: &str) -> Query {
        Query::new(self.clone(), table)
    }

    /// Runs `spec` as a single GET.
    ///
    /// Always resolves: transport failures, non-2xx statuses and malformed
    /// bodies come back as an envelope with empty `data` and `error` set.
    pub async fn execute(&self, spec: &QuerySpec) -> Envelope<Vec<Value>> {
        let request = HttpRequest::get(spec.url(&self.url), self.headers.to_vec());
        debug!("querying {}: {}", spec.table(), spec.query_string());

        let result = self
            .dispatch(request)
            .await
            .and_then(|response| rows_from_response(response, spec.table()));

        if let Err(err) = &result {
            warn!("query on {} failed: {}", spec.table(), err);
        }
        result.into()
    }

    /// Inserts one record or a sequence of records into `table`.
    ///
    /// A value that serializes to a JSON array is sent as is; anything else is
    /// wrapped into a one-element array. The created rows are returned.
    pub async fn insert<T>(&self, table: &str, rows: &T) -> Envelope<Vec<Value>>
    where
        T: Serialize + ?Sized,
    {
        let payload = match normalize_rows(rows) {
            Ok(payload) => payload,
            Err(err) => return Envelope::failure(err),
        };
        debug!("inserting {} row(s) into {}", payload_len(&payload), table);

        let request = HttpRequest::post(
            table_url(&self.url, table),
            self.headers.to_vec(),
            payload.to_string(),
        );

        let result = self
            .dispatch(request)
            .await
            .and_then(|response| rows_from_response(response, table));

        if let Err(err) = &result {
            warn!("insert into {} failed: {}", table, err);
        }
        result.into()
    }

    /// Runs the blocking transport off the async executor.
    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, RestError> {
        let transport = Arc::clone(&self.transport);
        let response = tokio::task::spawn_blocking(move || transport.send(&request))
            .await
            .map_err(|err| RestError::Network(err.to_string()))??;
        debug!("response status {}", response.status);
        Ok(response)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

fn normalize_rows<T: Serialize + ?Sized>(rows: &T) -> Result<Value, RestError> {
    let value = serde_json::to_value(rows).map_err(|err| RestError::Serialize(err.to_string()))?;
    Ok(match value {
        Value::Array(_) => value,
        single => Value::Array(vec![single]),
    })
}

fn payload_len(payload: &Value) -> usize {
    payload.as_array().map_or(0, Vec::len)
}

/// Turns a response into rows: arrays as is, any other JSON value as a single
/// row, an empty body as no rows.
fn rows_from_response(response: HttpResponse, table: &str) -> Result<Vec<Value>, RestError> {
    if !response.is_success() {
        return Err(RestError::from_status(response.status, response.body, table));
    }

    if response.body.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(&response.body)? {
        Value::Array(rows) => Ok(rows),
        row => Ok(vec![row]),
    }
}
