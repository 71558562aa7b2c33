//! A small PostgREST client.
//!
//! [`Client`] holds the project URL and API key and hands out [`Query`]
//! builders. A query accumulates a select list, filters, one ordering and a
//! limit, and is sent by one of two terminal actions:
//!
//! - [`Query::execute`] / [`Client::execute`]: a GET returning rows.
//! - [`Query::insert`] / [`Client::insert`]: a POST returning the created rows.
//!
//! Both resolve to an [`Envelope`] and never fail outright; errors travel in
//! its `error` field.

pub mod client;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod query;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use client::{create_client, Client};
pub use envelope::Envelope;
pub use error::{ErrorKind, RestError};
pub use http_client::{ClientConfig, HttpRequest, HttpResponse, Method, Transport, UreqTransport};
pub use query::{Filter, Operator, OrderOptions, Query, QuerySpec};
