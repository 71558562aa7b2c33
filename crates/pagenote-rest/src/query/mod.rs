//! The query builder.
//!
//! Start with [`crate::Client::from`] and chain methods to describe a request
//! against one table:
//!
//! - [`Query`]: the mutable builder. Records the select list, filters, a
//!   single ordering and a limit.
//! - [`QuerySpec`]: the immutable result of [`Query::build`]. Knows how to
//!   render itself as a PostgREST query string.
//!
//! # Submodules
//!
//! - [`clause`]: filter/order clauses and value encoding.
//! - [`builder`]: implementation of [`Query`].
//! - [`spec`]: implementation of [`QuerySpec`].

pub mod builder;
pub mod clause;
pub mod spec;

pub use builder::Query;
pub use clause::{Filter, Operator, OrderClause, OrderOptions};
pub use spec::QuerySpec;
