//! Immutable snapshot of a built query.

use crate::query::clause::{Filter, OrderClause};

/// Path prefix of the PostgREST API below the project URL.
pub const REST_PATH: &str = "rest/v1";

/// Everything needed to issue one GET against a table.
///
/// Produced by [`crate::Query::build`] and run by [`crate::Client::execute`].
/// Executing the same spec twice sends two independent requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub(crate) table: String,
    pub(crate) select: String,
    pub(crate) filters: Vec<Filter>,
    pub(crate) order: Option<OrderClause>,
    pub(crate) limit: Option<i64>,
}

impl QuerySpec {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn select(&self) -> &str {
        &self.select
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order(&self) -> Option<&OrderClause> {
        self.order.as_ref()
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    /// Query string in wire order: select, filters, order, limit.
    pub fn query_string(&self) -> String {
        let mut params = Vec::with_capacity(self.filters.len() + 3);

        params.push(format!("select={}", self.select));
        params.extend(self.filters.iter().map(Filter::to_param));

        if let Some(order) = &self.order {
            params.push(order.to_param());
        }

        if let Some(limit) = self.limit {
            params.push(format!("limit={limit}"));
        }

        params.join("&")
    }

    /// Full GET URL below `base`, which must not end with a slash.
    pub fn url(&self, base: &str) -> String {
        format!("{}?{}", table_url(base, &self.table), self.query_string())
    }
}

pub(crate) fn table_url(base: &str, table: &str) -> String {
    format!("{base}/{REST_PATH}/{table}")
}
