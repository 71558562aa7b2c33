//! The chainable query builder.

use serde::Serialize;
use serde_json::Value;

use crate::{
    client::Client,
    envelope::Envelope,
    query::{
        clause::{Filter, Operator, OrderClause, OrderOptions},
        spec::QuerySpec,
    },
};

/// A request builder for one table.
///
/// Obtained from [`Client::from`]. Builder methods only record state; nothing
/// is validated or sent until a terminal action ([`Query::execute`] or
/// [`Query::insert`]) runs.
///
/// # Example
///
/// ```no_run
/// use pagenote_rest::{create_client, OrderOptions};
///
/// # async fn run() {
/// let client = create_client("https://x.test/", "key");
/// let result = client
///     .from("feedback")
///     .select("*")
///     .eq("url", "https://a.com")
///     .order("created_at", OrderOptions::descending())
///     .limit(10)
///     .execute()
///     .await;
/// if let Some(err) = &result.error {
///     eprintln!("{err}");
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    client: Client,
    spec: QuerySpec,
}

impl Query {
    pub(crate) fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            spec: QuerySpec::new(table),
        }
    }

    /// Sets the selected columns, verbatim. The last call wins.
    pub fn select(mut self, fields: impl Into<String>) -> Self {
        self.spec.select = fields.into();
        self
    }

    /// Appends a filter clause. Filters apply in the order they were added.
    pub fn filter(
        mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl ToString,
    ) -> Self {
        self.spec.filters.push(Filter::new(column, operator, value));
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, Operator::Eq, value)
    }

    pub fn neq(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, Operator::Neq, value)
    }

    pub fn gt(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, Operator::Gt, value)
    }

    pub fn gte(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, Operator::Gte, value)
    }

    pub fn lt(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, Operator::Lt, value)
    }

    pub fn lte(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, Operator::Lte, value)
    }

    pub fn like(self, column: impl Into<String>, pattern: impl ToString) -> Self {
        self.filter(column, Operator::Like, pattern)
    }

    pub fn ilike(self, column: impl Into<String>, pattern: impl ToString) -> Self {
        self.filter(column, Operator::Ilike, pattern)
    }

    /// Sets the ordering, replacing any earlier one.
    pub fn order(mut self, column: impl Into<String>, options: OrderOptions) -> Self {
        self.spec.order = Some(OrderClause {
            column: column.into(),
            ascending: options.ascending,
        });
        self
    }

    /// Caps the number of returned rows. The value is sent as given.
    pub fn limit(mut self, count: i64) -> Self {
        self.spec.limit = Some(count);
        self
    }

    /// Snapshot of the accumulated state.
    pub fn build(&self) -> QuerySpec {
        self.spec.clone()
    }

    /// Sends the GET for this query. Equivalent to
    /// `client.execute(&query.build())`.
    pub async fn execute(self) -> Envelope<Vec<Value>> {
        self.client.execute(&self.spec).await
    }

    /// Inserts `rows` into this query's table; select, filters, order and
    /// limit are ignored.
    pub async fn insert<T>(self, rows: &T) -> Envelope<Vec<Value>>
    where
        T: Serialize + ?Sized,
    {
        self.client.insert(&self.spec.table, rows).await
    }
}
