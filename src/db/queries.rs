use rusqlite::{params_from_iter, types::Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{CountView, Quote, QueryFilter, TOP_100_TAG};

use super::repository::{quote_from_row, Repository};
use super::schema::QUOTE_COLUMNS;

impl Repository {
    /// Quotes matching `filter`, shuffled by SQLite on every call.
    ///
    /// Unknown filter labels fail with `InvalidFilter`.
    pub async fn query_by_filter(&self, key: &str, filter: &str) -> Result<Vec<Quote>> {
        let filter: QueryFilter = filter.parse().inspect_err(|e| warn!(error = %e, "Rejected quote query"))?;
        self.query(key, filter).await
    }

    pub async fn query(&self, key: &str, filter: QueryFilter) -> Result<Vec<Quote>> {
        let (clause, args) = match filter {
            QueryFilter::Deleted => ("deleted = 1", vec![]),
            QueryFilter::Author => ("deleted = 0 AND author LIKE ?1 ESCAPE '\\'", vec![contains(key)]),
            QueryFilter::Subject => ("deleted = 0 AND subjects LIKE ?1 ESCAPE '\\'", vec![contains(key)]),
        };
        self.select_shuffled(clause, args).await
    }

    /// Every non-deleted quote.
    pub async fn all_quotes(&self) -> Result<Vec<Quote>> {
        self.select_shuffled("deleted = 0", vec![]).await
    }

    pub async fn favorite_quotes(&self) -> Result<Vec<Quote>> {
        self.select_shuffled("deleted = 0 AND favorite = 1", vec![])
            .await
    }

    pub async fn quotes_contributed_by(&self, username: &str) -> Result<Vec<Quote>> {
        self.select_shuffled(
            "deleted = 0 AND contributed_by = ?1",
            vec![Value::Text(username.to_string())],
        )
        .await
    }

    /// Count quotes in a named view. Unknown views count as zero.
    pub async fn count(&self, key: &str, view: &str) -> Result<i64> {
        match CountView::parse(view) {
            Some(view) => self.count_view(key, view).await,
            None => {
                debug!(view, "Unknown count view, reporting zero");
                Ok(0)
            }
        }
    }

    pub async fn count_view(&self, key: &str, view: CountView) -> Result<i64> {
        let (clause, args) = match view {
            CountView::Author => ("deleted = 0 AND author LIKE ?1 ESCAPE '\\'", vec![contains(key)]),
            CountView::Subject => ("deleted = 0 AND subjects LIKE ?1 ESCAPE '\\'", vec![contains(key)]),
            CountView::All => ("deleted = 0", vec![]),
            CountView::Favorites => ("deleted = 0 AND favorite = 1", vec![]),
            CountView::Contributed => (
                "deleted = 0 AND contributed_by = ?1",
                vec![Value::Text(key.to_string())],
            ),
            CountView::Top100 => (
                "deleted = 0 AND subjects LIKE ?1 ESCAPE '\\'",
                vec![contains(TOP_100_TAG)],
            ),
            CountView::Deleted => ("deleted = 1", vec![]),
        };

        let count = self
            .conn
            .call(move |conn| {
                let sql = format!("SELECT COUNT(*) FROM quotes WHERE {clause}");
                let count: i64 = conn.query_row(&sql, params_from_iter(args), |row| row.get(0))?;
                Ok(count)
            })
            .await
            .inspect_err(|e| warn!(?view, error = %e, "Failed to count quotes"))?;
        Ok(count)
    }

    async fn select_shuffled(&self, clause: &'static str, args: Vec<Value>) -> Result<Vec<Quote>> {
        let quotes = self
            .conn
            .call(move |conn| {
                let sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE {clause} ORDER BY RANDOM()");
                let mut stmt = conn.prepare(&sql)?;
                let quotes = stmt
                    .query_map(params_from_iter(args), quote_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(quotes)
            })
            .await
            .inspect_err(|e| warn!(clause, error = %e, "Failed to query quotes"))?;
        Ok(quotes)
    }
}

/// Bound LIKE pattern matching `key` anywhere, with wildcards in `key` escaped.
fn contains(key: &str) -> Value {
    let mut escaped = String::with_capacity(key.len() + 2);
    escaped.push('%');
    for c in key.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Value::Text(escaped)
}
