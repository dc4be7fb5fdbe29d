use rusqlite::{params, OptionalExtension, Row};
use tokio::sync::broadcast;
use tokio_rusqlite::Connection;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, Result};
use crate::models::{DatasetQuote, DistinctColumn, NewQuote, Quote};

use super::schema::{QUOTE_COLUMNS, SCHEMA};
use super::watch::QuoteChange;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct Repository {
    pub(super) conn: Connection,
    changes: broadcast::Sender<QuoteChange>,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await.inspect_err(|e| {
            error!(db_path, error = %e, "Failed to open quote database");
        })?;
        Self::init(conn).await
    }

    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .inspect_err(|e| error!(error = %e, "Failed to create quote schema"))?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let repo = Self { conn, changes };
        repo.migrate_settings().await?;
        Ok(repo)
    }

    /// Receive an event after every successful quote write.
    pub fn subscribe(&self) -> broadcast::Receiver<QuoteChange> {
        self.changes.subscribe()
    }

    fn notify(&self, id: i64) {
        // No receivers is fine
        let _ = self.changes.send(QuoteChange { id });
    }

    // Seeding

    /// Populate an empty table from `records`. Returns the number of rows
    /// inserted, which is zero whenever the table already has data.
    pub async fn seed_if_empty(&self, records: Vec<DatasetQuote>) -> Result<usize> {
        let inserted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let existing: i64 = tx.query_row("SELECT COUNT(*) FROM quotes", [], |row| row.get(0))?;
                if existing > 0 {
                    return Ok(0);
                }

                let mut inserted: usize = 0;
                {
                    let mut stmt = tx.prepare(
                        r#"INSERT INTO quotes (quote_text, author, contributed_by, subjects, author_link, video_link, favorite, deleted)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0)"#,
                    )?;
                    for record in records {
                        let quote = NewQuote::from(record);
                        stmt.execute(params![
                            quote.quote_text,
                            quote.author,
                            quote.contributed_by,
                            quote.subjects,
                            quote.author_link,
                            quote.video_link,
                        ])?;
                        inserted += 1;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await
            .inspect_err(|e| error!(error = %e, "Seeding quotes failed"))?;

        if inserted > 0 {
            info!(inserted, "Seeded quote database from dataset");
        } else {
            debug!("Quote database already populated, skipping seed");
        }
        Ok(inserted)
    }

    // Quote operations

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Quote>> {
        let quote = self
            .conn
            .call(move |conn| Ok(select_quote(conn, id)?))
            .await
            .inspect_err(|e| warn!(id, error = %e, "Failed to load quote"))?;
        Ok(quote)
    }

    /// Insert when `is_update` is false, otherwise update the row with
    /// `quote.id`. The written row is read back and compared with the input.
    pub async fn upsert(&self, quote: Quote, is_update: bool) -> Result<Quote> {
        if is_update {
            self.update(quote).await
        } else {
            self.insert(quote.into()).await
        }
    }

    pub async fn insert(&self, quote: NewQuote) -> Result<Quote> {
        let expected = quote.clone();
        let (id, stored) = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO quotes (quote_text, author, contributed_by, subjects, author_link, video_link, favorite, deleted)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                    params![
                        quote.quote_text,
                        quote.author,
                        quote.contributed_by,
                        quote.subjects,
                        quote.author_link,
                        quote.video_link,
                        quote.favorite,
                        quote.deleted,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                Ok((id, select_quote(conn, id)?))
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to insert quote"))?;

        let stored = verify_written(id, stored, |q| NewQuote::from(q.clone()) == expected)?;
        self.notify(id);
        Ok(stored)
    }

    pub async fn update(&self, quote: Quote) -> Result<Quote> {
        let id = quote.id;
        let expected = quote.clone();
        let stored = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"UPDATE quotes SET quote_text = ?1, author = ?2, contributed_by = ?3, subjects = ?4,
                           author_link = ?5, video_link = ?6, favorite = ?7, deleted = ?8
                       WHERE id = ?9"#,
                    params![
                        quote.quote_text,
                        quote.author,
                        quote.contributed_by,
                        quote.subjects,
                        quote.author_link,
                        quote.video_link,
                        quote.favorite,
                        quote.deleted,
                        quote.id,
                    ],
                )?;
                Ok(select_quote(conn, quote.id)?)
            })
            .await
            .inspect_err(|e| warn!(id, error = %e, "Failed to update quote"))?;

        let stored = verify_written(id, stored, |q| *q == expected)?;
        self.notify(id);
        Ok(stored)
    }

    pub async fn set_deleted(&self, id: i64, deleted: bool) -> Result<()> {
        self.set_flag(id, "UPDATE quotes SET deleted = ?1 WHERE id = ?2", deleted)
            .await
    }

    pub async fn set_favorite(&self, id: i64, favorite: bool) -> Result<()> {
        self.set_flag(id, "UPDATE quotes SET favorite = ?1 WHERE id = ?2", favorite)
            .await
    }

    async fn set_flag(&self, id: i64, sql: &'static str, value: bool) -> Result<()> {
        let affected = self
            .conn
            .call(move |conn| Ok(conn.execute(sql, params![value, id])?))
            .await
            .inspect_err(|e| warn!(id, error = %e, "Failed to update quote flag"))?;

        if affected == 0 {
            return Err(AppError::NotFound(id));
        }
        self.notify(id);
        Ok(())
    }

    /// Sorted distinct non-empty values of `column`, for filter pickers.
    pub async fn distinct_values(&self, column: DistinctColumn) -> Result<Vec<String>> {
        let column = column.column();
        let values = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT DISTINCT {column} FROM quotes WHERE {column} IS NOT NULL AND {column} != '' ORDER BY {column} ASC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let values = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(values)
            })
            .await
            .inspect_err(|e| warn!(column, error = %e, "Failed to load distinct values"))?;
        Ok(values)
    }

    /// String entry point for pickers; unknown columns give an empty list.
    pub async fn distinct_values_for(&self, column: &str) -> Result<Vec<String>> {
        match DistinctColumn::parse(column) {
            Some(column) => self.distinct_values(column).await,
            None => {
                debug!(column, "Unknown distinct column, returning no values");
                Ok(Vec::new())
            }
        }
    }
}

fn verify_written(
    id: i64,
    stored: Option<Quote>,
    matches: impl FnOnce(&Quote) -> bool,
) -> Result<Quote> {
    match stored {
        Some(quote) if matches(&quote) => Ok(quote),
        _ => {
            error!(id, "Quote read back does not match the written quote");
            Err(AppError::IntegrityMismatch { id })
        }
    }
}

pub(super) fn select_quote(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Quote>> {
    let sql = format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?1");
    conn.query_row(&sql, params![id], quote_from_row).optional()
}

pub(super) fn quote_from_row(row: &Row) -> rusqlite::Result<Quote> {
    Ok(Quote {
        id: row.get(0)?,
        quote_text: row.get(1)?,
        author: row.get(2)?,
        contributed_by: row.get(3)?,
        subjects: row.get(4)?,
        author_link: row.get(5)?,
        video_link: row.get(6)?,
        favorite: row.get::<_, i64>(7)? != 0,
        deleted: row.get::<_, i64>(8)? != 0,
    })
}
