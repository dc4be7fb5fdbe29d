pub const SCHEMA: &str = r#"
-- quotes table
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    quote_text TEXT NOT NULL,
    author TEXT NOT NULL,
    contributed_by TEXT,
    subjects TEXT NOT NULL DEFAULT '',
    author_link TEXT,
    video_link TEXT,
    favorite INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_quotes_deleted ON quotes(deleted);
CREATE INDEX IF NOT EXISTS idx_quotes_favorite ON quotes(favorite);

-- settings table (values are JSON text)
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Columns selected by every quote query, in `quote_from_row` order.
pub const QUOTE_COLUMNS: &str =
    "id, quote_text, author, contributed_by, subjects, author_link, video_link, favorite, deleted";
