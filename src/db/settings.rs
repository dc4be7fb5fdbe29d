use rusqlite::{params, OptionalExtension, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{compose_title, Preferences, SettingKey};

use super::repository::Repository;

const SETTINGS_VERSION_KEY: &str = "settingsVersion";
const SETTINGS_VERSION: i64 = 2;

// Keys written by older releases before query/filter were renamed.
const LEGACY_QUERY_KEY: &str = "userQuery";
const LEGACY_FILTER_KEY: &str = "userFilter";

impl Repository {
    /// Persist `value` under `key`, replacing any previous value.
    pub async fn save<T: Serialize>(&self, key: SettingKey, value: &T) -> Result<()> {
        let text = encode(value)?;
        let name = key.as_str();
        self.conn
            .call(move |conn| {
                upsert_setting(conn, name, &text)?;
                Ok(())
            })
            .await
            .inspect_err(|e| warn!(key = name, error = %e, "Error saving setting"))?;
        Ok(())
    }

    /// The value stored under `key`, or `None` if it was never written.
    pub async fn load<T: DeserializeOwned>(&self, key: SettingKey) -> Result<Option<T>> {
        let name = key.as_str();
        let raw = self
            .conn
            .call(move |conn| Ok(select_setting(conn, name)?))
            .await
            .inspect_err(|e| warn!(key = name, error = %e, "Error loading setting"))?;

        match raw {
            Some(text) => Ok(Some(decode(&text).inspect_err(|e| {
                warn!(key = name, error = %e, "Stored setting could not be decoded");
            })?)),
            None => Ok(None),
        }
    }

    /// Store the active search and its derived title in one transaction.
    pub async fn save_search(&self, query: &str, filter: &str) -> Result<String> {
        let title = compose_title(filter, query);
        let entries = vec![
            (SettingKey::Query.as_str(), query.to_string()),
            (SettingKey::Filter.as_str(), filter.to_string()),
            (SettingKey::Title.as_str(), title.clone()),
        ];
        self.write_settings(entries).await?;
        Ok(title)
    }

    /// Cached title, falling back to the one derived from `defaults`.
    pub async fn title(&self, defaults: &Preferences) -> Result<String> {
        Ok(self
            .load::<String>(SettingKey::Title)
            .await?
            .unwrap_or_else(|| defaults.title()))
    }

    /// Read every setting, filling gaps from `defaults`.
    pub async fn load_preferences(&self, defaults: &Preferences) -> Result<Preferences> {
        Ok(Preferences {
            allow_notifications: self
                .load(SettingKey::AllowNotifications)
                .await?
                .unwrap_or(defaults.allow_notifications),
            start_time: self
                .load(SettingKey::StartTime)
                .await?
                .unwrap_or(defaults.start_time),
            end_time: self
                .load(SettingKey::EndTime)
                .await?
                .unwrap_or(defaults.end_time),
            spacing_minutes: self
                .load(SettingKey::Spacing)
                .await?
                .unwrap_or(defaults.spacing_minutes),
            query: self
                .load(SettingKey::Query)
                .await?
                .unwrap_or_else(|| defaults.query.clone()),
            filter: self
                .load(SettingKey::Filter)
                .await?
                .unwrap_or_else(|| defaults.filter.clone()),
        })
    }

    /// Write every setting, including the derived title, atomically.
    /// An inverted window or zero spacing is rejected and nothing is written.
    pub async fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        prefs
            .validate()
            .inspect_err(|e| warn!(error = %e, "Rejected preferences"))?;

        let entries = vec![
            (
                SettingKey::AllowNotifications.as_str(),
                encode(&prefs.allow_notifications)?,
            ),
            (SettingKey::StartTime.as_str(), encode(&prefs.start_time)?),
            (SettingKey::EndTime.as_str(), encode(&prefs.end_time)?),
            (SettingKey::Spacing.as_str(), encode(&prefs.spacing_minutes)?),
            (SettingKey::Query.as_str(), prefs.query.clone()),
            (SettingKey::Filter.as_str(), prefs.filter.clone()),
            (SettingKey::Title.as_str(), prefs.title()),
        ];
        self.write_settings(entries).await
    }

    async fn write_settings(&self, entries: Vec<(&'static str, String)>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for (key, text) in &entries {
                    upsert_setting(&tx, key, text)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Error saving settings"))?;
        Ok(())
    }

    /// Bring stored settings up to the current version.
    pub(super) async fn migrate_settings(&self) -> Result<()> {
        let migrated = self
            .conn
            .call(|conn| {
                let tx = conn.transaction()?;
                let version = select_setting(&tx, SETTINGS_VERSION_KEY)?
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(0);
                if version >= SETTINGS_VERSION {
                    return Ok(None);
                }

                if version < 1 {
                    migrate_legacy_search(&tx)?;
                }
                if version < 2 {
                    unquote_strings(&tx)?;
                }
                upsert_setting(&tx, SETTINGS_VERSION_KEY, &SETTINGS_VERSION.to_string())?;
                tx.commit()?;
                Ok(Some(version))
            })
            .await
            .inspect_err(|e| warn!(error = %e, "Settings migration failed"))?;

        if let Some(from) = migrated {
            info!(from, to = SETTINGS_VERSION, "Migrated settings");
        }
        Ok(())
    }
}

/// Strings are stored as plain text, everything else as JSON.
fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(match serde_json::to_value(value)? {
        Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Inverse of [`encode`]: plain text is tried as a string first, then as JSON.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    match serde_json::from_value(Value::String(text.to_string())) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_json::from_str(text)?),
    }
}

/// Copy `userQuery`/`userFilter` into `query`/`filter` unless already set,
/// and rewrite the cached title to match.
fn migrate_legacy_search(tx: &Transaction) -> rusqlite::Result<()> {
    let query_key = SettingKey::Query.as_str();
    let filter_key = SettingKey::Filter.as_str();
    let mut carried = false;

    for (legacy, current) in [(LEGACY_QUERY_KEY, query_key), (LEGACY_FILTER_KEY, filter_key)] {
        let Some(value) = select_setting(tx, legacy)? else {
            continue;
        };
        if select_setting(tx, current)?.is_none() {
            debug!(legacy, current, "Carrying legacy setting forward");
            upsert_setting(tx, current, &unquote(value))?;
            carried = true;
        }
        tx.execute("DELETE FROM settings WHERE key = ?1", params![legacy])?;
    }

    if carried {
        if let (Some(query), Some(filter)) = (select_setting(tx, query_key)?, select_setting(tx, filter_key)?) {
            let title = compose_title(&unquote(filter), &unquote(query));
            upsert_setting(tx, SettingKey::Title.as_str(), &title)?;
        }
    }
    Ok(())
}

/// Version 1 stored every string JSON-quoted; store them as plain text.
fn unquote_strings(tx: &Transaction) -> rusqlite::Result<()> {
    let rows: Vec<(String, String)> = {
        let mut stmt = tx.prepare("SELECT key, value FROM settings WHERE key != ?1")?;
        let rows = stmt
            .query_map(params![SETTINGS_VERSION_KEY], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };
    for (key, value) in rows {
        if let Ok(text) = serde_json::from_str::<String>(&value) {
            upsert_setting(tx, &key, &text)?;
        }
    }
    Ok(())
}

fn unquote(value: String) -> String {
    serde_json::from_str::<String>(&value).unwrap_or(value)
}

fn upsert_setting(conn: &rusqlite::Connection, key: &str, text: &str) -> rusqlite::Result<()> {
    conn.execute(
        r#"INSERT INTO settings (key, value) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = datetime('now')"#,
        params![key, text],
    )?;
    Ok(())
}

fn select_setting(conn: &rusqlite::Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}
