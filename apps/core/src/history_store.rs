use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::model::{host_from_url, ClosedTab};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS closed_tab (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    host TEXT NOT NULL,
    times_revisited INTEGER NOT NULL DEFAULT 0,
    times_opened_as_new_tab INTEGER NOT NULL DEFAULT 0,
    last_closed_epoch_secs INTEGER NOT NULL DEFAULT 0
)";

pub fn open_memory() -> Result<Connection, HistoryError> {
    let conn = Connection::open_in_memory()?;
    conn.execute(SCHEMA, [])?;
    Ok(conn)
}

pub fn open_file(path: &Path) -> Result<Connection, HistoryError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute(SCHEMA, [])?;
    Ok(conn)
}

/// Inserts or refreshes the entry for a closed page. Counters survive.
pub fn record_closed(
    db: &Connection,
    url: &str,
    title: &str,
    closed_epoch_secs: i64,
) -> Result<(), HistoryError> {
    db.execute(
        "INSERT INTO closed_tab (url, title, host, last_closed_epoch_secs) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(url) DO UPDATE SET title=excluded.title, host=excluded.host,
             last_closed_epoch_secs=excluded.last_closed_epoch_secs",
        params![url, title, host_from_url(url), closed_epoch_secs],
    )?;
    Ok(())
}

/// Bumps the revisit counter. Returns false when the url is not in history.
pub fn record_revisit(db: &Connection, url: &str) -> Result<bool, HistoryError> {
    let changed = db.execute(
        "UPDATE closed_tab SET times_revisited = times_revisited + 1 WHERE url = ?1",
        params![url],
    )?;
    Ok(changed > 0)
}

pub fn record_opened_as_new_tab(db: &Connection, url: &str) -> Result<bool, HistoryError> {
    let changed = db.execute(
        "UPDATE closed_tab SET times_opened_as_new_tab = times_opened_as_new_tab + 1 WHERE url = ?1",
        params![url],
    )?;
    Ok(changed > 0)
}

pub fn remove(db: &Connection, url: &str) -> Result<bool, HistoryError> {
    let changed = db.execute("DELETE FROM closed_tab WHERE url = ?1", params![url])?;
    Ok(changed > 0)
}

pub fn get(db: &Connection, url: &str) -> Result<Option<ClosedTab>, HistoryError> {
    let closed = db
        .query_row(
            "SELECT url, title, host, times_revisited, times_opened_as_new_tab, last_closed_epoch_secs
             FROM closed_tab WHERE url = ?1",
            params![url],
            closed_tab_from_row,
        )
        .optional()?;
    Ok(closed)
}

/// Most recently closed first.
pub fn list_recent(db: &Connection, limit: usize) -> Result<Vec<ClosedTab>, HistoryError> {
    let mut stmt = db.prepare(
        "SELECT url, title, host, times_revisited, times_opened_as_new_tab, last_closed_epoch_secs
         FROM closed_tab ORDER BY last_closed_epoch_secs DESC, rowid DESC LIMIT ?1",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![limit], closed_tab_from_row)?;
    let closed = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(closed)
}

/// Deletes everything beyond the `max_entries` most recent rows.
pub fn prune(db: &Connection, max_entries: usize) -> Result<usize, HistoryError> {
    let keep = i64::try_from(max_entries).unwrap_or(i64::MAX);
    let removed = db.execute(
        "DELETE FROM closed_tab WHERE url NOT IN (
             SELECT url FROM closed_tab ORDER BY last_closed_epoch_secs DESC, rowid DESC LIMIT ?1
         )",
        params![keep],
    )?;
    Ok(removed)
}

fn closed_tab_from_row(row: &Row<'_>) -> Result<ClosedTab, rusqlite::Error> {
    Ok(ClosedTab {
        url: row.get(0)?,
        title: row.get(1)?,
        host: row.get(2)?,
        times_revisited: row.get(3)?,
        times_opened_as_new_tab: row.get(4)?,
        last_closed_epoch_secs: row.get(5)?,
    })
}
