//! SQLite export loader
//!
//! Reads the database form of the demo export: a `header` table with a single
//! row, plus `rounds` and `ticks` tables matching the JSONL record fields.

use std::path::Path;

use rusqlite::Connection;

use super::{DemoData, DemoHeader, RoundRow, TickRow};

/// Load a SQLite export file into `DemoData`.
pub fn load_sqlite_export<P: AsRef<Path>>(path: P) -> Result<DemoData, String> {
    let conn = Connection::open(path.as_ref())
        .map_err(|e| format!("failed to open export database: {}", e))?;

    load_from_connection(&conn)
}

/// Load export tables from an open connection (used by tests with an
/// in-memory database).
pub fn load_from_connection(conn: &Connection) -> Result<DemoData, String> {
    let header = load_header(conn)?;
    let rounds = load_rounds(conn)?;
    let ticks = load_ticks(conn)?;

    let mut data = DemoData {
        header,
        rounds,
        ticks,
    };
    data.rounds.sort_by_key(|r| r.round_num);
    data.ticks.sort_by_key(|t| (t.round_num, t.tick));

    Ok(data)
}

fn load_header(conn: &Connection) -> Result<DemoHeader, String> {
    let mut stmt = conn
        .prepare("SELECT map_name, tickrate FROM header LIMIT 1")
        .map_err(|e| format!("export database has no header table: {}", e))?;

    let mut rows = stmt
        .query_map([], |row| {
            Ok(DemoHeader {
                map_name: row.get(0)?,
                tickrate: row.get::<_, Option<f64>>(1)?.map(|t| t as f32),
            })
        })
        .map_err(|e| format!("failed to read header: {}", e))?;

    match rows.next() {
        Some(row) => row.map_err(|e| format!("failed to read header: {}", e)),
        None => Ok(DemoHeader::default()),
    }
}

fn load_rounds(conn: &Connection) -> Result<Vec<RoundRow>, String> {
    let mut stmt = conn
        .prepare("SELECT round_num, freeze_end, start, \"end\", end_official FROM rounds")
        .map_err(|e| format!("export database has no rounds table: {}", e))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(RoundRow {
                round_num: row.get(0)?,
                freeze_end: row.get(1)?,
                start: row.get(2)?,
                end: row.get(3)?,
                end_official: row.get(4)?,
            })
        })
        .map_err(|e| format!("failed to read rounds: {}", e))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("failed to read rounds: {}", e))
}

fn load_ticks(conn: &Connection) -> Result<Vec<TickRow>, String> {
    let mut stmt = conn
        .prepare("SELECT round_num, tick, name, x, y, z, side FROM ticks")
        .map_err(|e| format!("export database has no ticks table: {}", e))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(TickRow {
                round_num: row.get(0)?,
                tick: row.get(1)?,
                name: row.get(2)?,
                x: row.get::<_, Option<f64>>(3)?.map(|v| v as f32),
                y: row.get::<_, Option<f64>>(4)?.map(|v| v as f32),
                z: row.get::<_, Option<f64>>(5)?.map(|v| v as f32),
                side: row.get(6)?,
            })
        })
        .map_err(|e| format!("failed to read ticks: {}", e))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("failed to read ticks: {}", e))
}
