//! JSONL export loader
//!
//! Reads the line-oriented JSON export: one record per line, tagged with a
//! `type` field of `header`, `round`, or `tick`. Blank lines and lines
//! starting with `#` are skipped.
//!
//! Example:
//! ```text
//! {"type":"header","map_name":"de_mirage","tickrate":64.0}
//! {"type":"round","round_num":1,"freeze_end":1200,"end":9400}
//! {"type":"tick","round_num":1,"tick":8504,"name":"apex","x":-410.5,"y":618.0,"z":-63.9,"side":"t"}
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DemoData, DemoHeader, RoundRow, TickRow};

/// A single line of the JSONL export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportRecord {
    Header(DemoHeader),
    Round(RoundRow),
    Tick(TickRow),
}

/// Load a JSONL export file into `DemoData`.
pub fn load_json_export<P: AsRef<Path>>(path: P) -> Result<DemoData, String> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| format!("failed to read export file: {}", e))?;

    parse_export_content(&content)
}

/// Parse export content (for testing or in-memory parsing).
pub fn parse_export_content(content: &str) -> Result<DemoData, String> {
    let mut data = DemoData::default();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record: ExportRecord = serde_json::from_str(line)
            .map_err(|e| format!("bad export record on line {}: {}", line_no + 1, e))?;

        match record {
            ExportRecord::Header(header) => data.header = header,
            ExportRecord::Round(round) => data.rounds.push(round),
            ExportRecord::Tick(tick) => data.ticks.push(tick),
        }
    }

    // The exporter writes in order, but round arithmetic assumes it.
    data.rounds.sort_by_key(|r| r.round_num);
    data.ticks.sort_by_key(|t| (t.round_num, t.tick));

    Ok(data)
}
