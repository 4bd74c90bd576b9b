use crate::models::snapshot::Snapshot;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::path::Path;

const DB_SCHEMA_VERSION: i64 = 1;

/// A persisted snapshot plus the bookkeeping of the run that wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub id: i64,
    pub run_id: String,
    pub created_at: i64,
    pub snapshot: Snapshot,
}

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("History schema v{version} is newer than v{DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            tech_id TEXT NOT NULL,
            snapshot_date TEXT NOT NULL,
            deaditude_score REAL,
            confidence REAL NOT NULL DEFAULT 0,
            verdict TEXT NOT NULL,
            config_version INTEGER NOT NULL DEFAULT 0,
            component_count INTEGER NOT NULL DEFAULT 0,
            snapshot_json TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_snapshots_tech_date ON snapshots(tech_id, snapshot_date);
        CREATE INDEX IF NOT EXISTS idx_snapshots_run ON snapshots(run_id);
        ",
    )
}

pub fn open_history(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    initialize_schema(&conn)?;
    Ok(conn)
}

/// Append one snapshot. History is never updated in place: scoring the same
/// tech again adds a new row.
pub fn insert_snapshot(conn: &Connection, run_id: &str, snapshot: &Snapshot) -> Result<i64> {
    let snapshot_json = serde_json::to_string(snapshot)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "
        INSERT INTO snapshots (
            run_id,
            tech_id,
            snapshot_date,
            deaditude_score,
            confidence,
            verdict,
            config_version,
            snapshot_json,
            created_at,
            component_count
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ",
        params![
            run_id,
            snapshot.tech_id,
            snapshot.snapshot_date.to_string(),
            snapshot.deaditude_score,
            snapshot.confidence,
            snapshot.verdict.as_str(),
            snapshot.config_version,
            snapshot_json,
            now,
            snapshot.component_scores.len() as i64,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn insert_snapshots(conn: &Connection, run_id: &str, snapshots: &[Snapshot]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    for snapshot in snapshots {
        insert_snapshot(&tx, run_id, snapshot)?;
    }
    tx.commit()?;
    Ok(snapshots.len())
}

/// Every stored snapshot for `tech_id`, oldest first.
pub fn load_history(conn: &Connection, tech_id: &str) -> Result<Vec<StoredSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, run_id, created_at, snapshot_json FROM snapshots
         WHERE tech_id = ?1
         ORDER BY snapshot_date ASC, id ASC",
    )?;

    let rows = stmt.query_map(params![tech_id], to_stored_snapshot)?;
    rows.collect()
}

/// Most recent snapshot for `tech_id` by snapshot date, newest row on ties.
pub fn load_latest(conn: &Connection, tech_id: &str) -> Result<Option<StoredSnapshot>> {
    conn.query_row(
        "SELECT id, run_id, created_at, snapshot_json FROM snapshots
         WHERE tech_id = ?1
         ORDER BY snapshot_date DESC, id DESC
         LIMIT 1",
        params![tech_id],
        to_stored_snapshot,
    )
    .optional()
}

fn to_stored_snapshot(row: &Row<'_>) -> Result<StoredSnapshot> {
    let raw: String = row.get(3)?;
    let snapshot = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(StoredSnapshot {
        id: row.get(0)?,
        run_id: row.get(1)?,
        created_at: row.get(2)?,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metrics::SourceId;
    use crate::models::snapshot::{ComponentScore, Maturity, Verdict};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn snapshot(tech_id: &str, date: &str, score: Option<f64>) -> Snapshot {
        Snapshot {
            tech_id: tech_id.to_string(),
            snapshot_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
            deaditude_score: score,
            component_scores: BTreeMap::new(),
            confidence: 0.4,
            verdict: if score.is_some() { Verdict::Stable } else { Verdict::InsufficientData },
            commentary_bucket: None,
            score_band: None,
            dimension_scores: BTreeMap::new(),
            highlights: vec![],
            maturity: Maturity::Established,
            tech_age_years: None,
            config_version: 1,
        }
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        initialize_schema(&conn).expect("schema init");
        conn
    }

    #[test]
    fn schema_initializes_with_expected_version() {
        let conn = memory_db();
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("schema version");
        assert_eq!(version, DB_SCHEMA_VERSION);

        initialize_schema(&conn).expect("re-running migrations is a no-op");

        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'snapshots'
                 AND name LIKE 'idx_snapshots_%'",
                [],
                |row| row.get(0),
            )
            .expect("index count");
        assert_eq!(indexes, 2);
    }

    #[test]
    fn stores_component_count() {
        let conn = memory_db();
        let mut stored = snapshot("go", "2026-10-08", Some(1.5));
        stored.component_scores.insert(
            SourceId::JobMarket,
            ComponentScore {
                source_id: SourceId::JobMarket,
                sub_score: 1.5,
                weight: 1.0,
                base_weight: 0.2,
                sample_size: 42_000,
                details: vec![],
            },
        );
        insert_snapshot(&conn, "run-1", &stored).expect("insert");

        let count: i64 = conn
            .query_row("SELECT component_count FROM snapshots WHERE tech_id = 'go'", [], |row| {
                row.get(0)
            })
            .expect("row exists");
        assert_eq!(count, 1);
    }

    #[test]
    fn history_is_append_only() {
        let conn = memory_db();
        let first = snapshot("perl", "2026-10-01", Some(7.2));
        let rerun = snapshot("perl", "2026-10-01", Some(7.4));

        insert_snapshot(&conn, "run-a", &first).expect("insert first");
        insert_snapshot(&conn, "run-b", &rerun).expect("insert rerun");

        let history = load_history(&conn, "perl").expect("load history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].snapshot, first);
        assert_eq!(history[1].snapshot, rerun);
        assert_eq!(history[1].run_id, "run-b");
    }

    #[test]
    fn latest_prefers_newest_date() {
        let conn = memory_db();
        let batch = vec![
            snapshot("cobol", "2026-10-08", Some(8.9)),
            snapshot("cobol", "2026-09-01", Some(8.1)),
            snapshot("rust", "2026-10-08", Some(1.2)),
        ];
        assert_eq!(insert_snapshots(&conn, "run-1", &batch).expect("insert batch"), 3);

        let latest = load_latest(&conn, "cobol")
            .expect("load latest")
            .expect("cobol has history");
        assert_eq!(latest.snapshot.deaditude_score, Some(8.9));
        assert!(load_latest(&conn, "fortran").expect("load latest").is_none());
    }

    #[test]
    fn degenerate_snapshot_stores_null_score() {
        let conn = memory_db();
        insert_snapshot(&conn, "run-1", &snapshot("ghost", "2026-10-08", None)).expect("insert");

        let score: Option<f64> = conn
            .query_row(
                "SELECT deaditude_score FROM snapshots WHERE tech_id = 'ghost'",
                [],
                |row| row.get(0),
            )
            .expect("row exists");
        assert_eq!(score, None);
    }
}
