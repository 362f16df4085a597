use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    FailureFilter, FailureRecord, FailureWithRun, ResortFailureCount, RunFilter, RunStats,
    StatusStore, StoreError,
};
use crate::adapter::StatusSnapshot;
use crate::run::{RunFinish, RunRecord, RunStatus, TriggerSource};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS runs (
        run_id TEXT PRIMARY KEY,
        total INTEGER NOT NULL,
        successful INTEGER,
        failed INTEGER,
        duration_ms INTEGER,
        started_at TEXT NOT NULL,
        completed_at TEXT,
        status TEXT NOT NULL,
        trigger_source TEXT NOT NULL,
        batch INTEGER,
        error TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);
    CREATE INDEX IF NOT EXISTS idx_runs_status ON runs(status);

    CREATE TABLE IF NOT EXISTS status_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        resort_id TEXT NOT NULL,
        is_open INTEGER NOT NULL,
        percent_open INTEGER NOT NULL,
        lifts_open INTEGER NOT NULL,
        lifts_total INTEGER NOT NULL,
        runs_open INTEGER NOT NULL,
        runs_total INTEGER NOT NULL,
        message TEXT,
        source_url TEXT NOT NULL,
        captured_at TEXT NOT NULL,
        UNIQUE(resort_id, captured_at)
    );

    CREATE TABLE IF NOT EXISTS resort_status (
        resort_id TEXT PRIMARY KEY,
        is_open INTEGER NOT NULL,
        percent_open INTEGER NOT NULL,
        lifts_open INTEGER NOT NULL,
        lifts_total INTEGER NOT NULL,
        runs_open INTEGER NOT NULL,
        runs_total INTEGER NOT NULL,
        message TEXT,
        source_url TEXT NOT NULL,
        captured_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS failures (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id TEXT NOT NULL REFERENCES runs(run_id),
        resort_id TEXT NOT NULL,
        error_kind TEXT NOT NULL,
        message TEXT NOT NULL,
        source_url TEXT NOT NULL,
        failed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_failures_failed_at ON failures(failed_at);
    CREATE INDEX IF NOT EXISTS idx_failures_resort_id ON failures(resort_id);
    CREATE INDEX IF NOT EXISTS idx_failures_run_id ON failures(run_id);
"#;

const SNAPSHOT_COLUMNS: &str = "resort_id, is_open, percent_open, lifts_open, lifts_total, \
     runs_open, runs_total, message, source_url, captured_at";

const RUN_COLUMNS: &str = "run_id, total, successful, failed, duration_ms, started_at, \
     completed_at, status, trigger_source, batch, error";

/// SQLite-backed status store
pub struct SqliteStatusStore {
    conn: Mutex<Connection>,
}

impl SqliteStatusStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| {
            StoreError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(SCHEMA).map_err(db_err)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn load_run(conn: &Connection, run_id: &str) -> Result<Option<RunRecord>, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM runs WHERE run_id = ?", RUN_COLUMNS),
            params![run_id],
            run_from_row,
        )
        .optional()
        .map_err(db_err)
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_err(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, format!("invalid timestamp {:?}: {}", raw, e)))
}

fn opt_ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_err(idx, format!("invalid timestamp {:?}: {}", raw, e)))
    })
    .transpose()
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(7)?;
    let trigger: String = row.get(8)?;
    let duration_ms: Option<i64> = row.get(4)?;
    Ok(RunRecord {
        run_id: row.get(0)?,
        total: row.get(1)?,
        successful: row.get(2)?,
        failed: row.get(3)?,
        duration_ms: duration_ms.map(|d| d.max(0) as u64),
        started_at: ts_at(row, 5)?,
        completed_at: opt_ts_at(row, 6)?,
        status: RunStatus::parse(&status)
            .ok_or_else(|| conversion_err(7, format!("unknown run status {:?}", status)))?,
        trigger: TriggerSource::parse(&trigger)
            .ok_or_else(|| conversion_err(8, format!("unknown trigger {:?}", trigger)))?,
        batch: row.get(9)?,
        error: row.get(10)?,
    })
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<StatusSnapshot> {
    Ok(StatusSnapshot {
        resort_id: row.get(0)?,
        is_open: row.get(1)?,
        percent_open: row.get(2)?,
        lifts_open: row.get(3)?,
        lifts_total: row.get(4)?,
        runs_open: row.get(5)?,
        runs_total: row.get(6)?,
        message: row.get(7)?,
        source_url: row.get(8)?,
        captured_at: ts_at(row, 9)?,
    })
}

fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

impl StatusStore for SqliteStatusStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn create_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO runs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                RUN_COLUMNS
            ),
            params![
                run.run_id,
                run.total,
                run.successful,
                run.failed,
                run.duration_ms.map(|d| d as i64),
                ts(&run.started_at),
                run.completed_at.as_ref().map(ts),
                run.status.as_str(),
                run.trigger.as_str(),
                run.batch,
                run.error,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn finish_run(
        &self,
        run_id: &str,
        finish: &RunFinish,
        at: DateTime<Utc>,
    ) -> Result<RunRecord, StoreError> {
        let conn = self.conn()?;

        let updated = match finish {
            RunFinish::Completed {
                successful,
                failed,
                duration_ms,
            } => conn.execute(
                "UPDATE runs SET status = ?, successful = ?, failed = ?, duration_ms = ?, completed_at = ?
                 WHERE run_id = ? AND status = 'running'",
                params![
                    RunStatus::Completed.as_str(),
                    successful,
                    failed,
                    *duration_ms as i64,
                    ts(&at),
                    run_id,
                ],
            ),
            RunFinish::Failed {
                reason,
                duration_ms,
            } => conn.execute(
                "UPDATE runs SET status = ?, error = ?, duration_ms = ?, completed_at = ?
                 WHERE run_id = ? AND status = 'running'",
                params![
                    RunStatus::Failed.as_str(),
                    reason,
                    duration_ms.map(|d| d as i64),
                    ts(&at),
                    run_id,
                ],
            ),
        }
        .map_err(db_err)?;

        let record = Self::load_run(&conn, run_id)?
            .ok_or_else(|| StoreError::NotFound(format!("run {}", run_id)))?;
        if updated == 0 {
            return Err(StoreError::AlreadyFinished(run_id.to_string()));
        }
        Ok(record)
    }

    fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>, StoreError> {
        let conn = self.conn()?;
        Self::load_run(&conn, run_id)
    }

    fn list_runs(&self, filter: &RunFilter) -> Result<Vec<RunRecord>, StoreError> {
        let conn = self.conn()?;

        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(status) = filter.status {
            conditions.push("status = ?");
            values.push(Box::new(status.as_str()));
        }
        if let Some(since) = filter.since {
            conditions.push("started_at >= ?");
            values.push(Box::new(ts(&since)));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        values.push(Box::new(filter.limit as i64));

        let sql = format!(
            "SELECT {} FROM runs {} ORDER BY started_at DESC LIMIT ?",
            RUN_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), run_from_row)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn save_many(&self, snapshots: &[StatusSnapshot]) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        {
            let mut history = tx
                .prepare(&format!(
                    "INSERT INTO status_history ({cols}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(resort_id, captured_at) DO UPDATE SET
                        is_open = excluded.is_open,
                        percent_open = excluded.percent_open,
                        lifts_open = excluded.lifts_open,
                        lifts_total = excluded.lifts_total,
                        runs_open = excluded.runs_open,
                        runs_total = excluded.runs_total,
                        message = excluded.message,
                        source_url = excluded.source_url",
                    cols = SNAPSHOT_COLUMNS
                ))
                .map_err(db_err)?;
            let mut latest = tx
                .prepare(&format!(
                    "INSERT INTO resort_status ({cols}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(resort_id) DO UPDATE SET
                        is_open = excluded.is_open,
                        percent_open = excluded.percent_open,
                        lifts_open = excluded.lifts_open,
                        lifts_total = excluded.lifts_total,
                        runs_open = excluded.runs_open,
                        runs_total = excluded.runs_total,
                        message = excluded.message,
                        source_url = excluded.source_url,
                        captured_at = excluded.captured_at
                     WHERE excluded.captured_at >= resort_status.captured_at",
                    cols = SNAPSHOT_COLUMNS
                ))
                .map_err(db_err)?;

            for snapshot in snapshots {
                let captured_at = ts(&snapshot.captured_at);
                let values: [&dyn rusqlite::ToSql; 10] = [
                    &snapshot.resort_id,
                    &snapshot.is_open,
                    &snapshot.percent_open,
                    &snapshot.lifts_open,
                    &snapshot.lifts_total,
                    &snapshot.runs_open,
                    &snapshot.runs_total,
                    &snapshot.message,
                    &snapshot.source_url,
                    &captured_at,
                ];
                history.execute(&values[..]).map_err(db_err)?;
                latest.execute(&values[..]).map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)?;
        Ok(snapshots.len())
    }

    fn save_failure(&self, failure: &FailureRecord) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO failures (run_id, resort_id, error_kind, message, source_url, failed_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                failure.run_id,
                failure.resort_id,
                failure.error_kind,
                failure.message,
                failure.source_url,
                ts(&failure.failed_at),
            ],
        )
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::NotFound(format!("run {}", failure.run_id))
            } else {
                db_err(e)
            }
        })?;
        Ok(())
    }

    fn get(&self, resort_id: &str) -> Result<Option<StatusSnapshot>, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM resort_status WHERE resort_id = ?",
                SNAPSHOT_COLUMNS
            ),
            params![resort_id],
            snapshot_from_row,
        )
        .optional()
        .map_err(db_err)
    }

    fn get_all(&self) -> Result<Vec<StatusSnapshot>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM resort_status ORDER BY resort_id",
                SNAPSHOT_COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map([], snapshot_from_row).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn history(&self, resort_id: &str, limit: usize) -> Result<Vec<StatusSnapshot>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM status_history WHERE resort_id = ? ORDER BY captured_at DESC LIMIT ?",
                SNAPSHOT_COLUMNS
            ))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![resort_id, limit as i64], snapshot_from_row)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn recent_failures(&self, filter: &FailureFilter) -> Result<Vec<FailureWithRun>, StoreError> {
        let conn = self.conn()?;

        let mut sql = String::from(
            "SELECT f.run_id, f.resort_id, f.error_kind, f.message, f.source_url, f.failed_at,
                    r.total, r.successful, r.failed, r.started_at
             FROM failures f
             JOIN runs r ON r.run_id = f.run_id
             WHERE f.failed_at >= ?",
        );
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(ts(&filter.since))];
        if let Some(ref resort_id) = filter.resort_id {
            sql.push_str(" AND f.resort_id = ?");
            values.push(Box::new(resort_id.clone()));
        }
        sql.push_str(" ORDER BY f.failed_at DESC, f.id DESC LIMIT ?");
        values.push(Box::new(filter.limit as i64));

        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                Ok(FailureWithRun {
                    failure: FailureRecord {
                        run_id: row.get(0)?,
                        resort_id: row.get(1)?,
                        error_kind: row.get(2)?,
                        message: row.get(3)?,
                        source_url: row.get(4)?,
                        failed_at: ts_at(row, 5)?,
                    },
                    run_total: row.get(6)?,
                    run_successful: row.get(7)?,
                    run_failed: row.get(8)?,
                    run_started_at: ts_at(row, 9)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn failure_counts(&self, since: DateTime<Utc>) -> Result<Vec<ResortFailureCount>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT resort_id, COUNT(*), MAX(failed_at)
                 FROM failures
                 WHERE failed_at >= ?
                 GROUP BY resort_id
                 ORDER BY COUNT(*) DESC, resort_id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![ts(&since)], |row| {
                Ok(ResortFailureCount {
                    resort_id: row.get(0)?,
                    count: row.get(1)?,
                    last_failed_at: ts_at(row, 2)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    fn get_stats(&self, since: DateTime<Utc>) -> Result<RunStats, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*), AVG(successful), AVG(failed), AVG(duration_ms)
             FROM runs
             WHERE status = 'completed' AND started_at >= ?",
            params![ts(&since)],
            |row| {
                Ok(RunStats {
                    run_count: row.get(0)?,
                    avg_successful: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
                    avg_failed: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                    avg_duration_ms: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                })
            },
        )
        .map_err(db_err)
    }
}
