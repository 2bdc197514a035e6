//! SQLite run persistence.
//!
//! RULE: only store.rs talks to the database. The engine calls store
//! methods — nothing else executes SQL.
//!
//! Write discipline mirrors run immutability: saving the same run id
//! with identical content is a no-op (recomputation is idempotent);
//! saving the same id with DIFFERENT content is a conflict, because two
//! writers disagreeing about one run would corrupt comparisons.
//! Superseding a run is an explicit, whole-row replacement.

use crate::error::{EngineError, EngineResult};
use crate::run::ComputationRun;
use crate::types::RunId;
use rusqlite::{params, Connection, OptionalExtension};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS computation_run (
    run_id     TEXT PRIMARY KEY,
    kind       TEXT NOT NULL,
    label      TEXT NOT NULL,
    payload    TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

pub struct PlanStore {
    conn: Connection,
}

impl PlanStore {
    /// Open (or create) the run database at `path`.
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply the schema.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Persist a run. Identical re-saves are accepted silently;
    /// divergent content under an existing id is a conflict.
    pub fn save_run(&self, run: &ComputationRun) -> EngineResult<()> {
        let payload = serde_json::to_string(run)?;

        if let Some(existing) = self.load_payload(&run.run_id)? {
            if existing == payload {
                log::debug!("run {} unchanged, skipping save", run.run_id);
                return Ok(());
            }
            return Err(EngineError::RunConflict {
                run_id: run.run_id.clone(),
            });
        }

        self.insert(run, &payload)
    }

    /// Replace a stored run wholesale. This is the only sanctioned way
    /// to change what an id refers to.
    pub fn supersede_run(&self, run: &ComputationRun) -> EngineResult<()> {
        let payload = serde_json::to_string(run)?;
        self.conn
            .execute("DELETE FROM computation_run WHERE run_id = ?1", params![run.run_id])?;
        self.insert(run, &payload)
    }

    pub fn load_run(&self, run_id: &str) -> EngineResult<Option<ComputationRun>> {
        match self.load_payload(run_id)? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// List stored run ids sharing a prefix, oldest first. Callers use
    /// id prefixes as version families ("baseline-", "scn-demand-").
    pub fn list_versions(&self, prefix: &str) -> EngineResult<Vec<RunId>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id FROM computation_run
             WHERE run_id LIKE ?1 || '%'
             ORDER BY created_at ASC, run_id ASC",
        )?;
        let ids = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn insert(&self, run: &ComputationRun, payload: &str) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO computation_run (run_id, kind, label, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.run_id,
                run.kind.name(),
                run.label,
                payload,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn load_payload(&self, run_id: &str) -> EngineResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM computation_run WHERE run_id = ?1",
                params![run_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }
}
