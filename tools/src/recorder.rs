//! SQLite recording of runs and their per-step snapshots.
//!
//! RULE: Only recorder.rs talks to the database.
//! The engine never sees SQL; it hands snapshots to a SnapshotRecorder.

use crate::topology::TopologySource;
use anyhow::{bail, Result};
use contagion_core::{
    config::SimParams,
    graph::{AdjacencyGraph, ContactGraph},
    error::{SimError, SimResult},
    observer::{ObserverSignal, SnapshotObserver},
    snapshot::{Census, SimSnapshot},
    types::Tick,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

pub struct RunStore {
    conn: Connection,
}

/// One row of the `run` table.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run_id:     String,
    pub seed:       u64,
    pub model:      String,
    pub node_count: usize,
    pub edge_count: usize,
    pub topology:   TopologySource,
    pub params:     SimParams,
}

impl RunRecord {
    /// Fails unless `graph` has the shape this run was recorded on.
    pub fn check_graph(&self, graph: &AdjacencyGraph) -> Result<()> {
        if graph.node_count() != self.node_count || graph.edge_count() != self.edge_count {
            bail!(
                "run {} was recorded on {} nodes / {} edges, the rebuilt topology has {} / {}",
                self.run_id,
                self.node_count,
                self.edge_count,
                graph.node_count(),
                graph.edge_count()
            );
        }
        Ok(())
    }
}

impl RunStore {
    /// Open (or create) the recording database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(include_str!("../migrations/001_recorder.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, record: &RunRecord, version: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, model, node_count, edge_count, topology, params, version, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.run_id,
                record.seed as i64,
                record.model,
                record.node_count as i64,
                record.edge_count as i64,
                serde_json::to_string(&record.topology)?,
                serde_json::to_string(&record.params)?,
                version,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn find_run(&self, run_id: &str) -> Result<Option<RunRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, seed, model, node_count, edge_count, topology, params
                 FROM run WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)? as u64,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)? as usize,
                        row.get::<_, i64>(4)? as usize,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((run_id, seed, model, node_count, edge_count, topology_json, params_json)) => {
                Ok(Some(RunRecord {
                    run_id,
                    seed,
                    model,
                    node_count,
                    edge_count,
                    topology: serde_json::from_str(&topology_json)?,
                    params: serde_json::from_str(&params_json)?,
                }))
            }
            None => Ok(None),
        }
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn append_snapshot<S: Serialize>(&self, snapshot: &SimSnapshot<S>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO snapshot (run_id, tick, susceptible, infected, recovering, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                snapshot.run_id,
                snapshot.tick as i64,
                snapshot.census.susceptible as i64,
                snapshot.census.infected as i64,
                snapshot.census.recovering as i64,
                snapshot.to_json()?,
            ],
        )?;
        Ok(())
    }

    pub fn snapshot_count(&self, run_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM snapshot WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?)
    }

    /// Census per recorded tick, oldest first.
    pub fn census_history(&self, run_id: &str) -> Result<Vec<(Tick, Census)>> {
        let mut stmt = self.conn.prepare(
            "SELECT tick, susceptible, infected, recovering
             FROM snapshot WHERE run_id = ?1
             ORDER BY tick ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)? as Tick,
                    Census {
                        susceptible: row.get::<_, i64>(1)? as usize,
                        infected:    row.get::<_, i64>(2)? as usize,
                        recovering:  row.get::<_, i64>(3)? as usize,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The most recent snapshot recorded for a run.
    pub fn latest_snapshot<S: DeserializeOwned>(&self, run_id: &str) -> Result<Option<SimSnapshot<S>>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM snapshot WHERE run_id = ?1 ORDER BY tick DESC LIMIT 1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

/// Observer that writes every snapshot it sees to a RunStore.
pub struct SnapshotRecorder<'a> {
    store:    &'a RunStore,
    recorded: u64,
}

impl<'a> SnapshotRecorder<'a> {
    pub fn new(store: &'a RunStore) -> Self {
        Self { store, recorded: 0 }
    }

    pub fn recorded(&self) -> u64 {
        self.recorded
    }
}

impl<S: Serialize> SnapshotObserver<S> for SnapshotRecorder<'_> {
    fn observe(&mut self, snapshot: &SimSnapshot<S>) -> SimResult<ObserverSignal> {
        self.store.append_snapshot(snapshot).map_err(SimError::Other)?;
        self.recorded += 1;
        Ok(ObserverSignal::Continue)
    }
}
