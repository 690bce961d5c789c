use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::player::PlayerRecord;

#[derive(Debug, Clone)]
pub struct StoreSummary {
    pub run_id: i64,
    pub players_upserted: usize,
    pub players_removed: usize,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY,
            web_name TEXT NOT NULL,
            team INTEGER NOT NULL,
            element_type INTEGER NOT NULL,
            now_cost INTEGER NOT NULL,
            form REAL NULL,
            total_points REAL NULL,
            threat REAL NULL,
            expected_goals REAL NULL,
            expected_assists REAL NULL,
            clean_sheets REAL NULL,
            saves REAL NULL,
            minutes REAL NULL,
            next_3_gw_fixtures REAL NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_players_element_type ON players(element_type);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            players_upserted INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Replaces the stored snapshot in one transaction and records the run.
/// Players missing from `records` are removed; a failed store leaves both
/// the previous snapshot and the run log untouched.
pub fn store_snapshot(conn: &mut Connection, records: &[PlayerRecord]) -> Result<StoreSummary> {
    let stamp = Utc::now().to_rfc3339();
    let tx = conn.transaction().context("begin snapshot transaction")?;
    tx.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, players_upserted) VALUES (?1, NULL, 0)",
        params![stamp],
    )
    .context("insert ingest run")?;
    let run_id = tx.last_insert_rowid();

    let previous = stored_ids(&tx)?;
    tx.execute("DELETE FROM players", [])
        .context("clear previous snapshot")?;
    for record in records {
        upsert_player(&tx, record, &stamp)?;
    }
    let current: HashSet<u32> = records.iter().map(|r| r.id).collect();
    let players_removed = previous.difference(&current).count();

    tx.execute(
        "UPDATE ingest_runs SET finished_at = ?1, players_upserted = ?2 WHERE run_id = ?3",
        params![Utc::now().to_rfc3339(), records.len() as i64, run_id],
    )
    .context("update ingest run")?;
    tx.commit().context("commit snapshot transaction")?;

    Ok(StoreSummary {
        run_id,
        players_upserted: records.len(),
        players_removed,
    })
}

fn stored_ids(tx: &rusqlite::Transaction<'_>) -> Result<HashSet<u32>> {
    let mut stmt = tx
        .prepare("SELECT id FROM players")
        .context("prepare stored ids query")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, u32>(0))
        .context("query stored ids")?
        .collect::<rusqlite::Result<HashSet<u32>>>()
        .context("read stored ids")?;
    Ok(ids)
}

fn upsert_player(tx: &rusqlite::Transaction<'_>, p: &PlayerRecord, stamp: &str) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO players (
            id, web_name, team, element_type, now_cost,
            form, total_points, threat, expected_goals, expected_assists,
            clean_sheets, saves, minutes, next_3_gw_fixtures, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15
        )
        ON CONFLICT(id) DO UPDATE SET
            web_name = excluded.web_name,
            team = excluded.team,
            element_type = excluded.element_type,
            now_cost = excluded.now_cost,
            form = excluded.form,
            total_points = excluded.total_points,
            threat = excluded.threat,
            expected_goals = excluded.expected_goals,
            expected_assists = excluded.expected_assists,
            clean_sheets = excluded.clean_sheets,
            saves = excluded.saves,
            minutes = excluded.minutes,
            next_3_gw_fixtures = excluded.next_3_gw_fixtures,
            updated_at = excluded.updated_at
        "#,
        params![
            p.id as i64,
            p.web_name,
            p.team as i64,
            p.element_type as i64,
            p.now_cost,
            p.form,
            p.total_points,
            p.threat,
            p.expected_goals,
            p.expected_assists,
            p.clean_sheets,
            p.saves,
            p.minutes,
            p.next_3_gw_fixtures,
            stamp,
        ],
    )
    .with_context(|| format!("upsert player {}", p.id))?;
    Ok(())
}

pub fn load_players(conn: &Connection) -> Result<Vec<PlayerRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                id, web_name, team, element_type, now_cost,
                form, total_points, threat, expected_goals, expected_assists,
                clean_sheets, saves, minutes, next_3_gw_fixtures
            FROM players
            ORDER BY id ASC
            "#,
        )
        .context("prepare load players query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PlayerRecord {
                id: row.get::<_, u32>(0)?,
                web_name: row.get(1)?,
                team: row.get::<_, u32>(2)?,
                element_type: row.get::<_, u8>(3)?,
                now_cost: row.get(4)?,
                form: row.get(5)?,
                total_points: row.get(6)?,
                threat: row.get(7)?,
                expected_goals: row.get(8)?,
                expected_assists: row.get(9)?,
                clean_sheets: row.get(10)?,
                saves: row.get(11)?,
                minutes: row.get(12)?,
                next_3_gw_fixtures: row.get(13)?,
            })
        })
        .context("query players")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("read player row")?);
    }
    Ok(out)
}

pub fn read_json_snapshot(path: &Path) -> Result<Vec<PlayerRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read player snapshot {}", path.display()))?;
    serde_json::from_str::<Vec<PlayerRecord>>(&raw)
        .with_context(|| format!("parse player snapshot {}", path.display()))
}

pub fn write_json_snapshot(path: &Path, records: &[PlayerRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(records).context("serialize player snapshot")?;
    fs::write(&tmp, json).context("write player snapshot")?;
    fs::rename(&tmp, path).context("swap player snapshot")?;
    Ok(())
}

/// Reads a snapshot: `.json` files as a record array, anything else as SQLite.
/// A missing file is an error; it is never created here.
pub fn load_records(path: &Path) -> Result<Vec<PlayerRecord>> {
    if !path.exists() {
        bail!("player snapshot {} not found", path.display());
    }
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        return read_json_snapshot(path);
    }
    let conn = Connection::open(path)
        .with_context(|| format!("open sqlite db {}", path.display()))?;
    load_players(&conn).with_context(|| format!("load players from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, cost: i64) -> PlayerRecord {
        PlayerRecord {
            id,
            web_name: format!("P{id}"),
            team: 4,
            element_type: 3,
            now_cost: cost,
            form: Some(5.5),
            total_points: Some(61.0),
            threat: None,
            expected_goals: Some(3.21),
            expected_assists: None,
            clean_sheets: Some(2.0),
            saves: Some(0.0),
            minutes: Some(1180.0),
            next_3_gw_fixtures: Some(2.33),
        }
    }

    #[test]
    fn snapshot_store_replaces_rows_and_keeps_nulls() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let first = store_snapshot(&mut conn, &[record(2, 70), record(1, 45)]).unwrap();
        assert_eq!(first.players_upserted, 2);
        assert_eq!(first.players_removed, 0);
        let second = store_snapshot(&mut conn, &[record(2, 72)]).unwrap();
        assert!(second.run_id > first.run_id);
        assert_eq!(second.players_removed, 1);

        let rows = load_players(&conn).unwrap();
        assert_eq!(rows.len(), 1, "players dropped from the feed are gone");
        assert_eq!(rows[0].id, 2);
        assert_eq!(rows[0].now_cost, 72);
        assert_eq!(rows[0].threat, None);
    }

    #[test]
    fn failed_store_keeps_previous_snapshot_and_run_log() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        store_snapshot(&mut conn, &[record(1, 45)]).unwrap();

        // The second row clashes with the first on the unique name index.
        conn.execute_batch("CREATE UNIQUE INDEX idx_players_name ON players(web_name)")
            .unwrap();
        let mut clash = record(3, 50);
        clash.web_name = "P4".to_string();
        assert!(store_snapshot(&mut conn, &[record(4, 60), clash]).is_err());

        let rows = load_players(&conn).unwrap();
        assert_eq!(rows, vec![record(1, 45)]);
        let (runs, unfinished): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(*) - COUNT(finished_at) FROM ingest_runs",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((runs, unfinished), (1, 0));
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let err = load_records(Path::new("/nonexistent/fpl/players.sqlite")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
