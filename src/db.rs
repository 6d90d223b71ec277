// Copyright 2025 the codedrill authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The progress store: problems, per-problem scheduling state, and the
//! append-only review log, in a single SQLite file.
//!
//! Opening the database runs every pending schema migration, so a
//! `Database` value in hand is always fully migrated. Migrations are
//! structural: each step probes for the column it would add and is a no-op
//! when the column is already present, so a store created by any historical
//! version converges to the current shape.

use rusqlite::Connection;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::date::Date;
use crate::types::problem::Problem;
use crate::types::problem::ProblemId;
use crate::types::progress::ProgressRecord;
use crate::types::quality::Quality;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;

pub struct Database {
    conn: Connection,
}

/// One row of the append-only review log, capturing the transition the
/// scheduler made.
pub struct HistoryEntry {
    pub problem_id: ProblemId,
    pub reviewed_at: Timestamp,
    pub quality: Quality,
    pub interval_before: i64,
    pub interval_after: i64,
    pub ease_factor_before: f64,
    pub ease_factor_after: f64,
}

impl Database {
    /// Open (or create) the store at the given path, running any pending
    /// migrations. A migration failure is fatal: no handle is returned.
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating base schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        run_migrations(&mut conn)?;
        ensure_indexes(&conn)?;
        Ok(Self { conn })
    }

    /// Upsert the catalog into the store, last writer wins on every field.
    /// Also creates a fresh progress row for problems that don't have one.
    pub fn upsert_problems(&mut self, problems: &[Problem]) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        for problem in problems {
            upsert_problem(&tx, problem)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_problem(&self, problem_id: ProblemId) -> Fallible<Option<Problem>> {
        let sql = "select id, title, difficulty, categories, tags, problem_url, solution_url, in_blind75, in_top150 from problems where id = ?;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([problem_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(problem_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn get_progress(&self, problem_id: ProblemId) -> Fallible<Option<ProgressRecord>> {
        let sql = "select problem_id, status, consecutive_successes, interval, ease_factor, success_rate, total_reviews, next_review_date, first_learned_at, last_reviewed_at from problem_progress where problem_id = ?;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([problem_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(progress_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Record one review: upsert the problem's progress and append a log
    /// entry, in a single transaction. Either both writes land or neither.
    pub fn record_review(&mut self, updated: &ProgressRecord, entry: &HistoryEntry) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        upsert_progress(&tx, updated)?;
        insert_history(&tx, entry)?;
        tx.commit()?;
        Ok(())
    }

    /// Problems due on or before `today`, soonest first. Reads the persisted
    /// next-review-date index; never recomputes schedules.
    pub fn due_problems(&self, today: Date) -> Fallible<Vec<(Problem, ProgressRecord)>> {
        let sql = "select p.id, p.title, p.difficulty, p.categories, p.tags, p.problem_url, p.solution_url, p.in_blind75, p.in_top150, \
                   g.problem_id, g.status, g.consecutive_successes, g.interval, g.ease_factor, g.success_rate, g.total_reviews, g.next_review_date, g.first_learned_at, g.last_reviewed_at \
                   from problems p join problem_progress g on g.problem_id = p.id \
                   where g.next_review_date is not null and g.next_review_date <= ? \
                   order by g.next_review_date asc, p.id asc;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([today])?;
        let mut due = Vec::new();
        while let Some(row) = rows.next()? {
            let problem = problem_from_row(row)?;
            let progress = progress_from_row_at(row, 9)?;
            due.push((problem, progress));
        }
        Ok(due)
    }

    pub fn list_by_status(&self, status: Status) -> Fallible<Vec<ProgressRecord>> {
        let sql = "select problem_id, status, consecutive_successes, interval, ease_factor, success_rate, total_reviews, next_review_date, first_learned_at, last_reviewed_at from problem_progress where status = ? order by problem_id asc;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([status])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(progress_from_row(row)?);
        }
        Ok(records)
    }

    pub fn problem_count(&self) -> Fallible<i64> {
        let count = self
            .conn
            .query_row("select count(*) from problems;", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn status_count(&self, status: Status) -> Fallible<i64> {
        let sql = "select count(*) from problem_progress where status = ?;";
        let count = self.conn.query_row(sql, [status], |row| row.get(0))?;
        Ok(count)
    }

    pub fn due_count(&self, today: Date) -> Fallible<i64> {
        let sql = "select count(*) from problem_progress where next_review_date is not null and next_review_date <= ?;";
        let count = self.conn.query_row(sql, [today], |row| row.get(0))?;
        Ok(count)
    }

    /// Total number of reviews ever logged.
    pub fn review_count(&self) -> Fallible<i64> {
        let count = self
            .conn
            .query_row("select count(*) from review_history;", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    pub fn get_preference(&self, key: &str) -> Fallible<Option<String>> {
        let sql = "select value from preferences where key = ?;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn set_preference(&mut self, key: &str, value: &str) -> Fallible<()> {
        let sql = "insert into preferences (key, value, updated_at) values (?, ?, ?) \
                   on conflict (key) do update set value = excluded.value, updated_at = excluded.updated_at;";
        self.conn.execute(sql, (key, value, Timestamp::now()))?;
        Ok(())
    }

    /// The persisted interview-mode toggle. Absent means off.
    pub fn interview_mode(&self) -> Fallible<bool> {
        Ok(self.get_preference("interview_mode")?.as_deref() == Some("true"))
    }

    pub fn set_interview_mode(&mut self, enabled: bool) -> Fallible<()> {
        self.set_preference("interview_mode", if enabled { "true" } else { "false" })
    }
}

fn problem_from_row(row: &rusqlite::Row) -> Fallible<Problem> {
    let categories: String = row.get(3)?;
    let tags: String = row.get(4)?;
    Ok(Problem {
        id: row.get(0)?,
        title: row.get(1)?,
        difficulty: row.get(2)?,
        categories: serde_json::from_str(&categories)?,
        tags: serde_json::from_str(&tags)?,
        problem_url: row.get(5)?,
        solution_url: row.get(6)?,
        in_blind75: row.get(7)?,
        in_top150: row.get(8)?,
    })
}

fn progress_from_row(row: &rusqlite::Row) -> Fallible<ProgressRecord> {
    progress_from_row_at(row, 0)
}

fn progress_from_row_at(row: &rusqlite::Row, offset: usize) -> Fallible<ProgressRecord> {
    Ok(ProgressRecord {
        problem_id: row.get(offset)?,
        status: row.get(offset + 1)?,
        consecutive_successes: row.get(offset + 2)?,
        interval: row.get(offset + 3)?,
        ease_factor: row.get(offset + 4)?,
        success_rate: row.get(offset + 5)?,
        total_reviews: row.get(offset + 6)?,
        next_review_date: row.get(offset + 7)?,
        first_learned_at: row.get(offset + 8)?,
        last_reviewed_at: row.get(offset + 9)?,
    })
}

fn upsert_problem(tx: &Transaction, problem: &Problem) -> Fallible<()> {
    let sql = "insert into problems (id, title, difficulty, categories, tags, problem_url, solution_url, in_blind75, in_top150, created_at) \
               values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
               on conflict (id) do update set \
                   title = excluded.title, \
                   difficulty = excluded.difficulty, \
                   categories = excluded.categories, \
                   tags = excluded.tags, \
                   problem_url = excluded.problem_url, \
                   solution_url = excluded.solution_url, \
                   in_blind75 = excluded.in_blind75, \
                   in_top150 = excluded.in_top150;";
    tx.execute(
        sql,
        (
            problem.id,
            &problem.title,
            problem.difficulty,
            serde_json::to_string(&problem.categories)?,
            serde_json::to_string(&problem.tags)?,
            &problem.problem_url,
            &problem.solution_url,
            problem.in_blind75,
            problem.in_top150,
            Timestamp::now(),
        ),
    )?;
    // Eagerly create the problem's progress row so status listings see it.
    tx.execute(
        "insert or ignore into problem_progress (problem_id) values (?);",
        [problem.id],
    )?;
    Ok(())
}

fn upsert_progress(tx: &Transaction, record: &ProgressRecord) -> Fallible<()> {
    let sql = "insert into problem_progress (problem_id, status, consecutive_successes, interval, ease_factor, success_rate, total_reviews, next_review_date, first_learned_at, last_reviewed_at) \
               values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
               on conflict (problem_id) do update set \
                   status = excluded.status, \
                   consecutive_successes = excluded.consecutive_successes, \
                   interval = excluded.interval, \
                   ease_factor = excluded.ease_factor, \
                   success_rate = excluded.success_rate, \
                   total_reviews = excluded.total_reviews, \
                   next_review_date = excluded.next_review_date, \
                   first_learned_at = excluded.first_learned_at, \
                   last_reviewed_at = excluded.last_reviewed_at;";
    tx.execute(
        sql,
        (
            record.problem_id,
            record.status,
            record.consecutive_successes,
            record.interval,
            record.ease_factor,
            record.success_rate,
            record.total_reviews,
            record.next_review_date,
            record.first_learned_at,
            record.last_reviewed_at,
        ),
    )?;
    Ok(())
}

fn insert_history(tx: &Transaction, entry: &HistoryEntry) -> Fallible<()> {
    let sql = "insert into review_history (problem_id, reviewed_at, quality, interval_before, interval_after, ease_factor_before, ease_factor_after) values (?, ?, ?, ?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            entry.problem_id,
            entry.reviewed_at,
            entry.quality,
            entry.interval_before,
            entry.interval_after,
            entry.ease_factor_before,
            entry.ease_factor_after,
        ),
    )?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' and name=?;";
    let count: i64 = tx.query_row(sql, ["problems"], |row| row.get(0))?;
    Ok(count > 0)
}

/// One additive schema change. `probe` reports whether the step already
/// ran; `apply` performs the DDL and backfills pre-existing rows.
struct Migration {
    name: &'static str,
    probe: fn(&Transaction) -> Fallible<bool>,
    apply: fn(&Transaction) -> Fallible<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "problem-set-flags",
        probe: |tx| column_exists(tx, "problems", "in_blind75"),
        apply: |tx| {
            tx.execute_batch(
                "alter table problems add column in_blind75 integer not null default 0; \
                 alter table problems add column in_top150 integer not null default 0;",
            )?;
            // The first 75 catalog entries are the Blind 75 list.
            tx.execute("update problems set in_blind75 = 1 where id <= 75;", [])?;
            Ok(())
        },
    },
    Migration {
        name: "cir-columns",
        probe: |tx| column_exists(tx, "problem_progress", "success_rate"),
        apply: |tx| {
            tx.execute_batch(
                "alter table problem_progress add column success_rate real not null default 0.5; \
                 alter table problem_progress add column consecutive_successes integer not null default 0;",
            )?;
            // The legacy SM-2 repetition count roughly maps to a success
            // streak, capped at the base interval table's last index.
            tx.execute(
                "update problem_progress set consecutive_successes = min(repetitions, 5);",
                [],
            )?;
            // Seed the success rate from the row's stage: reviewing rows
            // have been answering well, learning rows less so.
            tx.execute(
                "update problem_progress set success_rate = case \
                     when total_reviews = 0 then 0.5 \
                     when status = 'reviewing' then 0.8 \
                     when status = 'learning' then 0.6 \
                     else 0.5 \
                 end;",
                [],
            )?;
            Ok(())
        },
    },
];

fn run_migrations(conn: &mut Connection) -> Fallible<()> {
    for migration in MIGRATIONS {
        let tx = conn.transaction()?;
        if (migration.probe)(&tx)? {
            continue;
        }
        log::info!("Running migration: {}", migration.name);
        (migration.apply)(&tx)
            .map_err(|e| ErrorReport::new(format!("migration '{}' failed: {e}", migration.name)))?;
        tx.commit()?;
    }
    Ok(())
}

fn column_exists(tx: &Transaction, table: &str, column: &str) -> Fallible<bool> {
    let sql = format!("pragma table_info({table});");
    let mut stmt = tx.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn ensure_indexes(conn: &Connection) -> Fallible<()> {
    conn.execute_batch(
        "create index if not exists idx_progress_next_review on problem_progress (next_review_date); \
         create index if not exists idx_progress_status on problem_progress (status); \
         create index if not exists idx_history_problem on review_history (problem_id); \
         create index if not exists idx_history_date on review_history (reviewed_at); \
         create index if not exists idx_problems_blind75 on problems (in_blind75); \
         create index if not exists idx_problems_top150 on problems (in_top150);",
    )?;
    Ok(())
}
