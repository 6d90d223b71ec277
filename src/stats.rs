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

//! Aggregate statistics over the progress store. Read-only: this module
//! never writes scheduling state.

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

use crate::db::Database;
use crate::error::Fallible;
use crate::types::date::Date;
use crate::types::status::Status;

#[derive(ValueEnum, Clone)]
pub enum StatsFormat {
    /// Human-readable output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    total_problem_count: i64,
    new_count: i64,
    learning_count: i64,
    reviewing_count: i64,
    due_count: i64,
    total_review_count: i64,
    completion_percentage: i64,
}

pub fn collect(db: &Database, today: Date) -> Fallible<Stats> {
    let total_problem_count = db.problem_count()?;
    let new_count = db.status_count(Status::New)?;
    let learning_count = db.status_count(Status::Learning)?;
    let reviewing_count = db.status_count(Status::Reviewing)?;
    let practiced = learning_count + reviewing_count;
    let completion_percentage = if total_problem_count == 0 {
        0
    } else {
        (practiced as f64 / total_problem_count as f64 * 100.0).round() as i64
    };
    Ok(Stats {
        total_problem_count,
        new_count,
        learning_count,
        reviewing_count,
        due_count: db.due_count(today)?,
        total_review_count: db.review_count()?,
        completion_percentage,
    })
}

pub fn print_stats(db: &Database, today: Date, format: StatsFormat) -> Fallible<()> {
    let stats = collect(db, today)?;
    match format {
        StatsFormat::Text => {
            println!("Problems:   {}", stats.total_problem_count);
            println!("New:        {}", stats.new_count);
            println!("Learning:   {}", stats.learning_count);
            println!("Reviewing:  {}", stats.reviewing_count);
            println!("Due today:  {}", stats.due_count);
            println!("Reviews:    {}", stats.total_review_count);
            println!("Completion: {}%", stats.completion_percentage);
        }
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{}", stats_json);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::catalog;
    use crate::cir;
    use crate::db::HistoryEntry;
    use crate::types::difficulty::Difficulty;
    use crate::types::progress::ProgressRecord;
    use crate::types::quality::Quality;
    use crate::types::timestamp::Timestamp;

    #[test]
    fn test_collect() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codedrill.db");
        let mut db = Database::new(path.to_str().unwrap()).unwrap();
        let problems = catalog::builtin().unwrap();
        db.upsert_problems(&problems).unwrap();

        let today = Date::from_ymd(2025, 6, 1);
        let stats = collect(&db, today).unwrap();
        assert_eq!(stats.total_problem_count, problems.len() as i64);
        assert_eq!(stats.new_count, problems.len() as i64);
        assert_eq!(stats.due_count, 0);
        assert_eq!(stats.completion_percentage, 0);

        let record = ProgressRecord::fresh(1);
        let scheduled = cir::schedule(
            &record.state(),
            Quality::Again,
            Difficulty::Easy,
            false,
            today,
        );
        let updated = record.apply(&scheduled, Timestamp::now());
        let entry = HistoryEntry {
            problem_id: 1,
            reviewed_at: Timestamp::now(),
            quality: Quality::Again,
            interval_before: record.interval,
            interval_after: updated.interval,
            ease_factor_before: record.ease_factor,
            ease_factor_after: updated.ease_factor,
        };
        db.record_review(&updated, &entry).unwrap();

        let stats = collect(&db, today.plus_days(1)).unwrap();
        assert_eq!(stats.new_count, problems.len() as i64 - 1);
        assert_eq!(stats.learning_count, 1);
        assert_eq!(stats.due_count, 1);
        assert_eq!(stats.total_review_count, 1);
        assert!(stats.completion_percentage > 0);
    }
}
