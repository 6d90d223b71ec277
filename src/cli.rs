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

use clap::Parser;
use clap::ValueEnum;

use crate::catalog;
use crate::db::Database;
use crate::drill;
use crate::error::Fallible;
use crate::stats;
use crate::stats::StatsFormat;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;

const DEFAULT_DB_PATH: &str = "codedrill.db";

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Drill the problems due today in the browser.
    Drill {
        /// Path to the database file.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: String,
        /// Halve all intervals for this session, regardless of the stored
        /// interview-mode setting.
        #[arg(long)]
        interview: bool,
        /// Port to serve the drill interface on.
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// List the problems due today.
    Due {
        /// Path to the database file.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: String,
    },
    /// List problems in a given learning stage.
    List {
        status: Status,
        /// Path to the database file.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: String,
    },
    /// Print aggregate statistics.
    Stats {
        /// Path to the database file.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: String,
        /// Output format.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Turn interview mode on or off.
    Interview {
        setting: Toggle,
        /// Path to the database file.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: String,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum Toggle {
    On,
    Off,
}

/// Open the store and sync the built-in catalog into it.
fn open_store(path: &str) -> Fallible<Database> {
    let mut db = Database::new(path)?;
    let problems = catalog::builtin()?;
    db.upsert_problems(&problems)?;
    Ok(db)
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Drill {
            db,
            interview,
            port,
        } => {
            let database = open_store(&db)?;
            let today = Timestamp::now().local_date();
            let interview_mode = interview || database.interview_mode()?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(drill::drill(database, today, interview_mode, port))
        }
        Command::Due { db } => {
            let database = open_store(&db)?;
            let today = Timestamp::now().local_date();
            let due = database.due_problems(today)?;
            if due.is_empty() {
                println!("No problems due today.");
            } else {
                for (problem, record) in due {
                    let date = match record.next_review_date {
                        Some(date) => date.to_string(),
                        None => "-".to_string(),
                    };
                    println!(
                        "{date}  {title} ({difficulty})",
                        title = problem.title,
                        difficulty = problem.difficulty
                    );
                }
            }
            Ok(())
        }
        Command::List { status, db } => {
            let database = open_store(&db)?;
            for record in database.list_by_status(status)? {
                match database.get_problem(record.problem_id)? {
                    Some(problem) => {
                        println!("{} ({})", problem.title, problem.difficulty)
                    }
                    None => log::warn!("Progress row without a problem: {}", record.problem_id),
                }
            }
            Ok(())
        }
        Command::Stats { db, format } => {
            let database = open_store(&db)?;
            let today = Timestamp::now().local_date();
            stats::print_stats(&database, today, format)
        }
        Command::Interview { setting, db } => {
            let mut database = open_store(&db)?;
            let enabled = matches!(setting, Toggle::On);
            database.set_interview_mode(enabled)?;
            println!(
                "Interview mode is {}.",
                if enabled { "on" } else { "off" }
            );
            Ok(())
        }
    }
}
