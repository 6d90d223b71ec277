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

//! The drill interface: a local web server that walks through the problems
//! due today. Each grading button is annotated with the interval that
//! rating would produce, computed by the scheduler without committing.

use std::sync::Arc;
use std::sync::Mutex;

use axum::Form;
use axum::Router;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::Html;
use axum::routing::get;
use axum::routing::post;
use maud::DOCTYPE;
use maud::Markup;
use maud::html;
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::cir;
use crate::db::Database;
use crate::db::HistoryEntry;
use crate::error::Fallible;
use crate::types::date::Date;
use crate::types::problem::Problem;
use crate::types::progress::ProgressRecord;
use crate::types::quality::Quality;
use crate::types::timestamp::Timestamp;

#[derive(Clone)]
struct ServerState {
    today: Date,
    interview_mode: bool,
    mutable: Arc<Mutex<MutableState>>,
}

struct MutableState {
    db: Database,
    queue: Vec<(Problem, ProgressRecord)>,
    total: usize,
    done: usize,
}

pub async fn drill(db: Database, today: Date, interview_mode: bool, port: u16) -> Fallible<()> {
    let queue = db.due_problems(today)?;
    if queue.is_empty() {
        println!("No problems due today.");
        return Ok(());
    }
    println!("{} problems due.", queue.len());
    if interview_mode {
        println!("Interview mode is on: intervals are halved.");
    }

    let total = queue.len();
    let state = ServerState {
        today,
        interview_mode,
        mutable: Arc::new(Mutex::new(MutableState {
            db,
            queue,
            total,
            done: 0,
        })),
    };
    let app = Router::new();
    let app = app.route("/", get(root));
    let app = app.route("/", post(action));
    let app = app.route("/style.css", get(stylesheet));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("127.0.0.1:{port}");
    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    let url = format!("http://{bind}/");
    if let Err(e) = open::that(&url) {
        log::warn!("Could not open browser: {e}");
        println!("Open {url} to start drilling.");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn root(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    render_page(state, None)
}

#[derive(Debug, Deserialize)]
enum Action {
    Again,
    Hard,
    Good,
    Easy,
}

impl Action {
    fn quality(&self) -> Quality {
        match self {
            Action::Again => Quality::Again,
            Action::Hard => Quality::Hard,
            Action::Good => Quality::Good,
            Action::Easy => Quality::Easy,
        }
    }
}

#[derive(Deserialize)]
struct FormData {
    action: Action,
}

async fn action(
    State(state): State<ServerState>,
    Form(form): Form<FormData>,
) -> (StatusCode, Html<String>) {
    render_page(state, Some(form.action))
}

fn render_page(state: ServerState, action: Option<Action>) -> (StatusCode, Html<String>) {
    let mut mutable = state.mutable.lock().unwrap();

    if let Some(action) = action {
        if mutable.queue.is_empty() {
            log::error!("Grading with an empty queue.");
        } else {
            let (problem, record) = mutable.queue.remove(0);
            let quality = action.quality();
            let scheduled = cir::schedule(
                &record.state(),
                quality,
                problem.difficulty,
                state.interview_mode,
                state.today,
            );
            let now = Timestamp::now();
            let updated = record.apply(&scheduled, now);
            let entry = HistoryEntry {
                problem_id: problem.id,
                reviewed_at: now,
                quality,
                interval_before: record.interval,
                interval_after: updated.interval,
                ease_factor_before: record.ease_factor,
                ease_factor_after: updated.ease_factor,
            };
            match mutable.db.record_review(&updated, &entry) {
                Ok(()) => {
                    mutable.done += 1;
                    // A forgotten problem comes back at the end of the session.
                    if quality == Quality::Again {
                        mutable.queue.push((problem, updated));
                        mutable.total += 1;
                    }
                }
                Err(e) => {
                    log::error!("Failed to record review for problem {}: {e}", problem.id);
                    mutable.queue.insert(0, (problem, record));
                }
            }
        }
    }

    let body = if mutable.queue.is_empty() {
        html! {
            div.root {
                p.finished { "Finished! " (mutable.done) " reviews." }
            }
        }
    } else {
        let (problem, record) = &mutable.queue[0];
        let previews = cir::preview_intervals(
            &record.state(),
            problem.difficulty,
            state.interview_mode,
            state.today,
        );
        let progress_line = format!(
            "{} / {} · streak {} · {:.0}% success",
            mutable.done + 1,
            mutable.total,
            record.consecutive_successes,
            record.success_rate * 100.0
        );
        html! {
            div.root {
                div.problem {
                    p.progress { (progress_line) }
                    h1 { (problem.title) }
                    p class=(format!("difficulty {}", problem.difficulty.as_str().to_lowercase())) {
                        (problem.difficulty.as_str())
                    }
                    p.categories {
                        @for category in &problem.categories {
                            span.category { (category) " " }
                        }
                    }
                    p.links {
                        a href=(problem.problem_url) target="_blank" { "problem" }
                        " · "
                        a href=(problem.solution_url) target="_blank" { "solution" }
                    }
                    div.controls {
                        form action="/" method="post" {
                            @for (action, days) in [
                                ("Again", previews[0]),
                                ("Hard", previews[1]),
                                ("Good", previews[2]),
                                ("Easy", previews[3]),
                            ] {
                                button type="submit" name="action" value=(action) {
                                    (action) " (" (days) "d)"
                                }
                            }
                        }
                    }
                }
            }
        }
    };
    let html = page_template(body);
    (StatusCode::OK, Html(html.into_string()))
}

fn page_template(body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "codedrill" }
                link rel="stylesheet" href="/style.css";
            }
            body {
                (body)
            }
        }
    }
}

async fn stylesheet() -> (StatusCode, [(HeaderName, &'static str); 2], &'static [u8]) {
    let bytes = include_bytes!("style.css");
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css"),
            (CACHE_CONTROL, "public, max-age=604800, immutable"),
        ],
        bytes,
    )
}

async fn not_found_handler() -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html("Not Found".to_string()))
}
