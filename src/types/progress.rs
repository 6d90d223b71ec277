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

use crate::cir::CirState;
use crate::cir::Scheduled;
use crate::types::date::Date;
use crate::types::problem::ProblemId;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;

/// Persistent scheduling state of one problem. Mutated only by applying the
/// scheduler's output; everything else reads it.
#[derive(Clone, Debug)]
pub struct ProgressRecord {
    pub problem_id: ProblemId,
    pub status: Status,
    pub consecutive_successes: i64,
    pub interval: i64,
    pub ease_factor: f64,
    pub success_rate: f64,
    pub total_reviews: i64,
    pub next_review_date: Option<Date>,
    pub first_learned_at: Option<Timestamp>,
    pub last_reviewed_at: Option<Timestamp>,
}

impl ProgressRecord {
    /// The record of a problem that has never been reviewed.
    pub fn fresh(problem_id: ProblemId) -> Self {
        let state = CirState::initial();
        Self {
            problem_id,
            status: Status::New,
            consecutive_successes: state.consecutive_successes,
            interval: state.interval,
            ease_factor: state.ease_factor,
            success_rate: state.success_rate,
            total_reviews: state.total_reviews,
            next_review_date: None,
            first_learned_at: None,
            last_reviewed_at: None,
        }
    }

    /// The slice of the record the scheduler operates on.
    pub fn state(&self) -> CirState {
        CirState {
            consecutive_successes: self.consecutive_successes,
            interval: self.interval,
            ease_factor: self.ease_factor,
            success_rate: self.success_rate,
            total_reviews: self.total_reviews,
        }
    }

    /// Fold the scheduler's output back into the record.
    pub fn apply(&self, scheduled: &Scheduled, reviewed_at: Timestamp) -> Self {
        let state = scheduled.state;
        Self {
            problem_id: self.problem_id,
            status: Status::from_review_count(state.total_reviews),
            consecutive_successes: state.consecutive_successes,
            interval: state.interval,
            ease_factor: state.ease_factor,
            success_rate: state.success_rate,
            total_reviews: state.total_reviews,
            next_review_date: Some(scheduled.next_review_date),
            first_learned_at: self.first_learned_at.or(Some(reviewed_at)),
            last_reviewed_at: Some(reviewed_at),
        }
    }
}
