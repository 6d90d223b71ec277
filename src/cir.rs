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

//! The CIR (Coding Interview Repetition) scheduling algorithm.
//!
//! A spaced repetition variant tuned for interview preparation rather than
//! long-term retention. Differences from SM-2:
//!
//! - intervals are capped at 28 days;
//! - the progression doubles through a fixed table (1, 2, 4, 8, 16, 28);
//! - intervals are weighted by problem difficulty;
//! - a running success rate below 80% shortens intervals;
//! - interview mode halves every interval for cramming before a deadline.
//!
//! The transition is a pure function of the current state, the quality
//! rating, and an explicit `today`, so callers inject the clock.

use crate::types::date::Date;
use crate::types::difficulty::Difficulty;
use crate::types::quality::Quality;

/// The maximum review interval in days.
const MAX_INTERVAL_DAYS: i64 = 28;

/// Doubling interval progression, indexed by current streak length.
const BASE_INTERVALS: [i64; 6] = [1, 2, 4, 8, 16, 28];

/// Below this running success rate, successful reviews get shorter intervals.
const SUCCESS_RATE_THRESHOLD: f64 = 0.8;
const SUCCESS_RATE_PENALTY: f64 = 0.8;

const INTERVIEW_MODE_MULTIPLIER: f64 = 0.5;
const EASY_BONUS_MULTIPLIER: f64 = 1.15;
const MIN_EASE_FACTOR: f64 = 1.3;

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const INITIAL_SUCCESS_RATE: f64 = 0.5;

/// Scheduling state of a single problem, as seen by the algorithm.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CirState {
    /// Streak of consecutive Good/Easy reviews.
    pub consecutive_successes: i64,
    /// Current interval in days. Zero only before the first review.
    pub interval: i64,
    /// Slow-moving difficulty multiplier, bounded below at 1.3.
    pub ease_factor: f64,
    /// Running fraction of reviews rated Good or better.
    pub success_rate: f64,
    pub total_reviews: i64,
}

impl CirState {
    /// The state of a problem that has never been reviewed.
    pub fn initial() -> Self {
        Self {
            consecutive_successes: 0,
            interval: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            success_rate: INITIAL_SUCCESS_RATE,
            total_reviews: 0,
        }
    }
}

/// The outcome of a review transition.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Scheduled {
    pub state: CirState,
    pub next_review_date: Date,
}

fn base_interval(consecutive_successes: i64) -> i64 {
    let index = (consecutive_successes.max(0) as usize).min(BASE_INTERVALS.len() - 1);
    BASE_INTERVALS[index]
}

/// Compute the next scheduling state after a review.
///
/// The ordering of the adjustments is load-bearing: the success-rate
/// penalty and the interview-mode compression apply after the quality
/// branch, and the final clamp to [1, 28] comes last.
pub fn schedule(
    current: &CirState,
    quality: Quality,
    difficulty: Difficulty,
    interview_mode: bool,
    today: Date,
) -> Scheduled {
    let total_reviews = current.total_reviews + 1;
    let is_success = quality.is_success();
    let success_count =
        current.success_rate * current.total_reviews as f64 + if is_success { 1.0 } else { 0.0 };
    let success_rate = success_count / total_reviews as f64;

    let consecutive_successes: i64;
    let mut interval: i64;
    let ease_factor: f64;

    match quality {
        Quality::Again => {
            // Complete reset.
            consecutive_successes = 0;
            interval = 1;
            ease_factor = (current.ease_factor - 0.1).max(MIN_EASE_FACTOR);
        }
        Quality::Hard => {
            // Partial setback: halve the interval, keep a floor of one day.
            consecutive_successes = 0;
            interval = ((current.interval as f64 * 0.5).round() as i64).max(1);
            ease_factor = (current.ease_factor - 0.05).max(MIN_EASE_FACTOR);
        }
        Quality::Good | Quality::Easy => {
            consecutive_successes = current.consecutive_successes + 1;
            let base = base_interval(consecutive_successes);
            interval = (base as f64 * difficulty.multiplier()).round() as i64;
            if quality == Quality::Easy {
                interval = (interval as f64 * EASY_BONUS_MULTIPLIER).round() as i64;
            }
            // Map Good/Easy to 4/5 on the SM-2 quality scale for the ease
            // adjustment: Good leaves the ease factor unchanged, Easy adds 0.1.
            let adjusted_q = (quality.score() + 2) as f64;
            ease_factor = (current.ease_factor
                + (0.1 - (5.0 - adjusted_q) * (0.08 + (5.0 - adjusted_q) * 0.02)))
                .max(MIN_EASE_FACTOR);
        }
    }

    // A success during a rough patch still gets a shorter interval. Failures
    // are exempt: the Again/Hard branches already shrank theirs.
    if success_rate < SUCCESS_RATE_THRESHOLD && is_success {
        interval = ((interval as f64 * SUCCESS_RATE_PENALTY).round() as i64).max(1);
    }

    if interview_mode {
        interval = ((interval as f64 * INTERVIEW_MODE_MULTIPLIER).round() as i64).max(1);
    }

    interval = interval.min(MAX_INTERVAL_DAYS).max(1);

    Scheduled {
        state: CirState {
            consecutive_successes,
            interval,
            ease_factor,
            success_rate,
            total_reviews,
        },
        next_review_date: today.plus_days(interval),
    }
}

/// Whether a problem is due: a problem with no scheduled date is not due.
pub fn is_due(next_review_date: Option<Date>, today: Date) -> bool {
    match next_review_date {
        None => false,
        Some(date) => date <= today,
    }
}

/// The interval each of the four ratings would produce, without committing
/// anything. Used to annotate the grading buttons.
pub fn preview_intervals(
    current: &CirState,
    difficulty: Difficulty,
    interview_mode: bool,
    today: Date,
) -> [i64; 4] {
    Quality::ALL.map(|quality| {
        schedule(current, quality, difficulty, interview_mode, today)
            .state
            .interval
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> Date {
        Date::from_ymd(2025, 6, 1)
    }

    fn fresh() -> CirState {
        CirState::initial()
    }

    #[test]
    fn test_first_good_review() {
        // Fresh state, Good, Medium: streak goes to 1, base table gives 2
        // days, ease factor is unchanged.
        let result = schedule(&fresh(), Quality::Good, Difficulty::Medium, false, today());
        assert_eq!(result.state.consecutive_successes, 1);
        assert_eq!(result.state.interval, 2);
        assert_eq!(result.state.ease_factor, 2.5);
        assert_eq!(result.state.success_rate, 1.0);
        assert_eq!(result.state.total_reviews, 1);
        assert_eq!(result.next_review_date, Date::from_ymd(2025, 6, 3));
    }

    #[test]
    fn test_first_again_review() {
        let result = schedule(&fresh(), Quality::Again, Difficulty::Medium, false, today());
        assert_eq!(result.state.consecutive_successes, 0);
        assert_eq!(result.state.interval, 1);
        assert_eq!(result.state.ease_factor, 2.4);
        assert_eq!(result.state.success_rate, 0.0);
        assert_eq!(result.state.total_reviews, 1);
    }

    #[test]
    fn test_again_always_resets() {
        let state = CirState {
            consecutive_successes: 4,
            interval: 16,
            ease_factor: 2.8,
            success_rate: 0.9,
            total_reviews: 10,
        };
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let result = schedule(&state, Quality::Again, difficulty, false, today());
            assert_eq!(result.state.consecutive_successes, 0);
            assert_eq!(result.state.interval, 1);
        }
    }

    #[test]
    fn test_hard_halves_interval() {
        let state = CirState {
            interval: 8,
            consecutive_successes: 3,
            ..fresh()
        };
        // success_rate stays at 0.5 with totalReviews 0, so no penalty path:
        // Hard on a streak of 3 resets the streak and halves the interval.
        let result = schedule(&state, Quality::Hard, Difficulty::Medium, false, today());
        assert_eq!(result.state.consecutive_successes, 0);
        assert_eq!(result.state.interval, 4);
        assert_eq!(result.state.ease_factor, 2.45);
    }

    #[test]
    fn test_ease_factor_floor() {
        let state = CirState {
            ease_factor: 1.32,
            ..fresh()
        };
        let result = schedule(&state, Quality::Again, Difficulty::Medium, false, today());
        assert_eq!(result.state.ease_factor, 1.3);
    }

    #[test]
    fn test_easy_bonus() {
        // Streak 0 -> 1, base 2, Medium 1.0, easy bonus 1.15: round(2.3) = 2.
        // With streak 1 -> 2, base 4: round(4.6) = 5.
        let result = schedule(&fresh(), Quality::Easy, Difficulty::Medium, false, today());
        assert_eq!(result.state.interval, 2);
        assert_eq!(result.state.ease_factor, 2.6);
        let state = CirState {
            consecutive_successes: 1,
            interval: 2,
            success_rate: 1.0,
            total_reviews: 1,
            ..fresh()
        };
        let result = schedule(&state, Quality::Easy, Difficulty::Medium, false, today());
        assert_eq!(result.state.interval, 5);
    }

    #[test]
    fn test_difficulty_weighting() {
        // Streak 2 -> 3, base 8. Easy: round(8.8) = 9, Hard: round(7.2) = 7.
        let state = CirState {
            consecutive_successes: 2,
            interval: 4,
            success_rate: 1.0,
            total_reviews: 2,
            ..fresh()
        };
        let easy = schedule(&state, Quality::Good, Difficulty::Easy, false, today());
        let medium = schedule(&state, Quality::Good, Difficulty::Medium, false, today());
        let hard = schedule(&state, Quality::Good, Difficulty::Hard, false, today());
        assert_eq!(easy.state.interval, 9);
        assert_eq!(medium.state.interval, 8);
        assert_eq!(hard.state.interval, 7);
    }

    #[test]
    fn test_success_rate_penalty_applies_to_successes_only() {
        // 5 successes out of 10: rating Good makes the new rate 6/11 < 0.8,
        // so the penalty fires. Streak 0 -> 1, base 2, Easy: round(2.2) = 2,
        // then round(2 * 0.8) = 2.
        let state = CirState {
            consecutive_successes: 0,
            interval: 1,
            ease_factor: 2.5,
            success_rate: 0.5,
            total_reviews: 10,
        };
        let result = schedule(&state, Quality::Good, Difficulty::Easy, false, today());
        assert!(result.state.success_rate < SUCCESS_RATE_THRESHOLD);
        assert_eq!(result.state.interval, 2);

        // A larger interval shows the reduction: streak 3 -> 4, base 16,
        // Easy: round(17.6) = 18, penalty: round(14.4) = 14.
        let state = CirState {
            consecutive_successes: 3,
            interval: 8,
            ease_factor: 2.5,
            success_rate: 0.5,
            total_reviews: 10,
        };
        let result = schedule(&state, Quality::Good, Difficulty::Easy, false, today());
        assert_eq!(result.state.interval, 14);

        // The same rough patch with a failed review takes the Hard branch
        // untouched by the penalty: round(8 * 0.5) = 4.
        let result = schedule(&state, Quality::Hard, Difficulty::Easy, false, today());
        assert_eq!(result.state.interval, 4);
    }

    #[test]
    fn test_interview_mode_halves_intervals() {
        let state = CirState {
            consecutive_successes: 3,
            interval: 8,
            ease_factor: 2.5,
            success_rate: 1.0,
            total_reviews: 4,
        };
        let normal = schedule(&state, Quality::Good, Difficulty::Medium, false, today());
        let crammed = schedule(&state, Quality::Good, Difficulty::Medium, true, today());
        assert_eq!(normal.state.interval, 16);
        assert_eq!(crammed.state.interval, 8);
    }

    #[test]
    fn test_streak_saturates_at_table_end() {
        let mut previous = 0;
        for streak in 0..12 {
            let state = CirState {
                consecutive_successes: streak,
                interval: 1,
                ease_factor: 2.5,
                success_rate: 1.0,
                total_reviews: streak + 1,
            };
            let result = schedule(&state, Quality::Good, Difficulty::Medium, false, today());
            assert!(result.state.interval >= previous);
            previous = result.state.interval;
        }
        assert_eq!(previous, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_bounds_hold_for_all_inputs() {
        let states = [
            CirState::initial(),
            CirState {
                consecutive_successes: 10,
                interval: 28,
                ease_factor: 1.3,
                success_rate: 0.0,
                total_reviews: 100,
            },
            CirState {
                consecutive_successes: 5,
                interval: 28,
                ease_factor: 3.5,
                success_rate: 1.0,
                total_reviews: 40,
            },
        ];
        for state in states {
            for quality in Quality::ALL {
                for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
                    for interview_mode in [false, true] {
                        let result =
                            schedule(&state, quality, difficulty, interview_mode, today());
                        assert!(result.state.interval >= 1);
                        assert!(result.state.interval <= MAX_INTERVAL_DAYS);
                        assert!(result.state.ease_factor >= MIN_EASE_FACTOR);
                        assert!(result.state.success_rate >= 0.0);
                        assert!(result.state.success_rate <= 1.0);
                        assert_eq!(result.state.total_reviews, state.total_reviews + 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_is_due() {
        assert!(!is_due(None, today()));
        assert!(is_due(Some(Date::from_ymd(2025, 5, 31)), today()));
        assert!(is_due(Some(today()), today()));
        assert!(!is_due(Some(Date::from_ymd(2025, 6, 2)), today()));
    }

    #[test]
    fn test_previews_match_transitions() {
        let state = CirState {
            consecutive_successes: 2,
            interval: 4,
            ease_factor: 2.3,
            success_rate: 0.7,
            total_reviews: 10,
        };
        let previews = preview_intervals(&state, Difficulty::Hard, true, today());
        for (i, quality) in Quality::ALL.iter().enumerate() {
            let result = schedule(&state, *quality, Difficulty::Hard, true, today());
            assert_eq!(previews[i], result.state.interval);
        }
    }
}
