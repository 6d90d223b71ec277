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

use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;

/// Self-graded quality of a review, stored as the integer 0-3.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Quality {
    /// Complete blackout, didn't remember at all.
    Again,
    /// Incorrect response, but remembered upon seeing the answer.
    Hard,
    /// Correct response with some hesitation.
    Good,
    /// Perfect response with no hesitation.
    Easy,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Again, Quality::Hard, Quality::Good, Quality::Easy];

    /// Parse a raw score, rounding and clamping to [0, 3]. Out-of-range
    /// input is clamped rather than rejected, since the UI already
    /// constrains it.
    pub fn from_score(score: f64) -> Self {
        match score.round().clamp(0.0, 3.0) as i64 {
            0 => Quality::Again,
            1 => Quality::Hard,
            2 => Quality::Good,
            _ => Quality::Easy,
        }
    }

    pub fn score(&self) -> i64 {
        match self {
            Quality::Again => 0,
            Quality::Hard => 1,
            Quality::Good => 2,
            Quality::Easy => 3,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Quality::Again => "Again",
            Quality::Hard => "Hard",
            Quality::Good => "Good",
            Quality::Easy => "Easy",
        }
    }

    /// A review counts as a success when rated Good or better.
    pub fn is_success(&self) -> bool {
        self.score() >= 2
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl ToSql for Quality {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.score()))
    }
}

impl FromSql for Quality {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let score: i64 = FromSql::column_result(value)?;
        if (0..=3).contains(&score) {
            Ok(Quality::from_score(score as f64))
        } else {
            Err(FromSqlError::OutOfRange(score))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_score_rounds_and_clamps() {
        assert_eq!(Quality::from_score(-5.0), Quality::Again);
        assert_eq!(Quality::from_score(0.4), Quality::Again);
        assert_eq!(Quality::from_score(1.5), Quality::Good);
        assert_eq!(Quality::from_score(2.0), Quality::Good);
        assert_eq!(Quality::from_score(3.0), Quality::Easy);
        assert_eq!(Quality::from_score(99.0), Quality::Easy);
    }

    #[test]
    fn test_success_threshold() {
        assert!(!Quality::Again.is_success());
        assert!(!Quality::Hard.is_success());
        assert!(Quality::Good.is_success());
        assert!(Quality::Easy.is_success());
    }
}
