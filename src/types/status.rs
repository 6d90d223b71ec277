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

use clap::ValueEnum;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// Coarse learning stage of a problem. Advisory: derived from the review
/// count and never read by the scheduler.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    New,
    Learning,
    Reviewing,
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::New => "new",
            Status::Learning => "learning",
            Status::Reviewing => "reviewing",
        }
    }

    /// Derive the stage from the number of completed reviews.
    pub fn from_review_count(total_reviews: i64) -> Self {
        if total_reviews == 0 {
            Status::New
        } else if total_reviews < 3 {
            Status::Learning
        } else {
            Status::Reviewing
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Status {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "new" => Ok(Status::New),
            "learning" => Ok(Status::Learning),
            "reviewing" => Ok(Status::Reviewing),
            _ => fail(format!("Invalid status: {}", value)),
        }
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Status::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_review_count() {
        assert_eq!(Status::from_review_count(0), Status::New);
        assert_eq!(Status::from_review_count(1), Status::Learning);
        assert_eq!(Status::from_review_count(2), Status::Learning);
        assert_eq!(Status::from_review_count(3), Status::Reviewing);
        assert_eq!(Status::from_review_count(50), Status::Reviewing);
    }
}
