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

/// A generic error report: a human-readable message describing what failed.
#[derive(Debug)]
pub struct ErrorReport {
    message: String,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

/// Shorthand for returning an error from a function.
pub fn fail<T>(message: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(message))
}

impl From<std::io::Error> for ErrorReport {
    fn from(err: std::io::Error) -> Self {
        ErrorReport::new(format!("I/O error: {err}"))
    }
}

impl From<rusqlite::Error> for ErrorReport {
    fn from(err: rusqlite::Error) -> Self {
        ErrorReport::new(format!("database error: {err}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(err: serde_json::Error) -> Self {
        ErrorReport::new(format!("JSON error: {err}"))
    }
}

impl From<chrono::ParseError> for ErrorReport {
    fn from(err: chrono::ParseError) -> Self {
        ErrorReport::new(format!("date parse error: {err}"))
    }
}
