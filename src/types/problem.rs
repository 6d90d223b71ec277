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

use serde::Deserialize;
use serde::Serialize;

use crate::types::difficulty::Difficulty;

/// The stable identifier of a problem in the catalog.
pub type ProblemId = i64;

/// A practice problem from the static catalog. Owned by the catalog, never
/// mutated by the scheduling core; progress records reference it by id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub difficulty: Difficulty,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub problem_url: String,
    pub solution_url: String,
    pub in_blind75: bool,
    pub in_top150: bool,
}
