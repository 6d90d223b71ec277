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

//! The static problem catalog, embedded at compile time. The store treats
//! it as an upsert source keyed by problem id, never as the source of
//! truth for scheduling state.

use crate::error::Fallible;
use crate::types::problem::Problem;

pub fn builtin() -> Fallible<Vec<Problem>> {
    let problems: Vec<Problem> = serde_json::from_str(include_str!("problems.json"))?;
    Ok(problems)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalog_parses() {
        let problems = builtin().unwrap();
        assert!(!problems.is_empty());
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let problems = builtin().unwrap();
        let ids: HashSet<i64> = problems.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), problems.len());
    }

    #[test]
    fn test_catalog_urls_are_populated() {
        for problem in builtin().unwrap() {
            assert!(problem.problem_url.starts_with("https://"));
            assert!(problem.solution_url.starts_with("https://"));
            assert!(!problem.title.is_empty());
        }
    }
}
