/**
 * CourseReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::error::Result;

/// Knobs of a batch run. Every field has a default, so a config file only needs to name the
/// values it wants to change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of recommendations per course
    pub max_recs: usize,
    /// Course pairs below this cosine similarity are not emitted
    pub min_similarity: f64,
    /// Only the first `sample_limit` courses enter the similarity computation
    pub sample_limit: Option<usize>,
    /// `m` in the weighted rating, the number of reviews a course needs to be trusted
    pub min_reviews: u32,
    /// Courses in any other language are removed from the catalog
    pub target_language: String,
    /// Used whenever language detection fails
    pub default_language: String,
    pub num_threads: usize,
    pub persist_similarities: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_recs: 10,
            min_similarity: 0.5,
            sample_limit: None,
            min_reviews: 25,
            target_language: String::from("en"),
            default_language: String::from("en"),
            num_threads: num_cpus::get(),
            persist_similarities: false,
        }
    }
}

impl EngineConfig {

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }
}
