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

pub mod catalog;
pub mod category;
pub mod config;
pub mod error;
pub mod io;
pub mod matrix;
pub mod rating;
pub mod recommend;
pub mod similarity;
pub mod sparse;
pub mod stats;
pub mod text;
pub mod types;
pub mod utils;

pub use catalog::Catalog;
pub use category::CategoryRegistry;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use matrix::InteractionMatrix;
pub use sparse::SparseUserIndex;
pub use text::{BasicNormalizer, TextNormalizer};
pub use types::{Category, Course, Lead, RecommendationEdge, Review, SimilarityEdge};

/// Course-to-course recommendations from the (deduplicated) leads of a run: builds the
/// interaction matrix, compresses it per user and collects up to `config.max_recs` co-requested
/// courses for every course.
pub fn course_recommendations(leads: &[Lead], config: &EngineConfig) -> Vec<RecommendationEdge> {
    let matrix = matrix::build(leads);
    let index = SparseUserIndex::compress(&matrix);

    recommend::full_run(&index, config.max_recs, config.num_threads)
}

/// Content similarities between the courses of a catalog, restricted to the first
/// `config.sample_limit` courses if a limit is configured.
pub fn course_similarities<N>(
    catalog: &Catalog,
    normalizer: &N,
    config: &EngineConfig,
) -> Result<Vec<SimilarityEdge>> where N: TextNormalizer + ?Sized {

    let matrix = similarity::build(
        &catalog.corpus(),
        config.sample_limit,
        normalizer,
        config.num_threads,
    );

    similarity::filter(&matrix, &catalog.course_ids(), config.min_similarity, config.num_threads)
}
