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

use std::time::Instant;

use fnv::FnvHashSet;
use tracing::{debug, info};

use crate::sparse::SparseUserIndex;
use crate::types::RecommendationEdge;
use crate::utils;

/// Insertion-ordered set of course indices with a soft capacity.
///
/// Contributions are merged one user at a time. The accumulator may grow past its capacity during
/// a merge; `is_saturated` tells the caller to stop scanning once it has, and `into_vec` keeps
/// only the first `capacity` entries. Which entries survive therefore depends on the order in
/// which contributions arrive.
#[derive(Debug)]
pub struct BoundedAccumulator {
    capacity: usize,
    seen: FnvHashSet<u32>,
    items: Vec<u32>,
}

impl BoundedAccumulator {

    pub fn new(capacity: usize) -> Self {
        BoundedAccumulator {
            capacity,
            seen: FnvHashSet::with_capacity_and_hasher(capacity + 1, Default::default()),
            items: Vec::with_capacity(capacity + 1),
        }
    }

    /// Appends all items not seen before, in the order given.
    pub fn merge<I: IntoIterator<Item=u32>>(&mut self, contribution: I) {
        for item in contribution {
            if self.seen.insert(item) {
                self.items.push(item);
            }
        }
    }

    pub fn is_saturated(&self) -> bool {
        self.items.len() > self.capacity
    }

    pub fn into_vec(mut self) -> Vec<u32> {
        self.items.truncate(self.capacity);
        self.items
    }
}

/// Courses co-requested with `course_index`, as column indices.
///
/// Co-requesters are scanned in row order and each one's requested courses are merged in column
/// order. Scanning stops as soon as more than `max_recs` distinct courses have been collected.
pub fn recommend_index(course_index: u32, index: &SparseUserIndex, max_recs: usize) -> Vec<u32> {

    let mut accumulator = BoundedAccumulator::new(max_recs);

    for user_index in index.matrix().co_requesters(course_index) {
        let other_courses = index.row_by_index(user_index)
            .iter()
            .cloned()
            .filter(|other_course| *other_course != course_index);

        accumulator.merge(other_courses);

        if accumulator.is_saturated() {
            break;
        }
    }

    accumulator.into_vec()
}

/// At most `max_recs` courses co-requested with `course_id`. Courses outside the matrix have no
/// co-requesters and get no recommendations.
pub fn recommend<'a>(course_id: &str, index: &SparseUserIndex<'a>, max_recs: usize) -> Vec<&'a str> {

    let data_dict = index.matrix().data_dict();

    match data_dict.course_index(course_id) {
        Some(course_index) => {
            recommend_index(course_index, index, max_recs)
                .into_iter()
                .map(|other_course| data_dict.course_name(other_course))
                .collect()
        },
        None => {
            debug!(course_id, "Course has no leads, nothing to recommend");
            Vec::new()
        }
    }
}

/// Recommendations for every course of the matrix, computed in parallel per source course. Edges
/// are returned grouped by source course in column order, independent of scheduling.
pub fn full_run(
    index: &SparseUserIndex,
    max_recs: usize,
    num_threads: usize,
) -> Vec<RecommendationEdge> {

    let start = Instant::now();

    let num_courses = index.matrix().num_courses();
    let mut recommended: Vec<Vec<u32>> = vec![Vec::new(); num_courses];

    if num_courses > 0 {
        let pool = utils::pool(num_threads);
        let chunk_size = utils::chunk_size(num_courses, num_threads);

        pool.scoped(|scope| {
            for (chunk_index, chunk) in recommended.chunks_mut(chunk_size).enumerate() {
                let offset = chunk_index * chunk_size;

                scope.execute(move || {
                    for (position, recs) in chunk.iter_mut().enumerate() {
                        *recs = recommend_index((offset + position) as u32, index, max_recs);
                    }
                });
            }
        });

        pool.shutdown();
    }

    let data_dict = index.matrix().data_dict();

    let edges: Vec<RecommendationEdge> = recommended.into_iter()
        .enumerate()
        .flat_map(|(course_index, recs)| {
            let course = data_dict.course_name(course_index as u32);
            recs.into_iter().map(move |other_course| RecommendationEdge {
                course: course.to_owned(),
                recommended: data_dict.course_name(other_course).to_owned(),
            })
        })
        .collect();

    info!(
        courses = num_courses,
        edges = edges.len(),
        millis = utils::to_millis(start.elapsed()),
        "Created course-course recommendations"
    );

    edges
}


#[cfg(test)]
mod tests {

    use fnv::FnvHashSet;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::matrix;
    use crate::types::Lead;
    use crate::utils::tests::lead;

    fn as_set<'a>(items: &[&'a str]) -> FnvHashSet<&'a str> {
        items.iter().cloned().collect()
    }

    #[test]
    fn accumulator_deduplicates_in_insertion_order() {
        let mut accumulator = BoundedAccumulator::new(3);
        accumulator.merge(vec![5, 2, 5]);
        accumulator.merge(vec![2, 7]);

        assert!(!accumulator.is_saturated());

        accumulator.merge(vec![1, 9]);
        assert!(accumulator.is_saturated());
        assert_eq!(accumulator.into_vec(), vec![5, 2, 7]);
    }

    #[test]
    fn co_requested_courses() {
        let leads = vec![
            lead("u1", "cA", 1),
            lead("u1", "cB", 2),
            lead("u2", "cA", 3),
            lead("u2", "cC", 4),
        ];

        let matrix = matrix::build(&leads);
        let index = SparseUserIndex::compress(&matrix);

        let recs = recommend("cA", &index, 10);
        assert_eq!(recs.len(), 2);
        assert_eq!(as_set(&recs), as_set(&["cB", "cC"]));

        assert_eq!(recommend("cB", &index, 10), vec!["cA"]);
    }

    #[test]
    fn course_without_co_requesters() {
        let leads = vec![lead("u1", "cA", 1), lead("u2", "cB", 2)];

        let matrix = matrix::build(&leads);
        let index = SparseUserIndex::compress(&matrix);

        // Only requester has no other course
        assert!(recommend("cA", &index, 10).is_empty());
        // Not requested by anyone
        assert!(recommend("cX", &index, 10).is_empty());
    }

    #[test]
    fn early_exit_depends_on_co_requester_order() {
        let u1_first = vec![
            lead("u1", "cA", 1),
            lead("u1", "cB", 1),
            lead("u1", "cC", 1),
            lead("u2", "cA", 2),
            lead("u2", "cD", 2),
        ];

        let matrix = matrix::build(&u1_first);
        let index = SparseUserIndex::compress(&matrix);

        // u1 alone contributes two courses, which exceeds the cutoff, u2 is never scanned
        assert_eq!(recommend("cA", &index, 1), vec!["cB"]);
        // u1 contributes exactly two, so u2 is scanned as well before truncation
        assert_eq!(recommend("cA", &index, 2), vec!["cB", "cC"]);

        let u2_first = vec![
            lead("u2", "cA", 2),
            lead("u2", "cD", 2),
            lead("u1", "cA", 1),
            lead("u1", "cB", 1),
            lead("u1", "cC", 1),
        ];

        let matrix = matrix::build(&u2_first);
        let index = SparseUserIndex::compress(&matrix);

        assert_eq!(recommend("cA", &index, 1), vec!["cD"]);
    }

    fn random_leads(rng: &mut StdRng, num_users: usize, num_courses: usize) -> Vec<Lead> {
        let mut leads = Vec::new();
        for user in 0..num_users {
            let num_requests = rng.gen_range(1..6);
            for _ in 0..num_requests {
                let course = rng.gen_range(0..num_courses);
                leads.push(lead(&format!("u{}", user), &format!("c{}", course), 0));
            }
        }
        leads
    }

    #[test]
    fn recommendations_are_bounded_and_exclude_the_course() {
        let mut rng = StdRng::seed_from_u64(7);
        let leads = random_leads(&mut rng, 60, 25);

        let matrix = matrix::build(&leads);
        let index = SparseUserIndex::compress(&matrix);

        for max_recs in &[0, 1, 3, 10] {
            for course_id in matrix.data_dict().course_names() {
                let recs = recommend(course_id, &index, *max_recs);

                assert!(recs.len() <= *max_recs);
                assert!(!recs.contains(&course_id.as_str()));
                assert_eq!(as_set(&recs).len(), recs.len());
            }
        }
    }

    #[test]
    fn without_cutoff_input_order_does_not_matter() {
        let mut rng = StdRng::seed_from_u64(42);
        let leads = random_leads(&mut rng, 40, 15);

        let mut shuffled = leads.clone();
        shuffled.shuffle(&mut rng);

        let matrix = matrix::build(&leads);
        let index = SparseUserIndex::compress(&matrix);

        let shuffled_matrix = matrix::build(&shuffled);
        let shuffled_index = SparseUserIndex::compress(&shuffled_matrix);

        for course_id in matrix.data_dict().course_names() {
            let recs = recommend(course_id, &index, 100);
            let shuffled_recs = recommend(course_id, &shuffled_index, 100);

            assert_eq!(as_set(&recs), as_set(&shuffled_recs));
        }
    }

    #[test]
    fn full_run_matches_single_course_recommendations() {
        let mut rng = StdRng::seed_from_u64(3);
        let leads = random_leads(&mut rng, 50, 20);

        let matrix = matrix::build(&leads);
        let index = SparseUserIndex::compress(&matrix);

        let edges = full_run(&index, 4, 3);

        let mut expected = Vec::new();
        for course_id in matrix.data_dict().course_names() {
            for recommended in recommend(course_id, &index, 4) {
                expected.push(RecommendationEdge {
                    course: course_id.clone(),
                    recommended: recommended.to_owned(),
                });
            }
        }

        assert_eq!(edges, expected);
    }

    #[test]
    fn full_run_on_empty_matrix() {
        let matrix = matrix::build(&[]);
        let index = SparseUserIndex::compress(&matrix);

        assert!(full_run(&index, 10, 2).is_empty());
    }
}
