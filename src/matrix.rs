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

use tracing::{debug, info};

use crate::stats::DataDictionary;
use crate::types::{self, DenseVector, Lead};
use crate::utils;

/// Binary user x course table of lead interactions. Rows are users and columns are courses, both
/// in the order in which they first appear in the leads. The table is never modified once built.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionMatrix {
    data_dict: DataDictionary,
    // row-major, one byte per cell
    cells: Vec<u8>,
}

impl InteractionMatrix {

    pub fn num_users(&self) -> usize {
        self.data_dict.num_users()
    }

    pub fn num_courses(&self) -> usize {
        self.data_dict.num_courses()
    }

    pub fn data_dict(&self) -> &DataDictionary {
        &self.data_dict
    }

    #[inline]
    pub fn get(&self, user_index: u32, course_index: u32) -> u8 {
        self.cells[user_index as usize * self.num_courses() + course_index as usize]
    }

    /// Value for a pair of string identifiers, `0` for users or courses outside the matrix.
    pub fn value(&self, user_id: &str, course_id: &str) -> u8 {
        match (self.data_dict.user_index(user_id), self.data_dict.course_index(course_id)) {
            (Some(user_index), Some(course_index)) => self.get(user_index, course_index),
            _ => 0,
        }
    }

    pub fn row(&self, user_index: u32) -> &[u8] {
        let num_courses = self.num_courses();
        let start = user_index as usize * num_courses;
        &self.cells[start..start + num_courses]
    }

    /// Users with a lead for the course, in row order.
    pub fn co_requesters<'a>(&'a self, course_index: u32) -> impl Iterator<Item=u32> + 'a {
        (0..self.num_users() as u32)
            .filter(move |user_index| self.get(*user_index, course_index) == 1)
    }

    /// Number of distinct users per course.
    pub fn column_sums(&self) -> DenseVector {
        let mut sums = types::new_dense_vector(self.num_courses());

        for user_index in 0..self.num_users() as u32 {
            for (course_index, value) in self.row(user_index).iter().enumerate() {
                sums[course_index] += *value as u32;
            }
        }

        sums
    }

    /// Builds the matrix from (user, course) pairs. Repeated pairs collapse into a single `1`.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
        where I: Iterator<Item=(&'a str, &'a str)> + Clone {

        let data_dict = DataDictionary::from_interactions(pairs.clone());
        let num_courses = data_dict.num_courses();

        let mut cells = vec![0_u8; data_dict.num_users() * num_courses];

        for (user, course) in pairs {
            // Both lookups succeed, the dictionary was built from the same pairs
            if let (Some(user_index), Some(course_index)) =
                (data_dict.user_index(user), data_dict.course_index(course)) {
                cells[user_index as usize * num_courses + course_index as usize] = 1;
            }
        }

        InteractionMatrix { data_dict, cells }
    }
}

/// Builds the interaction matrix from the full set of leads of a run.
pub fn build(leads: &[Lead]) -> InteractionMatrix {

    let start = Instant::now();

    let matrix = InteractionMatrix::from_pairs(
        leads.iter().map(|lead| (lead.user_id.as_str(), lead.course_id.as_str())));

    info!(
        users = matrix.num_users(),
        courses = matrix.num_courses(),
        leads = leads.len(),
        millis = utils::to_millis(start.elapsed()),
        "Built leads user-item matrix"
    );

    let requesters = matrix.column_sums();
    debug!(
        max_requesters = requesters.iter().max().cloned().unwrap_or(0),
        "Distinct users of the most requested course"
    );

    matrix
}
