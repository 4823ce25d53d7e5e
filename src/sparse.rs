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

use tracing::info;

use crate::matrix::InteractionMatrix;
use crate::types::SparseRow;
use crate::utils;

/// Per-user compressed rows of an `InteractionMatrix`. The index borrows the matrix it was derived
/// from, so the matrix cannot change while the index is alive and both always share the same user
/// and course universes.
#[derive(Debug)]
pub struct SparseUserIndex<'a> {
    matrix: &'a InteractionMatrix,
    rows: Vec<SparseRow>,
}

impl<'a> SparseUserIndex<'a> {

    /// Keeps only the columns with value `1` of every row, in column order.
    pub fn compress(matrix: &'a InteractionMatrix) -> Self {

        let start = Instant::now();

        let rows: Vec<SparseRow> = (0..matrix.num_users() as u32)
            .map(|user_index| {
                matrix.row(user_index).iter()
                    .enumerate()
                    .filter(|(_, value)| **value == 1)
                    .map(|(course_index, _)| course_index as u32)
                    .collect()
            })
            .collect();

        let num_entries: usize = rows.iter().map(|row| row.len()).sum();

        info!(
            users = rows.len(),
            entries = num_entries,
            millis = utils::to_millis(start.elapsed()),
            "Compressed leads user-item matrix"
        );

        SparseUserIndex { matrix, rows }
    }

    pub fn matrix(&self) -> &'a InteractionMatrix {
        self.matrix
    }

    pub fn num_users(&self) -> usize {
        self.rows.len()
    }

    pub fn row_by_index(&self, user_index: u32) -> &SparseRow {
        &self.rows[user_index as usize]
    }

    /// Sparse row of a user, `None` for users without leads.
    pub fn row(&self, user_id: &str) -> Option<&SparseRow> {
        self.matrix.data_dict()
            .user_index(user_id)
            .map(|user_index| self.row_by_index(user_index))
    }

    /// Identifiers of the courses a user requested, in column order.
    pub fn requested_courses(&self, user_id: &str) -> Option<Vec<&'a str>> {
        let data_dict = self.matrix.data_dict();

        self.row(user_id).map(|row| {
            row.iter()
                .map(|course_index| data_dict.course_name(*course_index))
                .collect()
        })
    }

    /// `(user_id, row)` pairs in row order.
    pub fn iter<'b>(&'b self) -> impl Iterator<Item=(&'a str, &'b SparseRow)> + 'b {
        let data_dict = self.matrix.data_dict();

        self.rows.iter()
            .enumerate()
            .map(move |(user_index, row)| (data_dict.user_name(user_index as u32), row))
    }
}


#[cfg(test)]
mod tests {

    use super::SparseUserIndex;
    use crate::matrix;
    use crate::utils::tests::lead;

    #[test]
    fn rows_hold_requested_columns() {
        let leads = vec![
            lead("u1", "cA", 1),
            lead("u2", "cB", 2),
            lead("u1", "cC", 3),
            lead("u2", "cA", 4),
        ];

        let matrix = matrix::build(&leads);
        let index = SparseUserIndex::compress(&matrix);

        assert_eq!(index.num_users(), matrix.num_users());
        assert_eq!(index.row("u1"), Some(&vec![0, 2]));
        // column order, not lead order
        assert_eq!(index.row("u2"), Some(&vec![0, 1]));
        assert_eq!(index.requested_courses("u2"), Some(vec!["cA", "cB"]));
    }

    #[test]
    fn users_without_leads_have_no_row() {
        let leads = vec![lead("u1", "cA", 1)];
        let matrix = matrix::build(&leads);
        let index = SparseUserIndex::compress(&matrix);

        assert_eq!(index.row("u2"), None);
        assert_eq!(index.requested_courses("nobody"), None);
        assert_eq!(index.iter().count(), 1);
    }

    #[test]
    fn rows_agree_with_matrix() {
        let leads = vec![
            lead("u1", "cA", 1),
            lead("u1", "cB", 1),
            lead("u2", "cB", 2),
            lead("u3", "cC", 3),
            lead("u3", "cA", 3),
        ];

        let matrix = matrix::build(&leads);
        let index = SparseUserIndex::compress(&matrix);

        for (user_id, row) in index.iter() {
            let user_index = matrix.data_dict().user_index(user_id).unwrap();
            let ones = matrix.row(user_index).iter().filter(|value| **value == 1).count();
            assert_eq!(ones, row.len());

            for course_index in row {
                assert_eq!(matrix.get(user_index, *course_index), 1);
            }
        }
    }
}
