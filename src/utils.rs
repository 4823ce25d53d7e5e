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

use std::cmp;
use std::time::Duration;

use scoped_pool::Pool;

pub fn to_millis(duration: Duration) -> u64 {
    (duration.as_secs() * 1_000) + (duration.subsec_nanos() / 1_000_000) as u64
}

/// Worker pool for the parallel stages, never smaller than a single thread.
pub fn pool(num_threads: usize) -> Pool {
    Pool::new(cmp::max(num_threads, 1))
}

/// Number of items handed to a single job, about four jobs per thread.
pub fn chunk_size(len: usize, num_threads: usize) -> usize {
    cmp::max(len / (cmp::max(num_threads, 1) * 4), 1)
}
