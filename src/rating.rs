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

// Rating statistics of courses. An undefined value, e.g. the average rating of a course without
// reviews, is `None` and propagates instead of failing.

use fnv::FnvHashMap;

use crate::types::{Course, Review};

/// Mean rating of a course, `None` if it has no reviews.
pub fn average_rating(course_id: &str, reviews: &[Review]) -> Option<f64> {
    let (sum, count) = reviews.iter()
        .filter(|review| review.course_id == course_id)
        .fold((0_i64, 0_u32), |(sum, count), review| (sum + review.rating as i64, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

pub fn review_count(course_id: &str, reviews: &[Review]) -> u32 {
    reviews.iter().filter(|review| review.course_id == course_id).count() as u32
}

/// Mean of all defined average ratings (`C`), `None` if no course has one.
pub fn corpus_average_rating(courses: &[Course]) -> Option<f64> {
    let defined: Vec<f64> = courses.iter().filter_map(|course| course.avg_rating).collect();

    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

/// Shrinks the average rating `avg_rating` (`R`) of a course with `num_reviews` (`v`) reviews
/// towards the corpus average (`C`), `m` being the number of reviews needed to trust `R`:
///
/// `wr = v * R / (v + m) + m * C / (v + m)`
pub fn weighted_rating(
    num_reviews: u32,
    avg_rating: Option<f64>,
    corpus_avg: Option<f64>,
    min_reviews: u32,
) -> Option<f64> {

    let v = num_reviews as f64;
    let m = min_reviews as f64;

    match (avg_rating, corpus_avg) {
        (Some(r), Some(c)) if v + m > 0.0 => Some(v * r / (v + m) + m * c / (v + m)),
        _ => None,
    }
}

/// Per-course review count and rating sum in a single pass over the reviews.
pub fn review_statistics(reviews: &[Review]) -> FnvHashMap<&str, (u32, i64)> {
    let mut statistics: FnvHashMap<&str, (u32, i64)> = FnvHashMap::default();

    for review in reviews {
        let entry = statistics.entry(review.course_id.as_str()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += review.rating as i64;
    }

    statistics
}
