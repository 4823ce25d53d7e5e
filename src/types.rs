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

use chrono::NaiveDateTime;
use serde_derive::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub type DenseVector = Vec<u32>;

/// Column indices with a positive interaction, in ascending column order.
pub type SparseRow = Vec<u32>;

pub fn new_dense_vector(dimensions: usize) -> DenseVector {
    vec![0; dimensions]
}

/// A user requested contact for a course.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub user_id: String,
    pub course_id: String,
    #[serde(default)]
    pub course_title: String,
    #[serde(default)]
    pub course_description: String,
    #[serde(default)]
    pub course_category: String,
    #[serde(default)]
    pub center: String,
    #[serde(with = "timestamp")]
    pub created_on: NaiveDateTime,
}

/// A user rated a course.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: String,
    pub course_id: String,
    #[serde(default)]
    pub course_title: String,
    #[serde(default)]
    pub course_description: String,
    #[serde(default)]
    pub course_category: String,
    #[serde(default)]
    pub center: String,
    pub rating: i32,
    #[serde(with = "timestamp")]
    pub created_on: NaiveDateTime,
}

/// Both kinds of user events carry the course they refer to and when they happened.
pub trait CourseEvent {
    fn user_id(&self) -> &str;
    fn course_id(&self) -> &str;
    fn created_on(&self) -> NaiveDateTime;
    fn course_title(&self) -> &str;
    fn course_description(&self) -> &str;
    fn course_category(&self) -> &str;
    fn center(&self) -> &str;
}

macro_rules! course_event {
    ($event:ty) => {
        impl CourseEvent for $event {
            fn user_id(&self) -> &str { &self.user_id }
            fn course_id(&self) -> &str { &self.course_id }
            fn created_on(&self) -> NaiveDateTime { self.created_on }
            fn course_title(&self) -> &str { &self.course_title }
            fn course_description(&self) -> &str { &self.course_description }
            fn course_category(&self) -> &str { &self.course_category }
            fn center(&self) -> &str { &self.center }
        }
    };
}

course_event!(Lead);
course_event!(Review);

#[derive(Clone, Debug, PartialEq)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub center: String,
    pub category: String,
    /// `None` while the course has no reviews
    pub avg_rating: Option<f64>,
    pub num_reviews: u32,
    pub weighted_rating: Option<f64>,
    pub number_of_leads: u32,
    /// Assigned from a `CategoryRegistry` once all courses of a run are known
    pub category_id: Option<u32>,
}

impl Course {

    pub fn new(id: &str, title: &str, description: &str, category: &str, center: &str) -> Self {
        Course {
            id: id.to_owned(),
            title: title.to_owned(),
            description: description.to_owned(),
            center: center.to_owned(),
            category: category.to_owned(),
            avg_rating: None,
            num_reviews: 0,
            weighted_rating: None,
            number_of_leads: 0,
            category_id: None,
        }
    }

    /// Title and description joined the way the similarity corpus expects them.
    pub fn content(&self) -> String {
        format!("{}. {}", self.title, self.description)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub a_course_id: String,
    pub another_course_id: String,
    pub similarity: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecommendationEdge {
    pub course: String,
    pub recommended: String,
}

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parses a `created_on` value as exported from the relational store.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();

    TIMESTAMP_FORMATS.iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| EngineError::InvalidTimestamp { value: value.to_owned() })
}

pub mod timestamp {

    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer {
        serializer.serialize_str(&value.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
        where D: Deserializer<'de> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(de::Error::custom)
    }
}
