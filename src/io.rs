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

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::category::CategoryRegistry;
use crate::error::{EngineError, Result};
use crate::sparse::SparseUserIndex;
use crate::types::{Category, Course, Lead, Review, SparseRow};

pub const LEAD_COLUMNS: [&str; 7] = [
    "user_id", "course_id", "course_title", "course_description", "course_category", "center",
    "created_on",
];

pub const REVIEW_COLUMNS: [&str; 8] = [
    "user_id", "course_id", "course_title", "course_description", "course_category", "center",
    "rating", "created_on",
];

pub const CATEGORY_COLUMNS: [&str; 2] = ["id", "name"];

pub const COURSES_FILE: &str = "courses.csv";
pub const CATEGORIES_FILE: &str = "categories.csv";
pub const LEADS_FILE: &str = "leads.csv";
pub const REVIEWS_FILE: &str = "reviews.csv";

pub const COURSE_COLUMNS: [&str; 9] = [
    "id", "title", "description", "center", "avg_rating", "num_reviews", "weighted_rating",
    "number_of_leads", "category_id",
];

/// Reads a CSV input with headers. Fails with a schema error if one of `required_columns` is not
/// among the headers.
pub fn csv_reader<R: Read>(
    input: R,
    required_columns: &[&str],
    source_name: &str,
) -> Result<csv::Reader<R>> {

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers = reader.headers()?;

    for column in required_columns {
        if !headers.iter().any(|header| header == *column) {
            return Err(EngineError::MissingColumn {
                column: (*column).to_owned(),
                source_name: source_name.to_owned(),
            });
        }
    }

    Ok(reader)
}

fn records_from<R, T>(input: R, required_columns: &[&str], source_name: &str) -> Result<Vec<T>>
    where R: Read, T: DeserializeOwned {

    let mut reader = csv_reader(input, required_columns, source_name)?;

    let records = reader.deserialize().collect::<std::result::Result<Vec<T>, csv::Error>>()?;

    debug!(source_name, records = records.len(), "Read records");

    Ok(records)
}

pub fn leads_from<R: Read>(input: R) -> Result<Vec<Lead>> {
    records_from(input, &LEAD_COLUMNS, "leads")
}

pub fn reviews_from<R: Read>(input: R) -> Result<Vec<Review>> {
    records_from(input, &REVIEW_COLUMNS, "reviews")
}

pub fn read_leads<P: AsRef<Path>>(path: P) -> Result<Vec<Lead>> {
    leads_from(File::open(path)?)
}

pub fn read_reviews<P: AsRef<Path>>(path: P) -> Result<Vec<Review>> {
    reviews_from(File::open(path)?)
}

pub fn categories_from<R: Read>(input: R) -> Result<Vec<Category>> {
    records_from(input, &CATEGORY_COLUMNS, "categories")
}

/// Persisted form of a course, the category is referenced by id.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct CourseRow {
    id: String,
    title: String,
    description: String,
    center: String,
    avg_rating: Option<f64>,
    num_reviews: u32,
    weighted_rating: Option<f64>,
    number_of_leads: u32,
    category_id: Option<u32>,
}

impl<'a> From<&'a Course> for CourseRow {
    fn from(course: &'a Course) -> Self {
        CourseRow {
            id: course.id.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            center: course.center.clone(),
            avg_rating: course.avg_rating,
            num_reviews: course.num_reviews,
            weighted_rating: course.weighted_rating,
            number_of_leads: course.number_of_leads,
            category_id: course.category_id,
        }
    }
}

/// Reads persisted courses back, resolving category names through `categories`.
pub fn courses_from<R: Read>(input: R, categories: &CategoryRegistry) -> Result<Vec<Course>> {
    let rows: Vec<CourseRow> = records_from(input, &COURSE_COLUMNS, "courses")?;

    let courses = rows.into_iter()
        .map(|row| {
            let category = row.category_id
                .and_then(|id| categories.name(id))
                .unwrap_or_default();

            let mut course = Course::new(&row.id, &row.title, &row.description, category, &row.center);
            course.avg_rating = row.avg_rating;
            course.num_reviews = row.num_reviews;
            course.weighted_rating = row.weighted_rating;
            course.number_of_leads = row.number_of_leads;
            course.category_id = row.category_id;
            course
        })
        .collect();

    Ok(courses)
}

pub fn write_records<W, T, I>(output: W, records: I) -> Result<()>
    where W: Write, T: serde::Serialize, I: IntoIterator<Item=T> {

    let mut writer = csv::Writer::from_writer(output);

    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_courses<W: Write>(output: W, courses: &[Course]) -> Result<()> {
    write_records(output, courses.iter().map(CourseRow::from))
}

/// Creates `path` and writes `records` to it as CSV with headers.
pub fn write_csv_file<P, T, I>(path: P, records: I) -> Result<()>
    where P: AsRef<Path>, T: serde::Serialize, I: IntoIterator<Item=T> {

    let file = BufWriter::new(File::create(path.as_ref())?);
    write_records(file, records)?;

    debug!(path = %path.as_ref().display(), "Wrote CSV file");
    Ok(())
}

/// Writes courses, categories, leads, and reviews of a prepared catalog into `dir`.
pub fn write_catalog<P: AsRef<Path>>(dir: P, catalog: &Catalog) -> Result<()> {
    let dir = dir.as_ref();

    let courses = BufWriter::new(File::create(dir.join(COURSES_FILE))?);
    write_courses(courses, &catalog.courses)?;

    write_csv_file(dir.join(CATEGORIES_FILE), catalog.categories.categories())?;
    write_events(dir.join(LEADS_FILE), &catalog.leads, &LEAD_COLUMNS)?;
    write_events(dir.join(REVIEWS_FILE), &catalog.reviews, &REVIEW_COLUMNS)?;

    Ok(())
}

// Empty event lists still get a header, otherwise reading them back fails the schema check
fn write_events<T: serde::Serialize>(path: PathBuf, events: &[T], columns: &[&str]) -> Result<()> {
    if events.is_empty() {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(columns)?;
        writer.flush()?;
        Ok(())
    } else {
        write_csv_file(path, events)
    }
}

/// Whether `dir` holds a complete catalog written by `write_catalog`.
pub fn has_catalog<P: AsRef<Path>>(dir: P) -> bool {
    let dir = dir.as_ref();

    [COURSES_FILE, CATEGORIES_FILE, LEADS_FILE, REVIEWS_FILE].iter()
        .all(|file| dir.join(file).is_file())
}

/// Reads a catalog back from `dir`, so that a run can resume without preparing it again.
pub fn read_catalog<P: AsRef<Path>>(dir: P) -> Result<Catalog> {
    let dir = dir.as_ref();

    let categories = CategoryRegistry::from_categories(
        &categories_from(File::open(dir.join(CATEGORIES_FILE))?)?);
    let courses = courses_from(File::open(dir.join(COURSES_FILE))?, &categories)?;
    let leads = read_leads(dir.join(LEADS_FILE))?;
    let reviews = read_reviews(dir.join(REVIEWS_FILE))?;

    Ok(Catalog { courses, categories, leads, reviews })
}

#[derive(Serialize)]
struct UserCourses<'a> {
    courses: &'a [String],
    users: BTreeMap<&'a str, &'a SparseRow>,
}

/// JSON form of the per-user sparse rows, as read by consumers of the lookup. Rows refer to
/// positions in `courses`.
#[derive(Debug, PartialEq, Deserialize)]
pub struct UserCoursesLookup {
    pub courses: Vec<String>,
    pub users: BTreeMap<String, SparseRow>,
}

/// Serializes the sparse user index as a lookup from user id to requested course positions.
pub fn write_user_courses<W: Write>(output: W, index: &SparseUserIndex) -> Result<()> {

    let lookup = UserCourses {
        courses: index.matrix().data_dict().course_names(),
        users: index.iter().collect(),
    };

    serde_json::to_writer(output, &lookup)?;
    Ok(())
}

pub fn user_courses_from<R: Read>(input: R) -> Result<UserCoursesLookup> {
    let lookup = serde_json::from_reader(input)?;
    Ok(lookup)
}
