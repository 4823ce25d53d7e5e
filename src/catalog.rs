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

// Turns a snapshot of leads and reviews into the course catalog of a run.

use std::time::Instant;

use fnv::{FnvHashMap, FnvHashSet};
use tracing::{debug, info, warn};

use crate::category::CategoryRegistry;
use crate::config::EngineConfig;
use crate::rating;
use crate::text::TextNormalizer;
use crate::types::{Course, CourseEvent, Lead, Review};
use crate::utils;

/// Keeps one event per (user, course) pair, the most recent one. Among events with the same
/// timestamp the later one in the input wins. Survivors keep their relative order. Returns the
/// survivors and the number of removed events.
pub fn deduplicate<E: CourseEvent>(events: Vec<E>) -> (Vec<E>, usize) {

    let mut winners: FnvHashMap<(&str, &str), usize> =
        FnvHashMap::with_capacity_and_hasher(events.len(), Default::default());

    for (position, event) in events.iter().enumerate() {
        let key = (event.user_id(), event.course_id());

        let replaces = match winners.get(&key) {
            Some(winner) => event.created_on() >= events[*winner].created_on(),
            None => true,
        };

        if replaces {
            winners.insert(key, position);
        }
    }

    let keep: FnvHashSet<usize> = winners.into_iter().map(|(_, position)| position).collect();
    let num_events = events.len();

    let survivors: Vec<E> = events.into_iter()
        .enumerate()
        .filter(|(position, _)| keep.contains(position))
        .map(|(_, event)| event)
        .collect();

    let removed = num_events - survivors.len();
    (survivors, removed)
}

fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Distinct courses referenced by leads and then reviews, the first reference of a course wins.
pub fn build_courses(leads: &[Lead], reviews: &[Review]) -> Vec<Course> {

    let mut seen: FnvHashSet<&str> = FnvHashSet::default();
    let mut courses = Vec::new();

    let events = leads.iter().map(|lead| lead as &dyn CourseEvent)
        .chain(reviews.iter().map(|review| review as &dyn CourseEvent));

    for event in events {
        if seen.insert(event.course_id()) {
            courses.push(Course::new(
                event.course_id(),
                &clean(event.course_title()),
                &clean(event.course_description()),
                event.course_category().trim(),
                &clean(event.center()),
            ));
        }
    }

    courses
}

/// Language of each course description, `default_language` when detection fails.
pub fn detect_languages<N>(
    courses: &[Course],
    normalizer: &N,
    default_language: &str,
) -> Vec<String> where N: TextNormalizer + ?Sized {

    courses.iter()
        .map(|course| {
            match normalizer.detect_language(&course.description) {
                Ok(language) => language,
                Err(failure) => {
                    debug!(course_id = course.id.as_str(), %failure, "Falling back to default language");
                    default_language.to_owned()
                }
            }
        })
        .collect()
}

/// Removes the courses whose language differs from `target_language`, together with every lead
/// and review that references them. Returns the number of removed courses.
pub fn remove_courses_not_in(
    target_language: &str,
    languages: &[String],
    courses: &mut Vec<Course>,
    leads: &mut Vec<Lead>,
    reviews: &mut Vec<Review>,
) -> usize {

    let removed_ids: FnvHashSet<String> = courses.iter()
        .zip(languages.iter())
        .filter(|(_, language)| language.as_str() != target_language)
        .map(|(course, _)| course.id.clone())
        .collect();

    if removed_ids.is_empty() {
        return 0;
    }

    courses.retain(|course| !removed_ids.contains(&course.id));
    leads.retain(|lead| !removed_ids.contains(&lead.course_id));
    reviews.retain(|review| !removed_ids.contains(&review.course_id));

    removed_ids.len()
}

/// Fills the rating statistics and lead counts of every course.
pub fn annotate(courses: &mut [Course], leads: &[Lead], reviews: &[Review], min_reviews: u32) {

    let review_statistics = rating::review_statistics(reviews);

    for course in courses.iter_mut() {
        let (num_reviews, rating_sum) = review_statistics
            .get(course.id.as_str())
            .cloned()
            .unwrap_or((0, 0));

        course.num_reviews = num_reviews;
        course.avg_rating = if num_reviews == 0 {
            None
        } else {
            Some(rating_sum as f64 / num_reviews as f64)
        };
    }

    let corpus_avg = rating::corpus_average_rating(courses);

    let mut lead_counts: FnvHashMap<&str, u32> = FnvHashMap::default();
    for lead in leads {
        *lead_counts.entry(lead.course_id.as_str()).or_insert(0) += 1;
    }

    for course in courses.iter_mut() {
        course.weighted_rating =
            rating::weighted_rating(course.num_reviews, course.avg_rating, corpus_avg, min_reviews);
        course.number_of_leads = lead_counts.get(course.id.as_str()).cloned().unwrap_or(0);
    }
}

/// Courses, categories, and the cleaned events of a run.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub courses: Vec<Course>,
    pub categories: CategoryRegistry,
    pub leads: Vec<Lead>,
    pub reviews: Vec<Review>,
}

impl Catalog {

    pub fn prepare<N>(
        leads: Vec<Lead>,
        reviews: Vec<Review>,
        normalizer: &N,
        config: &EngineConfig,
    ) -> Catalog where N: TextNormalizer + ?Sized {

        let start = Instant::now();

        let (mut leads, duplicated_leads) = deduplicate(leads);
        let (mut reviews, duplicated_reviews) = deduplicate(reviews);
        info!(duplicated_leads, duplicated_reviews, "Removed duplicated data");

        let mut courses = build_courses(&leads, &reviews);
        info!(courses = courses.len(), "Created courses");

        let languages = detect_languages(&courses, normalizer, &config.default_language);
        let removed = remove_courses_not_in(
            &config.target_language, &languages, &mut courses, &mut leads, &mut reviews);

        if removed > 0 {
            warn!(
                removed,
                language = config.target_language.as_str(),
                "Removed courses in other languages"
            );
        }

        annotate(&mut courses, &leads, &reviews, config.min_reviews);

        let categories = CategoryRegistry::from_courses(&courses);
        categories.assign(&mut courses);

        info!(
            courses = courses.len(),
            categories = categories.len(),
            leads = leads.len(),
            reviews = reviews.len(),
            millis = utils::to_millis(start.elapsed()),
            "Prepared course catalog"
        );

        Catalog { courses, categories, leads, reviews }
    }

    pub fn course_ids(&self) -> Vec<String> {
        self.courses.iter().map(|course| course.id.clone()).collect()
    }

    /// Title and description of every course, aligned with `course_ids`.
    pub fn corpus(&self) -> Vec<String> {
        self.courses.iter().map(Course::content).collect()
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::error::LanguageError;
    use crate::utils::tests::{lead, review};

    /// Treats descriptions starting with "es:" as Spanish and empty ones as undetectable.
    struct PrefixNormalizer;

    impl TextNormalizer for PrefixNormalizer {
        fn normalize(&self, text: &str) -> String {
            text.to_lowercase()
        }

        fn detect_language(&self, text: &str) -> Result<String, LanguageError> {
            if text.is_empty() {
                Err(LanguageError::EmptyText)
            } else if text.starts_with("es:") {
                Ok(String::from("es"))
            } else {
                Ok(String::from("en"))
            }
        }
    }

    #[test]
    fn most_recent_duplicate_wins() {
        let leads = vec![
            lead("u1", "cA", 5),
            lead("u2", "cA", 1),
            lead("u1", "cA", 9),
            lead("u1", "cA", 2),
            lead("u1", "cB", 3),
        ];

        let (leads, removed) = deduplicate(leads);

        assert_eq!(removed, 2);
        assert_eq!(leads.len(), 3);
        assert_eq!(leads[0].user_id, "u2");
        assert_eq!(leads[1].created_on, crate::utils::tests::day(9));
        assert_eq!(leads[2].course_id, "cB");
    }

    #[test]
    fn ties_keep_the_later_row() {
        let mut first = review("u1", "cA", 1, 4);
        first.course_title = String::from("first");
        let mut second = review("u1", "cA", 5, 4);
        second.course_title = String::from("second");

        let (reviews, removed) = deduplicate(vec![first, second]);

        assert_eq!(removed, 1);
        assert_eq!(reviews[0].course_title, "second");
    }

    #[test]
    fn courses_from_leads_and_reviews() {
        let mut messy = lead("u1", "cA", 1);
        messy.course_title = String::from("  Data   Science\n");
        messy.course_description = String::new();

        let leads = vec![messy, lead("u2", "cB", 2)];
        let reviews = vec![review("u3", "cA", 4, 3), review("u3", "cC", 5, 4)];

        let courses = build_courses(&leads, &reviews);
        let ids: Vec<&str> = courses.iter().map(|course| course.id.as_str()).collect();

        assert_eq!(ids, vec!["cA", "cB", "cC"]);
        assert_eq!(courses[0].title, "Data Science");
        assert_eq!(courses[0].description, "");
    }

    #[test]
    fn detection_failures_fall_back_to_default() {
        let courses = vec![
            Course::new("c1", "A", "English text", "IT", "Acme"),
            Course::new("c2", "B", "es: texto", "IT", "Acme"),
            Course::new("c3", "C", "", "IT", "Acme"),
        ];

        let languages = detect_languages(&courses, &PrefixNormalizer, "xx");
        assert_eq!(languages, vec!["en", "es", "xx"]);
    }

    #[test]
    fn pruning_removes_dependent_events() {
        let mut courses = vec![
            Course::new("c1", "A", "", "IT", "Acme"),
            Course::new("c2", "B", "", "IT", "Acme"),
        ];
        let languages = vec![String::from("en"), String::from("es")];
        let mut leads = vec![lead("u1", "c1", 1), lead("u1", "c2", 1), lead("u2", "c2", 1)];
        let mut reviews = vec![review("u1", "c2", 3, 1)];

        let removed =
            remove_courses_not_in("en", &languages, &mut courses, &mut leads, &mut reviews);

        assert_eq!(removed, 1);
        assert_eq!(courses.len(), 1);
        assert_eq!(leads, vec![lead("u1", "c1", 1)]);
        assert!(reviews.is_empty());
    }

    #[test]
    fn annotation() {
        let leads = vec![lead("u1", "cA", 1), lead("u2", "cA", 1), lead("u1", "cB", 1)];
        let reviews = vec![review("u1", "cA", 4, 1), review("u2", "cA", 2, 1)];
        let mut courses = build_courses(&leads, &reviews);

        annotate(&mut courses, &leads, &reviews, 2);

        assert_eq!(courses[0].num_reviews, 2);
        assert_eq!(courses[0].avg_rating, Some(3.0));
        // v = 2, R = 3, C = 3, m = 2
        assert_eq!(courses[0].weighted_rating, Some(3.0));
        assert_eq!(courses[0].number_of_leads, 2);

        assert_eq!(courses[1].num_reviews, 0);
        assert_eq!(courses[1].avg_rating, None);
        assert_eq!(courses[1].weighted_rating, None);
        assert_eq!(courses[1].number_of_leads, 1);
    }

    #[test]
    fn prepare_keeps_references_consistent() {
        let mut spanish = lead("u3", "cS", 1);
        spanish.course_description = String::from("es: curso");
        spanish.course_category = String::from("Idiomas");

        let leads = vec![
            lead("u1", "cA", 1),
            lead("u1", "cA", 2),
            lead("u1", "cB", 1),
            spanish,
        ];
        let mut cooking = review("u2", "cC", 5, 1);
        cooking.course_category = String::from("Cooking");
        let reviews = vec![cooking, review("u2", "cS", 4, 1)];

        let catalog = Catalog::prepare(leads, reviews, &PrefixNormalizer, &EngineConfig::default());

        assert_eq!(catalog.course_ids(), vec!["cA", "cB", "cC"]);
        assert_eq!(catalog.leads.len(), 2);
        assert_eq!(catalog.reviews.len(), 1);

        let ids: FnvHashSet<String> = catalog.course_ids().into_iter().collect();
        assert!(catalog.leads.iter().all(|lead| ids.contains(&lead.course_id)));
        assert!(catalog.reviews.iter().all(|review| ids.contains(&review.course_id)));

        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.courses[0].category_id, Some(1));
        assert_eq!(catalog.courses[2].category_id, Some(2));
        assert_eq!(catalog.corpus()[0], "Title of cA. Description of cA");
    }
}
