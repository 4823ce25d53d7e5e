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

use fnv::FnvHashMap;

use crate::types::{Category, Course};

/// Bijection between category names and ids for a single run. Ids start at 1 and follow the order
/// in which names are first registered, so they are not stable across runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryRegistry {
    ids: FnvHashMap<String, u32>,
    names: Vec<String>,
}

impl CategoryRegistry {

    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_courses(courses: &[Course]) -> Self {
        let mut registry = CategoryRegistry::new();
        for course in courses {
            registry.register(&course.category);
        }
        registry
    }

    /// Rebuilds a registry from persisted categories, keeping their ids.
    pub fn from_categories(categories: &[Category]) -> Self {
        let mut sorted: Vec<&Category> = categories.iter().collect();
        sorted.sort_by_key(|category| category.id);

        let mut registry = CategoryRegistry::new();
        for category in sorted {
            registry.ids.insert(category.name.clone(), category.id);
            registry.names.push(category.name.clone());
        }
        registry
    }

    /// Id of `name`, registering it first if needed.
    pub fn register(&mut self, name: &str) -> u32 {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }

        self.names.push(name.to_owned());
        let id = self.names.len() as u32;
        self.ids.insert(name.to_owned(), id);
        id
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).cloned()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.ids.iter()
            .find(|(_, category_id)| **category_id == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolves `category_id` of every course whose category is registered.
    pub fn assign(&self, courses: &mut [Course]) {
        for course in courses.iter_mut() {
            course.category_id = self.id(&course.category);
        }
    }

    /// Category rows ordered by id.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.ids.iter()
            .map(|(name, id)| Category { id: *id, name: name.clone() })
            .collect();

        categories.sort_by_key(|category| category.id);
        categories
    }
}
