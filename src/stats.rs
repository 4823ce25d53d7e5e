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

/// Maps user and course identifiers to consecutive integer indices, in the order in which they
/// are first seen, and back.
#[derive(Clone, Debug, PartialEq)]
pub struct DataDictionary {
    user_dict: FnvHashMap<String, u32>,
    course_dict: FnvHashMap<String, u32>,
    user_names: Vec<String>,
    course_names: Vec<String>,
    num_interactions: u64,
}

impl DataDictionary {

    pub fn num_users(&self) -> usize {
        self.user_names.len()
    }

    pub fn num_courses(&self) -> usize {
        self.course_names.len()
    }

    pub fn num_interactions(&self) -> u64 {
        self.num_interactions
    }

    pub fn user_index(&self, name: &str) -> Option<u32> {
        self.user_dict.get(name).cloned()
    }

    pub fn course_index(&self, name: &str) -> Option<u32> {
        self.course_dict.get(name).cloned()
    }

    pub fn user_name(&self, user_index: u32) -> &str {
        &self.user_names[user_index as usize]
    }

    pub fn course_name(&self, course_index: u32) -> &str {
        &self.course_names[course_index as usize]
    }

    pub fn course_names(&self) -> &[String] {
        &self.course_names
    }
}

impl DataDictionary {

    pub fn from_interactions<'a, I>(interactions: I) -> Self
        where I: Iterator<Item=(&'a str, &'a str)> {

        let mut user_dict: FnvHashMap<String, u32> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());
        let mut user_names = Vec::with_capacity(100);

        let mut course_dict: FnvHashMap<String, u32> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());
        let mut course_names = Vec::with_capacity(100);

        let mut num_interactions: u64 = 0;

        for (user, course) in interactions {

            if !user_dict.contains_key(user) {
                user_dict.insert(user.to_owned(), user_names.len() as u32);
                user_names.push(user.to_owned());
            }

            if !course_dict.contains_key(course) {
                course_dict.insert(course.to_owned(), course_names.len() as u32);
                course_names.push(course.to_owned());
            }

            num_interactions += 1;
        }

        DataDictionary { user_dict, course_dict, user_names, course_names, num_interactions }
    }
}


#[cfg(test)]
mod tests {

    use super::DataDictionary;

    #[test]
    fn indices_follow_first_appearance() {
        let interactions = vec![("u2", "cB"), ("u1", "cA"), ("u2", "cA"), ("u3", "cC")];
        let data_dict = DataDictionary::from_interactions(interactions.into_iter());

        assert_eq!(data_dict.num_users(), 3);
        assert_eq!(data_dict.num_courses(), 3);
        assert_eq!(data_dict.num_interactions(), 4);

        assert_eq!(data_dict.user_index("u2"), Some(0));
        assert_eq!(data_dict.user_index("u3"), Some(2));
        assert_eq!(data_dict.course_index("cA"), Some(1));
        assert_eq!(data_dict.course_index("cZ"), None);

        assert_eq!(data_dict.course_name(0), "cB");
        assert_eq!(data_dict.user_name(1), "u1");
    }
}
