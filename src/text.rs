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

use fnv::FnvHashSet;
use stop_words::LANGUAGE;

use crate::error::LanguageError;

/// Text preparation consumed by the similarity index and the catalog. Implementations must be
/// pure, the same input always yields the same output.
pub trait TextNormalizer: Sync {

    /// Lower-cased tokens separated by single spaces, without stop words and noise.
    fn normalize(&self, text: &str) -> String;

    /// ISO 639-1 code of the language the text is written in.
    fn detect_language(&self, text: &str) -> Result<String, LanguageError>;

    fn tokens(&self, text: &str) -> Vec<String> {
        self.normalize(text)
            .split_whitespace()
            .map(String::from)
            .collect()
    }
}

struct LanguageProfile {
    code: &'static str,
    stop_words: FnvHashSet<String>,
}

impl LanguageProfile {

    fn new(code: &'static str, language: LANGUAGE) -> Self {
        let stop_words = stop_words::get(language)
            .iter()
            .map(|word| word.to_string())
            .collect();

        LanguageProfile { code, stop_words }
    }
}

/// Stop-word based normalizer and language detector.
///
/// A text is assigned the language whose stop words it contains most often. Texts that match two
/// languages equally often are undetectable. Normalization removes the stop words of the first
/// profile.
pub struct BasicNormalizer {
    profiles: Vec<LanguageProfile>,
    min_token_len: usize,
}

impl Default for BasicNormalizer {
    fn default() -> Self {
        BasicNormalizer::new()
    }
}

impl BasicNormalizer {

    pub fn new() -> Self {
        let profiles = vec![
            LanguageProfile::new("en", LANGUAGE::English),
            LanguageProfile::new("es", LANGUAGE::Spanish),
            LanguageProfile::new("fr", LANGUAGE::French),
            LanguageProfile::new("de", LANGUAGE::German),
            LanguageProfile::new("it", LANGUAGE::Italian),
            LanguageProfile::new("pt", LANGUAGE::Portuguese),
        ];

        BasicNormalizer { profiles, min_token_len: 2 }
    }

    fn is_noise(token: &str) -> bool {
        token.starts_with("http") || token.starts_with("www") || token.contains('@')
    }

    fn words(text: &str) -> impl Iterator<Item=String> + '_ {
        text.split_whitespace()
            .filter(|chunk| !BasicNormalizer::is_noise(&chunk.to_lowercase()))
            .flat_map(|chunk| chunk.split(|c: char| !c.is_alphanumeric()))
            .filter(|word| !word.is_empty())
            .map(|word| word.to_lowercase())
    }
}

impl TextNormalizer for BasicNormalizer {

    fn normalize(&self, text: &str) -> String {
        let stop_words = &self.profiles[0].stop_words;

        BasicNormalizer::words(text)
            .filter(|word| word.chars().count() >= self.min_token_len)
            .filter(|word| !word.chars().all(|c| c.is_numeric()))
            .filter(|word| !stop_words.contains(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn detect_language(&self, text: &str) -> Result<String, LanguageError> {
        let words: Vec<String> = BasicNormalizer::words(text).collect();

        if words.is_empty() {
            return Err(LanguageError::EmptyText);
        }

        let mut best: Option<(&str, usize)> = None;
        let mut tied = false;

        for profile in &self.profiles {
            let hits = words.iter().filter(|word| profile.stop_words.contains(*word)).count();

            if hits == 0 {
                continue;
            }

            match best {
                Some((_, best_hits)) if hits < best_hits => {},
                Some((_, best_hits)) if hits == best_hits => tied = true,
                _ => {
                    best = Some((profile.code, hits));
                    tied = false;
                }
            }
        }

        if tied {
            return Err(LanguageError::Undetectable);
        }

        best.map(|(code, _)| code.to_owned()).ok_or(LanguageError::Undetectable)
    }
}
