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
use std::time::Instant;

use fnv::FnvHashMap;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::text::TextNormalizer;
use crate::types::SimilarityEdge;
use crate::utils;

/// Sparse term vector, sorted by term index.
pub type TermVector = Vec<(u32, f64)>;

/// Dense, symmetric course x course matrix of cosine similarities.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.size + column]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.size..(row + 1) * self.size]
    }
}

/// Assigns term indices in order of first appearance and weights terms by their relative
/// frequency within a document.
#[derive(Debug, Default)]
pub struct TermFrequencyVectorizer {
    vocabulary: FnvHashMap<String, u32>,
}

impl TermFrequencyVectorizer {

    pub fn new() -> Self {
        Default::default()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn fit_transform(&mut self, documents: &[Vec<String>]) -> Vec<TermVector> {
        documents.iter()
            .map(|tokens| {
                let mut counts: FnvHashMap<u32, u32> =
                    FnvHashMap::with_capacity_and_hasher(tokens.len(), Default::default());

                for token in tokens {
                    let next_index = self.vocabulary.len() as u32;
                    let term = *self.vocabulary.entry(token.clone()).or_insert(next_index);
                    *counts.entry(term).or_insert(0) += 1;
                }

                let num_tokens = tokens.len() as f64;
                let mut vector: TermVector = counts.into_iter()
                    .map(|(term, count)| (term, count as f64 / num_tokens))
                    .collect();

                vector.sort_by_key(|(term, _)| *term);
                vector
            })
            .collect()
    }
}

fn norm(vector: &TermVector) -> f64 {
    vector.iter().map(|(_, weight)| weight * weight).sum::<f64>().sqrt()
}

fn dot(a: &TermVector, b: &TermVector) -> f64 {
    let mut sum = 0.0;
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            cmp::Ordering::Less => i += 1,
            cmp::Ordering::Greater => j += 1,
            cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    sum
}

/// Cosine similarity of two term vectors, `0` if either of them is empty.
pub fn cosine(a: &TermVector, norm_a: f64, b: &TermVector, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // Clamp round-off so that identical vectors never exceed 1
    (dot(a, b) / (norm_a * norm_b)).min(1.0)
}

/// Builds the similarity matrix of a corpus of course texts (title and description joined by
/// `". "`). Only the first `sample_limit` texts are used when a limit is given. Rows are computed
/// in parallel. The diagonal is always `1`, also for texts without any token left after
/// normalization.
pub fn build<N>(
    corpus: &[String],
    sample_limit: Option<usize>,
    normalizer: &N,
    num_threads: usize,
) -> SimilarityMatrix where N: TextNormalizer + ?Sized {

    let start = Instant::now();

    let size = match sample_limit {
        Some(limit) => cmp::min(limit, corpus.len()),
        None => corpus.len(),
    };

    let documents: Vec<Vec<String>> = corpus[..size].iter()
        .map(|text| normalizer.tokens(text))
        .collect();

    let mut vectorizer = TermFrequencyVectorizer::new();
    let vectors = vectorizer.fit_transform(&documents);
    let norms: Vec<f64> = vectors.iter().map(norm).collect();

    debug!(documents = size, terms = vectorizer.vocabulary_size(), "Vectorized course texts");

    let mut values = vec![0.0; size * size];

    if size > 0 {
        let pool = utils::pool(num_threads);
        let rows_per_chunk = utils::chunk_size(size, num_threads);

        let vectors = &vectors;
        let norms = &norms;

        pool.scoped(|scope| {
            for (chunk_index, chunk) in values.chunks_mut(rows_per_chunk * size).enumerate() {
                let first_row = chunk_index * rows_per_chunk;

                scope.execute(move || {
                    for (offset, row) in chunk.chunks_mut(size).enumerate() {
                        let i = first_row + offset;
                        for (j, value) in row.iter_mut().enumerate() {
                            *value = if i == j {
                                1.0
                            } else {
                                cosine(&vectors[i], norms[i], &vectors[j], norms[j])
                            };
                        }
                    }
                });
            }
        });

        pool.shutdown();
    }

    info!(
        courses = size,
        millis = utils::to_millis(start.elapsed()),
        "Created course content similarity matrix"
    );

    SimilarityMatrix { size, values }
}

/// Projects the similarity matrix to edges between different courses with a similarity of at
/// least `min_similarity`. Every qualifying pair is emitted in both directions. `course_ids` are
/// aligned with the matrix rows and may be longer than the matrix when it was built from a sample.
pub fn filter(
    matrix: &SimilarityMatrix,
    course_ids: &[String],
    min_similarity: f64,
    num_threads: usize,
) -> Result<Vec<SimilarityEdge>> {

    let size = matrix.size();

    if course_ids.len() < size {
        return Err(EngineError::MisalignedIds { rows: size, ids: course_ids.len() });
    }

    let start = Instant::now();

    let rows_per_chunk = utils::chunk_size(size, num_threads);
    let num_chunks = (size + rows_per_chunk - 1) / rows_per_chunk;
    let mut edges_per_chunk: Vec<Vec<SimilarityEdge>> = vec![Vec::new(); num_chunks];

    if size > 0 {
        let pool = utils::pool(num_threads);

        pool.scoped(|scope| {
            for (chunk_index, edges) in edges_per_chunk.iter_mut().enumerate() {
                let first_row = chunk_index * rows_per_chunk;
                let last_row = cmp::min(first_row + rows_per_chunk, size);

                scope.execute(move || {
                    for i in first_row..last_row {
                        for (j, similarity) in matrix.row(i).iter().enumerate() {
                            if i != j && *similarity >= min_similarity {
                                edges.push(SimilarityEdge {
                                    a_course_id: course_ids[i].clone(),
                                    another_course_id: course_ids[j].clone(),
                                    similarity: *similarity,
                                });
                            }
                        }
                    }
                });
            }
        });

        pool.shutdown();
    }

    let edges: Vec<SimilarityEdge> = edges_per_chunk.into_iter().flatten().collect();

    info!(
        courses = size,
        edges = edges.len(),
        min_similarity,
        millis = utils::to_millis(start.elapsed()),
        "Created course content similarities"
    );

    Ok(edges)
}


#[cfg(test)]
mod tests {

    use fnv::FnvHashSet;

    use super::*;
    use crate::text::BasicNormalizer;

    const EPSILON: f64 = 1e-9;

    fn corpus() -> Vec<String> {
        vec![
            String::from("Master in Data Science. Statistics, Python and machine learning for analysts."),
            String::from("Python for Data Analysis. Learn pandas and statistics with Python."),
            String::from("Professional Cooking. Knife skills, sauces and pastry in a real kitchen."),
            String::from("Master in Data Science. Statistics, Python and machine learning for analysts."),
            String::from("Advanced Pastry. Chocolate, sugar work and pastry decoration."),
        ]
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{}", i)).collect()
    }

    fn edge_set(edges: &[SimilarityEdge]) -> FnvHashSet<(String, String)> {
        edges.iter()
            .map(|edge| (edge.a_course_id.clone(), edge.another_course_id.clone()))
            .collect()
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let matrix = build(&corpus(), None, &BasicNormalizer::new(), 2);

        assert_eq!(matrix.size(), 5);

        for i in 0..matrix.size() {
            assert!((matrix.get(i, i) - 1.0).abs() < EPSILON);
            for j in 0..matrix.size() {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                assert!(matrix.get(i, j) >= 0.0 && matrix.get(i, j) <= 1.0);
            }
        }
    }

    #[test]
    fn identical_texts_are_fully_similar() {
        let matrix = build(&corpus(), None, &BasicNormalizer::new(), 1);

        assert!((matrix.get(0, 3) - 1.0).abs() < EPSILON);
        assert!(matrix.get(0, 1) > matrix.get(0, 2));
        assert!(matrix.get(0, 2) < EPSILON);
        assert!(matrix.get(2, 4) > 0.0);
    }

    #[test]
    fn sample_limit_takes_leading_courses() {
        let full = build(&corpus(), None, &BasicNormalizer::new(), 2);
        let sampled = build(&corpus(), Some(3), &BasicNormalizer::new(), 2);

        assert_eq!(sampled.size(), 3);
        for i in 0..3 {
            for j in 0..3 {
                assert!((sampled.get(i, j) - full.get(i, j)).abs() < EPSILON);
            }
        }

        assert_eq!(build(&corpus(), Some(50), &BasicNormalizer::new(), 2).size(), 5);
    }

    #[test]
    fn empty_documents() {
        let corpus = vec![String::from("the and of"), String::from("Rust programming")];
        let matrix = build(&corpus, None, &BasicNormalizer::new(), 1);

        assert_eq!(matrix.get(0, 0), 1.0);
        assert_eq!(matrix.get(0, 1), 0.0);
    }

    #[test]
    fn filter_excludes_self_pairs() {
        let matrix = build(&corpus(), None, &BasicNormalizer::new(), 2);
        let edges = filter(&matrix, &ids(5), 0.0, 2).unwrap();

        assert_eq!(edges.len(), 5 * 4);
        assert!(edges.iter().all(|edge| edge.a_course_id != edge.another_course_id));
    }

    #[test]
    fn filter_emits_both_directions() {
        let matrix = build(&corpus(), None, &BasicNormalizer::new(), 2);
        let edges = edge_set(&filter(&matrix, &ids(5), 0.99, 3).unwrap());

        let expected: FnvHashSet<(String, String)> = vec![
            (String::from("c0"), String::from("c3")),
            (String::from("c3"), String::from("c0")),
        ].into_iter().collect();

        assert_eq!(edges, expected);
    }

    #[test]
    fn higher_threshold_gives_subset() {
        let matrix = build(&corpus(), None, &BasicNormalizer::new(), 2);
        let thresholds = [0.0, 0.05, 0.1, 0.3, 0.5, 0.9, 1.0];

        for window in thresholds.windows(2) {
            let lower = edge_set(&filter(&matrix, &ids(5), window[0], 2).unwrap());
            let higher = edge_set(&filter(&matrix, &ids(5), window[1], 2).unwrap());

            assert!(higher.is_subset(&lower));
        }
    }

    #[test]
    fn filter_uses_leading_ids_of_sample() {
        let matrix = build(&corpus(), Some(2), &BasicNormalizer::new(), 1);
        let edges = filter(&matrix, &ids(5), 0.0, 1).unwrap();

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].a_course_id, "c0");
        assert_eq!(edges[0].another_course_id, "c1");
    }

    #[test]
    fn filter_rejects_missing_ids() {
        let matrix = build(&corpus(), None, &BasicNormalizer::new(), 1);

        match filter(&matrix, &ids(3), 0.5, 1) {
            Err(EngineError::MisalignedIds { rows, ids }) => {
                assert_eq!(rows, 5);
                assert_eq!(ids, 3);
            },
            other => panic!("unexpected result {:?}", other),
        }
    }
}
