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

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The input lacks a field an operation depends on. Aborts the enclosing step.
    #[error("[{column}] does not exist in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("cannot parse timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("similarity matrix has {rows} rows but {ids} course ids were given")]
    MisalignedIds { rows: usize, ids: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raised by language detection. Callers fall back to a default language instead of aborting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LanguageError {
    #[error("no text to detect a language from")]
    EmptyText,

    #[error("no known language matched the text")]
    Undetectable,
}
