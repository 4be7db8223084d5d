//! Immutable id/title/row mappings for one model.
//!
//! A catalog is built once from the movie table of a model artifact, where
//! the movie at position `i` owns row `i` of the embedding matrix. Ids are
//! unique and id/row lookups are exact inverses. Titles are not: exports
//! carry remakes and re-releases under the same title, so a repeated title
//! resolves to the last movie that carries it.

use crate::error::{RecsError, Result};
use crate::types::{Movie, MovieId, RowIndex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Lookup tables between movie ids, titles and matrix rows
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Row-ordered movies; doubles as the row -> id mapping
    movies: Vec<Movie>,
    title_to_id: HashMap<String, MovieId>,
    id_to_row: HashMap<MovieId, RowIndex>,
}

impl Catalog {
    /// Build a catalog from row-ordered movies
    ///
    /// Fails with `EmptyCatalog` when there are no movies, and with a
    /// validation error when an id appears twice.
    pub fn new(movies: Vec<Movie>) -> Result<Self> {
        if movies.is_empty() {
            return Err(RecsError::EmptyCatalog("no movies in model".to_string()));
        }

        let mut title_to_id = HashMap::with_capacity(movies.len());
        let mut id_to_row = HashMap::with_capacity(movies.len());
        let mut repeated_titles = 0;

        for (row, movie) in movies.iter().enumerate() {
            if id_to_row.insert(movie.id, row).is_some() {
                return Err(RecsError::ValidationError(format!(
                    "duplicate movie id {} at row {}",
                    movie.id, row
                )));
            }
            // Last one wins
            if title_to_id.insert(movie.title.clone(), movie.id).is_some() {
                repeated_titles += 1;
            }
        }
        if repeated_titles > 0 {
            debug!("{} titles repeat in the catalog", repeated_titles);
        }

        Ok(Self {
            movies,
            title_to_id,
            id_to_row,
        })
    }

    pub fn title_to_id(&self, title: &str) -> Result<MovieId> {
        self.title_to_id
            .get(title)
            .copied()
            .ok_or_else(|| RecsError::unknown_movie(title))
    }

    pub fn id_to_title(&self, id: MovieId) -> Result<&str> {
        let row = self.id_to_row(id)?;
        Ok(&self.movies[row].title)
    }

    pub fn id_to_row(&self, id: MovieId) -> Result<RowIndex> {
        self.id_to_row
            .get(&id)
            .copied()
            .ok_or_else(|| RecsError::unknown_movie(id))
    }

    /// Panics if `row` is outside the catalog; rows only ever come from the
    /// neighbor index built over the same artifact.
    pub fn row_to_id(&self, row: RowIndex) -> MovieId {
        self.movies[row].id
    }

    pub fn get_movie(&self, id: MovieId) -> Result<&Movie> {
        let row = self.id_to_row(id)?;
        Ok(&self.movies[row])
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.id_to_row.contains_key(&id)
    }

    /// All titles in row order, the candidate list for fuzzy search
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.title.as_str())
    }

    /// Each distinct title once, in order of first appearance
    pub fn unique_titles(&self) -> impl Iterator<Item = &str> {
        let mut seen = HashSet::new();
        self.titles().filter(move |title| seen.insert(*title))
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}
