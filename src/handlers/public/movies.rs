// handlers/public/movies.rs - GET /movies, GET /movies/:id, PATCH /movies/:id

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::api::{decode_json, decode_query};
use crate::app::AppState;
use crate::database::models::{Movie, MovieDraft, MovieFilter};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /movies/:id
pub async fn movie_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Movie> {
    let id = parse_id(&id)?;
    let movie = state.movies.get(id).await?;
    Ok(ApiResponse::success(movie))
}

/// Raw listing parameters; numbers are parsed by hand so a bad value gets a field-specific message.
#[derive(Debug, Default, Deserialize)]
pub struct ListMoviesQuery {
    pub title: Option<String>,
    pub genres: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

fn parse_number(name: &str, raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::invalid(format!("Invalid \"{}\" parameter format: {}", name, raw)))
}

impl ListMoviesQuery {
    pub fn into_filter(self) -> Result<MovieFilter, ApiError> {
        let mut filter = MovieFilter::default();
        if let Some(title) = self.title {
            filter.title = title;
        }
        if let Some(genres) = self.genres {
            filter.genres = genres
                .split(',')
                .map(str::trim)
                .filter(|genre| !genre.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(page) = self.page {
            filter.page = parse_number("page", &page)?;
        }
        if let Some(page_size) = self.page_size {
            filter.page_size = parse_number("page_size", &page_size)?;
        }
        if let Some(sort) = self.sort {
            filter.sort = sort;
        }
        filter.validate()?;
        Ok(filter)
    }
}

/// GET /movies?title=&genres=a,b&page=&page_size=&sort=
pub async fn movies_list(
    State(state): State<AppState>,
    query: Result<Query<ListMoviesQuery>, QueryRejection>,
) -> ApiResult<Vec<Movie>> {
    let filter = decode_query(query)?.into_filter()?;
    let movies = state.movies.get_all(&filter).await?;
    Ok(ApiResponse::success(movies))
}

/// Partial update body. Absent fields keep their stored value; `version` is the version the client last read.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime: Option<i32>,
    pub genres: Option<Vec<String>>,
    pub version: Option<i32>,
}

impl UpdateMovieRequest {
    fn apply(self, draft: &mut MovieDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(release_date) = self.release_date {
            draft.release_date = Some(release_date);
        }
        if let Some(runtime) = self.runtime {
            draft.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            draft.genres = genres;
        }
    }
}

/// PATCH /movies/:id - read, merge, validate, conditional update. No retry on conflict.
pub async fn movie_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMovieRequest>, JsonRejection>,
) -> ApiResult<Movie> {
    let id = parse_id(&id)?;
    let current = state.movies.get(id).await?;
    let request = decode_json(payload)?;

    let expected_version = request.version.unwrap_or(current.version);
    let mut draft = MovieDraft::from(&current);
    request.apply(&mut draft);

    let mut movie = draft.into_movie(current.id, current.version, Utc::now().date_naive())?;
    movie.version = state.movies.update(&movie, expected_version).await?;

    tracing::info!(movie_id = movie.id, version = movie.version, "movie updated");
    Ok(ApiResponse::success(movie))
}
