// handlers/protected/movies.rs - POST /movies, DELETE /movies/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::api::decode_json;
use crate::app::AppState;
use crate::database::models::{Movie, MovieDraft};
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthenticatedUser};

/// Create body. Missing fields fall through to validation so every problem is reported at once.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMovieRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub runtime: i32,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl From<CreateMovieRequest> for MovieDraft {
    fn from(request: CreateMovieRequest) -> Self {
        Self {
            title: request.title,
            release_date: request.release_date,
            runtime: request.runtime,
            genres: request.genres,
        }
    }
}

/// POST /movies - 201 with `Location: /movies/{id}`
pub async fn movie_create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    payload: Result<Json<CreateMovieRequest>, JsonRejection>,
) -> ApiResult<Movie> {
    let request = decode_json(payload)?;
    let draft = MovieDraft::from(request);
    let movie = draft.into_movie(0, 1, Utc::now().date_naive())?;

    let movie = state.movies.create(&movie).await?;
    tracing::info!(movie_id = movie.id, user_id = user.id, "movie created");

    let location = format!("/movies/{}", movie.id);
    Ok(ApiResponse::created(movie).with_location(location))
}

/// DELETE /movies/:id - 204, or 404 when nothing was deleted
pub async fn movie_delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    state.movies.delete(id).await?;
    tracing::info!(movie_id = id, user_id = user.id, "movie deleted");
    Ok(ApiResponse::<()>::no_content())
}
