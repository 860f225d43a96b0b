use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ActorRecord, MovieDetail, MovieSummary, ResultPage, SearchQuery},
    services::{
        discovery::SessionSnapshot,
        library::{compare_details, Library, LibraryAction, ListKind},
    },
};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct ActorSearchParams {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ActorMoviesParams {
    pub name: String,
    pub page: Option<u32>,
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let sessions = state.discovery.session_count().await;
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "sessions": sessions })),
    )
}

pub async fn create_session(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<SessionSnapshot>)> {
    let id = state.discovery.create_session().await;
    let snapshot = state.discovery.snapshot(id).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn get_session(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<SessionSnapshot>> {
    let Path(id) = path?;
    Ok(Json(state.discovery.snapshot(id).await?))
}

pub async fn delete_session(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    state.discovery.remove_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the session query; returns the session after the first page
pub async fn update_query(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<SearchQuery>, JsonRejection>,
) -> AppResult<Json<SessionSnapshot>> {
    let Path(id) = path?;
    let Json(query) = body?;
    tracing::info!(
        session = %id,
        query = %query.text,
        genre = %query.genre,
        search_type = %query.search_type,
        "Query updated"
    );
    Ok(Json(state.discovery.update_query(id, query).await?))
}

pub async fn load_more(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<SessionSnapshot>> {
    let Path(id) = path?;
    Ok(Json(state.discovery.load_more(id).await?))
}

pub async fn retry(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<SessionSnapshot>> {
    let Path(id) = path?;
    Ok(Json(state.discovery.retry(id).await?))
}

pub async fn get_movie(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Json<MovieDetail>> {
    let Path(id) = path?;
    let detail = state.provider.fetch_detail(&id).await?;
    Ok(Json(detail))
}

pub async fn search_actors(
    State(state): State<AppState>,
    query: Result<Query<ActorSearchParams>, QueryRejection>,
) -> AppResult<Json<Vec<ActorRecord>>> {
    let Query(params) = query?;
    Ok(Json(state.actors.search_by_name_or_movie(&params.q)))
}

/// One page of an actor's filmography
pub async fn actor_movies(
    State(state): State<AppState>,
    query: Result<Query<ActorMoviesParams>, QueryRejection>,
) -> AppResult<Json<ResultPage>> {
    let Query(params) = query?;
    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(AppError::InvalidInput("Pages start at 1".to_string()));
    }

    Ok(Json(state.actors.paginated(&params.name, page)))
}

pub async fn get_library(State(state): State<AppState>) -> Json<Library> {
    Json(state.library.snapshot().await)
}

pub async fn add_to_library(
    State(state): State<AppState>,
    path: Result<Path<ListKind>, PathRejection>,
    body: Result<Json<MovieSummary>, JsonRejection>,
) -> AppResult<Json<Library>> {
    let Path(list) = path?;
    let Json(movie) = body?;
    if movie.id.trim().is_empty() {
        return Err(AppError::InvalidInput("Movie id must not be empty".to_string()));
    }

    tracing::info!(list = ?list, id = %movie.id, "Adding to library");
    let library = state.library.apply(LibraryAction::Add(list, movie)).await?;
    Ok(Json(library))
}

pub async fn remove_from_library(
    State(state): State<AppState>,
    path: Result<Path<(ListKind, String)>, PathRejection>,
) -> AppResult<Json<Library>> {
    let Path((list, id)) = path?;
    tracing::info!(list = ?list, id = %id, "Removing from library");
    let library = state.library.apply(LibraryAction::Remove(list, id)).await?;
    Ok(Json(library))
}

pub async fn clear_library(
    State(state): State<AppState>,
    path: Result<Path<ListKind>, PathRejection>,
) -> AppResult<Json<Library>> {
    let Path(list) = path?;
    tracing::info!(list = ?list, "Clearing library list");
    let library = state.library.apply(LibraryAction::Clear(list)).await?;
    Ok(Json(library))
}

/// Full details of every movie on the compare list
pub async fn compare(State(state): State<AppState>) -> AppResult<Json<Vec<MovieDetail>>> {
    let library = state.library.snapshot().await;
    let details = compare_details(&state.provider, &library).await?;
    Ok(Json(details))
}
