use axum::{
    Form, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use fyyur_models::{
    ArtistDetail, SearchResults,
    forms::{ArtistForm, FormData},
    now_timestamp,
};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{error, info};

use super::{EntityId, SearchForm};
use crate::error::{AppError, AppResult};
use crate::page::Page;

pub fn routes() -> Router<SqlitePool> {
    Router::new()
        .route("/artists", get(list))
        .route("/artists/search", post(search))
        .route("/artists/create", get(create_form).post(create))
        .route("/artists/{id}", get(detail))
        .route("/artists/{id}/edit", get(edit_form).post(edit))
}

async fn list(State(pool): State<SqlitePool>) -> AppResult<Page> {
    let artists = fyyur_db::list_artists(&pool).await?;
    Ok(Page::new("pages/artists.html").with(json!({ "artists": artists })))
}

async fn search(
    State(pool): State<SqlitePool>,
    Form(params): Form<SearchForm>,
) -> AppResult<Page> {
    let found = fyyur_db::search_artists(&pool, &params.search_term, &now_timestamp()).await?;
    Ok(Page::new("pages/search_artists.html").with(json!({
        "results": SearchResults::from(found),
        "search_term": params.search_term,
    })))
}

async fn detail(State(pool): State<SqlitePool>, EntityId(id): EntityId) -> AppResult<Page> {
    let artist = fyyur_db::get_artist(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let shows = fyyur_db::list_shows_for_artist(&pool, id).await?;
    let detail = ArtistDetail::new(artist, shows, &now_timestamp());
    Ok(Page::new("pages/show_artist.html").with(json!({ "artist": detail })))
}

async fn create_form() -> Page {
    Page::form("forms/new_artist.html", &ArtistForm::default())
}

async fn create(State(pool): State<SqlitePool>, body: Bytes) -> Page {
    let form = ArtistForm::from_form(&FormData::from_urlencoded(&body));
    let artist = match form.validate() {
        Ok(artist) => artist,
        Err(errors) => {
            return Page::form("forms/new_artist.html", &form)
                .flash("The Artist data is not valid. Please try again!")
                .errors(errors)
                .status(StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    match fyyur_db::insert_artist(&pool, &artist).await {
        Ok(created) => {
            Page::home().flash(format!("Artist {} was successfully listed!", created.name))
        }
        Err(e) => {
            error!("Could not list artist {}: {e:#}", artist.name);
            Page::home()
                .flash(format!("An error occurred. Artist {} could not be listed.", artist.name))
                .status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn edit_form(State(pool): State<SqlitePool>, EntityId(id): EntityId) -> AppResult<Page> {
    let artist = fyyur_db::get_artist(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Page::form("forms/edit_artist.html", &ArtistForm::from_artist(&artist)).insert("artist", &artist))
}

async fn edit(
    State(pool): State<SqlitePool>,
    EntityId(id): EntityId,
    body: Bytes,
) -> AppResult<Page> {
    let stored = fyyur_db::get_artist(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let form = ArtistForm::from_form(&FormData::from_urlencoded(&body));
    let artist = match form.validate() {
        Ok(artist) => artist,
        Err(errors) => {
            return Ok(Page::form("forms/edit_artist.html", &form)
                .insert("artist", &stored)
                .flash("The Artist data is not valid. Please try again!")
                .errors(errors)
                .status(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };

    match fyyur_db::update_artist(&pool, id, &artist).await {
        Ok(true) => {
            info!("Artist {id} updated");
            Ok(Page::redirect(format!("/artists/{id}"))
                .flash(format!("Artist {} was successfully updated!", artist.name)))
        }
        Ok(false) => Err(AppError::NotFound),
        Err(e) => {
            error!("Could not update artist {id}: {e:#}");
            Ok(Page::form("forms/edit_artist.html", &form)
                .insert("artist", &stored)
                .flash(format!("An error occurred. Artist {} could not be updated.", artist.name))
                .status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}
