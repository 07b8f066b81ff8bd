use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    routing::{get, post},
};
use fyyur_models::{
    SearchResults, VenueDetail,
    forms::{FormData, VenueForm},
    now_timestamp,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::{error, info};

use super::{EntityId, SearchForm};
use crate::error::{AppError, AppResult};
use crate::page::Page;

pub fn routes() -> Router<SqlitePool> {
    Router::new()
        .route("/venues", get(list))
        .route("/venues/search", post(search))
        .route("/venues/create", get(create_form).post(create))
        .route("/venues/{id}", get(detail).delete(remove))
        .route("/venues/{id}/edit", get(edit_form).post(edit))
}

async fn list(State(pool): State<SqlitePool>) -> AppResult<Page> {
    let areas = fyyur_db::list_venue_areas(&pool, &now_timestamp()).await?;
    Ok(Page::new("pages/venues.html").with(json!({ "areas": areas })))
}

async fn search(
    State(pool): State<SqlitePool>,
    Form(params): Form<SearchForm>,
) -> AppResult<Page> {
    let found = fyyur_db::search_venues(&pool, &params.search_term, &now_timestamp()).await?;
    Ok(Page::new("pages/search_venues.html").with(json!({
        "results": SearchResults::from(found),
        "search_term": params.search_term,
    })))
}

async fn detail(State(pool): State<SqlitePool>, EntityId(id): EntityId) -> AppResult<Page> {
    let venue = fyyur_db::get_venue(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let shows = fyyur_db::list_shows_for_venue(&pool, id).await?;
    let detail = VenueDetail::new(venue, shows, &now_timestamp());
    Ok(Page::new("pages/show_venue.html").with(json!({ "venue": detail })))
}

async fn create_form() -> Page {
    Page::form("forms/new_venue.html", &VenueForm::default())
}

async fn create(State(pool): State<SqlitePool>, body: Bytes) -> Page {
    let form = VenueForm::from_form(&FormData::from_urlencoded(&body));
    let venue = match form.validate() {
        Ok(venue) => venue,
        Err(errors) => {
            return Page::form("forms/new_venue.html", &form)
                .flash("The Venue data is not valid. Please try again!")
                .errors(errors)
                .status(StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    match fyyur_db::insert_venue(&pool, &venue).await {
        Ok(created) => {
            Page::home().flash(format!("Venue {} was successfully listed!", created.name))
        }
        Err(e) => {
            error!("Could not list venue {}: {e:#}", venue.name);
            Page::home()
                .flash(format!("An error occurred. Venue {} could not be listed.", venue.name))
                .status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn edit_form(State(pool): State<SqlitePool>, EntityId(id): EntityId) -> AppResult<Page> {
    let venue = fyyur_db::get_venue(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Page::form("forms/edit_venue.html", &VenueForm::from_venue(&venue)).insert("venue", &venue))
}

async fn edit(
    State(pool): State<SqlitePool>,
    EntityId(id): EntityId,
    body: Bytes,
) -> AppResult<Page> {
    let stored = fyyur_db::get_venue(&pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let form = VenueForm::from_form(&FormData::from_urlencoded(&body));
    let venue = match form.validate() {
        Ok(venue) => venue,
        Err(errors) => {
            return Ok(Page::form("forms/edit_venue.html", &form)
                .insert("venue", &stored)
                .flash("The Venue data is not valid. Please try again!")
                .errors(errors)
                .status(StatusCode::UNPROCESSABLE_ENTITY));
        }
    };

    match fyyur_db::update_venue(&pool, id, &venue).await {
        Ok(true) => {
            info!("Venue {id} updated");
            Ok(Page::redirect(format!("/venues/{id}"))
                .flash(format!("Venue {} was successfully updated!", venue.name)))
        }
        Ok(false) => Err(AppError::NotFound),
        Err(e) => {
            error!("Could not update venue {id}: {e:#}");
            Ok(Page::form("forms/edit_venue.html", &form)
                .insert("venue", &stored)
                .flash(format!("An error occurred. Venue {} could not be updated.", venue.name))
                .status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// Always answers JSON, whatever the outcome, including a malformed id.
async fn remove(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> (StatusCode, Json<Value>) {
    let not_found = (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Venue not found." })),
    );
    let Ok(Path(id)) = id else {
        return not_found;
    };
    match fyyur_db::delete_venue(&pool, id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "The venue has been successfully deleted!" })),
        ),
        Ok(false) => not_found,
        Err(e) => {
            error!("Could not delete venue {id}: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "message": "Delete was unsuccessful, try again!" })),
            )
        }
    }
}
