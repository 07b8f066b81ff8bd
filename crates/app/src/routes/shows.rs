use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::get,
};
use fyyur_models::forms::{FormData, ShowForm};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;

use crate::error::AppResult;
use crate::page::Page;

pub fn routes() -> Router<SqlitePool> {
    Router::new()
        .route("/shows", get(list))
        .route("/shows/create", get(create_form).post(create))
}

async fn list(State(pool): State<SqlitePool>) -> AppResult<Page> {
    let shows = fyyur_db::list_shows(&pool).await?;
    Ok(Page::new("pages/shows.html").with(json!({ "shows": shows })))
}

async fn create_form() -> Page {
    Page::new("forms/new_show.html").with(json!({ "form": ShowForm::blank() }))
}

async fn create(State(pool): State<SqlitePool>, body: Bytes) -> Page {
    let form = ShowForm::from_form(&FormData::from_urlencoded(&body));
    let show = match form.validate() {
        Ok(show) => show,
        Err(errors) => {
            return Page::new("forms/new_show.html")
                .with(json!({ "form": form }))
                .flash("The Show data is not valid. Please try again!")
                .errors(errors)
                .status(StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    match fyyur_db::insert_show(&pool, &show).await {
        Ok(_) => Page::home().flash("Show was successfully listed!"),
        Err(e) => {
            error!(
                "Could not list show (venue {}, artist {}): {e:#}",
                show.venue_id, show.artist_id
            );
            Page::home()
                .flash("An error occurred. Show could not be listed.")
                .status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
