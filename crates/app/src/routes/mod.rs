mod artists;
mod shows;
mod venues;

use std::path::Path as FsPath;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path},
    handler::HandlerWithoutStateExt,
    http::request::Parts,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::AppError;
use crate::page::Page;
use crate::version_string;

/// A numeric `{id}` path segment. Anything that is not an `i64` is an
/// unknown page, not a bad request.
struct EntityId(i64);

impl<S: Send + Sync> FromRequestParts<S> for EntityId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<i64>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| EntityId(id))
            .map_err(|_| AppError::NotFound)
    }
}

#[derive(Debug, Deserialize)]
struct SearchForm {
    #[serde(default)]
    search_term: String,
}

async fn index() -> Page {
    Page::home()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": version_string()
    }))
}

async fn not_found() -> AppError {
    AppError::NotFound
}

pub fn router(pool: SqlitePool, static_dir: &FsPath) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(venues::routes())
        .merge(artists::routes())
        .merge(shows::routes())
        .nest_service(
            "/static",
            ServeDir::new(static_dir).not_found_service(not_found.into_service()),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    const HOP: &str = "name=The+Musical+Hop&city=San+Francisco&state=CA\
        &address=1015+Folsom+Street&phone=123-123-1234&genres=Jazz&genres=Reggae\
        &website_link=https%3A%2F%2Fwww.themusicalhop.com&seeking_talent=y";
    const APOLLO: &str = "name=Apollo&city=New+York&state=NY&address=253+W+125th+St&genres=Soul";
    const GUNS: &str = "name=Guns+N+Petals&city=San+Francisco&state=CA&genres=Rock+n+Roll\
        &image_link=https%3A%2F%2Fexample.com%2Fguns.png&seeking_venue=y";
    const QUEVEDO: &str = "name=Matt+Quevedo&city=New+York&state=NY&genres=Jazz";

    async fn app() -> Router {
        app_with_pool().await.0
    }

    async fn app_with_pool() -> (Router, SqlitePool) {
        let pool = fyyur_db::connect("sqlite::memory:").await.unwrap();
        fyyur_db::migrate(&pool).await.unwrap();
        (router(pool.clone(), FsPath::new("static")), pool)
    }

    /// Makes every write of `op` on `table` fail inside the database.
    async fn reject_writes(pool: &SqlitePool, table: &str, op: &str) {
        let sql = format!(
            "CREATE TRIGGER reject_{table}_{op} BEFORE {op} ON {table} \
             BEGIN SELECT RAISE(ABORT, 'writes disabled'); END"
        );
        sqlx::query(&sql).execute(pool).await.unwrap();
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(app: &Router, uri: &str, form: &str) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_show(app: &Router, venue_id: i64, artist_id: i64, start_time: &str) -> StatusCode {
        let form = format!(
            "venue_id={venue_id}&artist_id={artist_id}&start_time={}",
            start_time.replace(' ', "+").replace(':', "%3A")
        );
        post(app, "/shows/create", &form).await.0
    }

    #[tokio::test]
    async fn home_and_health() {
        let app = app().await;
        let (status, page) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["template"], "pages/home.html");

        let (status, health) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_renders_404_page() {
        let app = app().await;
        let (status, page) = get(&app, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(page["template"], "errors/404.html");

        let (status, page) = get(&app, "/venues/77").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(page["template"], "errors/404.html");
    }

    #[tokio::test]
    async fn creating_a_venue_persists_it() {
        let app = app().await;
        let (status, page) = post(&app, "/venues/create", HOP).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["template"], "pages/home.html");
        assert_eq!(page["flash"][0], "Venue The Musical Hop was successfully listed!");

        let (status, page) = get(&app, "/venues/1").await;
        assert_eq!(status, StatusCode::OK);
        let venue = &page["context"]["venue"];
        assert_eq!(venue["name"], "The Musical Hop");
        assert_eq!(venue["city"], "San Francisco");
        assert_eq!(venue["address"], "1015 Folsom Street");
        assert_eq!(venue["genres"], json!(["Jazz", "Reggae"]));
        assert_eq!(venue["website"], "https://www.themusicalhop.com");
        assert_eq!(venue["seeking_talent"], true);
        assert_eq!(venue["upcoming_shows_count"], 0);
    }

    #[tokio::test]
    async fn invalid_submission_persists_nothing() {
        let app = app().await;
        let (status, page) = post(&app, "/venues/create", "name=&city=Nowhere&state=ZZ").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(page["flash"][0], "The Venue data is not valid. Please try again!");
        assert!(page["errors"]["name"].is_array());
        assert!(page["errors"]["state"].is_array());
        assert_eq!(page["context"]["form"]["city"], "Nowhere");

        let (_, page) = get(&app, "/venues").await;
        assert_eq!(page["context"]["areas"], json!([]));

        let (status, _) = post(&app, "/artists/create", "city=Nowhere").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (_, page) = get(&app, "/artists").await;
        assert_eq!(page["context"]["artists"], json!([]));

        assert_eq!(post_show(&app, 1, 1, "whenever").await, StatusCode::UNPROCESSABLE_ENTITY);
        let (_, page) = get(&app, "/shows").await;
        assert_eq!(page["context"]["shows"], json!([]));
    }

    #[tokio::test]
    async fn venues_are_grouped_by_area() {
        let app = app().await;
        post(&app, "/venues/create", HOP).await;
        post(&app, "/venues/create", APOLLO).await;
        post(&app, "/artists/create", GUNS).await;
        assert_eq!(post_show(&app, 1, 1, "2035-04-01 20:00:00").await, StatusCode::OK);

        let (_, page) = get(&app, "/venues").await;
        let areas = page["context"]["areas"].as_array().unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0]["state"], "CA");
        assert_eq!(areas[0]["venues"][0]["num_upcoming_shows"], 1);
        assert_eq!(areas[1]["venues"][0]["name"], "Apollo");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let app = app().await;
        post(&app, "/venues/create", APOLLO).await;
        post(&app, "/venues/create", HOP).await;
        post(&app, "/artists/create", QUEVEDO).await;

        let (status, page) = post(&app, "/venues/search", "search_term=a").await;
        assert_eq!(status, StatusCode::OK);
        let results = &page["context"]["results"];
        assert!(
            results["data"]
                .as_array()
                .unwrap()
                .iter()
                .any(|v| v["name"] == "Apollo")
        );
        assert_eq!(page["context"]["search_term"], "a");

        let (_, page) = post(&app, "/venues/search", "search_term=xyz").await;
        assert_eq!(page["context"]["results"]["count"], 0);
        assert_eq!(page["context"]["results"]["data"], json!([]));

        let (_, page) = post(&app, "/artists/search", "search_term=MATT").await;
        assert_eq!(page["context"]["results"]["count"], 1);
        assert_eq!(page["context"]["results"]["data"][0]["name"], "Matt Quevedo");
    }

    #[tokio::test]
    async fn detail_views_partition_past_and_upcoming() {
        let app = app().await;
        post(&app, "/venues/create", HOP).await;
        post(&app, "/artists/create", GUNS).await;
        post_show(&app, 1, 1, "2035-04-01 20:00:00").await;
        post_show(&app, 1, 1, "2019-05-21 21:30:00").await;

        let (_, page) = get(&app, "/venues/1").await;
        let venue = &page["context"]["venue"];
        assert_eq!(venue["upcoming_shows_count"], 1);
        assert_eq!(venue["past_shows_count"], 1);
        assert_eq!(venue["upcoming_shows"][0]["start_time"], "2035-04-01 20:00:00");
        assert_eq!(venue["upcoming_shows"][0]["artist_name"], "Guns N Petals");
        assert_eq!(venue["past_shows"][0]["start_time"], "2019-05-21 21:30:00");

        let (_, page) = get(&app, "/artists/1").await;
        let artist = &page["context"]["artist"];
        assert_eq!(artist["upcoming_shows"][0]["start_time"], "2035-04-01 20:00:00");
        assert_eq!(artist["upcoming_shows"][0]["venue_name"], "The Musical Hop");
        assert_eq!(artist["past_shows"][0]["start_time"], "2019-05-21 21:30:00");
        assert_eq!(artist["genres"], json!(["Rock n Roll"]));
    }

    #[tokio::test]
    async fn created_show_appears_in_listing() {
        let app = app().await;
        post(&app, "/venues/create", HOP).await;
        post(&app, "/artists/create", QUEVEDO).await;
        post(&app, "/artists/create", GUNS).await;

        assert_eq!(post_show(&app, 1, 2, "2030-01-01 10:00:00").await, StatusCode::OK);

        let (status, page) = get(&app, "/shows").await;
        assert_eq!(status, StatusCode::OK);
        let shows = page["context"]["shows"].as_array().unwrap();
        assert!(shows.iter().any(|s| {
            s["venue_id"] == 1 && s["artist_id"] == 2 && s["start_time"] == "2030-01-01 10:00:00"
        }));
        assert_eq!(shows[0]["artist_image_link"], "https://example.com/guns.png");
    }

    #[tokio::test]
    async fn show_for_unknown_venue_is_a_persistence_error() {
        let app = app().await;
        post(&app, "/artists/create", GUNS).await;
        let form = "venue_id=9&artist_id=1&start_time=2030-01-01+10%3A00%3A00";
        let (status, page) = post(&app, "/shows/create", form).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(page["flash"][0], "An error occurred. Show could not be listed.");
    }

    #[tokio::test]
    async fn editing_redirects_to_detail() {
        let app = app().await;
        post(&app, "/venues/create", HOP).await;
        post(&app, "/artists/create", GUNS).await;

        let (status, page) = get(&app, "/venues/1/edit").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["context"]["form"]["genres"], json!(["Jazz", "Reggae"]));
        assert_eq!(page["context"]["venue"]["id"], 1);

        let edited = HOP.replace("The+Musical+Hop", "The+Musical+Jump");
        let (status, page) = post(&app, "/venues/1/edit", &edited).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(page["redirect"], "/venues/1");
        let (_, page) = get(&app, "/venues/1").await;
        assert_eq!(page["context"]["venue"]["name"], "The Musical Jump");

        let edited = GUNS.replace("seeking_venue=y", "seeking_venue=false");
        let (status, _) = post(&app, "/artists/1/edit", &edited).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let (_, page) = get(&app, "/artists/1").await;
        assert_eq!(page["context"]["artist"]["seeking_venue"], false);

        let (status, page) = post(&app, "/artists/1/edit", "name=").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(page["context"]["artist"]["name"], "Guns N Petals");
    }

    #[tokio::test]
    async fn editing_unknown_ids_is_not_found() {
        let app = app().await;
        let (status, _) = get(&app, "/venues/5/edit").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = post(&app, "/artists/5/edit", QUEVEDO).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_ids_are_not_found() {
        let app = app().await;
        for uri in ["/venues/abc", "/artists/99999999999999999999", "/venues/1.5/edit"] {
            let (status, page) = get(&app, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(page["template"], "errors/404.html", "{uri}");
        }
        let (status, page) = post(&app, "/artists/x/edit", QUEVEDO).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(page["template"], "errors/404.html");

        let (status, body) = delete(&app, "/venues/abc").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Venue not found.");
    }

    #[tokio::test]
    async fn missing_static_file_renders_404_page() {
        let app = app().await;
        let (status, page) = get(&app, "/static/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(page["template"], "errors/404.html");
    }

    #[tokio::test]
    async fn failed_create_answers_500_and_writes_nothing() {
        let (app, pool) = app_with_pool().await;
        reject_writes(&pool, "venues", "INSERT").await;
        reject_writes(&pool, "artists", "INSERT").await;

        let (status, page) = post(&app, "/venues/create", HOP).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(page["template"], "pages/home.html");
        assert_eq!(
            page["flash"][0],
            "An error occurred. Venue The Musical Hop could not be listed."
        );
        let (_, page) = get(&app, "/venues").await;
        assert_eq!(page["context"]["areas"], json!([]));

        let (status, page) = post(&app, "/artists/create", GUNS).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            page["flash"][0],
            "An error occurred. Artist Guns N Petals could not be listed."
        );
        let (_, page) = get(&app, "/artists").await;
        assert_eq!(page["context"]["artists"], json!([]));
    }

    #[tokio::test]
    async fn failed_edit_answers_500_and_keeps_the_record() {
        let (app, pool) = app_with_pool().await;
        post(&app, "/venues/create", HOP).await;
        post(&app, "/artists/create", GUNS).await;
        reject_writes(&pool, "venues", "UPDATE").await;
        reject_writes(&pool, "artists", "UPDATE").await;

        let edited = HOP.replace("The+Musical+Hop", "The+Musical+Jump");
        let (status, page) = post(&app, "/venues/1/edit", &edited).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(page["template"], "forms/edit_venue.html");
        assert_eq!(
            page["flash"][0],
            "An error occurred. Venue The Musical Jump could not be updated."
        );
        let (_, page) = get(&app, "/venues/1").await;
        assert_eq!(page["context"]["venue"]["name"], "The Musical Hop");

        let edited = GUNS.replace("Guns+N+Petals", "Guns+N+Roses");
        let (status, page) = post(&app, "/artists/1/edit", &edited).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            page["flash"][0],
            "An error occurred. Artist Guns N Roses could not be updated."
        );
        let (_, page) = get(&app, "/artists/1").await;
        assert_eq!(page["context"]["artist"]["name"], "Guns N Petals");
    }

    #[tokio::test]
    async fn delete_answers_json_and_removes_shows() {
        let app = app().await;
        let (status, body) = delete(&app, "/venues/12").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        post(&app, "/venues/create", HOP).await;
        post(&app, "/artists/create", GUNS).await;
        post_show(&app, 1, 1, "2035-04-01 20:00:00").await;

        let (status, body) = delete(&app, "/venues/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = get(&app, "/venues/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, page) = get(&app, "/shows").await;
        assert_eq!(page["context"]["shows"], json!([]));
    }

    #[tokio::test]
    async fn forms_offer_choices() {
        let app = app().await;
        let (status, page) = get(&app, "/venues/create").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["template"], "forms/new_venue.html");
        assert!(page["context"]["choices"]["genres"].as_array().unwrap().contains(&json!("Jazz")));

        let (_, page) = get(&app, "/shows/create").await;
        assert!(!page["context"]["form"]["start_time"].as_str().unwrap().is_empty());
    }
}
