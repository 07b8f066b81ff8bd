use anyhow::Result;
use fyyur_models::{
    Area, Artist, ArtistName, ArtistShow, NewArtist, NewShow, NewVenue, Show, ShowListing,
    UpcomingSummary, Venue, VenueShow,
};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let mut options = SqlitePoolOptions::new();
    // Every connection to `sqlite::memory:` opens its own empty database.
    if database_url.contains(":memory:") {
        options = options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = options.connect(database_url).await?;
    info!("Connected to database: {database_url}");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Migrations applied");
    Ok(())
}

const VENUE_COLUMNS: &str = "id, name, city, state, address, phone, image_link, \
    facebook_link, website_link, genres, seeking_talent, seeking_description";

const ARTIST_COLUMNS: &str = "id, name, city, state, phone, image_link, \
    facebook_link, website_link, genres, seeking_venue, seeking_description";

/// Keeps the rows whose name contains `term`, ignoring case.
///
/// SQLite's `LOWER` and `LIKE` only fold ASCII, so both sides are folded
/// here with the same Unicode lowercase.
fn name_contains(rows: Vec<UpcomingSummary>, term: &str) -> Vec<UpcomingSummary> {
    let needle = term.to_lowercase();
    rows.into_iter()
        .filter(|row| row.name.to_lowercase().contains(&needle))
        .collect()
}

// --- Venues ---

/// Venues grouped by (city, state), areas ordered by state, venues by name.
pub async fn list_venue_areas(pool: &SqlitePool, now: &str) -> Result<Vec<Area>> {
    let pairs: Vec<(String, String)> =
        sqlx::query_as("SELECT DISTINCT city, state FROM venues ORDER BY state, city")
            .fetch_all(pool)
            .await?;

    let mut areas = Vec::with_capacity(pairs.len());
    for (city, state) in pairs {
        let venues = sqlx::query_as::<_, UpcomingSummary>(
            "SELECT v.id, v.name, \
                (SELECT COUNT(*) FROM shows s WHERE s.venue_id = v.id AND s.start_time > ?) \
                AS num_upcoming_shows \
             FROM venues v WHERE v.city = ? AND v.state = ? ORDER BY v.name",
        )
        .bind(now)
        .bind(&city)
        .bind(&state)
        .fetch_all(pool)
        .await?;
        areas.push(Area {
            city,
            state,
            venues,
        });
    }
    Ok(areas)
}

pub async fn search_venues(
    pool: &SqlitePool,
    term: &str,
    now: &str,
) -> Result<Vec<UpcomingSummary>> {
    let venues = sqlx::query_as::<_, UpcomingSummary>(
        "SELECT v.id, v.name, \
            (SELECT COUNT(*) FROM shows s WHERE s.venue_id = v.id AND s.start_time > ?) \
            AS num_upcoming_shows \
         FROM venues v ORDER BY v.name",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(name_contains(venues, term))
}

pub async fn get_venue(pool: &SqlitePool, id: i64) -> Result<Option<Venue>> {
    let sql = format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = ?");
    let venue = sqlx::query_as::<_, Venue>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(venue)
}

/// Shows at a venue joined with their artists, oldest first.
pub async fn list_shows_for_venue(pool: &SqlitePool, venue_id: i64) -> Result<Vec<VenueShow>> {
    let shows = sqlx::query_as::<_, VenueShow>(
        "SELECT a.id AS artist_id, a.name AS artist_name, \
            a.image_link AS artist_image_link, s.start_time \
         FROM shows s JOIN artists a ON a.id = s.artist_id \
         WHERE s.venue_id = ? ORDER BY s.start_time",
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;
    Ok(shows)
}

pub async fn insert_venue(pool: &SqlitePool, venue: &NewVenue) -> Result<Venue> {
    let sql = format!(
        "INSERT INTO venues (name, city, state, address, phone, image_link, \
            facebook_link, website_link, genres, seeking_talent, seeking_description) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING {VENUE_COLUMNS}"
    );
    let created = sqlx::query_as::<_, Venue>(&sql)
        .bind(&venue.name)
        .bind(&venue.city)
        .bind(&venue.state)
        .bind(&venue.address)
        .bind(&venue.phone)
        .bind(&venue.image_link)
        .bind(&venue.facebook_link)
        .bind(&venue.website_link)
        .bind(&venue.genres)
        .bind(venue.seeking_talent)
        .bind(&venue.seeking_description)
        .fetch_one(pool)
        .await?;
    info!("Venue {} created: {}", created.id, created.name);
    Ok(created)
}

/// Overwrites every field of a venue. Returns false when the id is unknown.
pub async fn update_venue(pool: &SqlitePool, id: i64, venue: &NewVenue) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE venues SET name = ?, city = ?, state = ?, address = ?, phone = ?, \
            image_link = ?, facebook_link = ?, website_link = ?, genres = ?, \
            seeking_talent = ?, seeking_description = ? \
         WHERE id = ?",
    )
    .bind(&venue.name)
    .bind(&venue.city)
    .bind(&venue.state)
    .bind(&venue.address)
    .bind(&venue.phone)
    .bind(&venue.image_link)
    .bind(&venue.facebook_link)
    .bind(&venue.website_link)
    .bind(&venue.genres)
    .bind(venue.seeking_talent)
    .bind(&venue.seeking_description)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a venue and its shows in one transaction.
/// Returns false (and changes nothing) when the id is unknown.
pub async fn delete_venue(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await?;
    let shows = sqlx::query("DELETE FROM shows WHERE venue_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let venues = sqlx::query("DELETE FROM venues WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if venues.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }
    tx.commit().await?;
    info!("Venue {id} deleted along with {} show(s)", shows.rows_affected());
    Ok(true)
}

// --- Artists ---

pub async fn list_artists(pool: &SqlitePool) -> Result<Vec<ArtistName>> {
    let artists = sqlx::query_as::<_, ArtistName>("SELECT id, name FROM artists ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(artists)
}

pub async fn search_artists(
    pool: &SqlitePool,
    term: &str,
    now: &str,
) -> Result<Vec<UpcomingSummary>> {
    let artists = sqlx::query_as::<_, UpcomingSummary>(
        "SELECT a.id, a.name, \
            (SELECT COUNT(*) FROM shows s WHERE s.artist_id = a.id AND s.start_time > ?) \
            AS num_upcoming_shows \
         FROM artists a ORDER BY a.name",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(name_contains(artists, term))
}

pub async fn get_artist(pool: &SqlitePool, id: i64) -> Result<Option<Artist>> {
    let sql = format!("SELECT {ARTIST_COLUMNS} FROM artists WHERE id = ?");
    let artist = sqlx::query_as::<_, Artist>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(artist)
}

/// Shows by an artist joined with their venues, oldest first.
pub async fn list_shows_for_artist(pool: &SqlitePool, artist_id: i64) -> Result<Vec<ArtistShow>> {
    let shows = sqlx::query_as::<_, ArtistShow>(
        "SELECT v.id AS venue_id, v.name AS venue_name, \
            v.image_link AS venue_image_link, s.start_time \
         FROM shows s JOIN venues v ON v.id = s.venue_id \
         WHERE s.artist_id = ? ORDER BY s.start_time",
    )
    .bind(artist_id)
    .fetch_all(pool)
    .await?;
    Ok(shows)
}

pub async fn insert_artist(pool: &SqlitePool, artist: &NewArtist) -> Result<Artist> {
    let sql = format!(
        "INSERT INTO artists (name, city, state, phone, image_link, facebook_link, \
            website_link, genres, seeking_venue, seeking_description) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING {ARTIST_COLUMNS}"
    );
    let created = sqlx::query_as::<_, Artist>(&sql)
        .bind(&artist.name)
        .bind(&artist.city)
        .bind(&artist.state)
        .bind(&artist.phone)
        .bind(&artist.image_link)
        .bind(&artist.facebook_link)
        .bind(&artist.website_link)
        .bind(&artist.genres)
        .bind(artist.seeking_venue)
        .bind(&artist.seeking_description)
        .fetch_one(pool)
        .await?;
    info!("Artist {} created: {}", created.id, created.name);
    Ok(created)
}

pub async fn update_artist(pool: &SqlitePool, id: i64, artist: &NewArtist) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE artists SET name = ?, city = ?, state = ?, phone = ?, image_link = ?, \
            facebook_link = ?, website_link = ?, genres = ?, seeking_venue = ?, \
            seeking_description = ? \
         WHERE id = ?",
    )
    .bind(&artist.name)
    .bind(&artist.city)
    .bind(&artist.state)
    .bind(&artist.phone)
    .bind(&artist.image_link)
    .bind(&artist.facebook_link)
    .bind(&artist.website_link)
    .bind(&artist.genres)
    .bind(artist.seeking_venue)
    .bind(&artist.seeking_description)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

// --- Shows ---

pub async fn list_shows(pool: &SqlitePool) -> Result<Vec<ShowListing>> {
    let shows = sqlx::query_as::<_, ShowListing>(
        "SELECT v.id AS venue_id, v.name AS venue_name, \
            a.id AS artist_id, a.name AS artist_name, \
            a.image_link AS artist_image_link, s.start_time \
         FROM shows s \
         JOIN venues v ON v.id = s.venue_id \
         JOIN artists a ON a.id = s.artist_id \
         ORDER BY s.start_time, s.id",
    )
    .fetch_all(pool)
    .await?;
    Ok(shows)
}

/// Fails on the foreign key when the venue or artist does not exist.
pub async fn insert_show(pool: &SqlitePool, show: &NewShow) -> Result<Show> {
    let created = sqlx::query_as::<_, Show>(
        "INSERT INTO shows (venue_id, artist_id, start_time) VALUES (?, ?, ?) \
         RETURNING id, venue_id, artist_id, start_time",
    )
    .bind(show.venue_id)
    .bind(show.artist_id)
    .bind(&show.start_time)
    .fetch_one(pool)
    .await?;
    info!(
        "Show {} created: venue {} / artist {} at {}",
        created.id, created.venue_id, created.artist_id, created.start_time
    );
    Ok(created)
}
