use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub mod forms;
mod schedule;

pub use schedule::{
    StartsAt, TIMESTAMP_FORMAT, is_upcoming, normalize_start_time, now_timestamp, partition_by_start,
};

// --- Stored records ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    /// Bracketed list, e.g. `{Jazz,Folk}`. See [`parse_genres`].
    pub genres: String,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub genres: String,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Show {
    pub id: i64,
    pub venue_id: i64,
    pub artist_id: i64,
    pub start_time: String,
}

/// Venue fields as accepted by a validated form, ready to insert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVenue {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub genres: String,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewArtist {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website_link: Option<String>,
    pub genres: String,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewShow {
    pub venue_id: i64,
    pub artist_id: i64,
    /// Always in [`TIMESTAMP_FORMAT`].
    pub start_time: String,
}

// --- Genres ---

/// Stores a genre list in the bracketed form the `genres` column holds.
pub fn encode_genres<S: AsRef<str>>(genres: &[S]) -> String {
    let joined = genres
        .iter()
        .map(|g| g.as_ref())
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{joined}}}")
}

/// Splits a stored genre string back into a list.
///
/// One enclosing `{..}` or `[..]` pair is removed when present; a value
/// without brackets is split as-is rather than losing its first and last
/// characters. Entries are trimmed of whitespace and quotes, and empty
/// entries are dropped.
pub fn parse_genres(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let bracketed = trimmed.len() >= 2
        && ((trimmed.starts_with('{') && trimmed.ends_with('}'))
            || (trimmed.starts_with('[') && trimmed.ends_with(']')));
    let inner = if bracketed {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    inner
        .split(',')
        .map(|g| g.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|g| !g.is_empty())
        .map(String::from)
        .collect()
}

// --- Listing views ---

/// A venue or artist name with the number of shows still to come.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UpcomingSummary {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub city: String,
    pub state: String,
    pub venues: Vec<UpcomingSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ArtistName {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub count: usize,
    pub data: Vec<UpcomingSummary>,
}

impl From<Vec<UpcomingSummary>> for SearchResults {
    fn from(data: Vec<UpcomingSummary>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

/// One row of the show listing: a show flattened with its venue and artist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShowListing {
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

// --- Detail views ---

/// A show as seen from its venue.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VenueShow {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

/// A show as seen from its artist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ArtistShow {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: String,
}

impl StartsAt for VenueShow {
    fn start_time(&self) -> &str {
        &self.start_time
    }
}

impl StartsAt for ArtistShow {
    fn start_time(&self) -> &str {
        &self.start_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<VenueShow>,
    pub upcoming_shows: Vec<VenueShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

impl VenueDetail {
    pub fn new(venue: Venue, shows: Vec<VenueShow>, now: &str) -> Self {
        let (past_shows, upcoming_shows) = partition_by_start(shows, now);
        Self {
            id: venue.id,
            genres: parse_genres(&venue.genres),
            name: venue.name,
            address: venue.address,
            city: venue.city,
            state: venue.state,
            phone: venue.phone,
            website: venue.website_link,
            facebook_link: venue.facebook_link,
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description,
            image_link: venue.image_link,
            past_shows_count: past_shows.len(),
            upcoming_shows_count: upcoming_shows.len(),
            past_shows,
            upcoming_shows,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<ArtistShow>,
    pub upcoming_shows: Vec<ArtistShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

impl ArtistDetail {
    pub fn new(artist: Artist, shows: Vec<ArtistShow>, now: &str) -> Self {
        let (past_shows, upcoming_shows) = partition_by_start(shows, now);
        Self {
            id: artist.id,
            genres: parse_genres(&artist.genres),
            name: artist.name,
            city: artist.city,
            state: artist.state,
            phone: artist.phone,
            website: artist.website_link,
            facebook_link: artist.facebook_link,
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description,
            image_link: artist.image_link,
            past_shows_count: past_shows.len(),
            upcoming_shows_count: upcoming_shows.len(),
            past_shows,
            upcoming_shows,
        }
    }
}
