//! Form decoding and validation for venue, artist and show submissions.
//!
//! Each form is built from the posted body with `from_form`, then
//! `validate` either yields the record to write or the per-field errors.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::{
    Artist, NewArtist, NewShow, NewVenue, Venue, encode_genres, normalize_start_time,
    now_timestamp, parse_genres,
};

pub const GENRE_CHOICES: &[&str] = &[
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Other",
];

pub const STATE_CHOICES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR",
    "MD", "MA", "MI", "MN", "MS", "MO", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY",
];

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{3}-\d{4}$").expect("phone pattern compiles"));

/// Choice lists offered by the venue and artist forms.
#[derive(Debug, Clone, Serialize)]
pub struct FormChoices {
    pub state: &'static [&'static str],
    pub genres: &'static [&'static str],
}

pub const FORM_CHOICES: FormChoices = FormChoices {
    state: STATE_CHOICES,
    genres: GENRE_CHOICES,
};

/// Error messages keyed by field name.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

/// A decoded `application/x-www-form-urlencoded` body. Keys may repeat.
#[derive(Debug, Clone, Default)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    pub fn from_urlencoded(body: &[u8]) -> Self {
        Self(url::form_urlencoded::parse(body).into_owned().collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().trim().to_string()
    }

    /// Checkbox semantics: present and not blank or "false".
    fn checkbox(&self, key: &str) -> bool {
        match self.get(key) {
            Some(v) => {
                let v = v.trim();
                !v.is_empty() && !v.eq_ignore_ascii_case("false")
            }
            None => false,
        }
    }

    fn multi(&self, key: &str) -> Vec<String> {
        self.get_all(key)
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Default)]
struct Checks(FieldErrors);

impl Checks {
    fn fail(&mut self, field: &'static str, message: &str) {
        self.0.entry(field).or_default().push(message.to_string());
    }

    fn required(&mut self, field: &'static str, value: &str) -> bool {
        if value.is_empty() {
            self.fail(field, "This field is required.");
            false
        } else {
            true
        }
    }

    fn state(&mut self, value: &str) {
        if self.required("state", value) && !STATE_CHOICES.contains(&value) {
            self.fail("state", "Not a valid choice.");
        }
    }

    fn phone(&mut self, value: &str) {
        if !value.is_empty() && !PHONE.is_match(value) {
            self.fail("phone", "Phone number must look like 123-456-7890.");
        }
    }

    fn url(&mut self, field: &'static str, value: &str) {
        if value.is_empty() {
            return;
        }
        let valid = Url::parse(value)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false);
        if !valid {
            self.fail(field, "Invalid URL.");
        }
    }

    fn genres(&mut self, genres: &[String]) {
        if genres.is_empty() {
            self.fail("genres", "This field is required.");
        }
        for genre in genres {
            if !GENRE_CHOICES.contains(&genre.as_str()) {
                self.fail("genres", &format!("'{genre}' is not a valid choice for this field."));
            }
        }
    }

    fn id(&mut self, field: &'static str, value: &str) -> Option<i64> {
        if !self.required(field, value) {
            return None;
        }
        match value.parse::<i64>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                self.fail(field, "Not a valid integer value.");
                None
            }
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self.0)
        }
    }
}

// --- Venue ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub image_link: String,
    pub facebook_link: String,
    pub website_link: String,
    pub genres: Vec<String>,
    pub seeking_talent: bool,
    pub seeking_description: String,
}

impl VenueForm {
    pub fn from_form(data: &FormData) -> Self {
        Self {
            name: data.text("name"),
            city: data.text("city"),
            state: data.text("state"),
            address: data.text("address"),
            phone: data.text("phone"),
            image_link: data.text("image_link"),
            facebook_link: data.text("facebook_link"),
            website_link: data.text("website_link"),
            genres: data.multi("genres"),
            seeking_talent: data.checkbox("seeking_talent"),
            seeking_description: data.text("seeking_description"),
        }
    }

    /// Pre-fills the edit form from a stored venue.
    pub fn from_venue(venue: &Venue) -> Self {
        Self {
            name: venue.name.clone(),
            city: venue.city.clone(),
            state: venue.state.clone(),
            address: venue.address.clone(),
            phone: venue.phone.clone().unwrap_or_default(),
            image_link: venue.image_link.clone().unwrap_or_default(),
            facebook_link: venue.facebook_link.clone().unwrap_or_default(),
            website_link: venue.website_link.clone().unwrap_or_default(),
            genres: parse_genres(&venue.genres),
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<NewVenue, FieldErrors> {
        let mut checks = Checks::default();
        checks.required("name", &self.name);
        checks.required("city", &self.city);
        checks.state(&self.state);
        checks.required("address", &self.address);
        checks.phone(&self.phone);
        checks.url("image_link", &self.image_link);
        checks.url("facebook_link", &self.facebook_link);
        checks.url("website_link", &self.website_link);
        checks.genres(&self.genres);
        checks.finish(|| NewVenue {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            address: self.address.clone(),
            phone: optional(&self.phone),
            image_link: optional(&self.image_link),
            facebook_link: optional(&self.facebook_link),
            website_link: optional(&self.website_link),
            genres: encode_genres(&self.genres),
            seeking_talent: self.seeking_talent,
            seeking_description: optional(&self.seeking_description),
        })
    }
}

// --- Artist ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtistForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub image_link: String,
    pub facebook_link: String,
    pub website_link: String,
    pub genres: Vec<String>,
    pub seeking_venue: bool,
    pub seeking_description: String,
}

impl ArtistForm {
    pub fn from_form(data: &FormData) -> Self {
        Self {
            name: data.text("name"),
            city: data.text("city"),
            state: data.text("state"),
            phone: data.text("phone"),
            image_link: data.text("image_link"),
            facebook_link: data.text("facebook_link"),
            website_link: data.text("website_link"),
            genres: data.multi("genres"),
            seeking_venue: data.checkbox("seeking_venue"),
            seeking_description: data.text("seeking_description"),
        }
    }

    pub fn from_artist(artist: &Artist) -> Self {
        Self {
            name: artist.name.clone(),
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone().unwrap_or_default(),
            image_link: artist.image_link.clone().unwrap_or_default(),
            facebook_link: artist.facebook_link.clone().unwrap_or_default(),
            website_link: artist.website_link.clone().unwrap_or_default(),
            genres: parse_genres(&artist.genres),
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<NewArtist, FieldErrors> {
        let mut checks = Checks::default();
        checks.required("name", &self.name);
        checks.required("city", &self.city);
        checks.state(&self.state);
        checks.phone(&self.phone);
        checks.url("image_link", &self.image_link);
        checks.url("facebook_link", &self.facebook_link);
        checks.url("website_link", &self.website_link);
        checks.genres(&self.genres);
        checks.finish(|| NewArtist {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            phone: optional(&self.phone),
            image_link: optional(&self.image_link),
            facebook_link: optional(&self.facebook_link),
            website_link: optional(&self.website_link),
            genres: encode_genres(&self.genres),
            seeking_venue: self.seeking_venue,
            seeking_description: optional(&self.seeking_description),
        })
    }
}

// --- Show ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct ShowForm {
    pub artist_id: String,
    pub venue_id: String,
    pub start_time: String,
}

impl ShowForm {
    /// Empty form with the start time defaulting to now.
    pub fn blank() -> Self {
        Self {
            start_time: now_timestamp(),
            ..Self::default()
        }
    }

    pub fn from_form(data: &FormData) -> Self {
        Self {
            artist_id: data.text("artist_id"),
            venue_id: data.text("venue_id"),
            start_time: data.text("start_time"),
        }
    }

    pub fn validate(&self) -> Result<NewShow, FieldErrors> {
        let mut checks = Checks::default();
        let artist_id = checks.id("artist_id", &self.artist_id);
        let venue_id = checks.id("venue_id", &self.venue_id);
        let start_time = if checks.required("start_time", &self.start_time) {
            let normalized = normalize_start_time(&self.start_time);
            if normalized.is_none() {
                checks.fail("start_time", "Not a valid datetime value.");
            }
            normalized
        } else {
            None
        };
        match (artist_id, venue_id, start_time) {
            (Some(artist_id), Some(venue_id), Some(start_time)) => checks.finish(|| NewShow {
                venue_id,
                artist_id,
                start_time,
            }),
            _ => Err(checks.0),
        }
    }
}
