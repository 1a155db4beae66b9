use chrono::{Datelike, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The whole persisted document. Every mutation rewrites all three collections.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub movies: Vec<Movie>,
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub songs: Vec<Song>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub genre: String,
    pub director: String,
    pub year: i32,
    #[serde(default)]
    pub rating: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Series {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub genre: String,
    pub creator: String,
    pub seasons: u32,
    pub year: i32,
    #[serde(default)]
    pub rating: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Song {
    pub id: u64,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub genre: String,
    pub year: i32,
    #[serde(default = "default_duration")]
    pub duration: String,
}

/// Body of a delete request; only `id` is looked at.
#[derive(Debug, Deserialize, Default)]
pub struct Selector {
    pub id: Option<u64>,
}

impl Selector {
    /// Zero counts as absent, like an empty required string.
    pub fn id(&self) -> Option<u64> {
        nonzero(self.id)
    }
}

/// One record kind stored in the catalog.
///
/// `Draft` is the create payload (required fields still optional so that a
/// missing one can be reported instead of failing deserialization), `Patch`
/// is the update payload listing every field an update may touch.
pub trait MediaRecord: Serialize + Clone + Send + Sync + 'static {
    /// Human label used in not-found messages.
    const KIND: &'static str;

    type Draft: DeserializeOwned + Send;
    type Patch: DeserializeOwned + Send;

    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);

    /// Builds an unnumbered record (id 0), or `None` when a required field is
    /// missing. Needs no catalog, so bad payloads are rejected before any I/O.
    fn from_draft(draft: Self::Draft) -> Option<Self>;

    /// Id named by an update payload; zero counts as absent.
    fn target(patch: &Self::Patch) -> Option<u64>;

    /// Copies every supplied patch field onto the record.
    fn apply(&mut self, patch: Self::Patch);

    fn collection_mut(catalog: &mut Catalog) -> &mut Vec<Self>;
}

#[derive(Debug, Deserialize, Default)]
pub struct MovieDraft {
    pub title: Option<String>,
    pub director: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MoviePatch {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub director: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
}

impl MediaRecord for Movie {
    const KIND: &'static str = "Movie";
    type Draft = MovieDraft;
    type Patch = MoviePatch;

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn from_draft(draft: MovieDraft) -> Option<Self> {
        Some(Movie {
            id: 0,
            title: filled(draft.title)?,
            director: filled(draft.director)?,
            year: nonzero(draft.year)?,
            genre: filled(draft.genre).unwrap_or_default(),
            rating: draft.rating.unwrap_or(0.0),
        })
    }

    fn target(patch: &MoviePatch) -> Option<u64> {
        nonzero(patch.id)
    }

    fn apply(&mut self, patch: MoviePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(director) = patch.director {
            self.director = director;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut Vec<Self> {
        &mut catalog.movies
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SeriesDraft {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub seasons: Option<u32>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SeriesPatch {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub seasons: Option<u32>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
}

impl MediaRecord for Series {
    const KIND: &'static str = "Series";
    type Draft = SeriesDraft;
    type Patch = SeriesPatch;

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn from_draft(draft: SeriesDraft) -> Option<Self> {
        Some(Series {
            id: 0,
            title: filled(draft.title)?,
            creator: filled(draft.creator)?,
            seasons: nonzero(draft.seasons)?,
            genre: filled(draft.genre).unwrap_or_default(),
            year: nonzero(draft.year).unwrap_or_else(current_year),
            rating: draft.rating.unwrap_or(0.0),
        })
    }

    fn target(patch: &SeriesPatch) -> Option<u64> {
        nonzero(patch.id)
    }

    fn apply(&mut self, patch: SeriesPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(creator) = patch.creator {
            self.creator = creator;
        }
        if let Some(seasons) = patch.seasons {
            self.seasons = seasons;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut Vec<Self> {
        &mut catalog.series
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SongDraft {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SongPatch {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub duration: Option<String>,
}

impl MediaRecord for Song {
    const KIND: &'static str = "Song";
    type Draft = SongDraft;
    type Patch = SongPatch;

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn from_draft(draft: SongDraft) -> Option<Self> {
        Some(Song {
            id: 0,
            title: filled(draft.title)?,
            artist: filled(draft.artist)?,
            year: nonzero(draft.year)?,
            genre: filled(draft.genre).unwrap_or_default(),
            duration: filled(draft.duration).unwrap_or_else(default_duration),
        })
    }

    fn target(patch: &SongPatch) -> Option<u64> {
        nonzero(patch.id)
    }

    fn apply(&mut self, patch: SongPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(artist) = patch.artist {
            self.artist = artist;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut Vec<Self> {
        &mut catalog.songs
    }
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn nonzero<T: Default + PartialEq>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v != T::default())
}

fn current_year() -> i32 {
    Utc::now().year()
}

fn default_duration() -> String {
    "0:00".to_string()
}

/// Data written to a fresh catalog file.
pub fn seed_catalog() -> Catalog {
    let movie = |id, title: &str, director: &str, year, rating| Movie {
        id,
        title: title.to_string(),
        genre: "Action".to_string(),
        director: director.to_string(),
        year,
        rating,
    };
    let series = |id, title: &str, genre: &str, creator: &str, seasons, year, rating| Series {
        id,
        title: title.to_string(),
        genre: genre.to_string(),
        creator: creator.to_string(),
        seasons,
        year,
        rating,
    };
    let song = |id, title: &str, artist: &str, year, duration: &str| Song {
        id,
        title: title.to_string(),
        artist: artist.to_string(),
        genre: "R&B".to_string(),
        year,
        duration: duration.to_string(),
    };

    Catalog {
        movies: vec![
            movie(1, "The Batman", "Matt Reeves", 2022, 7.9),
            movie(2, "Top Gun: Maverick", "Joseph Kosinski", 2022, 8.3),
            movie(3, "Bullet Train", "David Leitch", 2022, 7.3),
            movie(4, "John Wick: Chapter 4", "Chad Stahelski", 2023, 8.0),
        ],
        series: vec![
            series(1, "The Last of Us", "Drama", "Craig Mazin", 1, 2023, 8.9),
            series(2, "Stranger Things", "Sci-Fi", "The Duffer Brothers", 4, 2022, 8.7),
            series(3, "The Mandalorian", "Sci-Fi", "Jon Favreau", 3, 2023, 8.7),
            series(4, "Wednesday", "Comedy", "Alfred Gough", 1, 2022, 8.2),
        ],
        songs: vec![
            song(1, "Die For You", "The Weeknd", 2022, "4:20"),
            song(2, "CUFF IT", "Beyoncé", 2022, "3:45"),
            song(3, "Under the Influence", "Chris Brown", 2022, "3:04"),
            song(4, "Good Days", "SZA", 2020, "4:39"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft<T: DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).expect("draft parses")
    }

    #[test]
    fn movie_draft_fills_defaults() {
        let mut movie = Movie::from_draft(draft(
            json!({"title": "Heat", "director": "Michael Mann", "year": 1995}),
        ))
        .expect("complete draft");
        assert_eq!(movie.id, 0);
        movie.set_id(7);
        assert_eq!(movie.id(), 7);
        assert_eq!(movie.genre, "");
        assert_eq!(movie.rating, 0.0);
    }

    #[test]
    fn empty_or_zero_required_fields_count_as_missing() {
        let empty_title: MovieDraft =
            draft(json!({"title": "", "director": "Someone", "year": 2000}));
        assert!(Movie::from_draft(empty_title).is_none());

        let zero_seasons: SeriesDraft =
            draft(json!({"title": "Show", "creator": "Someone", "seasons": 0}));
        assert!(Series::from_draft(zero_seasons).is_none());

        let no_artist: SongDraft = draft(json!({"title": "Track", "year": 2001}));
        assert!(Song::from_draft(no_artist).is_none());
    }

    #[test]
    fn series_year_defaults_to_current_year() {
        let series = Series::from_draft(draft(
            json!({"title": "Dark", "creator": "Baran bo Odar", "seasons": 3}),
        ))
        .expect("complete draft");
        assert_eq!(series.year, Utc::now().year());
    }

    #[test]
    fn song_duration_defaults() {
        let song = Song::from_draft(draft(
            json!({"title": "Track", "artist": "Band", "year": 2001}),
        ))
        .expect("complete draft");
        assert_eq!(song.duration, "0:00");
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut series = seed_catalog().series[1].clone();
        let patch: SeriesPatch = draft(json!({"id": 2, "rating": 9.1, "unknown": "ignored"}));
        series.apply(patch);
        assert_eq!(series.rating, 9.1);
        assert_eq!(series.title, "Stranger Things");
        assert_eq!(series.creator, "The Duffer Brothers");
        assert_eq!(series.seasons, 4);
        assert_eq!(series.genre, "Sci-Fi");
        assert_eq!(series.year, 2022);
    }

    #[test]
    fn null_patch_fields_are_ignored() {
        let mut song = seed_catalog().songs[0].clone();
        let patch: SongPatch = draft(json!({"id": 1, "genre": null, "duration": "4:21"}));
        song.apply(patch);
        assert_eq!(song.genre, "R&B");
        assert_eq!(song.duration, "4:21");
    }

    #[test]
    fn patch_carries_its_target_id() {
        let patch: MoviePatch = draft(json!({"id": 4, "rating": 8.1}));
        assert_eq!(Movie::target(&patch), Some(4));
        let zero: SongPatch = draft(json!({"id": 0, "title": "T"}));
        assert_eq!(Song::target(&zero), None);
        let missing: SeriesPatch = draft(json!({"rating": 1.0}));
        assert_eq!(Series::target(&missing), None);
    }

    #[test]
    fn selector_treats_zero_as_missing() {
        let zero: Selector = draft(json!({"id": 0}));
        assert_eq!(zero.id(), None);
        let present: Selector = draft(json!({"id": 3}));
        assert_eq!(present.id(), Some(3));
    }

    #[test]
    fn seed_has_four_of_each() {
        let catalog = seed_catalog();
        assert_eq!(catalog.movies.len(), 4);
        assert_eq!(catalog.series.len(), 4);
        assert_eq!(catalog.songs.len(), 4);
    }

    #[test]
    fn catalog_tolerates_missing_collections() {
        let catalog: Catalog = serde_json::from_str(r#"{"movies": []}"#).expect("parses");
        assert!(catalog.series.is_empty());
        assert!(catalog.songs.is_empty());
    }
}
