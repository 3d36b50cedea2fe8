use chrono::NaiveDate;
use sqlx::{types::Json, FromRow, PgPool};

use crate::{
    db::TrackCatalog,
    error::AppResult,
    models::{AudioFeatures, Mood, Signal, TimeOfDay, Track, Weather},
};

const TRACK_COLUMNS: &str = "id, external_id, name, artist, album, release_date, popularity, \
                             audio_features, preview_url, image_url";

#[derive(Debug, FromRow)]
struct TrackRow {
    id: String,
    external_id: String,
    name: String,
    artist: String,
    album: String,
    release_date: Option<NaiveDate>,
    popularity: i32,
    audio_features: Json<AudioFeatures>,
    preview_url: Option<String>,
    image_url: Option<String>,
}

impl From<TrackRow> for Track {
    fn from(row: TrackRow) -> Self {
        Track {
            id: row.id,
            external_id: row.external_id,
            name: row.name,
            artist: row.artist,
            album: row.album,
            release_date: row.release_date,
            popularity: row.popularity,
            audio_features: row.audio_features.0,
            preview_url: row.preview_url,
            image_url: row.image_url,
        }
    }
}

/// SQL filter over the `audio_features` JSONB column for signals that have a
/// dedicated retrieval rule. Mirrors the feature rules on [`AudioFeatures`].
fn signal_predicate(signal: Signal) -> Option<&'static str> {
    let predicate = match signal {
        Signal::Mood(Mood::Happy) => "(audio_features->>'valence')::float8 > 0.7 \
             AND (audio_features->>'energy')::float8 > 0.5",
        Signal::Mood(Mood::Sad) => "(audio_features->>'valence')::float8 < 0.4 \
             AND (audio_features->>'energy')::float8 < 0.5",
        Signal::Mood(Mood::Energetic) => "(audio_features->>'energy')::float8 > 0.8 \
             AND (audio_features->>'tempo')::float8 > 120",
        Signal::Mood(Mood::Calm) => "(audio_features->>'energy')::float8 < 0.4 \
             AND (audio_features->>'acousticness')::float8 > 0.5",
        Signal::Mood(Mood::Focused) => "(audio_features->>'instrumentalness')::float8 > 0.5 \
             AND (audio_features->>'energy')::float8 < 0.7",
        Signal::Mood(Mood::Romantic) => "(audio_features->>'valence')::float8 > 0.5 \
             AND (audio_features->>'energy')::float8 < 0.6 \
             AND (audio_features->>'acousticness')::float8 > 0.4",
        Signal::Mood(Mood::Nostalgic) => "(audio_features->>'valence')::float8 > 0.3 \
             AND (audio_features->>'valence')::float8 < 0.7 \
             AND (audio_features->>'acousticness')::float8 > 0.4",
        Signal::Mood(Mood::Party) => "(audio_features->>'danceability')::float8 > 0.7 \
             AND (audio_features->>'energy')::float8 > 0.7",
        Signal::Mood(Mood::Melancholy) => "(audio_features->>'valence')::float8 < 0.4 \
             AND (audio_features->>'energy')::float8 < 0.5 \
             AND (audio_features->>'acousticness')::float8 > 0.5",
        Signal::Weather(Weather::Rainy) => "(audio_features->>'valence')::float8 < 0.5 \
             AND (audio_features->>'acousticness')::float8 > 0.5",
        Signal::TimeOfDay(TimeOfDay::Morning) => "(audio_features->>'valence')::float8 > 0.5 \
             AND (audio_features->>'energy')::float8 > 0.5 \
             AND (audio_features->>'energy')::float8 < 0.8",
        _ => return None,
    };
    Some(predicate)
}

/// Track catalog backed by the `tracks` table
#[derive(Clone)]
pub struct PgTrackCatalog {
    pool: PgPool,
}

impl PgTrackCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TrackCatalog for PgTrackCatalog {
    async fn get_track_by_id(&self, id: &str) -> AppResult<Option<Track>> {
        let row = sqlx::query_as::<_, TrackRow>(&format!(
            "SELECT {} FROM tracks WHERE id = $1",
            TRACK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Track::from))
    }

    async fn retrieve_by_signal(&self, signal: Signal, limit: usize) -> AppResult<Vec<Track>> {
        let Some(predicate) = signal_predicate(signal) else {
            tracing::debug!(
                signal = %signal,
                "No dedicated retrieval rule, falling back to most popular"
            );
            return self.get_most_popular(limit).await;
        };

        let sql = format!(
            "SELECT {} FROM tracks WHERE {} ORDER BY popularity DESC, id ASC LIMIT $1",
            TRACK_COLUMNS,
            predicate
        );

        let rows = sqlx::query_as::<_, TrackRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let fetched = rows.len();
        let tracks: Vec<Track> = rows
            .into_iter()
            .map(Track::from)
            .filter(|track| signal.matches(&track.audio_features))
            .collect();

        if tracks.len() != fetched {
            tracing::warn!(
                signal = %signal,
                fetched,
                kept = tracks.len(),
                "Stored audio features disagree with the retrieval rule"
            );
        }

        tracing::debug!(signal = %signal, count = tracks.len(), "Retrieved candidates");

        Ok(tracks)
    }

    async fn get_most_popular(&self, limit: usize) -> AppResult<Vec<Track>> {
        let rows = sqlx::query_as::<_, TrackRow>(&format!(
            "SELECT {} FROM tracks ORDER BY popularity DESC, id ASC LIMIT $1",
            TRACK_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Track::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_flagged_signal_has_a_predicate() {
        for mood in Mood::ALL {
            assert!(signal_predicate(Signal::Mood(mood)).is_some());
        }
        assert!(signal_predicate(Signal::Weather(Weather::Rainy)).is_some());
        assert!(signal_predicate(Signal::TimeOfDay(TimeOfDay::Morning)).is_some());
    }

    #[test]
    fn test_predicates_agree_with_dedicated_flag() {
        let all = Mood::ALL
            .into_iter()
            .map(Signal::Mood)
            .chain(Weather::ALL.into_iter().map(Signal::Weather))
            .chain(TimeOfDay::ALL.into_iter().map(Signal::TimeOfDay));

        for signal in all {
            assert_eq!(
                signal_predicate(signal).is_some(),
                signal.has_dedicated_predicate(),
                "mismatch for {}",
                signal
            );
        }
    }

    #[test]
    fn test_predicates_cast_features_to_float() {
        let sql = signal_predicate(Signal::Mood(Mood::Happy)).unwrap();
        assert!(sql.contains("(audio_features->>'valence')::float8 > 0.7"));
        assert!(sql.contains("(audio_features->>'energy')::float8 > 0.5"));
    }

    #[test]
    fn test_track_row_conversion() {
        let row = TrackRow {
            id: "t1".to_string(),
            external_id: "4uLU6hMCjMI75M1A2tKUQC".to_string(),
            name: "Song".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            release_date: NaiveDate::from_ymd_opt(1987, 7, 27),
            popularity: 83,
            audio_features: Json(AudioFeatures {
                tempo: 113.0,
                ..Default::default()
            }),
            preview_url: None,
            image_url: Some("https://i.scdn.co/image/abc".to_string()),
        };

        let track = Track::from(row);
        assert_eq!(track.id, "t1");
        assert_eq!(track.popularity, 83);
        assert_eq!(track.tempo(), 113.0);
    }
}
