//! Mood diary
//!
//! View model over the user's diary log: most logged mood, today's entry,
//! the emotional rating chart, and validated new entries.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::aggregate::{most_frequent, tally, Series};
use crate::gateway::dto::CreateDiaryRequest;
use crate::gateway::{Gateway, GatewayResult};
use crate::hydration::{date_prefix, parse_timestamp};
use crate::session::Session;
use crate::validation::{check_range, ValidationError};

/// Moods a diary entry can be tagged with
pub const MOOD_CHOICES: [&str; 10] = [
    "productive",
    "energetic",
    "happy",
    "motivated",
    "content",
    "relaxed",
    "accomplished",
    "tired",
    "stressed",
    "anxious",
];

/// One diary log as stored by the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiaryEntry {
    pub id: u64,
    pub user: u64,
    /// ISO date or date-time
    pub date: String,
    /// Comma-separated moods
    #[serde(default)]
    pub mood_descriptors: String,
    /// 1 (worst) to 10 (best)
    pub emotional_rating: u8,
}

impl DiaryEntry {
    /// Individual moods, trimmed, without empty items
    pub fn moods(&self) -> impl Iterator<Item = &str> {
        self.mood_descriptors
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    fn sort_key(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.date)
            .map(|dt| dt.naive_utc())
            .or_else(|| {
                NaiveDate::parse_from_str(date_prefix(&self.date), "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    fn day(&self) -> &str {
        date_prefix(&self.date)
    }
}

/// Order entries newest first; undated entries go last
pub fn sort_recent_first(entries: &mut [DiaryEntry]) {
    entries.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
}

/// The mood that appears most often across all entries
pub fn most_logged_mood(entries: &[DiaryEntry]) -> Option<String> {
    let counts = tally(entries.iter().flat_map(DiaryEntry::moods), |m| m.to_string());
    most_frequent(&counts)
}

/// The newest entry, if it was logged on `today`
pub fn logged_today(entries: &[DiaryEntry], today: NaiveDate) -> Option<&DiaryEntry> {
    let latest = entries.iter().max_by_key(|e| e.sort_key())?;
    let key = today.format("%Y-%m-%d").to_string();
    (latest.day() == key).then_some(latest)
}

pub fn rating_emoji(rating: u8) -> &'static str {
    match rating {
        8.. => "😊",
        6..=7 => "🙂",
        4..=5 => "😐",
        2..=3 => "😟",
        _ => "😞",
    }
}

/// Emotional rating per entry, labelled by date
pub fn rating_series(entries: &[DiaryEntry]) -> Series {
    entries
        .iter()
        .map(|e| (e.day().to_string(), f64::from(e.emotional_rating)))
        .collect()
}

/// A validated diary entry ready to submit
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiaryEntry {
    pub user: u64,
    pub moods: Vec<String>,
    pub rating: u8,
}

impl NewDiaryEntry {
    /// Rating must be 1..=10 and every mood one of [`MOOD_CHOICES`]
    pub fn new<S: AsRef<str>>(user: u64, moods: &[S], rating: u8) -> Result<Self, ValidationError> {
        check_range("rating", i64::from(rating), 1, 10)?;

        let mut picked = Vec::with_capacity(moods.len());
        for mood in moods {
            let mood = mood.as_ref().trim().to_lowercase();
            if !MOOD_CHOICES.contains(&mood.as_str()) {
                return Err(ValidationError::UnknownMood(mood));
            }
            if !picked.contains(&mood) {
                picked.push(mood);
            }
        }

        Ok(Self {
            user,
            moods: picked,
            rating,
        })
    }

    /// Moods joined the way the gateway stores them
    pub fn mood_descriptors(&self) -> String {
        self.moods.join(",")
    }

    pub(crate) fn to_request(&self) -> CreateDiaryRequest {
        CreateDiaryRequest {
            user: self.user,
            mood_descriptors: self.mood_descriptors(),
            emotional_rating: self.rating,
        }
    }
}

/// Everything the diary page shows
#[derive(Debug, Clone, Serialize)]
pub struct DiarySummary {
    /// Newest first
    pub entries: Vec<DiaryEntry>,
    pub most_logged_mood: Option<String>,
    pub today: Option<DiaryEntry>,
    pub ratings: Series,
}

impl DiarySummary {
    /// Sort `entries` newest first and derive the rest
    pub fn new(mut entries: Vec<DiaryEntry>, today: NaiveDate) -> Self {
        sort_recent_first(&mut entries);
        Self {
            most_logged_mood: most_logged_mood(&entries),
            today: logged_today(&entries, today).cloned(),
            ratings: rating_series(&entries),
            entries,
        }
    }

    /// Put a newly accepted entry in front and rebuild the derived fields
    pub fn insert(&mut self, entry: DiaryEntry, today: NaiveDate) {
        self.entries.insert(0, entry);
        self.most_logged_mood = most_logged_mood(&self.entries);
        self.today = logged_today(&self.entries, today).cloned();
        self.ratings = rating_series(&self.entries);
    }

    /// Emoji for today's rating, neutral when nothing was logged today
    pub fn today_emoji(&self) -> &'static str {
        self.today
            .as_ref()
            .map(|e| rating_emoji(e.emotional_rating))
            .unwrap_or("😐")
    }
}

/// Fetch the user's diary and build its summary
pub async fn load(gateway: &dyn Gateway, session: &Session, today: NaiveDate) -> GatewayResult<DiarySummary> {
    let entries = gateway.list_diary(session.user_id()).await?;

    tracing::debug!(entries = entries.len(), "Loaded diary");

    Ok(DiarySummary::new(entries, today))
}

/// Submit an entry and add it to `summary`
///
/// `summary` is untouched when the gateway rejects the entry.
pub async fn submit(
    gateway: &dyn Gateway,
    summary: &mut DiarySummary,
    entry: &NewDiaryEntry,
    today: NaiveDate,
) -> GatewayResult<DiaryEntry> {
    let created = gateway.create_diary(entry).await.inspect_err(|e| {
        tracing::warn!(endpoint = %e.endpoint(), error = %e, "Diary entry rejected");
    })?;

    tracing::info!(id = created.id, rating = created.emotional_rating, "Logged mood");
    summary.insert(created.clone(), today);

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Endpoint, InMemoryGateway};
    use chrono::{TimeZone, Utc};

    fn entry(id: u64, date: &str, moods: &str, rating: u8) -> DiaryEntry {
        DiaryEntry {
            id,
            user: 2,
            date: date.to_string(),
            mood_descriptors: moods.to_string(),
            emotional_rating: rating,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_most_logged_mood() {
        let entries = vec![
            entry(1, "2024-11-18", "happy,tired", 6),
            entry(2, "2024-11-19", "tired, stressed", 3),
            entry(3, "2024-11-20", "happy,tired", 7),
        ];
        assert_eq!(most_logged_mood(&entries), Some("tired".to_string()));
    }

    #[test]
    fn test_most_logged_mood_tie_prefers_later() {
        let entries = vec![entry(1, "2024-11-18", "happy", 6), entry(2, "2024-11-19", "relaxed", 6)];
        assert_eq!(most_logged_mood(&entries), Some("relaxed".to_string()));
    }

    #[test]
    fn test_most_logged_mood_empty() {
        assert_eq!(most_logged_mood(&[]), None);
        assert_eq!(most_logged_mood(&[entry(1, "2024-11-18", "", 5)]), None);
    }

    #[test]
    fn test_sort_and_logged_today() {
        let mut entries = vec![
            entry(1, "2024-11-18", "happy", 6),
            entry(3, "2024-11-20T08:30:00Z", "content", 8),
            entry(2, "2024-11-19", "tired", 4),
        ];
        sort_recent_first(&mut entries);
        let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        assert_eq!(logged_today(&entries, day("2024-11-20")).map(|e| e.id), Some(3));
        assert!(logged_today(&entries, day("2024-11-21")).is_none());
    }

    #[test]
    fn test_rating_emoji_bands() {
        assert_eq!(rating_emoji(10), "😊");
        assert_eq!(rating_emoji(8), "😊");
        assert_eq!(rating_emoji(7), "🙂");
        assert_eq!(rating_emoji(4), "😐");
        assert_eq!(rating_emoji(2), "😟");
        assert_eq!(rating_emoji(1), "😞");
    }

    #[test]
    fn test_new_entry_validation() {
        let ok = NewDiaryEntry::new(2, &["Happy", "tired", "happy"], 7).unwrap();
        assert_eq!(ok.mood_descriptors(), "happy,tired");

        assert!(matches!(
            NewDiaryEntry::new(2, &["happy"], 0),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            NewDiaryEntry::new(2, &["hangry"], 5),
            Err(ValidationError::UnknownMood(_))
        ));
    }

    #[tokio::test]
    async fn test_load_summary() {
        let gateway = InMemoryGateway::new().with_diary(vec![
            entry(1, "2024-11-19", "happy", 4),
            entry(2, "2024-11-20", "happy,content", 9),
        ]);
        let session = Session::new(2, 7.0).unwrap();

        let summary = load(&gateway, &session, day("2024-11-20")).await.unwrap();
        assert_eq!(summary.entries[0].id, 2);
        assert_eq!(summary.most_logged_mood.as_deref(), Some("happy"));
        assert_eq!(summary.today_emoji(), "😊");
        assert_eq!(summary.ratings.values, vec![9.0, 4.0]);
    }

    #[tokio::test]
    async fn test_submit_updates_summary() {
        let gateway = InMemoryGateway::new().with_diary(vec![entry(1, "2024-11-19", "tired", 3)]);
        gateway.set_now(Utc.with_ymd_and_hms(2024, 11, 20, 21, 0, 0).unwrap());
        let session = Session::new(2, 7.0).unwrap();
        let today = day("2024-11-20");

        let mut summary = load(&gateway, &session, today).await.unwrap();
        assert!(summary.today.is_none());
        assert_eq!(summary.today_emoji(), "😐");

        let new = NewDiaryEntry::new(2, &["happy", "relaxed"], 9).unwrap();
        let created = submit(&gateway, &mut summary, &new, today).await.unwrap();

        assert_eq!(summary.entries[0].id, created.id);
        assert_eq!(summary.today.as_ref().map(|e| e.id), Some(created.id));
        assert_eq!(summary.today_emoji(), "😊");
        // Three moods seen once each: the last one counted wins
        assert_eq!(summary.most_logged_mood.as_deref(), Some("tired"));
        assert_eq!(summary.ratings.values, vec![9.0, 3.0]);
        assert_eq!(gateway.list_diary(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_submit_leaves_summary() {
        let gateway = InMemoryGateway::new().with_diary(vec![entry(1, "2024-11-19", "tired", 3)]);
        let session = Session::new(2, 7.0).unwrap();
        let today = day("2024-11-20");
        let mut summary = load(&gateway, &session, today).await.unwrap();

        gateway.set_endpoint_failing(Endpoint::CreateDiary, true);
        let new = NewDiaryEntry::new(2, &["happy"], 9).unwrap();
        let err = submit(&gateway, &mut summary, &new, today).await.unwrap_err();

        assert_eq!(err.endpoint(), Endpoint::CreateDiary);
        assert_eq!(summary.entries.len(), 1);
        assert!(summary.today.is_none());
    }
}
