//! In-memory gateway
//!
//! Keeps every collection in process. Used by tests and for running the
//! views without a backend. Can be switched into a failing mode and given
//! an artificial latency.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{Endpoint, Gateway, GatewayError, GatewayResult};
use crate::diary::{DiaryEntry, NewDiaryEntry};
use crate::hydration::{aggregate_daily, DailyTotal, IntakeEntry};
use crate::sleep::{NewSleepEntry, SleepAnalysis, SleepEntry};

#[derive(Default)]
struct Store {
    intake: Vec<IntakeEntry>,
    diary: Vec<DiaryEntry>,
    sleep: Vec<SleepEntry>,
    analysis: Option<SleepAnalysis>,
    next_id: u64,
    now: Option<DateTime<Utc>>,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Keep new ids above every seeded one
    fn bump_id(&mut self, seeded: Option<u64>) {
        self.next_id = self.next_id.max(seeded.unwrap_or(0));
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

/// Gateway backed by in-process collections
#[derive(Default)]
pub struct InMemoryGateway {
    store: Mutex<Store>,
    failing: AtomicBool,
    failing_endpoints: Mutex<HashSet<Endpoint>>,
    latency: Mutex<Option<Duration>>,
    requests: AtomicUsize,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed intake entries, oldest first
    pub fn with_intake(self, entries: Vec<IntakeEntry>) -> Self {
        if let Ok(mut store) = self.store.lock() {
            store.bump_id(entries.iter().map(|e| e.id).max());
            store.intake = entries;
        }
        self
    }

    /// Seed diary entries
    pub fn with_diary(self, entries: Vec<DiaryEntry>) -> Self {
        if let Ok(mut store) = self.store.lock() {
            store.bump_id(entries.iter().map(|e| e.id).max());
            store.diary = entries;
        }
        self
    }

    /// Seed sleep entries
    pub fn with_sleep(self, entries: Vec<SleepEntry>) -> Self {
        if let Ok(mut store) = self.store.lock() {
            store.bump_id(entries.iter().map(|e| e.id).max());
            store.sleep = entries;
        }
        self
    }

    /// Serve a fixed sleep analysis instead of computing one
    pub fn with_analysis(self, analysis: SleepAnalysis) -> Self {
        if let Ok(mut store) = self.store.lock() {
            store.analysis = Some(analysis);
        }
        self
    }

    /// Make every request fail as if the backend were down
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make requests to `endpoint` fail while others keep working
    pub fn set_endpoint_failing(&self, endpoint: Endpoint, failing: bool) {
        if let Ok(mut endpoints) = self.failing_endpoints.lock() {
            if failing {
                endpoints.insert(endpoint);
            } else {
                endpoints.remove(&endpoint);
            }
        }
    }

    /// Delay every response by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut slot) = self.latency.lock() {
            *slot = latency;
        }
    }

    /// Fix the timestamp assigned to new entries
    pub fn set_now(&self, now: DateTime<Utc>) {
        if let Ok(mut store) = self.store.lock() {
            store.now = Some(now);
        }
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Stored intake entries, oldest first
    pub fn intake(&self) -> Vec<IntakeEntry> {
        self.store
            .lock()
            .map(|store| store.intake.clone())
            .unwrap_or_default()
    }

    async fn begin(&self, endpoint: Endpoint) -> GatewayResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency.lock().ok().and_then(|slot| *slot);
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }

        let endpoint_down = self
            .failing_endpoints
            .lock()
            .map(|endpoints| endpoints.contains(&endpoint))
            .unwrap_or(false);
        if endpoint_down || self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable { endpoint });
        }
        Ok(())
    }

    fn lock(&self, endpoint: Endpoint) -> GatewayResult<MutexGuard<'_, Store>> {
        self.store.lock().map_err(|_| GatewayError::Api {
            endpoint,
            status: 500,
            message: "store poisoned".to_string(),
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn list_intake(&self) -> GatewayResult<Vec<IntakeEntry>> {
        self.begin(Endpoint::ListIntake).await?;
        let store = self.lock(Endpoint::ListIntake)?;
        Ok(store.intake.iter().rev().cloned().collect())
    }

    async fn create_intake(&self, user: u64, amount: f64) -> GatewayResult<IntakeEntry> {
        self.begin(Endpoint::CreateIntake).await?;
        let mut store = self.lock(Endpoint::CreateIntake)?;
        if amount < 0.0 {
            return Err(GatewayError::Api {
                endpoint: Endpoint::CreateIntake,
                status: 400,
                message: "amount must not be negative".to_string(),
            });
        }

        let entry = IntakeEntry {
            id: store.next_id(),
            user,
            amount,
            timestamp: timestamp(store.now()),
        };
        store.intake.push(entry.clone());
        Ok(entry)
    }

    async fn daily_totals(&self, user: u64) -> GatewayResult<Vec<DailyTotal>> {
        self.begin(Endpoint::DailyTotals).await?;
        let store = self.lock(Endpoint::DailyTotals)?;
        let owned: Vec<IntakeEntry> = store
            .intake
            .iter()
            .filter(|e| e.user == user)
            .cloned()
            .collect();
        Ok(aggregate_daily(&owned))
    }

    async fn list_diary(&self, user: u64) -> GatewayResult<Vec<DiaryEntry>> {
        self.begin(Endpoint::ListDiary).await?;
        let store = self.lock(Endpoint::ListDiary)?;
        Ok(store
            .diary
            .iter()
            .filter(|e| e.user == user)
            .cloned()
            .collect())
    }

    async fn create_diary(&self, entry: &NewDiaryEntry) -> GatewayResult<DiaryEntry> {
        self.begin(Endpoint::CreateDiary).await?;
        let mut store = self.lock(Endpoint::CreateDiary)?;
        let created = DiaryEntry {
            id: store.next_id(),
            user: entry.user,
            date: timestamp(store.now()),
            mood_descriptors: entry.mood_descriptors(),
            emotional_rating: entry.rating,
        };
        store.diary.push(created.clone());
        Ok(created)
    }

    async fn list_sleep(&self) -> GatewayResult<Vec<SleepEntry>> {
        self.begin(Endpoint::ListSleep).await?;
        let store = self.lock(Endpoint::ListSleep)?;
        Ok(store.sleep.clone())
    }

    async fn create_sleep(&self, entry: &NewSleepEntry) -> GatewayResult<SleepEntry> {
        self.begin(Endpoint::CreateSleep).await?;
        let mut store = self.lock(Endpoint::CreateSleep)?;
        let created = SleepEntry {
            id: store.next_id(),
            user: entry.user,
            sleep_start: entry.sleep_start.clone(),
            sleep_end: entry.sleep_end.clone(),
            quality: entry.quality,
            duration: entry.duration_hours(),
        };
        store.sleep.push(created.clone());
        Ok(created)
    }

    async fn sleep_analysis(&self, user: u64) -> GatewayResult<SleepAnalysis> {
        self.begin(Endpoint::SleepAnalysis).await?;
        let store = self.lock(Endpoint::SleepAnalysis)?;
        if let Some(analysis) = &store.analysis {
            return Ok(analysis.clone());
        }

        let nights: Vec<&SleepEntry> = store.sleep.iter().filter(|e| e.user == user).collect();
        if nights.is_empty() {
            return Ok(SleepAnalysis::default());
        }
        let quality: f64 = nights.iter().map(|e| f64::from(e.quality)).sum();
        let hours: f64 = nights.iter().filter_map(|e| e.duration).sum();
        Ok(SleepAnalysis {
            average_quality: Some(quality / nights.len() as f64),
            total_duration: Some(hours * 3600.0),
        })
    }
}
