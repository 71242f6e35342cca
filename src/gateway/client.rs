//! Wellness gateway REST client
//!
//! HTTP client for the hydration, diary and sleep collection endpoints.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::dto::{CreateIntakeRequest, DailyTotalsResponse};
use super::{Endpoint, Gateway, GatewayError, GatewayResult};
use crate::config::GatewayConfig;
use crate::diary::{DiaryEntry, NewDiaryEntry};
use crate::hydration::{DailyTotal, IntakeEntry};
use crate::sleep::{NewSleepEntry, SleepAnalysis, SleepEntry};

/// REST client for the wellness gateway
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a client for the configured gateway
    pub fn new(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("wellspring/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint, path: &str) -> GatewayResult<T> {
        let url = self.url(path);
        tracing::debug!(endpoint = %endpoint, url = %url, "Gateway request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(endpoint, e))?;

        Self::read(endpoint, response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        let url = self.url(path);
        tracing::debug!(endpoint = %endpoint, url = %url, "Gateway request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(endpoint, e))?;

        Self::read(endpoint, response).await
    }

    async fn read<T: DeserializeOwned>(endpoint: Endpoint, response: Response) -> GatewayResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                endpoint,
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::from_reqwest(endpoint, e))?;

        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode {
            endpoint,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_intake(&self) -> GatewayResult<Vec<IntakeEntry>> {
        self.get_json(Endpoint::ListIntake, "/hydration/").await
    }

    async fn create_intake(&self, user: u64, amount: f64) -> GatewayResult<IntakeEntry> {
        let body = CreateIntakeRequest { user, amount };
        self.post_json(Endpoint::CreateIntake, "/hydration/", &body)
            .await
    }

    async fn daily_totals(&self, user: u64) -> GatewayResult<Vec<DailyTotal>> {
        let path = format!("/hydration/total_water_intake_by_user/{user}/");
        let body: DailyTotalsResponse = self.get_json(Endpoint::DailyTotals, &path).await?;
        Ok(body.daily_totals)
    }

    async fn list_diary(&self, user: u64) -> GatewayResult<Vec<DiaryEntry>> {
        let path = format!("/diary/user_log/{user}/");
        self.get_json(Endpoint::ListDiary, &path).await
    }

    async fn create_diary(&self, entry: &NewDiaryEntry) -> GatewayResult<DiaryEntry> {
        self.post_json(Endpoint::CreateDiary, "/diary/", &entry.to_request())
            .await
    }

    async fn list_sleep(&self) -> GatewayResult<Vec<SleepEntry>> {
        self.get_json(Endpoint::ListSleep, "/sleep/").await
    }

    async fn create_sleep(&self, entry: &NewSleepEntry) -> GatewayResult<SleepEntry> {
        self.post_json(Endpoint::CreateSleep, "/sleep/", &entry.to_request())
            .await
    }

    async fn sleep_analysis(&self, user: u64) -> GatewayResult<SleepAnalysis> {
        let path = format!("/sleep/sleep_analysis/{user}/");
        self.get_json(Endpoint::SleepAnalysis, &path).await
    }
}
