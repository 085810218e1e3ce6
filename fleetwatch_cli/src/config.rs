use std::env;

use fleetwatch_feed::{
    client::LiveFeedParams,
    snapshot::{SnapshotFetcherParams, SnapshotFetcher},
};

pub const DEFAULT_FEED_URL: &str = "ws://127.0.0.1:8080/fleet/ws";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

pub struct Config {
    pub feed_url: String,
    pub api_url: String,
    pub api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            feed_url: env::var("FLEETWATCH_FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_owned()),
            api_url: env::var("FLEETWATCH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned()),
            api_token: env::var("FLEETWATCH_API_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
        }
    }

    pub fn feed_params(&self) -> LiveFeedParams {
        LiveFeedParams::new(self.feed_url.clone())
    }

    pub fn fetcher(&self) -> anyhow::Result<SnapshotFetcher> {
        let mut params = SnapshotFetcherParams::new(self.api_url.clone());
        params.api_token = self.api_token.clone();

        Ok(SnapshotFetcher::new(params)?)
    }
}
