//! Joke fetching for the `/joke` command.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Something that can tell a joke
#[async_trait]
pub trait JokeSource: Send + Sync {
    async fn fetch_joke(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct JokeResponse {
    joke: String,
}

/// icanhazdadjoke.com client
pub struct DadJokeClient {
    client: reqwest::Client,
    url: String,
}

impl DadJokeClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("lieksika-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl JokeSource for DadJokeClient {
    async fn fetch_joke(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;

        let body: JokeResponse = response.json().await?;
        parse_joke(body)
    }
}

fn parse_joke(body: JokeResponse) -> Result<String> {
    let joke = body.joke.trim();
    if joke.is_empty() {
        anyhow::bail!("Joke service returned an empty joke");
    }
    Ok(joke.to_string())
}
