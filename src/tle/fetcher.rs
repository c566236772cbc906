//! TLE fetching functionality
//!
//! A background thread owns a tokio runtime and a reqwest client and serves
//! [`FetchCommand`]s one at a time. Every result carries the request's
//! ticket back so the session can drop responses that were superseded.

use bevy::log::{error, info, warn};
use std::path::Path;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use crate::error::{ElementSetParseError, LoadError};
use crate::tle::TleConfig;
use crate::tle::cache::TleCache;
use crate::tle::parser::extract_tle_block;
use crate::tle::types::{FetchChannels, FetchCommand, FetchResultMsg, TleSource, TleText};

/// Start the background TLE worker thread
pub fn start_tle_worker(config: TleConfig) -> Result<FetchChannels, anyhow::Error> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<FetchCommand>();
    let (res_tx, res_rx) = mpsc::channel::<FetchResultMsg>();

    let cache = if config.use_cache {
        match TleCache::new(config.cache_expiration_days) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("[TLE] disk cache disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    thread::Builder::new()
        .name("tle-fetch".into())
        .spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("[TLE] could not start runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async move {
                let client = reqwest::Client::new();
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        FetchCommand::Fetch { ticket, source } => {
                            let result =
                                load_source(&client, &config, cache.as_ref(), &source).await;
                            match &result {
                                Ok(text) => info!(
                                    "[TLE RESULT] {} SUCCESS name={}",
                                    source,
                                    text.name.as_deref().unwrap_or("None")
                                ),
                                Err(e) => warn!("[TLE RESULT] {} FAILURE: {}", source, e),
                            }
                            if res_tx.send(FetchResultMsg { ticket, result }).is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        })?;

    Ok(FetchChannels {
        cmd_tx,
        res_rx: Arc::new(Mutex::new(res_rx)),
    })
}

/// Celestrak GP endpoint for a single catalog number
pub fn celestrak_url(base_url: &str, norad: u32) -> String {
    format!("{}?CATNR={}&FORMAT=TLE", base_url, norad)
}

/// Pick the element set out of a response body.
pub fn parse_body(body: &str, norad: Option<u32>) -> Result<TleText, LoadError> {
    let (name, line1, line2) =
        extract_tle_block(body, norad).ok_or(ElementSetParseError::MissingLines)?;
    Ok(TleText { name, line1, line2 })
}

/// Resolve one source to element set text.
pub async fn load_source(
    client: &reqwest::Client,
    config: &TleConfig,
    cache: Option<&TleCache>,
    source: &TleSource,
) -> Result<TleText, LoadError> {
    match source {
        TleSource::Inline(text) => parse_body(text, None),
        TleSource::File(path) => parse_body(&read_file(path).await?, None),
        TleSource::Url(url) => parse_body(&fetch_text(client, url).await?, None),
        TleSource::Norad(norad) => {
            if let Some(text) = cache.and_then(|c| c.lookup(*norad)) {
                return Ok(text);
            }
            let url = celestrak_url(&config.base_url, *norad);
            let text = parse_body(&fetch_text(client, &url).await?, Some(*norad))?;
            if let Some(cache) = cache {
                cache.store(*norad, &text);
            }
            Ok(text)
        }
    }
}

async fn read_file(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, LoadError> {
    let resp = client
        .get(url)
        .header("accept", "text/plain")
        .send()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;
    info!("[TLE FETCH] status={} url={} bytes={}", status, url, body.len());
    if !status.is_success() {
        return Err(LoadError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(body)
}
