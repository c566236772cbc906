//! TLE data types and communication structures

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{
    Arc, Mutex,
    mpsc::{Receiver, Sender},
};

use crate::error::LoadError;

/// Where a satellite's element set comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TleSource {
    /// Catalog number, fetched from Celestrak
    Norad(u32),
    Url(String),
    File(PathBuf),
    /// Element set text embedded in the configuration
    Inline(String),
}

impl fmt::Display for TleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TleSource::Norad(norad) => write!(f, "NORAD {}", norad),
            TleSource::Url(url) => write!(f, "{}", url),
            TleSource::File(path) => write!(f, "{}", path.display()),
            TleSource::Inline(_) => write!(f, "inline element set"),
        }
    }
}

/// Raw two-line element text as extracted from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleText {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

/// Index of a satellite trace within a display session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(pub usize);

/// Identifies one load request. Only the ticket with the trace's current
/// generation is applied; anything older is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub trace: TraceId,
    pub generation: u64,
}

/// Starts asynchronous element set loads.
pub trait ElementSetLoader {
    fn request(&mut self, ticket: LoadTicket, source: &TleSource) -> Result<(), LoadError>;
}

/// Commands for the TLE fetcher worker thread
#[derive(Debug)]
pub enum FetchCommand {
    Fetch {
        ticket: LoadTicket,
        source: TleSource,
    },
}

/// Results from the TLE fetcher worker thread
#[derive(Debug)]
pub struct FetchResultMsg {
    pub ticket: LoadTicket,
    pub result: Result<TleText, LoadError>,
}

/// Resource containing channels for communicating with the TLE worker thread
#[derive(Resource, Clone)]
pub struct FetchChannels {
    pub cmd_tx: Sender<FetchCommand>,
    pub res_rx: Arc<Mutex<Receiver<FetchResultMsg>>>,
}

impl ElementSetLoader for FetchChannels {
    fn request(&mut self, ticket: LoadTicket, source: &TleSource) -> Result<(), LoadError> {
        self.cmd_tx
            .send(FetchCommand::Fetch {
                ticket,
                source: source.clone(),
            })
            .map_err(|_| LoadError::WorkerGone)
    }
}
