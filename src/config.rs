//! Application configuration
//!
//! Loaded from JSON: the path in `SATSTATUS_CONFIG` if set, else
//! `satstatus.json` in the platform config directory, else built-in
//! defaults tracking the ISS.

use anyhow::Context;
use bevy::color::{Color, Srgba};
use bevy::log::info;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::orbit_camera::CameraConfig;
use crate::error::ConfigError;
use crate::orbital::time::ClockConfig;
use crate::tle::{TleConfig, TleSource};
use crate::trace::TraceConfig;

pub const CONFIG_ENV: &str = "SATSTATUS_CONFIG";
const CONFIG_FILE: &str = "satstatus.json";
const ISS_NORAD: u32 = 25544;

/// One tracked satellite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteConfig {
    pub source: TleSource,
    #[serde(default)]
    pub label: Option<String>,
    /// `#rrggbb` hex colour; a golden-angle hue is picked when absent
    #[serde(default)]
    pub color: Option<String>,
}

impl SatelliteConfig {
    pub fn from_source(source: TleSource) -> Self {
        Self {
            source,
            label: None,
            color: None,
        }
    }

    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.source.to_string())
    }

    /// Configured colour, or the `index`-th golden-angle hue.
    pub fn resolved_color(&self, index: usize) -> Result<Color, ConfigError> {
        match &self.color {
            Some(hex) => parse_hex_color(hex),
            None => Ok(golden_angle_color(index)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub trace: TraceConfig,
    pub sun_trace: TraceConfig,
    pub clock: ClockConfig,
    pub camera: CameraConfig,
    pub tle: TleConfig,
    pub satellites: Vec<SatelliteConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            trace: TraceConfig::default(),
            sun_trace: TraceConfig::default(),
            clock: ClockConfig::default(),
            camera: CameraConfig::default(),
            tle: TleConfig::default(),
            satellites: vec![SatelliteConfig::from_source(TleSource::Norad(ISS_NORAD))],
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }
        if let Some(path) = default_path().filter(|p| p.exists()) {
            return Self::load_from(&path);
        }
        info!("[CONFIG] no configuration file, using defaults");
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_json(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!("[CONFIG] loaded {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trace.validate()?;
        self.sun_trace.validate()?;
        self.camera.validate()?;
        if self.tle.cache_expiration_days <= 0 {
            return Err(ConfigError::Invalid {
                field: "cache_expiration_days",
                reason: "must be positive".into(),
            });
        }
        for (index, satellite) in self.satellites.iter().enumerate() {
            satellite.resolved_color(index)?;
        }
        Ok(())
    }
}

fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "satstatus").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

pub fn parse_hex_color(hex: &str) -> Result<Color, ConfigError> {
    Srgba::hex(hex)
        .map(Color::from)
        .map_err(|_| ConfigError::BadColor(hex.to_string()))
}

/// Well-spread hues for successive traces
pub fn golden_angle_color(index: usize) -> Color {
    Color::hsl((index as f32 * 137.5) % 360.0, 0.8, 0.5)
}
