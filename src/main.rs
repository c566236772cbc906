use anyhow::Context;
use bevy::prelude::*;
use bevy::render::RenderPlugin;
use bevy::render::settings::{RenderCreation, WgpuSettings};
use bevy::window::{PresentMode, Window, WindowPlugin};

#[cfg(feature = "dev")]
use bevy::dev_tools::fps_overlay::FpsOverlayPlugin;

use satstatus::config::AppConfig;
use satstatus::core::{DisplaySession, RealtimeTimer, SessionPlugin};
use satstatus::tle::{FetchChannels, TlePlugin, start_tle_worker};
use satstatus::ui::UiPlugin;
use satstatus::visualization::{SceneSegments, SessionResource, VisualizationPlugin};

/// Build the display session and queue the configured satellites
fn build_session(config: &AppConfig, loader: FetchChannels) -> anyhow::Result<SessionResource> {
    let mut session = DisplaySession::new(SceneSegments::default(), config, chrono::Utc::now())
        .context("invalid session configuration")?;
    session.set_loader(Box::new(loader));

    for (index, sat) in config.satellites.iter().enumerate() {
        let color = sat
            .resolved_color(index)
            .with_context(|| format!("satellite {}", sat.display_label()))?;
        session.add_satellite(sat.display_label(), sat.source.clone(), color);
    }
    Ok(SessionResource(session))
}

fn main() -> anyhow::Result<()> {
    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Satellite Status".to_string(),
                    present_mode: PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            })
            .set(RenderPlugin {
                render_creation: RenderCreation::Automatic(WgpuSettings { ..default() }),
                ..default()
            }),
    );

    #[cfg(feature = "dev")]
    app.add_plugins(FpsOverlayPlugin::default());

    // Logging is up once DefaultPlugins are added
    let config = AppConfig::load()?;
    let fetch = start_tle_worker(config.tle.clone())?;
    let session = build_session(&config, fetch.clone())?;

    app.insert_resource(fetch)
        .insert_resource(session)
        .insert_resource(RealtimeTimer::from_millis(config.clock.realtime_update_ms));

    app.add_plugins(SessionPlugin);
    app.add_plugins(TlePlugin);
    app.add_plugins(UiPlugin);
    app.add_plugins(VisualizationPlugin);

    app.run();
    Ok(())
}
