//! TLE processing systems

use bevy::prelude::*;

use crate::core::LoadOutcome;
use crate::tle::types::FetchChannels;
use crate::visualization::SessionResource;

/// System to drain fetch results into the session
pub fn process_fetch_results_system(
    mut session: ResMut<SessionResource>,
    fetch: Option<Res<FetchChannels>>,
) {
    let Some(fetch) = fetch else { return };
    let Ok(guard) = fetch.res_rx.lock() else {
        return;
    };
    while let Ok(msg) = guard.try_recv() {
        let trace = msg.ticket.trace;
        // failures are logged and kept on the trace by the session
        if session.complete_load(msg.ticket, msg.result) == LoadOutcome::Applied {
            debug!("[TLE] trace {} updated", trace.0);
        }
    }
}
