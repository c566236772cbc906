//! Trace line drawing via gizmos

use bevy::prelude::*;

use super::scene::SessionResource;

/// Draw every live segment with its faded colour
pub fn draw_trace_segments(mut gizmos: Gizmos, session: Res<SessionResource>) {
    for segment in session.renderer().segments() {
        if segment.opacity <= 0.0 || !segment.within_draw_distance() {
            continue;
        }
        gizmos.line(
            segment.a.as_vec3(),
            segment.b.as_vec3(),
            segment.color.with_alpha(segment.opacity),
        );
    }
}
