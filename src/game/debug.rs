//! Debug visualization for the hex grid.
//!
//! Toggle with the 'D' key. Shows:
//! - Cell outlines for every valid slot
//! - Occupied cells highlighted
//! - The danger rows near the shooter
//!
//! `F2` logs the current game state as JSON.

use bevy::{color::palettes::css, input::common_conditions::input_just_pressed, prelude::*};

use super::{
    grid::GridBounds,
    hex::{PlayArea, ROW_PACKING},
    session::Session,
};
use crate::AppSystems;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<DebugGridVisible>();

    app.add_systems(
        Update,
        (
            toggle_debug.run_if(input_just_pressed(KeyCode::KeyD)),
            dump_state.run_if(input_just_pressed(KeyCode::F2)),
        )
            .in_set(AppSystems::RecordInput),
    );

    app.add_systems(
        Update,
        (draw_walls, draw_debug_grid.run_if(debug_visible)).in_set(AppSystems::Update),
    );
}

/// Resource to track if debug visualization is visible.
#[derive(Resource, Default)]
pub struct DebugGridVisible(pub bool);

fn debug_visible(debug: Res<DebugGridVisible>) -> bool {
    debug.0
}

fn toggle_debug(mut debug: ResMut<DebugGridVisible>) {
    debug.0 = !debug.0;
    let state = if debug.0 { "ON" } else { "OFF" };
    info!("Debug grid: {}", state);
}

fn dump_state(session: Res<Session>) {
    match serde_json::to_string_pretty(session.state()) {
        Ok(json) => info!("Game state:\n{}", json),
        Err(err) => warn!("Could not serialize game state: {}", err),
    }
}

/// Draw every cell slot using Bevy's Gizmos.
fn draw_debug_grid(mut gizmos: Gizmos, session: Res<Session>) {
    let grid = &session.state().bubbles;
    let bounds = grid.bounds;
    let area = session.play_area();
    let radius = area.bubble_size / 2.0;

    for coord in bounds.cells(bounds.rows) {
        let color = if grid.is_occupied(coord) {
            css::LIMEGREEN.with_alpha(0.5)
        } else if coord.row == 0 {
            // Ceiling row anchors everything
            css::GOLD.with_alpha(0.3)
        } else if coord.row >= bounds.danger_row() {
            css::INDIAN_RED.with_alpha(0.3)
        } else {
            css::WHITE.with_alpha(0.15)
        };

        let center = area.to_world(coord.to_position(area.bubble_size));
        gizmos.circle_2d(center, radius, color);
    }

    let danger_y = danger_line_y(&area, &bounds);
    gizmos.line_2d(
        Vec2::new(-area.width / 2.0, danger_y),
        Vec2::new(area.width / 2.0, danger_y),
        css::INDIAN_RED,
    );
}

/// World y of the top edge of the danger rows.
fn danger_line_y(area: &PlayArea, bounds: &GridBounds) -> f32 {
    let top = Vec2::new(0.0, bounds.danger_row() as f32 * area.bubble_size * ROW_PACKING);
    area.to_world(top).y + area.bubble_size / 2.0
}

/// Draw the walls and ceiling of the play area.
fn draw_walls(mut gizmos: Gizmos, session: Res<Session>) {
    let area = session.play_area();
    let wall_color = css::ORANGE.with_alpha(0.8);

    let left = -area.width / 2.0;
    let right = area.width / 2.0;
    let top = area.height / 2.0;
    let bottom = -area.height / 2.0;

    gizmos.line_2d(Vec2::new(left, bottom), Vec2::new(left, top), wall_color);
    gizmos.line_2d(Vec2::new(right, bottom), Vec2::new(right, top), wall_color);
    gizmos.line_2d(Vec2::new(left, top), Vec2::new(right, top), wall_color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_danger_line_sits_inside_play_area() {
        let bounds = GridBounds::default();
        let area = PlayArea::new(bounds.rows, bounds.cols, 40.0);
        let y = danger_line_y(&area, &bounds);
        assert!(y < area.height / 2.0);
        assert!(y > -area.height / 2.0);
    }
}
