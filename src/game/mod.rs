//! The main game module for the bubble shooter.
//!
//! This module contains all the gameplay logic including:
//! - Hex grid addressing (offset rows)
//! - Bubble colors and the grid that holds them
//! - Shooter input and projectile physics
//! - Cluster detection, popping and floating drops
//! - Scoring, levels and the session that ties a turn together

mod bubble;
mod cluster;
mod debug;
mod grid;
mod hex;
mod polish;
mod projectile;
pub mod session;
mod shooter;
mod state;

use bevy::prelude::*;

use session::Session;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        hex::plugin,
        grid::plugin,
        session::plugin,
        bubble::plugin,
        shooter::plugin,
        projectile::plugin,
        state::plugin,
        polish::plugin,
        debug::plugin,
    ));

    app.add_systems(Startup, spawn_game);
}

/// Spawn the static backdrop of the play area.
fn spawn_game(mut commands: Commands, session: Res<Session>) {
    let area = session.play_area();

    commands.spawn((
        Name::new("Game Panel"),
        Sprite {
            color: Color::srgb(0.12, 0.12, 0.16),
            custom_size: Some(Vec2::new(area.width, area.height)),
            ..default()
        },
        // Behind bubbles
        Transform::from_xyz(0.0, 0.0, -1.0),
    ));

    info!(
        "Game spawned - {}x{} grid, bubble shooter ready!",
        session.config().rows,
        session.config().cols
    );
}
