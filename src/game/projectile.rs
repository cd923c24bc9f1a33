//! Projectile - the bubble being shot.
//!
//! The projectile travels in a straight line, bouncing off the side walls,
//! until it reaches the ceiling or comes within one diameter of a bubble.
//! Stepping is frame-independent: one call to [`Projectile::step`] is one
//! simulation tick, driven from `FixedUpdate`.

use bevy::prelude::*;

use super::{
    bubble::{BubbleColor, BubbleMeshes},
    grid::BubbleGrid,
    hex::PlayArea,
    session::{Session, ShotPhase},
};
use crate::{AppSystems, PausableSystems};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<ProjectileSprite>();

    // One physics step per 60 Hz frame.
    app.insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ));

    app.add_systems(FixedUpdate, advance_projectile.in_set(PausableSystems));
    app.add_systems(
        Update,
        sync_projectile_sprite
            .in_set(AppSystems::Update)
            .in_set(PausableSystems),
    );
}

/// Simulation ticks per second.
const SIMULATION_HZ: f64 = 60.0;

/// Distance covered per tick, in pixels.
pub const SHOT_SPEED: f32 = 8.0;

/// A bubble in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Top-left of the bubble in shooting space.
    pub position: Vec2,
    /// Per-tick displacement.
    pub velocity: Vec2,
    pub color: BubbleColor,
}

/// What happened during one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Still flying.
    Moved,
    /// Hit a side wall; the horizontal velocity flipped.
    Bounced,
    /// Reached the ceiling or touched a bubble at this position.
    Collided(Vec2),
}

impl Projectile {
    /// Launch from `origin` at `angle_degrees` from vertical (positive leans
    /// right).
    pub fn launch(origin: Vec2, angle_degrees: f32, speed: f32, color: BubbleColor) -> Self {
        Self {
            position: origin,
            velocity: velocity_for_angle(angle_degrees, speed),
            color,
        }
    }

    /// Advance by one tick.
    ///
    /// A wall bounce ends the tick: the projectile is clamped to the wall and
    /// no ceiling or bubble check runs until the next one.
    pub fn step(&mut self, grid: &BubbleGrid, area: &PlayArea) -> StepOutcome {
        let candidate = self.position + self.velocity;

        if candidate.x < 0.0 || candidate.x > area.max_x() {
            self.position.x = candidate.x.clamp(0.0, area.max_x());
            self.velocity.x = -self.velocity.x;
            return StepOutcome::Bounced;
        }

        if candidate.y < 0.0 {
            return StepOutcome::Collided(Vec2::new(candidate.x, 0.0));
        }

        if touches_any_bubble(candidate, grid, area.bubble_size) {
            return StepOutcome::Collided(candidate);
        }

        self.position = candidate;
        StepOutcome::Moved
    }
}

/// Convert an aim angle to a per-tick velocity (y grows downward, so "up" is
/// negative).
pub fn velocity_for_angle(angle_degrees: f32, speed: f32) -> Vec2 {
    let radians = angle_degrees.to_radians();
    Vec2::new(radians.sin() * speed, -radians.cos() * speed)
}

/// Exhaustive check against every bubble on the grid.
///
/// Grid-neighbor checks on the rounded cell are not enough: the projectile
/// must stop before its center crosses into an occupied cell.
fn touches_any_bubble(position: Vec2, grid: &BubbleGrid, bubble_size: f32) -> bool {
    grid.iter()
        .any(|bubble| position.distance(bubble.coord.to_position(bubble_size)) < bubble_size)
}

/// The in-flight bubble's sprite and the color it currently shows.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ProjectileSprite(pub BubbleColor);

/// Step the in-flight projectile once per fixed tick.
fn advance_projectile(mut session: ResMut<Session>) {
    if !matches!(session.phase(), ShotPhase::InFlight(_)) {
        return;
    }
    session.tick();
}

/// Show, move, recolor, or hide the projectile sprite.
///
/// A shot can land and the next one fire within a single frame, so the
/// surviving sprite may belong to the previous shot.
fn sync_projectile_sprite(
    mut commands: Commands,
    session: Res<Session>,
    bubble_meshes: Option<Res<BubbleMeshes>>,
    mut sprite_query: Query<
        (
            Entity,
            &mut Transform,
            &mut ProjectileSprite,
            &mut MeshMaterial2d<ColorMaterial>,
        ),
    >,
) {
    let projectile = match session.phase() {
        ShotPhase::InFlight(projectile) => Some(projectile),
        _ => None,
    };
    let Some(bubble_meshes) = bubble_meshes else {
        return;
    };

    match (projectile, sprite_query.single_mut()) {
        (Some(projectile), Ok((_, mut transform, mut shown, mut material))) => {
            let world = session.play_area().to_world(projectile.position);
            transform.translation = world.extend(5.0);

            if shown.0 != projectile.color
                && let Some(handle) = bubble_meshes.material(projectile.color)
            {
                shown.0 = projectile.color;
                material.0 = handle;
            }
        }
        (Some(projectile), Err(_)) => {
            let Some(material) = bubble_meshes.material(projectile.color) else {
                return;
            };
            let world = session.play_area().to_world(projectile.position);
            commands.spawn((
                Name::new("Projectile"),
                ProjectileSprite(projectile.color),
                Transform::from_translation(world.extend(5.0)),
                Mesh2d(bubble_meshes.circle.clone()),
                MeshMaterial2d(material),
            ));
        }
        (None, Ok((entity, ..))) => {
            commands.entity(entity).despawn();
        }
        (None, Err(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        bubble::{Bubble, BubbleId, load_bubble_meshes},
        grid::GridBounds,
        hex::{BUBBLE_SIZE, GridCoord},
        session::GameConfig,
    };
    use bevy::ecs::system::RunSystemOnce;

    fn area() -> PlayArea {
        PlayArea::new(10, 10, BUBBLE_SIZE)
    }

    fn empty_grid() -> BubbleGrid {
        BubbleGrid::new(GridBounds::default())
    }

    #[test]
    fn test_velocity_straight_up() {
        let v = velocity_for_angle(0.0, SHOT_SPEED);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y + SHOT_SPEED).abs() < 1e-6);
    }

    #[test]
    fn test_velocity_leans_with_angle() {
        let right = velocity_for_angle(30.0, SHOT_SPEED);
        let left = velocity_for_angle(-30.0, SHOT_SPEED);
        assert!(right.x > 0.0 && left.x < 0.0);
        assert!((right.length() - SHOT_SPEED).abs() < 1e-4);
    }

    #[test]
    fn test_moves_when_clear() {
        let mut projectile = Projectile::launch(Vec2::new(180.0, 450.0), 0.0, SHOT_SPEED, BubbleColor::Red);
        assert_eq!(projectile.step(&empty_grid(), &area()), StepOutcome::Moved);
        assert!((projectile.position.y - 442.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounces_off_right_wall() {
        let mut projectile = Projectile::launch(Vec2::new(355.0, 300.0), 80.0, SHOT_SPEED, BubbleColor::Red);
        let before = projectile.velocity;

        assert_eq!(projectile.step(&empty_grid(), &area()), StepOutcome::Bounced);
        assert_eq!(projectile.position, Vec2::new(360.0, 300.0));
        assert_eq!(projectile.velocity.x, -before.x);
        assert_eq!(projectile.velocity.y, before.y);
    }

    #[test]
    fn test_bounces_off_left_wall() {
        let mut projectile = Projectile::launch(Vec2::new(3.0, 300.0), -80.0, SHOT_SPEED, BubbleColor::Red);
        assert_eq!(projectile.step(&empty_grid(), &area()), StepOutcome::Bounced);
        assert_eq!(projectile.position.x, 0.0);
        assert!(projectile.velocity.x > 0.0);
    }

    #[test]
    fn test_hits_ceiling() {
        let mut projectile = Projectile::launch(Vec2::new(100.0, 5.0), 0.0, SHOT_SPEED, BubbleColor::Red);
        assert_eq!(
            projectile.step(&empty_grid(), &area()),
            StepOutcome::Collided(Vec2::new(100.0, 0.0))
        );
    }

    #[test]
    fn test_hits_bubble_within_diameter() {
        let mut grid = empty_grid();
        grid.insert(Bubble::new(BubbleId(1), BubbleColor::Blue, GridCoord::new(2, 4)));
        let cell = GridCoord::new(2, 4).to_position(BUBBLE_SIZE);

        let start = cell + Vec2::new(0.0, BUBBLE_SIZE + 5.0);
        let mut projectile = Projectile::launch(start, 0.0, SHOT_SPEED, BubbleColor::Red);
        match projectile.step(&grid, &area()) {
            StepOutcome::Collided(at) => assert!((at - (start + Vec2::new(0.0, -SHOT_SPEED))).length() < 1e-4),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn test_flight_eventually_resolves() {
        let mut projectile = Projectile::launch(area().launch_position(), 37.0, SHOT_SPEED, BubbleColor::Red);
        let grid = empty_grid();
        let mut bounces = 0;
        let landed = (0..1000).find_map(|_| match projectile.step(&grid, &area()) {
            StepOutcome::Collided(at) => Some(at),
            StepOutcome::Bounced => {
                bounces += 1;
                None
            }
            StepOutcome::Moved => None,
        });
        let landed = landed.expect("projectile never landed");
        assert_eq!(landed.y, 0.0);
        assert!(bounces > 0);
        assert!((0.0..=area().max_x()).contains(&landed.x));
    }

    fn sprite_world() -> World {
        let mut world = World::new();
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<ColorMaterial>>();
        world.run_system_once(load_bubble_meshes).unwrap();

        let mut session = Session::with_seed(GameConfig::default(), 11);
        session.state_mut().bubbles.clear();
        world.insert_resource(session);
        world
    }

    fn fire(world: &mut World, color: BubbleColor) {
        let mut session = world.resource_mut::<Session>();
        session.state_mut().active_bubble.color = color;
        assert!(session.apply_shoot());
    }

    fn shown_sprites(world: &mut World) -> Vec<(BubbleColor, Handle<ColorMaterial>)> {
        world
            .query::<(&ProjectileSprite, &MeshMaterial2d<ColorMaterial>)>()
            .iter(world)
            .map(|(shown, material)| (shown.0, material.0.clone()))
            .collect()
    }

    #[test]
    fn test_sprite_follows_new_shot_color() {
        let mut world = sprite_world();

        fire(&mut world, BubbleColor::Red);
        world.run_system_once(sync_projectile_sprite).unwrap();
        assert_eq!(shown_sprites(&mut world).len(), 1);

        // Land without a pop and fire again before the sprite is synced.
        world
            .resource_mut::<Session>()
            .resolve_pop(GridCoord::new(0, 0).to_position(BUBBLE_SIZE));
        fire(&mut world, BubbleColor::Blue);
        world.run_system_once(sync_projectile_sprite).unwrap();

        let blue = world
            .resource::<BubbleMeshes>()
            .material(BubbleColor::Blue)
            .unwrap();
        let sprites = shown_sprites(&mut world);
        assert_eq!(sprites.len(), 1);
        assert_eq!(sprites[0].0, BubbleColor::Blue);
        assert_eq!(sprites[0].1, blue);
    }

    #[test]
    fn test_sprite_removed_after_landing() {
        let mut world = sprite_world();

        fire(&mut world, BubbleColor::Green);
        world.run_system_once(sync_projectile_sprite).unwrap();
        world
            .resource_mut::<Session>()
            .resolve_pop(GridCoord::new(0, 3).to_position(BUBBLE_SIZE));
        world.run_system_once(sync_projectile_sprite).unwrap();

        assert!(shown_sprites(&mut world).is_empty());
    }
}
