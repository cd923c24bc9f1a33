//! The shooter at the bottom of the play area.
//!
//! The player aims with the mouse, a finger or the arrow keys, and fires with
//! a left click, Space, or by lifting the finger. The loaded bubble sits on the shooter; the next one is
//! previewed beside it.

use bevy::{prelude::*, window::PrimaryWindow};

use super::{
    bubble::{BubbleColor, BubbleMeshes, load_bubble_meshes},
    session::Session,
};
use crate::{AppSystems, PausableSystems};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_shooter.after(load_bubble_meshes));

    app.add_systems(
        Update,
        (aim_with_cursor, aim_with_touch, aim_with_keys, handle_fire_input)
            .chain()
            .in_set(AppSystems::RecordInput)
            .in_set(PausableSystems),
    );
    app.add_systems(Update, handle_reset_input.in_set(AppSystems::RecordInput));

    app.add_systems(
        Update,
        (update_shooter_visuals, draw_aim_line)
            .in_set(AppSystems::Update)
            .in_set(PausableSystems),
    );
}

/// Aim change per second while an arrow key is held, in degrees.
const KEY_AIM_SPEED: f32 = 90.0;

/// Length of the aim line in pixels.
const AIM_LINE_LENGTH: f32 = 150.0;

/// Scale of the next-bubble preview.
const PREVIEW_SCALE: f32 = 0.7;

/// Marker for the loaded bubble visual.
#[derive(Component)]
struct LoadedBubbleVisual;

/// Marker for the next bubble visual.
#[derive(Component)]
struct NextBubbleVisual;

/// Remembers which color each visual shows, to swap materials only on change.
#[derive(Component)]
struct ShownColor(BubbleColor);

/// Angle in degrees from vertical for a pointer relative to the shooter
/// (world space, y up), clamped like any other aim input downstream.
pub fn angle_to_pointer(shooter: Vec2, pointer: Vec2) -> f32 {
    let delta = pointer - shooter;
    delta.x.atan2(delta.y).to_degrees()
}

/// World-space center of the launch point.
fn shooter_world(session: &Session) -> Vec2 {
    let area = session.play_area();
    area.to_world(area.launch_position())
}

fn spawn_shooter(
    mut commands: Commands,
    bubble_meshes: Res<BubbleMeshes>,
    session: Res<Session>,
) {
    let state = session.state();
    let origin = shooter_world(&session);
    let size = session.play_area().bubble_size;

    info!("Spawning shooter at {:?}", origin);

    if let Some(material) = bubble_meshes.material(state.active_bubble.color) {
        commands.spawn((
            Name::new("Loaded Bubble"),
            LoadedBubbleVisual,
            ShownColor(state.active_bubble.color),
            Transform::from_translation(origin.extend(2.0)),
            Mesh2d(bubble_meshes.circle.clone()),
            MeshMaterial2d(material),
        ));
    }

    if let Some(material) = bubble_meshes.material(state.next_bubble) {
        commands.spawn((
            Name::new("Next Bubble"),
            NextBubbleVisual,
            ShownColor(state.next_bubble),
            Transform::from_translation((origin + Vec2::new(size * 2.5, -size)).extend(2.0))
                .with_scale(Vec3::splat(PREVIEW_SCALE)),
            Mesh2d(bubble_meshes.circle.clone()),
            MeshMaterial2d(material),
        ));
    }

    commands.spawn((
        Name::new("Shooter Base"),
        Sprite {
            color: Color::srgb(0.3, 0.3, 0.35),
            custom_size: Some(Vec2::new(size * 1.6, size * 0.4)),
            ..default()
        },
        Transform::from_translation((origin - Vec2::new(0.0, size * 0.9)).extend(1.0)),
    ));
}

/// Aim at the cursor while it is over the window.
fn aim_with_cursor(
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    mut session: ResMut<Session>,
    mut last_cursor: Local<Option<Vec2>>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Some(cursor_pos) = window
        .cursor_position()
        .and_then(|p| camera.viewport_to_world_2d(camera_transform, p).ok())
    else {
        return;
    };

    // Only a moving pointer takes over the aim, so arrow keys still work.
    if *last_cursor == Some(cursor_pos) {
        return;
    }
    *last_cursor = Some(cursor_pos);

    let angle = angle_to_pointer(shooter_world(&session), cursor_pos);
    session.apply_aim_change(angle);
}

/// Aim at the first active touch.
fn aim_with_touch(
    touches: Res<Touches>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    mut session: ResMut<Session>,
) {
    let Some(touch) = touches.iter().next() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Ok(touch_pos) = camera.viewport_to_world_2d(camera_transform, touch.position()) else {
        return;
    };

    let angle = angle_to_pointer(shooter_world(&session), touch_pos);
    session.apply_aim_change(angle);
}

fn aim_with_keys(
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut session: ResMut<Session>,
) {
    let mut direction = 0.0;
    if keyboard.pressed(KeyCode::ArrowLeft) {
        direction -= 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        direction += 1.0;
    }
    if direction == 0.0 {
        return;
    }

    let angle = session.state().active_bubble.angle + direction * KEY_AIM_SPEED * time.delta_secs();
    session.apply_aim_change(angle);
}

fn handle_fire_input(
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    touches: Res<Touches>,
    mut session: ResMut<Session>,
) {
    if mouse.just_pressed(MouseButton::Left)
        || keyboard.just_pressed(KeyCode::Space)
        || touches.any_just_released()
    {
        session.apply_shoot();
    }
}

fn handle_reset_input(keyboard: Res<ButtonInput<KeyCode>>, mut session: ResMut<Session>) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        session.apply_reset();
    }
}

/// Swap the loaded/next visuals' materials when the colors rotate.
fn update_shooter_visuals(
    session: Res<Session>,
    bubble_meshes: Res<BubbleMeshes>,
    mut loaded_query: Query<
        (&mut ShownColor, &mut MeshMaterial2d<ColorMaterial>, &mut Visibility),
        (With<LoadedBubbleVisual>, Without<NextBubbleVisual>),
    >,
    mut next_query: Query<
        (&mut ShownColor, &mut MeshMaterial2d<ColorMaterial>),
        (With<NextBubbleVisual>, Without<LoadedBubbleVisual>),
    >,
) {
    let state = session.state();

    if let Ok((mut shown, mut material, mut visibility)) = loaded_query.single_mut() {
        // The loaded bubble is hidden while its twin is flying or popping.
        *visibility = if session.can_shoot() {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if shown.0 != state.active_bubble.color
            && let Some(handle) = bubble_meshes.material(state.active_bubble.color)
        {
            shown.0 = state.active_bubble.color;
            material.0 = handle;
        }
    }

    if let Ok((mut shown, mut material)) = next_query.single_mut()
        && shown.0 != state.next_bubble
        && let Some(handle) = bubble_meshes.material(state.next_bubble)
    {
        shown.0 = state.next_bubble;
        material.0 = handle;
    }
}

/// Draw a dotted aim line from the shooter.
fn draw_aim_line(mut gizmos: Gizmos, session: Res<Session>) {
    if !session.can_shoot() {
        return;
    }

    // World y is up, matching the aim angle's "0 = straight up".
    let radians = session.state().active_bubble.angle.to_radians();
    let direction = Vec2::new(radians.sin(), radians.cos());
    let start = shooter_world(&session);

    let segments = 15;
    let segment_length = AIM_LINE_LENGTH / segments as f32;

    for i in (0..segments).step_by(2) {
        let seg_start = start + direction * (i as f32 * segment_length);
        let seg_end = start + direction * ((i as f32 + 0.7) * segment_length);
        gizmos.line_2d(seg_start, seg_end, Color::srgba(0.9, 0.9, 0.9, 0.6));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_straight_above_is_zero() {
        assert!(angle_to_pointer(Vec2::ZERO, Vec2::new(0.0, 100.0)).abs() < 1e-4);
    }

    #[test]
    fn test_pointer_to_the_right_is_positive() {
        let angle = angle_to_pointer(Vec2::ZERO, Vec2::new(100.0, 100.0));
        assert!((angle - 45.0).abs() < 1e-3);
        assert!(angle_to_pointer(Vec2::ZERO, Vec2::new(-100.0, 100.0)) < 0.0);
    }

    #[test]
    fn test_pointer_below_is_clamped_by_session() {
        let angle = angle_to_pointer(Vec2::ZERO, Vec2::new(10.0, -100.0));
        assert!(angle > 85.0);

        let mut session = Session::with_seed(Default::default(), 3);
        session.apply_aim_change(angle);
        assert_eq!(session.state().active_bubble.angle, 85.0);
    }

    #[test]
    fn test_lifting_a_finger_fires() {
        use bevy::{
            ecs::{message::Messages, system::RunSystemOnce},
            input::touch::{TouchInput, TouchPhase, touch_screen_input_system},
        };

        let mut world = World::new();
        world.init_resource::<ButtonInput<MouseButton>>();
        world.init_resource::<ButtonInput<KeyCode>>();
        world.init_resource::<Touches>();
        world.init_resource::<Messages<TouchInput>>();
        world.insert_resource(Session::with_seed(Default::default(), 5));

        let window = world.spawn_empty().id();
        for phase in [TouchPhase::Started, TouchPhase::Ended] {
            world.write_message(TouchInput {
                phase,
                position: Vec2::new(200.0, 100.0),
                window,
                force: None,
                id: 0,
            });
        }
        world.run_system_once(touch_screen_input_system).unwrap();
        world.run_system_once(handle_fire_input).unwrap();

        assert!(!world.resource::<Session>().can_shoot());
    }
}
