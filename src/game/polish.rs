//! Toast banners for level-ups and game over, plus floating score text.
//!
//! Purely observational: these systems read [`SessionEvent`]s and never touch
//! the session.

use bevy::prelude::*;

use super::session::{SessionEvent, SessionRelay};
use crate::{
    AppSystems,
    theme::palette::{TOAST_ALERT, TOAST_TEXT},
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (spawn_toasts, animate_toasts)
            .chain()
            .in_set(AppSystems::Update)
            .after(SessionRelay),
    );
}

/// How a toast should look.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub title: String,
    pub description: String,
    pub alert: bool,
}

/// Build the toast for an event, if it warrants one.
pub fn toast_for(event: &SessionEvent) -> Option<Banner> {
    match event {
        SessionEvent::LevelUp { level } => Some(Banner {
            title: "Level Up!".to_string(),
            description: format!("You've reached level {level}!"),
            alert: false,
        }),
        SessionEvent::GameOver { score } => Some(Banner {
            title: "Game Over!".to_string(),
            description: format!("Final Score: {score}"),
            alert: true,
        }),
        SessionEvent::Scored { points, .. } if *points > 0 => Some(Banner {
            title: format!("+{points}"),
            description: String::new(),
            alert: false,
        }),
        _ => None,
    }
}

/// Component for a fading banner.
#[derive(Component)]
pub struct Toast {
    /// Time elapsed.
    pub timer: f32,
    /// Total duration.
    pub duration: f32,
    pub color: Color,
    /// Height the toast floats up from.
    pub base_y: f32,
}

/// Vertical spot of the first banner in world space.
const TOAST_Y: f32 = 60.0;

/// Gap between stacked banners.
const TOAST_SPACING: f32 = 80.0;

/// Starting height of the toast in `slot`, counting down from the top one.
fn toast_y(slot: usize) -> f32 {
    TOAST_Y - slot as f32 * TOAST_SPACING
}

fn spawn_toasts(
    mut commands: Commands,
    mut events: MessageReader<SessionEvent>,
    live: Query<&Toast>,
) {
    let mut taken: Vec<f32> = live.iter().map(|toast| toast.base_y).collect();

    for banner in events.read().filter_map(toast_for) {
        let base_y = (0..)
            .map(toast_y)
            .find(|y| !taken.contains(y))
            .unwrap_or(TOAST_Y);
        taken.push(base_y);
        let color = if banner.alert { TOAST_ALERT } else { TOAST_TEXT };
        let text = if banner.description.is_empty() {
            banner.title
        } else {
            format!("{}\n{}", banner.title, banner.description)
        };
        // Game over stays up until the next reset clears it.
        let duration = if banner.alert { f32::INFINITY } else { 1.5 };

        commands.spawn((
            Name::new("Toast"),
            Toast {
                timer: 0.0,
                duration,
                color,
                base_y,
            },
            Text2d::new(text),
            TextFont {
                font_size: 32.0,
                ..default()
            },
            TextColor(color),
            Transform::from_xyz(0.0, base_y, 10.0),
        ));
    }
}

/// Float toasts upward and fade them out; a reset clears them all.
fn animate_toasts(
    mut commands: Commands,
    time: Res<Time>,
    mut resets: Local<usize>,
    mut events: MessageReader<SessionEvent>,
    mut query: Query<(Entity, &mut Transform, &mut Toast, &mut TextColor)>,
) {
    let reset = events.read().any(|e| *e == SessionEvent::Reset);
    if reset {
        *resets += 1;
        debug!("Clearing toasts after reset #{}", *resets);
    }

    for (entity, mut transform, mut toast, mut color) in &mut query {
        toast.timer += time.delta_secs();
        let progress = (toast.timer / toast.duration).min(1.0);

        if reset || progress >= 1.0 {
            commands.entity(entity).despawn();
            continue;
        }

        transform.translation.y = toast.base_y + 40.0 * progress;

        // Fade out in last 30%
        let alpha = if progress > 0.7 {
            1.0 - (progress - 0.7) / 0.3
        } else {
            1.0
        };
        color.0 = toast.color.with_alpha(alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::{message::Messages, system::RunSystemOnce};

    #[test]
    fn test_level_up_toast() {
        let toast = toast_for(&SessionEvent::LevelUp { level: 3 }).unwrap();
        assert_eq!(toast.title, "Level Up!");
        assert_eq!(toast.description, "You've reached level 3!");
        assert!(!toast.alert);
    }

    #[test]
    fn test_game_over_toast() {
        let toast = toast_for(&SessionEvent::GameOver { score: 120 }).unwrap();
        assert_eq!(toast.description, "Final Score: 120");
        assert!(toast.alert);
    }

    #[test]
    fn test_quiet_events_have_no_toast() {
        assert!(toast_for(&SessionEvent::Bounced).is_none());
        assert!(toast_for(&SessionEvent::Scored { points: 0, total: 0 }).is_none());
    }

    #[test]
    fn test_toasts_from_one_turn_do_not_overlap() {
        let mut world = World::new();
        world.init_resource::<Messages<SessionEvent>>();
        world.write_message(SessionEvent::Scored { points: 30, total: 30 });
        world.write_message(SessionEvent::LevelUp { level: 2 });

        world.run_system_once(spawn_toasts).unwrap();

        let mut heights: Vec<f32> = world
            .query::<&Transform>()
            .iter(&world)
            .map(|t| t.translation.y)
            .collect();
        heights.sort_by(f32::total_cmp);
        assert_eq!(heights, vec![toast_y(1), toast_y(0)]);
        assert!(toast_y(0) - toast_y(1) >= TOAST_SPACING);
    }
}
