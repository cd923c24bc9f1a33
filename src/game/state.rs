//! Game state and the rules that score it.
//!
//! Win a level: clear every bubble; the next level starts with more rows.
//! Lose: a turn without a pop leaves a bubble in the danger rows.

use bevy::prelude::*;
use serde::Serialize;

use super::{
    bubble::BubbleColor,
    grid::{BubbleGrid, GridBounds, INITIAL_ROWS},
    session::Session,
};
use crate::{
    AppSystems, Pause,
    theme::palette::{BUTTON_BACKGROUND, BUTTON_TEXT, HUD_ALERT_TEXT, HUD_TEXT},
};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<ActiveBubble>();

    app.add_systems(Startup, spawn_hud);
    app.add_systems(Update, update_hud.in_set(AppSystems::Update));
}

/// Points awarded per bubble removed.
const POINTS_PER_BUBBLE: u32 = 10;

/// Extra points per bubble beyond the third in one group.
const CHAIN_BONUS: u32 = 5;

/// Aim limit either side of vertical, in degrees.
pub const MAX_AIM_ANGLE: f32 = 85.0;

/// The loaded bubble and where it points.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize)]
pub struct ActiveBubble {
    pub color: BubbleColor,
    /// Degrees from vertical, positive to the right.
    pub angle: f32,
}

/// Everything the presentation layer reads each frame.
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    pub bubbles: BubbleGrid,
    pub active_bubble: ActiveBubble,
    pub next_bubble: BubbleColor,
    pub score: u32,
    pub level: u32,
    pub game_over: bool,
    /// Best score seen since the program started.
    pub high_score: u32,
}

impl GameState {
    pub fn new(bounds: GridBounds, active: BubbleColor, next: BubbleColor) -> Self {
        Self {
            bubbles: BubbleGrid::new(bounds),
            active_bubble: ActiveBubble {
                color: active,
                angle: 0.0,
            },
            next_bubble: next,
            score: 0,
            level: 1,
            game_over: false,
            high_score: 0,
        }
    }

    /// Add points and keep the high score current.
    pub fn add_score(&mut self, points: u32) {
        self.score += points;
        self.high_score = self.high_score.max(self.score);
    }
}

/// Score for removing `count` bubbles at once.
///
/// Base points per bubble plus a chain bonus for each bubble past the third.
pub fn score_for(count: usize) -> u32 {
    let count = count as u32;
    count * POINTS_PER_BUBBLE + count.saturating_sub(3) * CHAIN_BONUS
}

/// Rows generated for a level: more every other level, capped by the grid.
pub fn rows_for_level(level: u32, max_rows: i32) -> i32 {
    let extra = (level / 2) as i32;
    (INITIAL_ROWS + extra).min(max_rows)
}

/// Whether any bubble has reached the danger rows near the shooter.
pub fn reached_danger_zone(grid: &BubbleGrid) -> bool {
    grid.lowest_row()
        .is_some_and(|row| row >= grid.bounds.danger_row())
}

/// Clamp an aim angle to the allowed range; NaN aims straight up.
pub fn clamp_angle(angle: f32) -> f32 {
    if angle.is_nan() {
        0.0
    } else {
        angle.clamp(-MAX_AIM_ANGLE, MAX_AIM_ANGLE)
    }
}

/// Marker for the score/level readout.
#[derive(Component)]
struct HudText;

/// Marker for the game-over / pause hint line.
#[derive(Component)]
struct HudHint;

/// Marker for the button shown on game over.
#[derive(Component)]
struct PlayAgainButton;

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Name::new("HUD"),
        HudText,
        Text::new("Score: 0  Level: 1"),
        TextFont {
            font_size: 24.0,
            ..default()
        },
        TextColor(HUD_TEXT),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(10.0),
            ..default()
        },
    ));

    commands.spawn((
        Name::new("HUD Hint"),
        HudHint,
        Text::new(""),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(HUD_ALERT_TEXT),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(42.0),
            ..default()
        },
    ));

    commands
        .spawn((
            Name::new("Play Again Button"),
            PlayAgainButton,
            Button,
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(12.0),
                top: Val::Px(74.0),
                padding: UiRect::axes(Val::Px(16.0), Val::Px(8.0)),
                display: Display::None,
                ..default()
            },
            BackgroundColor(BUTTON_BACKGROUND),
            children![(
                Name::new("Play Again Label"),
                Text::new("Play Again"),
                TextFont::from_font_size(20.0),
                TextColor(BUTTON_TEXT),
            )],
        ))
        .observe(play_again);
}

fn play_again(_: On<Pointer<Click>>, mut session: ResMut<Session>) {
    session.apply_reset();
}

fn update_hud(
    session: Res<Session>,
    pause: Res<State<Pause>>,
    mut text_query: Query<&mut Text, (With<HudText>, Without<HudHint>)>,
    mut hint_query: Query<&mut Text, (With<HudHint>, Without<HudText>)>,
    mut button_query: Query<&mut Node, With<PlayAgainButton>>,
) {
    let state = session.state();

    if let Ok(mut text) = text_query.single_mut() {
        text.0 = format!(
            "Score: {}  Level: {}  Best: {}",
            state.score, state.level, state.high_score
        );
    }

    if let Ok(mut hint) = hint_query.single_mut() {
        hint.0 = if state.game_over {
            "Game Over! Press R or click Play Again".to_string()
        } else if pause.get().0 {
            "Paused".to_string()
        } else {
            String::new()
        };
    }

    if let Ok(mut node) = button_query.single_mut() {
        node.display = if state.game_over {
            Display::Flex
        } else {
            Display::None
        };
    }
}
