use bevy::prelude::*;

/// Light text for the score readout
pub const HUD_TEXT: Color = Color::srgb(0.92, 0.92, 0.95);

/// Warm text for game-over and pause hints
pub const HUD_ALERT_TEXT: Color = Color::srgb(0.95, 0.55, 0.35);

/// #ffd95a
pub const TOAST_TEXT: Color = Color::srgb(1.0, 0.851, 0.353);

/// #e0443e
pub const TOAST_ALERT: Color = Color::srgb(0.878, 0.267, 0.243);

/// #1a1a24
pub const BACKGROUND: Color = Color::srgb(0.102, 0.102, 0.141);

/// Dark text for buttons
pub const BUTTON_TEXT: Color = Color::srgb(0.1, 0.1, 0.1);
/// #4666bf
pub const BUTTON_BACKGROUND: Color = Color::srgb(0.275, 0.400, 0.750);
