//! Fire-and-forget sound effects.
//!
//! Sounds are spawned as self-despawning audio entities. A missing or broken
//! asset only produces a log line from the asset server; gameplay never waits
//! on playback.

use bevy::{audio::Volume, prelude::*};

use crate::{
    AppSystems,
    game::session::{SessionEvent, SessionRelay},
};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<SoundEffect>();

    app.add_systems(Startup, load_sound_effects);
    app.add_systems(
        Update,
        play_session_sounds
            .in_set(AppSystems::Update)
            .after(SessionRelay),
    );
}

/// Volume all sound effects play at.
const EFFECT_VOLUME: f32 = 0.5;

/// An organizational marker component that should be added to a spawned [`AudioPlayer`] if it's in the
/// general "sound effect" category (e.g. footsteps, the sound of a magic spell, a door opening).
#[derive(Component, Reflect, Default)]
#[reflect(Component)]
pub struct SoundEffect;

/// A sound effect audio instance.
pub fn sound_effect(handle: Handle<AudioSource>) -> impl Bundle {
    (
        AudioPlayer(handle),
        PlaybackSettings::DESPAWN.with_volume(Volume::Linear(EFFECT_VOLUME)),
        SoundEffect,
    )
}

/// Handles for every sound the game plays.
#[derive(Resource)]
pub struct SoundEffects {
    pub shoot: Handle<AudioSource>,
    pub pop: Handle<AudioSource>,
    pub level_up: Handle<AudioSource>,
    pub game_over: Handle<AudioSource>,
}

fn load_sound_effects(mut commands: Commands, asset_server: Res<AssetServer>) {
    commands.insert_resource(SoundEffects {
        shoot: asset_server.load("audio/sound_effects/shoot.ogg"),
        pop: asset_server.load("audio/sound_effects/pop.ogg"),
        level_up: asset_server.load("audio/sound_effects/level_up.ogg"),
        game_over: asset_server.load("audio/sound_effects/game_over.ogg"),
    });
}

/// Pick the sound for a session event, if it has one.
fn sound_for<'a>(event: &SessionEvent, sounds: &'a SoundEffects) -> Option<&'a Handle<AudioSource>> {
    match event {
        SessionEvent::ShotFired { .. } => Some(&sounds.shoot),
        SessionEvent::Popped { .. } => Some(&sounds.pop),
        SessionEvent::LevelUp { .. } => Some(&sounds.level_up),
        SessionEvent::GameOver { .. } => Some(&sounds.game_over),
        _ => None,
    }
}

fn play_session_sounds(
    mut commands: Commands,
    mut events: MessageReader<SessionEvent>,
    sounds: Option<Res<SoundEffects>>,
) {
    let Some(sounds) = sounds else {
        // Drain so stale events do not play late.
        events.clear();
        return;
    };

    for event in events.read() {
        if let Some(handle) = sound_for(event, &sounds) {
            commands.spawn(sound_effect(handle.clone()));
        }
    }
}
