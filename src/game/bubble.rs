//! Bubbles - the main game objects.
//!
//! The authoritative bubble set lives in the session's [`BubbleGrid`]. The ECS
//! only mirrors it: every frame [`sync_bubble_sprites`] spawns a sprite for
//! each new bubble, despawns sprites whose bubble is gone, and highlights
//! bubbles that are mid-pop.

use bevy::prelude::*;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

use super::{
    hex::{BUBBLE_SIZE, GridCoord},
    session::Session,
};
use crate::{AppSystems, PausableSystems};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<BubbleColor>();
    app.register_type::<BubbleSprite>();

    app.add_systems(Startup, load_bubble_meshes);
    app.add_systems(
        Update,
        sync_bubble_sprites
            .in_set(AppSystems::Update)
            .in_set(PausableSystems),
    );
}

/// The six bubble hues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleColor {
    #[default]
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl BubbleColor {
    /// All possible bubble colors.
    pub const ALL: [BubbleColor; 6] = [
        BubbleColor::Red,
        BubbleColor::Blue,
        BubbleColor::Green,
        BubbleColor::Yellow,
        BubbleColor::Purple,
        BubbleColor::Orange,
    ];

    /// Get the actual color for rendering.
    pub fn to_color(self) -> Color {
        match self {
            BubbleColor::Red => Color::srgb(0.9, 0.2, 0.2),
            BubbleColor::Blue => Color::srgb(0.2, 0.4, 0.9),
            BubbleColor::Green => Color::srgb(0.2, 0.8, 0.3),
            BubbleColor::Yellow => Color::srgb(0.95, 0.85, 0.2),
            BubbleColor::Purple => Color::srgb(0.7, 0.3, 0.8),
            BubbleColor::Orange => Color::srgb(0.95, 0.5, 0.1),
        }
    }

    /// Pick a color uniformly.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Opaque identity of a placed bubble.
///
/// Ids are handed out by the session and never reused within it, so a sprite
/// keyed by id can tell a replaced bubble from the one it was drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize)]
pub struct BubbleId(pub u64);

/// A bubble placed on the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bubble {
    pub id: BubbleId,
    pub color: BubbleColor,
    pub coord: GridCoord,
    /// Set while the bubble waits out the pop delay before removal.
    pub is_popping: bool,
}

impl Bubble {
    pub fn new(id: BubbleId, color: BubbleColor, coord: GridCoord) -> Self {
        Self {
            id,
            color,
            coord,
            is_popping: false,
        }
    }
}

/// Links a rendered sprite to the bubble it draws.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BubbleSprite(pub BubbleId);

/// Shared circle mesh and one material per color.
#[derive(Resource)]
pub struct BubbleMeshes {
    pub circle: Handle<Mesh>,
    pub materials: HashMap<BubbleColor, Handle<ColorMaterial>>,
}

impl BubbleMeshes {
    pub fn material(&self, color: BubbleColor) -> Option<Handle<ColorMaterial>> {
        self.materials.get(&color).cloned()
    }
}

/// Scale applied to a bubble sprite while it is popping.
const POP_HIGHLIGHT_SCALE: f32 = 1.2;

pub fn load_bubble_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let circle = meshes.add(Circle::new(BUBBLE_SIZE / 2.0 - 1.0));
    let materials = BubbleColor::ALL
        .into_iter()
        .map(|color| (color, materials.add(ColorMaterial::from_color(color.to_color()))))
        .collect();

    commands.insert_resource(BubbleMeshes { circle, materials });
}

/// Keep one sprite per bubble in the session's grid.
fn sync_bubble_sprites(
    mut commands: Commands,
    session: Res<Session>,
    bubble_meshes: Option<Res<BubbleMeshes>>,
    mut sprites: Query<(Entity, &BubbleSprite, &mut Transform)>,
) {
    let Some(bubble_meshes) = bubble_meshes else {
        return;
    };

    let grid = &session.state().bubbles;
    let area = session.play_area();
    let by_id: HashMap<BubbleId, &Bubble> = grid.iter().map(|b| (b.id, b)).collect();
    let mut drawn = Vec::with_capacity(by_id.len());

    for (entity, sprite, mut transform) in &mut sprites {
        match by_id.get(&sprite.0) {
            Some(bubble) => {
                let scale = if bubble.is_popping { POP_HIGHLIGHT_SCALE } else { 1.0 };
                transform.scale = Vec3::splat(scale);
                drawn.push(sprite.0);
            }
            None => commands.entity(entity).despawn(),
        }
    }

    for bubble in grid.iter().filter(|b| !drawn.contains(&b.id)) {
        let Some(material) = bubble_meshes.material(bubble.color) else {
            continue;
        };
        let world = area.to_world(bubble.coord.to_position(area.bubble_size));

        commands.spawn((
            Name::new(format!("Bubble {:?} at {}", bubble.color, bubble.coord)),
            BubbleSprite(bubble.id),
            Transform::from_translation(world.extend(0.0)),
            Mesh2d(bubble_meshes.circle.clone()),
            MeshMaterial2d(material),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    #[test]
    fn test_random_covers_all_colors() {
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<_> = (0..500).map(|_| BubbleColor::random(&mut rng)).collect();
        assert_eq!(seen.len(), BubbleColor::ALL.len());
    }

    #[test]
    fn test_new_bubble_is_not_popping() {
        let bubble = Bubble::new(BubbleId(1), BubbleColor::Green, GridCoord::new(0, 0));
        assert!(!bubble.is_popping);
    }
}
