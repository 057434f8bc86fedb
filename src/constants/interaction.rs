//! Interaction trigger and pickup constants.

/// Default distance within which a trigger can be activated
pub const DEFAULT_INTERACTION_RANGE: f32 = 3.0;
/// Default distance within which a looked-at item can be picked up
pub const DEFAULT_PICKUP_DISTANCE: f32 = 30.0;
/// Default radius of an item's bounding sphere for look ray tests
pub const DEFAULT_ITEM_RADIUS: f32 = 0.5;
/// Longest look ray cast when searching for pickable items
pub const MAX_LOOK_DISTANCE: f32 = 100.0;
/// How far from the POI toward the observer transition effects spawn
pub const EFFECT_ORIGIN_LERP: f32 = 0.3;
