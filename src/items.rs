//! Pickable items and the item detail view.
//!
//! Items are found by continuously casting the camera's view ray against
//! each item's bounding sphere. The nearest hit within the item's own pick
//! distance gets focus (highlight plus HUD prompt); pressing the pickup key
//! on the focused item collects it and may open the detail view.

use glam::Vec3;
use hecs::{Entity, World};
use tracing::{debug, info, warn};
use winit::keyboard::KeyCode;

use crate::camera::FirstPersonCamera;
use crate::components::{Hidden, Position};
use crate::constants::*;
use crate::presentation::{Color, PromptPresenter};

/// Pickable item component
#[derive(Debug, Clone)]
pub struct PickableItem {
    pub name: String,
    pub description: String,
    pub name_color: Option<Color>,
    /// Display object shown in the detail view
    pub display_object: Option<String>,
    pub pick_distance: f32,
    /// Bounding sphere radius for the look ray
    pub radius: f32,
    /// Open the detail view on pickup
    pub inspectable: bool,
    /// Narration restarted when the detail view closes
    pub narration: Option<Entity>,
    pub picked: bool,
    pub can_pickup: bool,
    highlighted: bool,
}

impl PickableItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            name_color: None,
            display_object: None,
            pick_distance: DEFAULT_PICKUP_DISTANCE,
            radius: DEFAULT_ITEM_RADIUS,
            inspectable: false,
            narration: None,
            picked: false,
            can_pickup: true,
            highlighted: false,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    fn pickable(&self) -> bool {
        !self.picked && self.can_pickup
    }
}

/// Distance along a unit ray to the first intersection with a sphere
pub fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let along = to_center.dot(direction);
    let closest_sq = to_center.length_squared() - along * along;
    let radius_sq = radius * radius;
    if closest_sq > radius_sq {
        return None;
    }
    let half_chord = (radius_sq - closest_sq).sqrt();
    let near = along - half_chord;
    let far = along + half_chord;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        // Origin is inside the sphere
        Some(0.0)
    } else {
        None
    }
}

/// Item that was just picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pickup {
    pub item: Entity,
    pub inspectable: bool,
}

/// Tracks the focused item across frames
#[derive(Debug, Clone)]
pub struct ItemPicker {
    pub pickup_key: KeyCode,
    focused: Option<Entity>,
}

impl ItemPicker {
    pub fn new(pickup_key: KeyCode) -> Self {
        Self {
            pickup_key,
            focused: None,
        }
    }

    pub fn focused(&self) -> Option<Entity> {
        self.focused
    }

    /// Update focus from the camera and pick up the focused item on key press
    pub fn update(
        &mut self,
        world: &mut World,
        camera: &FirstPersonCamera,
        pickup_pressed: bool,
        hud: &mut dyn PromptPresenter,
    ) -> Option<Pickup> {
        puffin::profile_function!();

        let target = look_target(world, camera);
        if target != self.focused {
            self.clear_focus(world, hud);
            if let Some(entity) = target {
                self.focus(world, entity, hud);
            }
        }

        let entity = self.focused?;
        if !pickup_pressed {
            return None;
        }
        self.pick_up(world, entity, hud)
    }

    /// Drop focus and clear the highlight and prompt
    pub fn clear_focus(&mut self, world: &mut World, hud: &mut dyn PromptPresenter) {
        let Some(entity) = self.focused.take() else {
            return;
        };
        if let Ok(mut item) = world.get::<&mut PickableItem>(entity) {
            item.highlighted = false;
        }
        hud.hide_prompt();
    }

    fn focus(&mut self, world: &mut World, entity: Entity, hud: &mut dyn PromptPresenter) {
        if let Ok(mut item) = world.get::<&mut PickableItem>(entity) {
            debug!(item = %item.name, "item focused");
            item.highlighted = true;
            hud.show_prompt(&item.name, item.name_color);
            self.focused = Some(entity);
        }
    }

    fn pick_up(
        &mut self,
        world: &mut World,
        entity: Entity,
        hud: &mut dyn PromptPresenter,
    ) -> Option<Pickup> {
        let inspectable = {
            let mut item = world.get::<&mut PickableItem>(entity).ok()?;
            if !item.pickable() {
                return None;
            }
            item.picked = true;
            item.highlighted = false;
            info!(item = %item.name, "item picked up");
            item.inspectable
        };
        hud.hide_prompt();
        self.focused = None;
        if world.insert_one(entity, Hidden).is_err() {
            warn!(?entity, "picked item vanished");
        }
        Some(Pickup {
            item: entity,
            inspectable,
        })
    }
}

/// Nearest visible item under the view ray, if it is close enough to pick
fn look_target(world: &World, camera: &FirstPersonCamera) -> Option<Entity> {
    let origin = camera.position;
    let direction = camera.forward();

    let mut nearest: Option<(Entity, f32, bool)> = None;
    for (entity, (pos, item, hidden)) in world
        .query::<(&Position, &PickableItem, Option<&Hidden>)>()
        .iter()
    {
        if hidden.is_some() {
            continue;
        }
        let Some(distance) = ray_sphere(origin, direction, pos.0, item.radius) else {
            continue;
        };
        if distance > MAX_LOOK_DISTANCE {
            continue;
        }
        if nearest.map_or(true, |(_, best, _)| distance < best) {
            let in_reach = item.pickable() && distance <= item.pick_distance;
            nearest = Some((entity, distance, in_reach));
        }
    }

    // The nearest hit blocks items behind it, pickable or not
    nearest.and_then(|(entity, _, in_reach)| in_reach.then_some(entity))
}

// =============================================================================
// DETAIL VIEW
// =============================================================================

/// Display objects available to the detail view, at most one shown
#[derive(Debug, Clone, Default)]
pub struct DisplayCatalog {
    objects: Vec<String>,
    current: Option<String>,
}

impl DisplayCatalog {
    pub fn new(objects: Vec<String>) -> Self {
        Self {
            objects,
            current: None,
        }
    }

    /// Hide everything, then show `id` if it exists
    pub fn show(&mut self, id: &str) -> bool {
        self.hide_all();
        if self.objects.iter().any(|object| object == id) {
            self.current = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn hide_all(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

/// What the detail view is showing
#[derive(Debug, Clone, PartialEq)]
pub struct DetailContent {
    pub item: Entity,
    pub name: String,
    pub description: String,
    pub narration: Option<Entity>,
}

/// Returned when the detail view closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailClosed {
    pub item: Entity,
    /// Narration the caller should start now
    pub narration: Option<Entity>,
}

/// Full-screen item inspection. Pauses time and the camera while open.
#[derive(Debug, Clone)]
pub struct ItemDetailView {
    pub close_key: KeyCode,
    pub catalog: DisplayCatalog,
    content: Option<DetailContent>,
}

impl ItemDetailView {
    pub fn new(close_key: KeyCode, catalog: DisplayCatalog) -> Self {
        Self {
            close_key,
            catalog,
            content: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.content.is_some()
    }

    pub fn content(&self) -> Option<&DetailContent> {
        self.content.as_ref()
    }

    pub fn open(
        &mut self,
        entity: Entity,
        item: &PickableItem,
        camera: &mut FirstPersonCamera,
        time_scale: &mut f32,
    ) {
        camera.enabled = false;
        *time_scale = 0.0;
        if let Some(object) = &item.display_object {
            if !self.catalog.show(object) {
                warn!(item = %item.name, object = %object, "display object not found");
            }
        }
        info!(item = %item.name, "detail view opened");
        self.content = Some(DetailContent {
            item: entity,
            name: item.name.clone(),
            description: item.description.clone(),
            narration: item.narration,
        });
    }

    /// Close and restore time and camera. Returns None if it was not open.
    pub fn close(
        &mut self,
        camera: &mut FirstPersonCamera,
        time_scale: &mut f32,
    ) -> Option<DetailClosed> {
        let content = self.content.take()?;
        self.catalog.hide_all();
        *time_scale = 1.0;
        camera.enabled = true;
        info!(item = %content.name, "detail view closed");
        Some(DetailClosed {
            item: content.item,
            narration: content.narration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{call_log, Call, Recorder};

    fn spawn_item(world: &mut World, z: f32, item: PickableItem) -> Entity {
        world.spawn((Position::new(0.0, 0.0, z), item))
    }

    #[test]
    fn test_ray_sphere_hits_and_misses() {
        let hit = ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, 5.0), 1.0);
        assert_eq!(hit, Some(4.0));
        assert_eq!(ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 3.0, 5.0), 1.0), None);
        assert_eq!(ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, -5.0), 1.0), None);
        assert_eq!(ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::ZERO, 1.0), Some(0.0));
    }

    #[test]
    fn test_focus_and_pickup() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut world = World::new();
        let lantern = spawn_item(&mut world, 5.0, PickableItem::new("Lantern"));
        let camera = FirstPersonCamera::new(Vec3::ZERO);
        let mut picker = ItemPicker::new(KeyCode::KeyF);

        assert_eq!(picker.update(&mut world, &camera, false, &mut hud), None);
        assert_eq!(picker.focused(), Some(lantern));
        assert!(world.get::<&PickableItem>(lantern).unwrap().is_highlighted());
        assert_eq!(log.borrow().as_slice(), &[Call::Prompt("Lantern".to_string())]);

        let pickup = picker.update(&mut world, &camera, true, &mut hud);
        assert_eq!(pickup.map(|p| p.item), Some(lantern));
        assert!(world.get::<&PickableItem>(lantern).unwrap().picked);
        assert!(world.get::<&Hidden>(lantern).is_ok());

        // Hidden items are no longer hit
        assert_eq!(picker.update(&mut world, &camera, true, &mut hud), None);
        assert_eq!(picker.focused(), None);
    }

    #[test]
    fn test_out_of_pick_distance_not_focused() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut world = World::new();
        let mut far = PickableItem::new("Far");
        far.pick_distance = 2.0;
        spawn_item(&mut world, 5.0, far);
        let camera = FirstPersonCamera::new(Vec3::ZERO);
        let mut picker = ItemPicker::new(KeyCode::KeyF);
        assert_eq!(picker.update(&mut world, &camera, true, &mut hud), None);
        assert_eq!(picker.focused(), None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_nearest_disabled_item_blocks_view() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut world = World::new();
        let mut statue = PickableItem::new("Statue");
        statue.can_pickup = false;
        spawn_item(&mut world, 3.0, statue);
        spawn_item(&mut world, 6.0, PickableItem::new("Coin"));
        let camera = FirstPersonCamera::new(Vec3::ZERO);
        let mut picker = ItemPicker::new(KeyCode::KeyF);
        assert_eq!(picker.update(&mut world, &camera, false, &mut hud), None);
        assert_eq!(picker.focused(), None);
    }

    #[test]
    fn test_looking_away_clears_focus() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut world = World::new();
        let coin = spawn_item(&mut world, 5.0, PickableItem::new("Coin"));
        let mut camera = FirstPersonCamera::new(Vec3::ZERO);
        let mut picker = ItemPicker::new(KeyCode::KeyF);
        picker.update(&mut world, &camera, false, &mut hud);

        camera.yaw = 180.0;
        picker.update(&mut world, &camera, false, &mut hud);
        assert_eq!(picker.focused(), None);
        assert!(!world.get::<&PickableItem>(coin).unwrap().is_highlighted());
        assert_eq!(log.borrow().last(), Some(&Call::HidePrompt));
    }

    #[test]
    fn test_detail_view_pauses_and_restores() {
        let mut world = World::new();
        let narration = world.spawn(());
        let mut item = PickableItem::new("Letter");
        item.display_object = Some("letter".to_string());
        item.narration = Some(narration);
        let entity = world.spawn((item.clone(),));

        let mut camera = FirstPersonCamera::new(Vec3::ZERO);
        let mut time_scale = 1.0;
        let mut view = ItemDetailView::new(
            KeyCode::Space,
            DisplayCatalog::new(vec!["letter".to_string(), "key".to_string()]),
        );

        view.open(entity, &item, &mut camera, &mut time_scale);
        assert!(view.is_open());
        assert!(!camera.enabled);
        assert_eq!(time_scale, 0.0);
        assert_eq!(view.catalog.current(), Some("letter"));

        let closed = view.close(&mut camera, &mut time_scale);
        assert_eq!(closed.and_then(|c| c.narration), Some(narration));
        assert!(camera.enabled);
        assert_eq!(time_scale, 1.0);
        assert_eq!(view.catalog.current(), None);
        assert!(view.close(&mut camera, &mut time_scale).is_none());
    }

    #[test]
    fn test_catalog_unknown_id_hides_all() {
        let mut catalog = DisplayCatalog::new(vec!["key".to_string()]);
        assert!(catalog.show("key"));
        assert!(!catalog.show("map"));
        assert_eq!(catalog.current(), None);
    }
}
