//! First-person observer camera.
//!
//! The camera position is the observer position used for every proximity
//! check. Angles are in degrees; yaw 0 looks down +Z, positive pitch looks up.

use glam::{Vec2, Vec3};

use crate::constants::*;
use crate::input::InputState;

#[derive(Debug, Clone)]
pub struct FirstPersonCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub move_speed: f32,
    pub rotation_speed: f32,
    /// Disabled while the item detail view is open
    pub enabled: bool,
}

impl FirstPersonCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            move_speed: CAMERA_MOVE_SPEED,
            rotation_speed: CAMERA_ROTATION_SPEED,
            enabled: true,
        }
    }

    /// Unit view direction
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        )
    }

    /// Right vector on the ground plane
    pub fn right(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        Vec3::new(yaw.cos(), 0.0, -yaw.sin())
    }

    /// Apply one frame of mouse-look and movement
    pub fn update(&mut self, input: &InputState, dt: f32) {
        if !self.enabled {
            return;
        }
        self.rotate(input.mouse_delta);
        self.translate(input.movement_axis(), dt);
    }

    /// Mouse-look: `delta.x` turns right, `delta.y` looks up
    pub fn rotate(&mut self, delta: Vec2) {
        self.yaw = (self.yaw + delta.x * self.rotation_speed).rem_euclid(360.0);
        self.pitch = (self.pitch + delta.y * self.rotation_speed)
            .clamp(-CAMERA_PITCH_LIMIT, CAMERA_PITCH_LIMIT);
    }

    /// Move along the view direction (`axis.y`) and strafe (`axis.x`)
    pub fn translate(&mut self, axis: Vec2, dt: f32) {
        let direction = self.right() * axis.x + self.forward() * axis.y;
        self.position += direction * self.move_speed * dt;
    }

    /// Point the camera at a world position
    pub fn look_at(&mut self, target: Vec3) {
        let to = target - self.position;
        if to.length_squared() <= f32::EPSILON {
            return;
        }
        let flat = Vec2::new(to.x, to.z).length();
        self.yaw = to.x.atan2(to.z).to_degrees().rem_euclid(360.0);
        self.pitch = to
            .y
            .atan2(flat)
            .to_degrees()
            .clamp(-CAMERA_PITCH_LIMIT, CAMERA_PITCH_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_default_looks_down_z() {
        let camera = FirstPersonCamera::new(Vec3::ZERO);
        assert!(approx(camera.forward(), Vec3::Z));
        assert!(approx(camera.right(), Vec3::X));
    }

    #[test]
    fn test_pitch_clamped() {
        let mut camera = FirstPersonCamera::new(Vec3::ZERO);
        camera.rotate(Vec2::new(0.0, 1000.0));
        assert_eq!(camera.pitch, CAMERA_PITCH_LIMIT);
    }

    #[test]
    fn test_look_at_then_forward_points_at_target() {
        let mut camera = FirstPersonCamera::new(Vec3::new(1.0, 1.0, 1.0));
        let target = Vec3::new(4.0, 1.0, -3.0);
        camera.look_at(target);
        let expected = (target - camera.position).normalize();
        assert!(approx(camera.forward(), expected));
    }

    #[test]
    fn test_disabled_camera_ignores_input() {
        let mut camera = FirstPersonCamera::new(Vec3::ZERO);
        camera.enabled = false;
        let mut input = InputState::new();
        input.press(KeyCode::KeyW);
        input.add_mouse_motion(10.0, 0.0);
        camera.update(&input, 1.0);
        assert_eq!(camera.position, Vec3::ZERO);
        assert_eq!(camera.yaw, 0.0);
    }

    #[test]
    fn test_walk_forward() {
        let mut camera = FirstPersonCamera::new(Vec3::ZERO);
        let mut input = InputState::new();
        input.press(KeyCode::KeyW);
        camera.update(&input, 0.5);
        assert!(approx(camera.position, Vec3::new(0.0, 0.0, CAMERA_MOVE_SPEED * 0.5)));
    }
}
