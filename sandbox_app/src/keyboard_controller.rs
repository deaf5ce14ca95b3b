//! First-person keyboard camera controller
//!
//! Moves a viewer transform in the XZ plane: WASD to translate, Q/E for
//! height, arrow keys to look around. The world is Y-down, so "up" is -Y.

use forge_engine::prelude::{TransformComponent, Vec3, Window};
use glfw::Key;

pub struct KeyboardController {
    pub move_speed: f32,
    pub look_speed: f32,
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            look_speed: 1.5,
        }
    }
}

impl KeyboardController {
    pub fn move_in_plane_xz(&self, window: &Window, dt: f32, transform: &mut TransformComponent) {
        let mut rotate = Vec3::zeros();
        if window.is_key_pressed(Key::Right) {
            rotate.y += 1.0;
        }
        if window.is_key_pressed(Key::Left) {
            rotate.y -= 1.0;
        }
        if window.is_key_pressed(Key::Up) {
            rotate.x += 1.0;
        }
        if window.is_key_pressed(Key::Down) {
            rotate.x -= 1.0;
        }

        if rotate.magnitude_squared() > f32::EPSILON {
            transform.rotation += self.look_speed * dt * rotate.normalize();
        }

        // Keep pitch short of straight up/down and yaw in one revolution
        transform.rotation.x = transform.rotation.x.clamp(-1.5, 1.5);
        transform.rotation.y %= 2.0 * std::f32::consts::PI;

        let yaw = transform.rotation.y;
        let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        let right = Vec3::new(forward.z, 0.0, -forward.x);
        let up = Vec3::new(0.0, -1.0, 0.0);

        let mut movement = Vec3::zeros();
        if window.is_key_pressed(Key::W) {
            movement += forward;
        }
        if window.is_key_pressed(Key::S) {
            movement -= forward;
        }
        if window.is_key_pressed(Key::D) {
            movement += right;
        }
        if window.is_key_pressed(Key::A) {
            movement -= right;
        }
        if window.is_key_pressed(Key::E) {
            movement += up;
        }
        if window.is_key_pressed(Key::Q) {
            movement -= up;
        }

        if movement.magnitude_squared() > f32::EPSILON {
            transform.translation += self.move_speed * dt * movement.normalize();
        }
    }
}
