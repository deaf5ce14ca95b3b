//! Semi-implicit Euler integration with AABB collision response
//!
//! The world is Y-down: gravity is a positive Y acceleration and the
//! ground plane caps positive Y. Each step runs four phases in strict
//! order over dynamic objects (non-static, mass > 0): integration for all
//! objects, ground resolution, pairwise AABB resolution, then a global
//! velocity damping factor that bounds energy growth from discretization
//! error. Pairs resolve in ascending-id order, which the store guarantees.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::render::frame_info::FrameInfo;
use crate::scene::{GameObjectId, GameObjectStore, PhysicsComponent, TransformComponent};

/// A reflected bounce below this speed is zeroed, putting the object to
/// rest. Sits above `gravity * dt * restitution` at the 60 Hz defaults, so
/// the gravity kick picked up in a single resting step always damps back
/// to zero instead of micro-bouncing forever.
const REST_EPSILON: f32 = 0.15;

/// Centers closer than this cannot produce a collision normal; the pair
/// is skipped for the frame.
const MIN_CENTER_DISTANCE: f32 = 1e-6;

/// Tunable integrator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration; positive Y is down
    pub gravity: f32,
    /// Fraction of relative velocity preserved across a collision
    pub restitution: f32,
    /// Y coordinate of the ground plane
    pub ground_y: f32,
    /// Per-step velocity multiplier applied to all dynamic objects
    pub velocity_damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            restitution: 0.7,
            ground_y: 0.0,
            velocity_damping: 0.99,
        }
    }
}

/// The physics integrator; one instance drives the whole scene
pub struct PhysicsSystem {
    config: PhysicsConfig,
}

impl PhysicsSystem {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    /// Advance the scene by the frame's elapsed time
    pub fn update(&self, frame_info: &mut FrameInfo) {
        self.step(frame_info.frame_time, frame_info.game_objects);
    }

    /// Advance the scene by `dt` seconds
    pub fn step(&self, dt: f32, objects: &mut GameObjectStore) {
        self.integrate(dt, objects);
        self.resolve_ground_collisions(objects);
        self.resolve_pair_collisions(objects);
        self.apply_damping(objects);
    }

    fn integrate(&self, dt: f32, objects: &mut GameObjectStore) {
        for (_, object) in objects.iter_mut() {
            if !object.is_dynamic() {
                continue;
            }
            let physics = object.physics.as_mut().unwrap();

            physics.velocity.y += self.config.gravity * dt;
            object.transform.translation += physics.velocity * dt;
        }
    }

    fn resolve_ground_collisions(&self, objects: &mut GameObjectStore) {
        for (_, object) in objects.iter_mut() {
            if !object.is_dynamic() {
                continue;
            }

            let bottom = object.transform.translation.y + object.transform.scale.y * 0.5;
            if bottom >= self.config.ground_y {
                let physics = object.physics.as_mut().unwrap();
                Self::resolve_ground(&self.config, &mut object.transform, physics);
            }
        }
    }

    /// Rest the object's lower bound exactly on the plane; reflect the
    /// velocity if it still points into the ground.
    fn resolve_ground(config: &PhysicsConfig, transform: &mut TransformComponent, physics: &mut PhysicsComponent) {
        transform.translation.y = config.ground_y - transform.scale.y * 0.5;

        if physics.velocity.y > 0.0 {
            let rebound = physics.velocity.y * config.restitution;
            physics.velocity.y = if rebound < REST_EPSILON { 0.0 } else { -rebound };
        }
    }

    fn resolve_pair_collisions(&self, objects: &mut GameObjectStore) {
        let ids: Vec<GameObjectId> = objects
            .iter()
            .filter(|(_, object)| object.is_dynamic())
            .map(|(&id, _)| id)
            .collect();

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let first = objects.get(ids[i]).unwrap();
                let second = objects.get(ids[j]).unwrap();

                if !aabb_overlap(&first.transform, &second.transform) {
                    continue;
                }

                let mut transform_a = first.transform.clone();
                let mut physics_a = first.physics.unwrap();
                let mut transform_b = second.transform.clone();
                let mut physics_b = second.physics.unwrap();

                if !self.resolve_collision(&mut transform_a, &mut physics_a, &mut transform_b, &mut physics_b) {
                    continue;
                }

                let object_a = objects.get_mut(ids[i]).unwrap();
                object_a.transform = transform_a;
                object_a.physics = Some(physics_a);

                let object_b = objects.get_mut(ids[j]).unwrap();
                object_b.transform = transform_b;
                object_b.physics = Some(physics_b);
            }
        }
    }

    /// Separate the pair along the center-to-center normal and exchange an
    /// impulse. Returns false when nothing was resolved.
    fn resolve_collision(
        &self,
        transform_a: &mut TransformComponent,
        physics_a: &mut PhysicsComponent,
        transform_b: &mut TransformComponent,
        physics_b: &mut PhysicsComponent,
    ) -> bool {
        let delta = transform_a.translation - transform_b.translation;
        let distance = delta.magnitude();
        if distance < MIN_CENTER_DISTANCE {
            // Coincident centers give no usable normal; skip the pair
            return false;
        }
        let normal = delta / distance;

        // Positional correction: push each object out by half the overlap
        let overlap = (transform_a.scale + transform_b.scale).magnitude() * 0.5 - distance;
        if overlap > 0.0 {
            transform_a.translation += normal * overlap * 0.5;
            transform_b.translation -= normal * overlap * 0.5;
        }

        let relative_velocity = physics_a.velocity - physics_b.velocity;
        let velocity_along_normal = relative_velocity.dot(&normal);

        // Already separating; leave velocities alone
        if velocity_along_normal > 0.0 {
            return true;
        }

        let impulse_magnitude = -(1.0 + self.config.restitution) * velocity_along_normal
            / (1.0 / physics_a.mass + 1.0 / physics_b.mass);

        let impulse: Vec3 = normal * impulse_magnitude;
        physics_a.velocity += impulse / physics_a.mass;
        physics_b.velocity -= impulse / physics_b.mass;

        true
    }

    fn apply_damping(&self, objects: &mut GameObjectStore) {
        for (_, object) in objects.iter_mut() {
            if !object.is_dynamic() {
                continue;
            }
            object.physics.as_mut().unwrap().velocity *= self.config.velocity_damping;
        }
    }
}

/// Axis-aligned overlap test using `position +/- scale / 2` as the box
fn aabb_overlap(a: &TransformComponent, b: &TransformComponent) -> bool {
    let min_a = a.translation - a.scale * 0.5;
    let max_a = a.translation + a.scale * 0.5;
    let min_b = b.translation - b.scale * 0.5;
    let max_b = b.translation + b.scale * 0.5;

    min_a.x <= max_b.x
        && max_a.x >= min_b.x
        && min_a.y <= max_b.y
        && max_a.y >= min_b.y
        && min_a.z <= max_b.z
        && max_a.z >= min_b.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::scene::GameObjectStore;

    const DT: f32 = 1.0 / 60.0;

    fn spawn_box(store: &mut GameObjectStore, position: Vec3, velocity: Vec3, mass: f32) -> GameObjectId {
        let object = store.create_object();
        object.transform.translation = position;
        object.physics = Some(PhysicsComponent {
            velocity,
            mass,
            is_static: false,
        });
        object.id()
    }

    fn frictionless() -> PhysicsSystem {
        PhysicsSystem::new(PhysicsConfig {
            gravity: 0.0,
            restitution: 1.0,
            ground_y: 0.0,
            velocity_damping: 1.0,
        })
    }

    #[test]
    fn test_gravity_accelerates_downward() {
        let system = PhysicsSystem::new(PhysicsConfig::default());
        let mut store = GameObjectStore::new();
        let id = spawn_box(&mut store, Vec3::new(0.0, -10.0, 0.0), Vec3::zeros(), 1.0);

        system.step(DT, &mut store);

        let object = store.get(id).unwrap();
        // Down-positive Y: velocity grows positive, position moves toward the ground
        assert!(object.physics.unwrap().velocity.y > 0.0);
        assert!(object.transform.translation.y > -10.0);
    }

    #[test]
    fn test_static_and_massless_objects_are_untouched() {
        let system = PhysicsSystem::new(PhysicsConfig::default());
        let mut store = GameObjectStore::new();

        let static_id = {
            let object = store.create_object();
            object.transform.translation = Vec3::new(0.0, -3.0, 0.0);
            object.physics = Some(PhysicsComponent {
                is_static: true,
                ..Default::default()
            });
            object.id()
        };
        let massless_id = {
            let object = store.create_object();
            object.transform.translation = Vec3::new(2.0, -3.0, 0.0);
            object.physics = Some(PhysicsComponent {
                mass: 0.0,
                ..Default::default()
            });
            object.id()
        };
        let bare_id = {
            let object = store.create_object();
            object.transform.translation = Vec3::new(4.0, -3.0, 0.0);
            object.id()
        };

        for _ in 0..10 {
            system.step(DT, &mut store);
        }

        assert_eq!(store.get(static_id).unwrap().transform.translation, Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(store.get(massless_id).unwrap().transform.translation, Vec3::new(2.0, -3.0, 0.0));
        assert_eq!(store.get(bare_id).unwrap().transform.translation, Vec3::new(4.0, -3.0, 0.0));
    }

    #[test]
    fn test_drop_settles_on_ground_plane() {
        // Scenario: unit cube of mass 1 dropped from 5 units above the
        // ground with the default constants, stepped until it settles.
        let system = PhysicsSystem::new(PhysicsConfig::default());
        let mut store = GameObjectStore::new();
        let id = spawn_box(&mut store, Vec3::new(0.0, -5.0, 0.0), Vec3::zeros(), 1.0);

        for _ in 0..2000 {
            system.step(DT, &mut store);
        }

        let object = store.get(id).unwrap();
        // Lower bound rests exactly on the plane: center = ground - half extent
        assert_relative_eq!(object.transform.translation.y, -0.5, epsilon = 1e-5);
        assert_eq!(object.physics.unwrap().velocity.y, 0.0);
    }

    #[test]
    fn test_resting_object_stays_at_rest() {
        // An object already resting on the plane with negligible velocity
        // must stay at zero velocity across repeated updates.
        let system = PhysicsSystem::new(PhysicsConfig::default());
        let mut store = GameObjectStore::new();
        let id = spawn_box(&mut store, Vec3::new(0.0, -0.5, 0.0), Vec3::zeros(), 1.0);

        for _ in 0..100 {
            system.step(DT, &mut store);
            let object = store.get(id).unwrap();
            assert_eq!(object.physics.unwrap().velocity.y, 0.0);
            assert_relative_eq!(object.transform.translation.y, -0.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_bounce_reflects_with_restitution() {
        let system = PhysicsSystem::new(PhysicsConfig {
            gravity: 0.0,
            velocity_damping: 1.0,
            ..Default::default()
        });
        let mut store = GameObjectStore::new();
        // Moving into the ground fast enough that the bounce survives
        let id = spawn_box(&mut store, Vec3::new(0.0, -0.51, 0.0), Vec3::new(0.0, 2.0, 0.0), 1.0);

        system.step(DT, &mut store);

        let physics = store.get(id).unwrap().physics.unwrap();
        assert_relative_eq!(physics.velocity.y, -2.0 * 0.7, epsilon = 1e-5);
    }

    #[test]
    fn test_equal_mass_head_on_elastic_swap() {
        // Scenario: equal masses approaching head-on with restitution 1.0
        // exchange velocities exactly.
        let system = frictionless();
        let mut store = GameObjectStore::new();
        let a = spawn_box(&mut store, Vec3::new(-0.4, -2.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1.0);
        let b = spawn_box(&mut store, Vec3::new(0.4, -2.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 1.0);

        system.step(DT, &mut store);

        let velocity_a = store.get(a).unwrap().physics.unwrap().velocity;
        let velocity_b = store.get(b).unwrap().physics.unwrap().velocity;
        assert_relative_eq!(velocity_a.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(velocity_b.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(velocity_a.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(velocity_b.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_collision_conserves_momentum() {
        let system = PhysicsSystem::new(PhysicsConfig {
            gravity: 0.0,
            restitution: 0.6,
            ground_y: 100.0,
            velocity_damping: 1.0,
        });
        let mut store = GameObjectStore::new();
        let a = spawn_box(&mut store, Vec3::new(-0.3, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), 2.0);
        let b = spawn_box(&mut store, Vec3::new(0.3, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 3.0);

        let momentum_before = 2.0 * store.get(a).unwrap().physics.unwrap().velocity
            + 3.0 * store.get(b).unwrap().physics.unwrap().velocity;

        system.step(DT, &mut store);

        let momentum_after = 2.0 * store.get(a).unwrap().physics.unwrap().velocity
            + 3.0 * store.get(b).unwrap().physics.unwrap().velocity;

        assert_relative_eq!(momentum_before, momentum_after, epsilon = 1e-4);
    }

    #[test]
    fn test_separating_objects_receive_no_impulse() {
        let system = frictionless();
        let mut store = GameObjectStore::new();
        // Overlapping but already moving apart
        let a = spawn_box(&mut store, Vec3::new(-0.2, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 1.0);
        let b = spawn_box(&mut store, Vec3::new(0.2, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1.0);

        system.step(DT, &mut store);

        // Positions were pushed apart, but velocities are untouched
        assert_relative_eq!(store.get(a).unwrap().physics.unwrap().velocity.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(store.get(b).unwrap().physics.unwrap().velocity.x, 1.0, epsilon = 1e-5);
        assert!(store.get(a).unwrap().transform.translation.x < -0.2);
        assert!(store.get(b).unwrap().transform.translation.x > 0.2);
    }

    #[test]
    fn test_coincident_centers_are_skipped() {
        let system = frictionless();
        let mut store = GameObjectStore::new();
        let position = Vec3::new(0.0, -2.0, 0.0);
        let a = spawn_box(&mut store, position, Vec3::zeros(), 1.0);
        let b = spawn_box(&mut store, position, Vec3::zeros(), 1.0);

        system.step(DT, &mut store);

        // No normal can be derived, so neither object moves
        assert_eq!(store.get(a).unwrap().transform.translation, position);
        assert_eq!(store.get(b).unwrap().transform.translation, position);
    }

    #[test]
    fn test_damping_shrinks_velocity() {
        let system = PhysicsSystem::new(PhysicsConfig {
            gravity: 0.0,
            ..Default::default()
        });
        let mut store = GameObjectStore::new();
        let id = spawn_box(&mut store, Vec3::new(0.0, -5.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1.0);

        system.step(DT, &mut store);

        assert_relative_eq!(store.get(id).unwrap().physics.unwrap().velocity.x, 0.99, epsilon = 1e-6);
    }

    #[test]
    fn test_aabb_overlap_cases() {
        let at = |x: f32, y: f32, z: f32| TransformComponent {
            translation: Vec3::new(x, y, z),
            ..Default::default()
        };

        // Unit boxes: centers closer than 1.0 on every axis overlap
        assert!(aabb_overlap(&at(0.0, 0.0, 0.0), &at(0.9, 0.0, 0.0)));
        assert!(aabb_overlap(&at(0.0, 0.0, 0.0), &at(1.0, 0.0, 0.0)), "touching faces count");
        assert!(!aabb_overlap(&at(0.0, 0.0, 0.0), &at(1.01, 0.0, 0.0)));
        assert!(!aabb_overlap(&at(0.0, 0.0, 0.0), &at(0.9, 0.0, 1.5)));
    }
}
