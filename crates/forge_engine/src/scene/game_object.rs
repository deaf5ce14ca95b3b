//! Game objects and the id-keyed store that owns them
//!
//! Objects are addressed by an opaque id that is unique for the process
//! lifetime: ids are handed out by a monotonic counter and never reused,
//! even after removal. Cross-object references (collision pairs, reset
//! snapshots) always go through ids rather than pointers.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::foundation::math::{Mat3, Mat4, Vec3};
use crate::render::mesh::Mesh;

/// Opaque, process-unique object id
pub type GameObjectId = u32;

/// Position, Euler rotation, and per-axis scale
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    pub translation: Vec3,
    pub scale: Vec3,
    /// Euler angles in radians, applied in Y-X-Z order
    pub rotation: Vec3,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Vec3::zeros(),
        }
    }
}

impl TransformComponent {
    /// Model matrix: translate * Ry * Rx * Rz * scale
    pub fn mat4(&self) -> Mat4 {
        let translation = Mat4::new_translation(&self.translation);
        let rotation_y = Mat4::from_axis_angle(&Vec3::y_axis(), self.rotation.y);
        let rotation_x = Mat4::from_axis_angle(&Vec3::x_axis(), self.rotation.x);
        let rotation_z = Mat4::from_axis_angle(&Vec3::z_axis(), self.rotation.z);
        let scale = Mat4::new_nonuniform_scaling(&self.scale);

        translation * rotation_y * rotation_x * rotation_z * scale
    }

    /// Normal matrix: inverse-transpose of the model matrix's linear part,
    /// so lighting stays correct under non-uniform scale. Falls back to
    /// identity for a singular (zero-scale) transform.
    pub fn normal_matrix(&self) -> Mat3 {
        let model = self.mat4();
        let linear: Mat3 = model.fixed_view::<3, 3>(0, 0).into_owned();

        match linear.try_inverse() {
            Some(inverse) => inverse.transpose(),
            None => {
                log::warn!("Model matrix is not invertible, using identity normal matrix");
                Mat3::identity()
            }
        }
    }
}

/// Simulation state for entities the physics integrator moves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsComponent {
    pub velocity: Vec3,
    pub mass: f32,
    pub is_static: bool,
}

impl Default for PhysicsComponent {
    fn default() -> Self {
        Self {
            velocity: Vec3::zeros(),
            mass: 1.0,
            is_static: false,
        }
    }
}

/// Marks an entity as a light emitter for the point light pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightComponent {
    pub light_intensity: f32,
}

/// A single scene entity
pub struct GameObject {
    id: GameObjectId,
    pub transform: TransformComponent,
    pub color: Vec3,
    pub mesh: Option<Arc<Mesh>>,
    pub physics: Option<PhysicsComponent>,
    pub point_light: Option<PointLightComponent>,
}

impl GameObject {
    fn new(id: GameObjectId) -> Self {
        Self {
            id,
            transform: TransformComponent::default(),
            color: Vec3::new(1.0, 1.0, 1.0),
            mesh: None,
            physics: None,
            point_light: None,
        }
    }

    /// The object's process-unique id
    pub fn id(&self) -> GameObjectId {
        self.id
    }

    /// Whether the physics integrator may move this object.
    /// Non-positive mass is treated as static.
    pub fn is_dynamic(&self) -> bool {
        self.physics.map_or(false, |p| !p.is_static && p.mass > 0.0)
    }
}

/// Captured state used by `reset_simulation`
#[derive(Clone)]
struct InitialState {
    transform: TransformComponent,
    physics: Option<PhysicsComponent>,
}

/// Id-keyed object store with stable (ascending-id) iteration order
#[derive(Default)]
pub struct GameObjectStore {
    objects: BTreeMap<GameObjectId, GameObject>,
    initial_states: BTreeMap<GameObjectId, InitialState>,
    next_id: GameObjectId,
}

impl GameObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new object with the next id and return it for setup
    pub fn create_object(&mut self) -> &mut GameObject {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.insert(id, GameObject::new(id));
        self.objects.get_mut(&id).unwrap()
    }

    /// Create a light-emitting object; `radius` is carried in the x scale
    pub fn create_point_light(&mut self, intensity: f32, radius: f32, color: Vec3) -> &mut GameObject {
        let object = self.create_object();
        object.color = color;
        object.transform.scale.x = radius;
        object.point_light = Some(PointLightComponent {
            light_intensity: intensity,
        });
        object
    }

    pub fn get(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    /// Remove an object; its id is never handed out again
    pub fn remove(&mut self, id: GameObjectId) -> Option<GameObject> {
        self.initial_states.remove(&id);
        self.objects.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate objects in ascending-id order
    pub fn iter(&self) -> impl Iterator<Item = (&GameObjectId, &GameObject)> {
        self.objects.iter()
    }

    /// Iterate objects mutably in ascending-id order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&GameObjectId, &mut GameObject)> {
        self.objects.iter_mut()
    }

    /// Snapshot every object's transform and physics state for later reset
    pub fn capture_initial_state(&mut self) {
        self.initial_states = self
            .objects
            .iter()
            .map(|(&id, object)| {
                (
                    id,
                    InitialState {
                        transform: object.transform.clone(),
                        physics: object.physics,
                    },
                )
            })
            .collect();
    }

    /// Restore every still-present object to its captured state.
    /// Calling this repeatedly yields the same state each time.
    pub fn reset_simulation(&mut self) {
        for (id, state) in &self.initial_states {
            if let Some(object) = self.objects.get_mut(id) {
                object.transform = state.transform.clone();
                object.physics = state.physics;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::foundation::math::Vec4;

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut store = GameObjectStore::new();

        let first = store.create_object().id();
        let second = store.create_object().id();
        assert!(second > first);

        store.remove(second);
        let third = store.create_object().id();
        assert!(third > second, "removed ids must not be reused");
    }

    #[test]
    fn test_iteration_is_in_ascending_id_order() {
        let mut store = GameObjectStore::new();
        for _ in 0..5 {
            store.create_object();
        }
        store.remove(2);

        let ids: Vec<GameObjectId> = store.iter().map(|(&id, _)| id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_reset_simulation_is_idempotent() {
        let mut store = GameObjectStore::new();
        let id = {
            let object = store.create_object();
            object.transform.translation = Vec3::new(0.0, -5.0, 0.0);
            object.physics = Some(PhysicsComponent::default());
            object.id()
        };
        store.capture_initial_state();

        // Simulate some mutation
        let object = store.get_mut(id).unwrap();
        object.transform.translation = Vec3::new(3.0, 1.0, -2.0);
        object.physics.as_mut().unwrap().velocity = Vec3::new(0.0, 4.0, 0.0);

        store.reset_simulation();
        let after_first = store.get(id).unwrap().transform.translation;
        let velocity_first = store.get(id).unwrap().physics.unwrap().velocity;

        store.reset_simulation();
        let after_second = store.get(id).unwrap().transform.translation;
        let velocity_second = store.get(id).unwrap().physics.unwrap().velocity;

        assert_eq!(after_first, Vec3::new(0.0, -5.0, 0.0));
        assert_eq!(after_first, after_second);
        assert_eq!(velocity_first, Vec3::zeros());
        assert_eq!(velocity_first, velocity_second);
    }

    #[test]
    fn test_non_positive_mass_is_treated_as_static() {
        let mut store = GameObjectStore::new();
        let object = store.create_object();
        object.physics = Some(PhysicsComponent {
            mass: 0.0,
            ..Default::default()
        });

        assert!(!object.is_dynamic());

        object.physics.as_mut().unwrap().mass = 1.0;
        assert!(object.is_dynamic());

        object.physics.as_mut().unwrap().is_static = true;
        assert!(!object.is_dynamic());
    }

    #[test]
    fn test_model_matrix_translation_column() {
        let transform = TransformComponent {
            translation: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };

        let model = transform.mat4();
        assert_relative_eq!(model[(0, 3)], 1.0);
        assert_relative_eq!(model[(1, 3)], 2.0);
        assert_relative_eq!(model[(2, 3)], 3.0);
    }

    #[test]
    fn test_rotation_order_is_y_then_x_then_z() {
        let half_pi = std::f32::consts::FRAC_PI_2;
        let transform = TransformComponent {
            rotation: Vec3::new(half_pi, half_pi, 0.0),
            ..Default::default()
        };

        // With R = Ry * Rx * Rz, the +Z axis is first pitched onto -Y by
        // Rx and is then unaffected by the yaw.
        let rotated = transform.mat4() * Vec4::new(0.0, 0.0, 1.0, 0.0);

        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(rotated.y, -1.0, epsilon = 1e-6);
        assert_relative_eq!(rotated.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normal_matrix_counteracts_non_uniform_scale() {
        let transform = TransformComponent {
            scale: Vec3::new(2.0, 1.0, 4.0),
            ..Default::default()
        };

        let normal = transform.normal_matrix();

        assert_relative_eq!(normal[(0, 0)], 0.5, epsilon = 1e-6);
        assert_relative_eq!(normal[(1, 1)], 1.0, epsilon = 1e-6);
        assert_relative_eq!(normal[(2, 2)], 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_normal_matrix_equals_rotation_for_rigid_transform() {
        let transform = TransformComponent {
            rotation: Vec3::new(0.4, 1.1, -0.7),
            translation: Vec3::new(5.0, -1.0, 2.0),
            ..Default::default()
        };

        let normal = transform.normal_matrix();
        let rotation: Mat3 = transform.mat4().fixed_view::<3, 3>(0, 0).into_owned();

        assert_relative_eq!(normal, rotation, epsilon = 1e-5);
    }
}
