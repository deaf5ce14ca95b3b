//! Retained scene of game objects

pub mod game_object;

pub use game_object::{
    GameObject, GameObjectId, GameObjectStore, PhysicsComponent, PointLightComponent, TransformComponent,
};
