//! Static obstacles

use std::sync::Arc;

use glam::Vec2;

use super::entity::{Body, Entity, EntityKind};
use super::shape::ConvexShape;

pub const OBSTACLE_MATERIAL: &str = "obstacle";

#[derive(Debug, Clone)]
pub struct Obstacle {
    visible: bool,
    material: String,
}

impl Obstacle {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            visible: true,
            material: material.into(),
        }
    }

    /// Obstacle entity at rest; `mass` only matters to robots bouncing off it
    pub fn spawn(position: Vec2, mass: f32, shape: Arc<ConvexShape>) -> Entity {
        Entity::new(
            Body::new(position, mass),
            Some(shape),
            EntityKind::Obstacle(Self::new(OBSTACLE_MATERIAL)),
        )
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn material(&self) -> &str {
        &self.material
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingSink;

    #[test]
    fn test_obstacles_share_one_shape() {
        let shape = Arc::new(ConvexShape::circle(40.0, 24).unwrap());
        let a = Obstacle::spawn(Vec2::ZERO, 1.0, Arc::clone(&shape));
        let b = Obstacle::spawn(Vec2::X * 100.0, 1.0, Arc::clone(&shape));
        assert!(Arc::ptr_eq(a.shape().unwrap(), b.shape().unwrap()));
        assert_eq!(Arc::strong_count(&shape), 3);
    }

    #[test]
    fn test_hidden_obstacle_is_not_drawn() {
        let shape = Arc::new(ConvexShape::circle(40.0, 24).unwrap());
        let mut entity = Obstacle::spawn(Vec2::ZERO, 1.0, shape);
        let mut sink = RecordingSink::default();

        entity.render(&mut sink);
        assert_eq!(sink.with_material(OBSTACLE_MATERIAL).count(), 1);

        if let EntityKind::Obstacle(obstacle) = entity.kind_mut() {
            obstacle.set_visible(false);
        }
        sink.clear();
        entity.render(&mut sink);
        assert!(sink.requests.is_empty());
    }
}
