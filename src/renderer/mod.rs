//! Render-side interface
//!
//! The simulation never draws. Each frame it submits [`DrawRequest`]s and
//! point lights to a [`RenderSink`]; whatever sits behind the sink batches and
//! issues the actual draw calls. Lights are fire-and-forget proxies owned by a
//! [`Lights`] registry and addressed by [`LightId`].

use std::collections::BTreeMap;

use glam::{Affine2, Vec2};
use serde::Serialize;

use crate::sim::EntityId;

/// Opaque request to draw one entity part
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawRequest {
    pub entity: EntityId,
    /// Material or mesh tag resolved by the renderer
    pub material: String,
    pub transform: Affine2,
}

impl DrawRequest {
    pub fn new(entity: EntityId, material: &str, transform: Affine2) -> Self {
        Self {
            entity,
            material: material.to_string(),
            transform,
        }
    }

    /// World position of the request's origin
    pub fn position(&self) -> Vec2 {
        self.transform.translation
    }
}

/// Point light proxy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointLight {
    pub position: Vec2,
    pub radius: f32,
    pub intensity: f32,
    pub color: [f32; 4],
}

impl PointLight {
    /// Warm glow that follows exploding projectiles
    pub fn burst(position: Vec2) -> Self {
        Self {
            position,
            radius: 150.0,
            intensity: 1.5,
            color: [1.0, 0.6, 0.2, 1.0],
        }
    }

    /// Soft light carried by a robot during a duel
    pub fn robot(position: Vec2) -> Self {
        Self {
            position,
            radius: 300.0,
            intensity: 0.8,
            color: [0.8, 0.9, 1.0, 1.0],
        }
    }
}

/// Handle to a registered light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LightId(u32);

/// Live point lights, iterated in registration order
#[derive(Debug, Default)]
pub struct Lights {
    lights: BTreeMap<LightId, PointLight>,
    next_id: u32,
}

impl Lights {
    pub fn register(&mut self, light: PointLight) -> LightId {
        let id = LightId(self.next_id);
        self.next_id += 1;
        self.lights.insert(id, light);
        id
    }

    /// Move a light; unknown handles are ignored
    pub fn set_position(&mut self, id: LightId, position: Vec2) {
        if let Some(light) = self.lights.get_mut(&id) {
            light.position = position;
        }
    }

    pub fn remove(&mut self, id: LightId) -> Option<PointLight> {
        self.lights.remove(&id)
    }

    pub fn get(&self, id: LightId) -> Option<&PointLight> {
        self.lights.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LightId, &PointLight)> {
        self.lights.iter().map(|(id, light)| (*id, light))
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

/// Consumer of per-frame render output
pub trait RenderSink {
    fn submit(&mut self, request: DrawRequest);

    fn submit_light(&mut self, _light: &PointLight) {}
}

/// Sink that keeps everything it is given, for tests and the headless driver
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub requests: Vec<DrawRequest>,
    pub lights: Vec<PointLight>,
}

impl RecordingSink {
    pub fn clear(&mut self) {
        self.requests.clear();
        self.lights.clear();
    }

    pub fn with_material<'a>(
        &'a self,
        material: &'a str,
    ) -> impl Iterator<Item = &'a DrawRequest> + 'a {
        self.requests.iter().filter(move |r| r.material == material)
    }
}

impl RenderSink for RecordingSink {
    fn submit(&mut self, request: DrawRequest) {
        self.requests.push(request);
    }

    fn submit_light(&mut self, light: &PointLight) {
        self.lights.push(*light);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_lifecycle() {
        let mut lights = Lights::default();
        let a = lights.register(PointLight::burst(Vec2::ZERO));
        let b = lights.register(PointLight::robot(Vec2::ONE));
        assert_ne!(a, b);
        assert_eq!(lights.len(), 2);

        lights.set_position(a, Vec2::new(3.0, 4.0));
        assert_eq!(lights.get(a).unwrap().position, Vec2::new(3.0, 4.0));

        assert!(lights.remove(a).is_some());
        assert!(lights.remove(a).is_none());
        // Moving a removed light is harmless
        lights.set_position(a, Vec2::ZERO);
        assert_eq!(lights.len(), 1);
    }

    #[test]
    fn test_handles_not_reused() {
        let mut lights = Lights::default();
        let a = lights.register(PointLight::burst(Vec2::ZERO));
        lights.remove(a);
        let b = lights.register(PointLight::burst(Vec2::ZERO));
        assert_ne!(a, b);
    }

    #[test]
    fn test_recording_sink() {
        let mut sink = RecordingSink::default();
        let transform = Affine2::from_translation(Vec2::new(1.0, 2.0));
        sink.submit(DrawRequest::new(EntityId(1), "robot", transform));
        sink.submit(DrawRequest::new(EntityId(1), "turret", transform));
        sink.submit_light(&PointLight::robot(Vec2::ZERO));

        assert_eq!(sink.with_material("robot").count(), 1);
        assert_eq!(sink.requests[0].position(), Vec2::new(1.0, 2.0));
        assert_eq!(sink.lights.len(), 1);

        sink.clear();
        assert!(sink.requests.is_empty());
    }
}
