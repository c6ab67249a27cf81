//! Sprite-style frame animation
//!
//! Cycles the `enabled` flags of a set of frame entities so that exactly one
//! renders at a time. The frame entities each carry their own
//! [`MeshComponent`](super::MeshComponent); this component only decides
//! which one is visible.

use crate::ecs::{Component, Entity};

/// Repeating frame animation over a set of mesh entities
#[derive(Debug, Clone)]
pub struct SpriteAnimation {
    /// Frame entities in playback order; each carries a mesh component
    pub frames: Vec<Entity>,
    /// Seconds each frame stays visible
    pub frame_time: f32,
    elapsed: f32,
    current: usize,
}

impl Component for SpriteAnimation {}

impl SpriteAnimation {
    /// Create an animation over the given frame entities
    pub fn new(frames: Vec<Entity>, frame_time: f32) -> Self {
        Self {
            frames,
            frame_time,
            elapsed: 0.0,
            current: 0,
        }
    }

    /// Index of the currently visible frame
    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Advance by `dt` seconds, returning the new frame index when the
    /// visible frame changed
    pub fn advance(&mut self, dt: f32) -> Option<usize> {
        if self.frames.len() < 2 || self.frame_time <= 0.0 {
            return None;
        }
        self.elapsed += dt;
        if self.elapsed < self.frame_time {
            return None;
        }
        let steps = (self.elapsed / self.frame_time) as usize;
        self.elapsed -= steps as f32 * self.frame_time;
        self.current = (self.current + steps) % self.frames.len();
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Registry;

    fn frames(registry: &mut Registry, n: usize) -> Vec<Entity> {
        (0..n).map(|_| registry.create().unwrap()).collect()
    }

    #[test]
    fn test_advance_cycles_frames() {
        let mut registry = Registry::new();
        let mut animation = SpriteAnimation::new(frames(&mut registry, 3), 0.1);

        assert_eq!(animation.current_frame(), 0);
        assert_eq!(animation.advance(0.05), None);
        assert_eq!(animation.advance(0.06), Some(1));
        assert_eq!(animation.advance(0.1), Some(2));
        assert_eq!(animation.advance(0.1), Some(0));
    }

    #[test]
    fn test_large_dt_skips_frames() {
        let mut registry = Registry::new();
        let mut animation = SpriteAnimation::new(frames(&mut registry, 4), 0.1);

        // 0.35s = 3 whole frames.
        assert_eq!(animation.advance(0.35), Some(3));
    }

    #[test]
    fn test_single_frame_never_advances() {
        let mut registry = Registry::new();
        let mut animation = SpriteAnimation::new(frames(&mut registry, 1), 0.1);
        assert_eq!(animation.advance(10.0), None);
    }
}
