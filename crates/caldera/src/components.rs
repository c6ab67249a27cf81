//! Game-specific components

use ember_engine::prelude::*;

/// A rock hurled out of the crater
///
/// Rocks live outside the scene hierarchy; the eruption script ages them and
/// reclaims entity, mesh light and physics body once the lifetime runs out.
#[derive(Debug, Clone)]
pub struct LavaRock {
    /// Seconds since launch
    pub age: f32,

    /// Seconds until the rock is reclaimed
    pub lifetime: f32,
}

impl Component for LavaRock {}

impl LavaRock {
    /// Creates a freshly launched rock.
    pub fn new(lifetime: f32) -> Self {
        Self { age: 0.0, lifetime }
    }

    /// True once the rock has outlived its lifetime.
    pub fn expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

/// Marks a light as part of the orbiting ember ring
///
/// Carries no data; the orbit script selects every tagged entity and spaces
/// them evenly around the crater.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmberLight;

impl Component for EmberLight {}

/// Intensity wobble parameters for a point light
///
/// The flicker script reads these from its own entity every frame, so the
/// wobble can be tuned per light.
#[derive(Debug, Clone)]
pub struct Flicker {
    /// Intensity the wobble oscillates around
    pub base_intensity: f32,

    /// Wobble amplitude as a fraction of the base intensity
    pub amplitude: f32,

    /// Wobble speed in cycles per second
    pub frequency: f32,
}

impl Component for Flicker {}

impl Default for Flicker {
    fn default() -> Self {
        Self {
            base_intensity: 3.0,
            amplitude: 0.35,
            frequency: 7.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rock_expires_after_its_lifetime() {
        let mut rock = LavaRock::new(2.0);
        assert!(!rock.expired());

        rock.age = 1.9;
        assert!(!rock.expired());

        rock.age = 2.0;
        assert!(rock.expired());
    }
}
