use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::Rng;

/// Half-height of the band around the entrance that idle bees stay within.
pub const INTERIOR_VERTICAL_BAND: f32 = 0.3;

/// A bee's home: where it enters, where it leaves, and the space it idles in.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Hive {
    pub entrance: Vec3,
    pub exit: Vec3,
}

impl Hive {
    /// Without a dedicated exit the bee leaves through the entrance.
    pub fn new(entrance: Vec3, exit: Option<Vec3>) -> Self {
        Self {
            entrance,
            exit: exit.unwrap_or(entrance),
        }
    }

    /// Random point inside the hive: a point of the ball of `wander_radius`
    /// around the entrance, kept within the vertical band.
    pub fn random_interior_point<R: Rng + ?Sized>(&self, wander_radius: f32, rng: &mut R) -> Vec3 {
        let mut point = self.entrance + random_in_unit_ball(rng) * wander_radius;
        point.y = point.y.clamp(
            self.entrance.y - INTERIOR_VERTICAL_BAND,
            self.entrance.y + INTERIOR_VERTICAL_BAND,
        );
        point
    }
}

fn random_in_unit_ball<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if candidate.length_squared() <= 1.0 {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn exit_defaults_to_entrance() {
        let hive = Hive::new(Vec3::new(1.0, 2.0, 3.0), None);
        assert_eq!(hive.exit, hive.entrance);
    }

    #[test]
    fn interior_points_stay_in_band() {
        let hive = Hive::new(Vec3::new(0.0, 1.0, 0.0), None);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let p = hive.random_interior_point(1.5, &mut rng);
            assert!(p.distance(hive.entrance) <= 1.5 + 1e-4);
            assert!((p.y - 1.0).abs() <= INTERIOR_VERTICAL_BAND + 1e-6);
        }
    }
}
