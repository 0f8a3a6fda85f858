use nalgebra::Vector3;
use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::spins::{Dipole, Orientation};

/// Region shape for random point-set generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomRegion {
    /// Ball of the given radius. The radius of each point is drawn
    /// uniformly, so the density is center-heavy.
    Ball,
    /// Cube (square in 2D) with half-edge `size`.
    Box,
}

impl TryFrom<&str> for RandomRegion {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "round" => Ok(Self::Ball),
            "square" => Ok(Self::Box),
            _ => Err(format!(
                "unknown random region '{s}', expected 'round' or 'square'"
            )),
        }
    }
}

/// Generate `count` dipoles at random positions with random orientations
/// and 1 µB moments.
pub fn random_dipoles(
    count: usize,
    size: f64,
    is_2d: bool,
    region: RandomRegion,
    rng: &mut Xoshiro256StarStar,
) -> Vec<Dipole> {
    (0..count)
        .map(|_| {
            let position = match region {
                RandomRegion::Ball => {
                    let r = rng.gen::<f64>() * size;
                    Orientation::random(rng, is_2d).direction() * r
                }
                RandomRegion::Box => {
                    let coord = |rng: &mut Xoshiro256StarStar| (rng.gen::<f64>() * 2.0 - 1.0) * size;
                    let x = coord(rng);
                    let y = coord(rng);
                    let z = if is_2d { 0.0 } else { coord(rng) };
                    Vector3::new(x, y, z)
                }
            };
            Dipole::new(position, Orientation::random(rng, is_2d), 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_region_names() {
        assert_eq!(RandomRegion::try_from("round"), Ok(RandomRegion::Ball));
        assert_eq!(RandomRegion::try_from("square"), Ok(RandomRegion::Box));
        assert!(RandomRegion::try_from("hex").is_err());
    }

    #[test]
    fn test_ball_stays_within_radius() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let dipoles = random_dipoles(200, 50.0, false, RandomRegion::Ball, &mut rng);
        assert_eq!(dipoles.len(), 200);
        for d in &dipoles {
            assert!(d.position.norm() <= 50.0 + 1e-9);
        }
    }

    #[test]
    fn test_2d_box_is_planar_and_bounded() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(12);
        let dipoles = random_dipoles(200, 30.0, true, RandomRegion::Box, &mut rng);
        for d in &dipoles {
            assert_eq!(d.position.z, 0.0);
            assert!(d.position.x.abs() <= 30.0);
            assert!(d.position.y.abs() <= 30.0);
            assert!(d.orientation.direction().z.abs() < 1e-12);
        }
    }
}
