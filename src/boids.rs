use log::trace;
use nalgebra::Vector2;
use rand::Rng;
use rand::distr::Uniform;
use rayon::prelude::*;

use crate::{ConfigError, Parameters, check_spawn_range};

/// Guards the separation weight against near-zero distances.
const SEPARATION_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    pub position: Vector2<f32>,
    pub velocity: Vector2<f32>,
}

impl Boid {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32) -> Self {
        Boid {
            position: Vector2::new(x, y),
            velocity: Vector2::new(vx, vy),
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.norm()
    }
}

/// A fixed-size population of boids and the parameters driving them.
#[derive(Debug, Clone)]
pub struct Flock {
    boids: Vec<Boid>,
    params: Parameters,
}

impl Flock {
    /// Spawns `n` boids uniformly in `[-bounds, bounds]²` with velocities
    /// uniform in `[-initial_speed, initial_speed]²`.
    pub fn initialize<R: Rng>(
        n: usize,
        bounds: f32,
        initial_speed: f32,
        params: Parameters,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let spawn = spawn_range("spawn_bounds", bounds)?;
        let drift = spawn_range("initial_speed", initial_speed)?;
        let boids = (0..n)
            .map(|_| {
                Boid::new(
                    rng.sample(&spawn),
                    rng.sample(&spawn),
                    rng.sample(&drift),
                    rng.sample(&drift),
                )
            })
            .collect();
        Ok(Flock { boids, params })
    }

    pub fn from_boids(boids: Vec<Boid>, params: Parameters) -> Self {
        Flock { boids, params }
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    /// Advances the whole flock by one tick.
    pub fn step(&mut self) {
        self.boids = update_boids(&self.boids, &self.params);
    }
}

fn spawn_range(name: &'static str, half_width: f32) -> Result<Uniform<f32>, ConfigError> {
    check_spawn_range(name, half_width)?;
    Uniform::new_inclusive(-half_width, half_width).map_err(|_| ConfigError::SpawnRange {
        name,
        value: half_width,
    })
}

/// Sums gathered from one boid's scan of the rest of the flock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighborhood {
    pub neighbors: usize,
    pub velocity_sum: Vector2<f32>,
    pub position_sum: Vector2<f32>,
    pub separation: Vector2<f32>,
}

/// Scans every boid except the one at `boid_idx`. Self-exclusion is by index,
/// so two boids sharing a position still see each other.
pub fn scan_neighbors(boids: &[Boid], boid_idx: usize, params: &Parameters) -> Neighborhood {
    let boid = &boids[boid_idx];
    let mut hood = Neighborhood {
        neighbors: 0,
        velocity_sum: Vector2::zeros(),
        position_sum: Vector2::zeros(),
        separation: Vector2::zeros(),
    };
    for (other_idx, other) in boids.iter().enumerate() {
        if other_idx == boid_idx {
            continue;
        }
        let offset = boid.position - other.position;
        let distance = offset.norm();
        if distance < params.visual_range {
            hood.velocity_sum += other.velocity;
            hood.position_sum += other.position;
            if distance < params.protected_range {
                hood.separation += offset / (distance + SEPARATION_EPSILON);
            }
            hood.neighbors += 1;
        }
    }
    hood
}

/// Computes the next state of the boid at `boid_idx` from the pre-tick snapshot.
pub fn steer(boids: &[Boid], boid_idx: usize, params: &Parameters) -> Boid {
    let boid = &boids[boid_idx];
    let hood = scan_neighbors(boids, boid_idx, params);

    let mut velocity = boid.velocity;
    if hood.neighbors > 0 {
        let count = hood.neighbors as f32;
        let avg_velocity = hood.velocity_sum / count;
        velocity += (avg_velocity - velocity) * params.alignment_factor;

        let centroid = hood.position_sum / count;
        velocity += (centroid - boid.position) * params.cohesion_factor;
    }
    // Applied even without neighbours; the sum is zero then.
    velocity += hood.separation * params.separation_factor;

    let speed = velocity.norm();
    if speed > params.max_speed {
        velocity = velocity / speed * params.max_speed;
    } else if speed > 0.0 && speed < params.min_speed {
        velocity = velocity / speed * params.min_speed;
    }

    let mut next = Boid {
        position: boid.position + velocity,
        velocity,
    };
    bounce(&mut next, params.margin);
    next
}

/// Clamps each axis to `[-margin, margin]`, reversing that axis's velocity
/// when it hits the wall.
pub fn bounce(boid: &mut Boid, margin: f32) {
    for axis in 0..2 {
        if boid.position[axis] > margin {
            boid.position[axis] = margin;
            boid.velocity[axis] = -boid.velocity[axis];
        } else if boid.position[axis] < -margin {
            boid.position[axis] = -margin;
            boid.velocity[axis] = -boid.velocity[axis];
        }
    }
}

/// Produces the next tick of the flock. Every boid reads only the snapshot
/// passed in and writes only its own output slot.
pub fn update_boids(boids: &[Boid], params: &Parameters) -> Vec<Boid> {
    let next: Vec<Boid> = (0..boids.len())
        .into_par_iter()
        .map(|boid_idx| steer(boids, boid_idx, params))
        .collect();
    trace!("advanced {} boids", next.len());
    next
}
