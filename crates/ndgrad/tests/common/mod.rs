//! Seeded random inputs shared by the integration tests.

use ndgrad::c64;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `len` standard normal reals.
#[allow(unused)]
pub fn randn_f64<R: Rng>(len: usize, rng: &mut R) -> Vec<f64> {
    (0..len).map(|_| rng.sample(StandardNormal)).collect()
}

/// `len` complex normals with independent N(0, 1/2) parts, so |z|^2 has mean 1.
#[allow(unused)]
pub fn randn_c64<R: Rng>(len: usize, rng: &mut R) -> Vec<c64> {
    let half = std::f64::consts::FRAC_1_SQRT_2;
    (0..len)
        .map(|_| {
            let re: f64 = rng.sample(StandardNormal);
            let im: f64 = rng.sample(StandardNormal);
            c64::new(re * half, im * half)
        })
        .collect()
}
