//! # Noise Context Module
//!
//! A seeded noise primitive owned by whoever needs deterministic sampling. The
//! algorithm is chosen once, when the context is built.

use std::fmt;

use log::warn;
use noise::{NoiseFn, Perlin, Simplex};
use serde::{Deserialize, Deserializer, Serialize};

/// The coherent noise algorithms a context can be built with.
///
/// Serialized by lowercase name. An unknown name falls back to Perlin with a
/// warning instead of failing the config.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseAlgorithm {
    /// Gradient noise on a cubic lattice.
    #[default]
    Perlin,
    /// Gradient noise on a simplex lattice.
    Simplex,
}

impl NoiseAlgorithm {
    /// Looks up an algorithm by its lowercase name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "perlin" => NoiseAlgorithm::Perlin,
            "simplex" => NoiseAlgorithm::Simplex,
            unknown => {
                warn!("Unknown noise algorithm {:?}, using perlin", unknown);
                NoiseAlgorithm::Perlin
            }
        }
    }
}

impl<'de> Deserialize<'de> for NoiseAlgorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(NoiseAlgorithm::from_name(&name))
    }
}

enum NoiseBackend {
    Perlin(Perlin),
    Simplex(Simplex),
}

/// A seeded 3D noise source returning values in `[-1, 1]`.
///
/// Two contexts built from the same seed and algorithm return bit-identical samples.
pub struct NoiseContext {
    seed: u32,
    algorithm: NoiseAlgorithm,
    backend: NoiseBackend,
}

impl NoiseContext {
    /// Creates a context for the given seed and algorithm.
    pub fn new(seed: u32, algorithm: NoiseAlgorithm) -> Self {
        let backend = match algorithm {
            NoiseAlgorithm::Perlin => NoiseBackend::Perlin(Perlin::new(seed)),
            NoiseAlgorithm::Simplex => NoiseBackend::Simplex(Simplex::new(seed)),
        };

        NoiseContext {
            seed,
            algorithm,
            backend,
        }
    }

    /// The seed this context was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The algorithm this context samples with.
    pub fn algorithm(&self) -> NoiseAlgorithm {
        self.algorithm
    }

    /// Samples the noise primitive at `point`.
    ///
    /// The result is clamped to `[-1, 1]`; both backends can overshoot slightly.
    pub fn sample3d(&self, point: [f64; 3]) -> f64 {
        let value = match &self.backend {
            NoiseBackend::Perlin(perlin) => perlin.get(point),
            NoiseBackend::Simplex(simplex) => simplex.get(point),
        };
        value.clamp(-1.0, 1.0)
    }
}

impl fmt::Debug for NoiseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseContext")
            .field("seed", &self.seed)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS: [[f64; 3]; 4] = [
        [0.1, 0.2, 0.3],
        [12.5, -3.25, 7.75],
        [-100.3, 4.4, 0.01],
        [0.5, 0.5, 0.5],
    ];

    #[test]
    fn same_seed_same_samples() {
        for algorithm in [NoiseAlgorithm::Perlin, NoiseAlgorithm::Simplex] {
            let a = NoiseContext::new(42, algorithm);
            let b = NoiseContext::new(42, algorithm);
            for point in POINTS {
                assert_eq!(a.sample3d(point).to_bits(), b.sample3d(point).to_bits());
            }
        }
    }

    #[test]
    fn samples_stay_in_range() {
        for algorithm in [NoiseAlgorithm::Perlin, NoiseAlgorithm::Simplex] {
            let context = NoiseContext::new(7, algorithm);
            for i in 0..200 {
                let t = i as f64 * 0.37;
                let value = context.sample3d([t, t * 0.5, -t]);
                assert!((-1.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn algorithm_names_deserialize() {
        let perlin: NoiseAlgorithm = serde_json::from_str("\"perlin\"").unwrap();
        let simplex: NoiseAlgorithm = serde_json::from_str("\"simplex\"").unwrap();
        assert_eq!(perlin, NoiseAlgorithm::Perlin);
        assert_eq!(simplex, NoiseAlgorithm::Simplex);
        assert_eq!(serde_json::to_string(&NoiseAlgorithm::Simplex).unwrap(), "\"simplex\"");
    }

    #[test]
    fn unknown_algorithm_falls_back_to_perlin() {
        let unknown: NoiseAlgorithm = serde_json::from_str("\"value\"").unwrap();
        assert_eq!(unknown, NoiseAlgorithm::Perlin);
        assert_eq!(NoiseAlgorithm::from_name("Simplex"), NoiseAlgorithm::Perlin);
        assert!(serde_json::from_str::<NoiseAlgorithm>("3").is_err());
    }

    #[test]
    fn context_reports_its_construction() {
        let context = NoiseContext::new(9, NoiseAlgorithm::Simplex);
        assert_eq!(context.seed(), 9);
        assert_eq!(context.algorithm(), NoiseAlgorithm::Simplex);
    }
}
