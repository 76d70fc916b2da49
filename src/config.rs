//! Training configuration and `hglearn.toml` loading.
//!
//! Options are validated up front; a bad value is a
//! [`HgError::Configuration`] before any sampling happens.
//!
//! ## Example
//!
//! ```toml
//! [training]
//! iterations = 1000
//! learning-rate = 0.1
//! weight-init = "random"
//! allow-negative-weights = true
//! tie-epsilon = 1e-9
//!
//! [plateau]
//! dataset-factor = 10
//! patience-floor = 250
//! patience-divisor = 4
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::Rng;
use serde::Deserialize;

use crate::error::{HgError, Result};
use crate::ranking::DEFAULT_TIE_EPSILON;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "hglearn.toml";

/// Most decimals a change vector can be rounded to; f64 holds about 15.
pub const MAX_CHANGE_PRECISION: u32 = 15;

/// How the weight vector starts out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightInit {
    /// Every weight is exactly 1.0
    Uniform,
    /// Every weight drawn uniformly from [0, 1)
    Random,
}

impl WeightInit {
    /// Initial weights for `n` constraints.
    pub fn initialize<R: Rng>(self, n: usize, rng: &mut R) -> Vec<f64> {
        match self {
            WeightInit::Uniform => vec![1.0; n],
            WeightInit::Random => (0..n).map(|_| rng.gen::<f64>()).collect(),
        }
    }
}

impl FromStr for WeightInit {
    type Err = HgError;

    /// Accepts the names and the historical `1` (uniform) / `0` (random) flags.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" | "1" => Ok(WeightInit::Uniform),
            "random" | "0" => Ok(WeightInit::Random),
            other => Err(HgError::Configuration(format!(
                "weight init must be 'uniform' or 'random', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for WeightInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightInit::Uniform => f.write_str("uniform"),
            WeightInit::Random => f.write_str("random"),
        }
    }
}

/// Stagnation detection thresholds.
///
/// A run stops once the next draw index reaches
/// `max(dataset_factor * |data|, iterations, best_sample + max(patience_floor, iterations / patience_divisor))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateauPolicy {
    pub dataset_factor: usize,
    pub patience_floor: usize,
    pub patience_divisor: usize,
}

impl Default for PlateauPolicy {
    fn default() -> Self {
        Self {
            dataset_factor: 10,
            patience_floor: 250,
            patience_divisor: 4,
        }
    }
}

impl PlateauPolicy {
    /// Sample index at which the run is considered stuck.
    pub fn bound(&self, dataset_len: usize, iterations: usize, best_sample: usize) -> usize {
        let patience = self
            .patience_floor
            .max(iterations / self.patience_divisor.max(1));
        (self.dataset_factor.saturating_mul(dataset_len))
            .max(iterations)
            .max(best_sample.saturating_add(patience))
    }
}

/// Options for one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    /// Budget of accepted (weight-changing) updates
    pub iterations: usize,
    pub learning_rate: f64,
    pub weight_init: WeightInit,
    /// When false, weights are clamped at 0 after every update
    pub allow_negative_weights: bool,
    /// Seed for the run's random source; drawn fresh when absent
    pub seed: Option<u64>,
    /// Harmonies closer than this are tied
    pub tie_epsilon: f64,
    /// Round the change vector to this many decimals
    pub change_precision: Option<u32>,
    pub plateau: PlateauPolicy,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            iterations: 1000,
            learning_rate: 0.1,
            weight_init: WeightInit::Random,
            allow_negative_weights: true,
            seed: None,
            tie_epsilon: DEFAULT_TIE_EPSILON,
            change_precision: None,
            plateau: PlateauPolicy::default(),
        }
    }
}

impl TrainingOptions {
    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(HgError::Configuration(
                "iterations must be a positive integer".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(HgError::Configuration(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !self.tie_epsilon.is_finite() || self.tie_epsilon < 0.0 {
            return Err(HgError::Configuration(format!(
                "tie epsilon must be non-negative, got {}",
                self.tie_epsilon
            )));
        }
        if let Some(p) = self.change_precision.filter(|&p| p > MAX_CHANGE_PRECISION) {
            return Err(HgError::Configuration(format!(
                "change precision must be at most {} decimals, got {}",
                MAX_CHANGE_PRECISION, p
            )));
        }
        if self.plateau.patience_divisor == 0 {
            return Err(HgError::Configuration(
                "plateau patience divisor must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// hglearn configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,
    pub training: TrainingOptions,
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    training: Option<RawTraining>,
    plateau: Option<RawPlateau>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawTraining {
    iterations: Option<usize>,
    learning_rate: Option<f64>,
    weight_init: Option<String>,
    allow_negative_weights: Option<bool>,
    seed: Option<u64>,
    tie_epsilon: Option<f64>,
    change_precision: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawPlateau {
    dataset_factor: Option<usize>,
    patience_floor: Option<usize>,
    patience_divisor: Option<usize>,
}

impl Config {
    /// Load `hglearn.toml` from the given directory, or defaults if absent.
    pub fn load(directory: &Path) -> Result<Self> {
        let path = directory.join(CONFIG_FILE);
        if path.exists() {
            Self::load_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load a specific config file. Unreadable or invalid files are errors.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HgError::io(path, e))?;
        let mut config = Self::parse(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| HgError::Configuration(format!("failed to parse config: {}", e)))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let mut training = TrainingOptions::default();

        if let Some(t) = raw.training {
            if let Some(v) = t.iterations {
                training.iterations = v;
            }
            if let Some(v) = t.learning_rate {
                training.learning_rate = v;
            }
            if let Some(v) = t.weight_init {
                training.weight_init = v.parse()?;
            }
            if let Some(v) = t.allow_negative_weights {
                training.allow_negative_weights = v;
            }
            if t.seed.is_some() {
                training.seed = t.seed;
            }
            if let Some(v) = t.tie_epsilon {
                training.tie_epsilon = v;
            }
            if t.change_precision.is_some() {
                training.change_precision = t.change_precision;
            }
        }

        if let Some(p) = raw.plateau {
            if let Some(v) = p.dataset_factor {
                training.plateau.dataset_factor = v;
            }
            if let Some(v) = p.patience_floor {
                training.plateau.patience_floor = v;
            }
            if let Some(v) = p.patience_divisor {
                training.plateau.patience_divisor = v;
            }
        }

        training.validate()?;
        Ok(Self {
            source: None,
            training,
        })
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let t = &self.training;
        let mut lines = Vec::new();

        match &self.source {
            Some(source) => lines.push(format!("   Config: {}", source.display())),
            None => lines.push("   Config: (defaults)".to_string()),
        }
        lines.push(format!(
            "   Iterations: {}  Rate: {}  Init: {}",
            t.iterations, t.learning_rate, t.weight_init
        ));
        lines.push(format!(
            "   Negative weights: {}  Seed: {}",
            if t.allow_negative_weights { "allowed" } else { "clamped" },
            t.seed.map(|s| s.to_string()).unwrap_or_else(|| "random".to_string())
        ));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_uniform_init_is_all_ones() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = WeightInit::Uniform.initialize(5, &mut rng);
        assert_eq!(w, vec![1.0; 5]);
    }

    #[test]
    fn test_random_init_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = WeightInit::Random.initialize(50, &mut rng);
        assert_eq!(w.len(), 50);
        assert!(w.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_weight_init_parse() {
        assert_eq!("uniform".parse::<WeightInit>().unwrap(), WeightInit::Uniform);
        assert_eq!("1".parse::<WeightInit>().unwrap(), WeightInit::Uniform);
        assert_eq!("Random".parse::<WeightInit>().unwrap(), WeightInit::Random);
        assert!(matches!(
            "gaussian".parse::<WeightInit>(),
            Err(HgError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_iters = TrainingOptions {
            iterations: 0,
            ..Default::default()
        };
        assert!(bad_iters.validate().is_err());

        let bad_rate = TrainingOptions {
            learning_rate: -0.1,
            ..Default::default()
        };
        assert!(bad_rate.validate().is_err());

        let nan_rate = TrainingOptions {
            learning_rate: f64::NAN,
            ..Default::default()
        };
        assert!(nan_rate.validate().is_err());

        let huge_precision = TrainingOptions {
            change_precision: Some(400),
            ..Default::default()
        };
        assert!(matches!(
            huge_precision.validate(),
            Err(HgError::Configuration(_))
        ));

        let max_precision = TrainingOptions {
            change_precision: Some(MAX_CHANGE_PRECISION),
            ..Default::default()
        };
        assert!(max_precision.validate().is_ok());

        assert!(TrainingOptions::default().validate().is_ok());
    }

    #[test]
    fn test_plateau_bound() {
        let policy = PlateauPolicy::default();
        // max(10*5, 100, 0 + max(250, 25))
        assert_eq!(policy.bound(5, 100, 0), 250);
        // max(10*100, 100, 40 + 250)
        assert_eq!(policy.bound(100, 100, 40), 1000);
        // max(50, 4000, 3000 + 1000)
        assert_eq!(policy.bound(5, 4000, 3000), 4000);
        assert_eq!(policy.bound(5, 4000, 3500), 4500);
    }

    #[test]
    fn test_parse_config() {
        let config = Config::parse(
            r#"
[training]
iterations = 500
learning-rate = 0.05
weight-init = "uniform"
allow-negative-weights = false
seed = 42

[plateau]
patience-floor = 100
"#,
        )
        .unwrap();

        let t = &config.training;
        assert_eq!(t.iterations, 500);
        assert!((t.learning_rate - 0.05).abs() < 1e-12);
        assert_eq!(t.weight_init, WeightInit::Uniform);
        assert!(!t.allow_negative_weights);
        assert_eq!(t.seed, Some(42));
        assert_eq!(t.plateau.patience_floor, 100);
        assert_eq!(t.plateau.dataset_factor, 10);
    }

    #[test]
    fn test_parse_config_rejects_invalid() {
        assert!(Config::parse("[training]\niterations = 0\n").is_err());
        assert!(Config::parse("[training]\nweight-init = \"zeros\"\n").is_err());
        assert!(Config::parse("[training]\nunknown-key = 1\n").is_err());
        assert!(Config::parse("[training]\nchange-precision = 309\n").is_err());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.source.is_none());
        assert_eq!(config.training, TrainingOptions::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[training]\niterations = 12\n").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.training.iterations, 12);
        assert!(config.source.is_some());
    }
}
