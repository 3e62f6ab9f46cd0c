//! Latent response models.
//!
//! A respondent's momentary perception of an attribute is its latent location
//! plus one draw of zero-location noise:
//!
//! | Model | Noise | Scale |
//! |-------|-------|-------|
//! | [`ResponseModel::Thurstone`] | standard normal | Case V d-prime |
//! | [`ResponseModel::Bradley`] | standard logistic | BTL log-odds |

use std::fmt;
use std::str::FromStr;

use rand::distr::Open01;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Choice model used by every subject of a population.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseModel {
    /// Thurstone Case V: Gaussian latent variable.
    Thurstone,
    /// Bradley-Terry-Luce: logistic latent variable.
    #[default]
    #[serde(alias = "btl")]
    Bradley,
}

impl ResponseModel {
    /// One noisy sample of the latent variable at `location`.
    #[inline]
    pub fn draw_noisy_sample<R: Rng>(&self, rng: &mut R, location: f64) -> f64 {
        match self {
            ResponseModel::Thurstone => location + rng.sample::<f64, _>(StandardNormal),
            ResponseModel::Bradley => location + standard_logistic(rng),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseModel::Thurstone => "thurstone",
            ResponseModel::Bradley => "bradley",
        }
    }
}

impl fmt::Display for ResponseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thurstone" => Ok(ResponseModel::Thurstone),
            "bradley" | "btl" => Ok(ResponseModel::Bradley),
            other => Err(format!("unknown response model '{}'", other)),
        }
    }
}

/// Standard logistic sample by inverse CDF. `Open01` keeps `u` away from 0 and 1.
#[inline]
fn standard_logistic<R: Rng>(rng: &mut R) -> f64 {
    let u: f64 = rng.sample(Open01);
    (u / (1.0 - u)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn moments(model: ResponseModel, loc: f64, n: usize) -> (f64, f64) {
        let mut rng = SmallRng::seed_from_u64(42);
        let xs: Vec<f64> = (0..n).map(|_| model.draw_noisy_sample(&mut rng, loc)).collect();
        let mean = xs.iter().sum::<f64>() / n as f64;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        (mean, var)
    }

    #[test]
    fn test_thurstone_moments() {
        let (mean, var) = moments(ResponseModel::Thurstone, 1.5, 100_000);
        assert!((mean - 1.5).abs() < 0.02, "mean={mean}");
        assert!((var - 1.0).abs() < 0.03, "var={var}");
    }

    #[test]
    fn test_bradley_moments() {
        // logistic variance = pi^2 / 3
        let (mean, var) = moments(ResponseModel::Bradley, -0.5, 100_000);
        let expected = std::f64::consts::PI.powi(2) / 3.0;
        assert!((mean + 0.5).abs() < 0.03, "mean={mean}");
        assert!((var - expected).abs() < 0.08, "var={var}");
    }

    #[test]
    fn test_samples_are_finite() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..10_000 {
            assert!(ResponseModel::Bradley.draw_noisy_sample(&mut rng, 0.0).is_finite());
        }
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Thurstone".parse::<ResponseModel>(), Ok(ResponseModel::Thurstone));
        assert_eq!("btl".parse::<ResponseModel>(), Ok(ResponseModel::Bradley));
        assert!("probit".parse::<ResponseModel>().is_err());
        assert_eq!(ResponseModel::Bradley.to_string(), "bradley");
        assert_eq!(ResponseModel::default(), ResponseModel::Bradley);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ResponseModel::Thurstone).unwrap();
        assert_eq!(json, "\"thurstone\"");
        let back: ResponseModel = serde_json::from_str("\"bradley\"").unwrap();
        assert_eq!(back, ResponseModel::Bradley);
        let btl: ResponseModel = serde_json::from_str("\"btl\"").unwrap();
        assert_eq!(btl, ResponseModel::Bradley);
        assert_eq!(serde_json::to_string(&btl).unwrap(), "\"bradley\"");
    }
}
