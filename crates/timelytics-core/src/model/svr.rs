use serde::{Deserialize, Serialize};

/// Standard scaling applied before the kernel, `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.mean.len() != n_features || self.scale.len() != n_features {
            return Err(format!(
                "scaler expects {n_features} features, got mean={} scale={}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err("scaler contains a zero or non-finite scale".to_string());
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("scaler contains a non-finite mean".to_string());
        }
        Ok(())
    }

    fn apply(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf {
        gamma: f64,
    },
    Poly {
        gamma: f64,
        #[serde(default)]
        coef0: f64,
        degree: u32,
    },
}

/// Highest polynomial degree an artifact may declare.
pub const MAX_POLY_DEGREE: u32 = 32;

impl Kernel {
    fn validate(&self) -> Result<(), String> {
        match *self {
            Kernel::Linear => Ok(()),
            Kernel::Rbf { gamma } => {
                if !gamma.is_finite() {
                    return Err("rbf gamma is not finite".to_string());
                }
                Ok(())
            }
            Kernel::Poly {
                gamma,
                coef0,
                degree,
            } => {
                if !gamma.is_finite() || !coef0.is_finite() {
                    return Err("poly gamma and coef0 must be finite".to_string());
                }
                if degree > MAX_POLY_DEGREE {
                    return Err(format!(
                        "poly degree {degree} exceeds the maximum of {MAX_POLY_DEGREE}"
                    ));
                }
                Ok(())
            }
        }
    }

    fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { gamma } => {
                let dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                (-gamma * dist).exp()
            }
            Kernel::Poly {
                gamma,
                coef0,
                degree,
            } => (gamma * dot(a, b) + coef0).powi(degree.min(MAX_POLY_DEGREE) as i32),
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Support vector regressor in its dual form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Svr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<Scaler>,
    pub kernel: Kernel,
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
}

impl Svr {
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if let Some(scaler) = &self.scaler {
            scaler.validate(n_features)?;
        }
        self.kernel.validate()?;
        if self.support_vectors.len() != self.dual_coef.len() {
            return Err(format!(
                "{} support vectors but {} dual coefficients",
                self.support_vectors.len(),
                self.dual_coef.len()
            ));
        }
        if let Some((index, sv)) = self
            .support_vectors
            .iter()
            .enumerate()
            .find(|(_, sv)| sv.len() != n_features)
        {
            return Err(format!(
                "support vector {index} has {} values, expected {n_features}",
                sv.len()
            ));
        }
        if !self.intercept.is_finite() {
            return Err("intercept is not finite".to_string());
        }
        Ok(())
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let scaled;
        let x = match &self.scaler {
            Some(scaler) => {
                scaled = scaler.apply(row);
                scaled.as_slice()
            }
            None => row,
        };
        self.support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, coef)| coef * self.kernel.eval(sv, x))
            .sum::<f64>()
            + self.intercept
    }
}
