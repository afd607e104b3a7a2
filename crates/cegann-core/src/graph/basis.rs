use serde::{Deserialize, Serialize};

/// Expands a scalar onto Gaussians with evenly spaced centers from `dmin` to `dmax`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianBasis {
    pub dmin: f64,
    pub dmax: f64,
    pub steps: usize,
    /// Gaussian width. Defaults to the spacing between centers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var: Option<f64>,
}

impl GaussianBasis {
    pub fn new(dmin: f64, dmax: f64, steps: usize) -> Self {
        Self {
            dmin,
            dmax,
            steps,
            var: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.steps == 0 {
            return Err("steps must be at least 1".to_string());
        }
        if !(self.dmax > self.dmin) {
            return Err(format!(
                "dmax ({}) must be greater than dmin ({})",
                self.dmax, self.dmin
            ));
        }
        if let Some(var) = self.var {
            if !(var > 0.0) {
                return Err(format!("var must be positive, got {}", var));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    pub fn centers(&self) -> Vec<f64> {
        if self.steps == 1 {
            return vec![self.dmin];
        }
        let step = (self.dmax - self.dmin) / (self.steps - 1) as f64;
        (0..self.steps).map(|i| self.dmin + step * i as f64).collect()
    }

    pub fn width(&self) -> f64 {
        match self.var {
            Some(var) => var,
            None if self.steps > 1 => (self.dmax - self.dmin) / (self.steps - 1) as f64,
            None => self.dmax - self.dmin,
        }
    }

    /// Append the expansion of `x` to `out`.
    pub fn expand_into(&self, x: f64, out: &mut Vec<f32>) {
        let width = self.width();
        out.extend(self.centers().into_iter().map(|mu| {
            let z = (x - mu) / width;
            (-z * z).exp() as f32
        }));
    }

    pub fn expand(&self, x: f64) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.steps);
        self.expand_into(x, &mut out);
        out
    }
}
