//! Binary logistic regression with L2 regularization, fitted by full-batch
//! gradient descent.

use leanscope_core::ClassifierError;
use ndarray::{Array1, Array2};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    /// Inverse regularization strength
    c: f64,
    learning_rate: f64,
    max_iter: usize,
    tolerance: f64,
    pub cost_history: Vec<f64>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0, 1000)
    }
}

impl LogisticRegression {
    pub fn new(c: f64, max_iter: usize) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            c,
            learning_rate: 0.5,
            max_iter,
            tolerance: 1e-6,
            cost_history: Vec::new(),
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let exp_z = z.exp();
            exp_z / (1.0 + exp_z)
        }
    }

    fn log_loss(y: &Array1<f64>, p: &Array1<f64>) -> f64 {
        let eps = 1e-15;
        -y.iter()
            .zip(p.iter())
            .map(|(&y, &p)| {
                let p = p.clamp(eps, 1.0 - eps);
                y * p.ln() + (1.0 - y) * (1.0 - p).ln()
            })
            .sum::<f64>()
            / y.len() as f64
    }

    /// Fits on rows of `x` with targets in {0, 1}. The penalty is
    /// `||w||^2 / (2 C n)` on the mean loss; the intercept is not penalized.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ClassifierError> {
        if x.nrows() != y.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }

        let n_samples = x.nrows() as f64;
        let alpha = 1.0 / (self.c * n_samples);
        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        self.cost_history.clear();

        for iter in 0..self.max_iter {
            let predictions = (x.dot(&weights) + bias).mapv(Self::sigmoid);
            let errors = &predictions - y;

            let dw = x.t().dot(&errors) / n_samples + &weights * alpha;
            let db = errors.sum() / n_samples;

            let cost = Self::log_loss(y, &predictions) + 0.5 * alpha * weights.dot(&weights);
            self.cost_history.push(cost);

            weights = &weights - &(dw * self.learning_rate);
            bias -= self.learning_rate * db;

            if iter > 0 && (self.cost_history[iter - 1] - cost).abs() < self.tolerance {
                debug!("Converged at iteration {}", iter);
                break;
            }
        }

        self.coefficients = Some(weights);
        self.intercept = bias;
        Ok(())
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, ClassifierError> {
        let weights = self.coefficients.as_ref().ok_or(ClassifierError::NotFitted)?;
        if x.ncols() != weights.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: weights.len(),
                got: x.ncols(),
            });
        }
        Ok((x.dot(weights) + self.intercept).mapv(Self::sigmoid))
    }

    /// Class 1 when the probability reaches one half.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ClassifierError> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64, ClassifierError> {
        let predictions = self.predict(x)?;
        if y.is_empty() {
            return Ok(0.0);
        }
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| (*p - *t).abs() < 0.5)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }
}
