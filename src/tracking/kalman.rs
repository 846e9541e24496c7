//! Constant-velocity Kalman filter over a 2D position
//!
//! State vector: [x, y, vx, vy]ᵀ, measurement: [x, y]ᵀ, one step per cycle.
//!
//! The filter alternates between two phases. `predict` moves it into the
//! predicted phase and `correct` back into the corrected phase; both mutate.
//! Predicting again before a correction returns the pending prediction
//! instead of advancing a second time.

use nalgebra::{SMatrix, SVector};

use crate::consts::{KALMAN_INITIAL_COVARIANCE, KALMAN_MEASUREMENT_NOISE, KALMAN_PROCESS_NOISE};

type State = SVector<f32, 4>;
type Matrix4 = SMatrix<f32, 4, 4>;
type Matrix2x4 = SMatrix<f32, 2, 4>;
type Matrix4x2 = SMatrix<f32, 4, 2>;
type Matrix2 = SMatrix<f32, 2, 2>;
type Vector2 = SVector<f32, 2>;

/// Which step the filter ran last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPhase {
    /// A posterior estimate is current; the next `predict` advances time
    Corrected,
    /// A prior estimate is pending; `correct` folds a measurement into it
    Predicted,
}

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    /// Prior (after predict)
    state_pre: State,
    covariance_pre: Matrix4,
    /// Posterior (after correct)
    state_post: State,
    covariance_post: Matrix4,

    transition: Matrix4,
    process_noise: Matrix4,
    measurement_noise: Matrix2,

    phase: FilterPhase,
}

impl KalmanFilter {
    pub fn new(process_noise: f32, measurement_noise: f32, initial_covariance: f32) -> Self {
        let covariance = Matrix4::identity() * initial_covariance;
        Self {
            state_pre: State::zeros(),
            covariance_pre: covariance,
            state_post: State::zeros(),
            covariance_post: covariance,
            transition: Self::transition_matrix(),
            process_noise: Matrix4::identity() * process_noise,
            measurement_noise: Matrix2::identity() * measurement_noise,
            phase: FilterPhase::Corrected,
        }
    }

    /// Transition matrix F for one cycle
    ///
    /// ```text
    /// | 1  0  1  0 |
    /// | 0  1  0  1 |
    /// | 0  0  1  0 |
    /// | 0  0  0  1 |
    /// ```
    #[rustfmt::skip]
    fn transition_matrix() -> Matrix4 {
        Matrix4::new(
            1.0, 0.0, 1.0, 0.0,
            0.0, 1.0, 0.0, 1.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Observation matrix H (position only)
    #[rustfmt::skip]
    fn observation_matrix() -> Matrix2x4 {
        Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
        )
    }

    pub fn phase(&self) -> FilterPhase {
        self.phase
    }

    /// Advance one cycle and return the predicted position.
    ///
    /// The posterior is set to the prior as well, so a cycle that never
    /// corrects continues from the prediction.
    pub fn predict(&mut self) -> (f32, f32) {
        if self.phase == FilterPhase::Corrected {
            let f = self.transition;
            self.state_pre = f * self.state_post;
            self.covariance_pre = f * self.covariance_post * f.transpose() + self.process_noise;
            self.state_post = self.state_pre;
            self.covariance_post = self.covariance_pre;
            self.phase = FilterPhase::Predicted;
        }
        (self.state_pre[0], self.state_pre[1])
    }

    /// Fold a position measurement into the pending prior
    pub fn correct(&mut self, measured_x: f32, measured_y: f32) {
        let h = Self::observation_matrix();
        let z = Vector2::new(measured_x, measured_y);

        // Innovation: y = z - H * x
        let innovation = z - h * self.state_pre;

        // Innovation covariance: S = H * P * Hᵀ + R
        let s = h * self.covariance_pre * h.transpose() + self.measurement_noise;

        // Kalman gain: K = P * Hᵀ * S⁻¹
        let s_inv = s.try_inverse().unwrap_or_else(Matrix2::identity);
        let k: Matrix4x2 = self.covariance_pre * h.transpose() * s_inv;

        self.state_post = self.state_pre + k * innovation;
        self.covariance_post = (Matrix4::identity() - k * h) * self.covariance_pre;
        self.phase = FilterPhase::Corrected;
    }

    /// Close the cycle without a measurement; the prior becomes the posterior
    pub fn coast(&mut self) {
        self.phase = FilterPhase::Corrected;
    }

    /// Current best position estimate (posterior)
    pub fn position(&self) -> (f32, f32) {
        (self.state_post[0], self.state_post[1])
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.state_post[2], self.state_post[3])
    }
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(
            KALMAN_PROCESS_NOISE,
            KALMAN_MEASUREMENT_NOISE,
            KALMAN_INITIAL_COVARIANCE,
        )
    }
}
