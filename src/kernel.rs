//! Kernel profiles for density estimation.
//!
//! A kernel profile is a non-negative, non-increasing function `k(u)` of the
//! squared normalized distance `u = (d/h)²`, where `h` is the bandwidth.
//! Mean shift never evaluates the profile itself during iteration: the
//! weight of a neighbor is the *shadow* weight `g(u) = -k'(u)`, the negative
//! derivative of the profile. The derivative must therefore yield
//! non-positive values over the whole queried range, `u` in `[0, 9]` given
//! the 3-bandwidth search window.

/// A kernel profile evaluated at squared normalized distances.
pub trait DensityKernel: Send + Sync {
    /// Evaluate the profile at squared normalized distance `u`.
    fn profile(&self, u: f32) -> f32;

    /// Derivative of the profile at `u`.
    ///
    /// `-derivative(u)` is the weight a neighbor at squared normalized
    /// distance `u` contributes to the shifted mean.
    fn derivative(&self, u: f32) -> f32;
}

/// Flat (uniform) kernel.
///
/// The derivative is a negative constant over the queried range: every
/// neighbor inside the search window carries equal weight, so the shifted
/// mean is the plain average of the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformKernel;

impl DensityKernel for UniformKernel {
    fn profile(&self, u: f32) -> f32 {
        if u <= 1.0 {
            1.0
        } else {
            0.0
        }
    }

    fn derivative(&self, _u: f32) -> f32 {
        -1.0
    }
}

/// Gaussian kernel, `k(u) = exp(-u / 2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianKernel;

impl DensityKernel for GaussianKernel {
    fn profile(&self, u: f32) -> f32 {
        (-u / 2.0).exp()
    }

    fn derivative(&self, u: f32) -> f32 {
        -0.5 * (-u / 2.0).exp()
    }
}

/// Epanechnikov kernel, `k(u) = 1 - u` on `[0, 1]`.
///
/// Support ends at `u = 1` (distance equal to the bandwidth); neighbors
/// farther out contribute nothing even when the search window reaches them.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpanechnikovKernel;

impl DensityKernel for EpanechnikovKernel {
    fn profile(&self, u: f32) -> f32 {
        if u <= 1.0 {
            1.0 - u
        } else {
            0.0
        }
    }

    fn derivative(&self, u: f32) -> f32 {
        if u <= 1.0 {
            -1.0
        } else {
            0.0
        }
    }
}
