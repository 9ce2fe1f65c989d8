//! Analytic GFPT distribution for walks on self-similar networks.
//!
//! Time is rescaled by the global mean first-passage time, `T = t / ⟨t⟩`, so
//! the distribution depends only on `ν = d_f / d_w`:
//! - `ν ≥ 1` (non-compact exploration): `P(T) = exp(−T)`.
//! - `0 < ν < 1` (compact exploration), with `α_k` the positive zeros of
//!   `J_{−ν}`:
//!
//! ```text
//! P(T) = 2^{2ν} ν Γ(1+ν) / ((1−ν²) Γ(1−ν))
//!        · Σ_k α_k^{1−2ν} J_ν(α_k) / J_{1−ν}(α_k) · exp(−α_k² ν T / (2(1−ν²)))
//! ```
//!
//! The sum is truncated at [`SERIES_TERMS`] terms; it converges slowly near
//! `T = 0`, where the compact distribution is singular for `ν < 1/2`.

use crate::special::{gamma, BesselSource, NumericalBessel};
use crate::{Error, Result};

pub const SERIES_TERMS: usize = 100;

/// GFPT distribution at rescaled times `t`, using the built-in Bessel provider.
pub fn gfpt_theory(t: &[f64], nu: f64) -> Result<Vec<f64>> {
    gfpt_theory_with(t, nu, &NumericalBessel)
}

/// GFPT distribution at rescaled times `t` with an explicit Bessel provider.
///
/// Returns [`Error::Unavailable`] when the provider cannot supply the zeros
/// or function values the compact series needs.
pub fn gfpt_theory_with(t: &[f64], nu: f64, bessel: &dyn BesselSource) -> Result<Vec<f64>> {
    if !nu.is_finite() || nu <= 0.0 {
        return Err(Error::InvalidParameter(format!("nu must be positive and finite, got {nu}")));
    }
    if nu >= 1.0 {
        return Ok(t.iter().map(|&x| (-x).exp()).collect());
    }

    let zeros = bessel.bessel_j_zeros(-nu, SERIES_TERMS).ok_or_else(|| {
        log::warn!("no Bessel zeros for order {}; compact GFPT series unavailable", -nu);
        Error::Unavailable(format!("zeros of J_{{{}}}", -nu))
    })?;
    if zeros.len() < SERIES_TERMS {
        return Err(Error::Unavailable(format!(
            "only {} of {SERIES_TERMS} zeros of J_{{{}}}",
            zeros.len(),
            -nu
        )));
    }

    let one_minus_sq = (1.0 - nu) * (1.0 + nu);
    let prefactor = 2f64.powf(2.0 * nu) * nu * gamma(1.0 + nu) / (one_minus_sq * gamma(1.0 - nu));
    let rate = nu / (2.0 * one_minus_sq);

    // (amplitude, decay rate) of each exponential mode.
    let mut modes = Vec::with_capacity(zeros.len());
    for &alpha in &zeros {
        let j_nu = bessel.bessel_j(nu, alpha);
        let j_comp = bessel.bessel_j(1.0 - nu, alpha);
        let (j_nu, j_comp) = match (j_nu, j_comp) {
            (Some(a), Some(b)) if b != 0.0 => (a, b),
            _ => return Err(Error::Unavailable(format!("Bessel values at zero {alpha}"))),
        };
        modes.push((prefactor * alpha.powf(1.0 - 2.0 * nu) * j_nu / j_comp, alpha * alpha * rate));
    }

    Ok(t.iter().map(|&x| modes.iter().map(|&(amp, k)| amp * (-k * x).exp()).sum()).collect())
}
