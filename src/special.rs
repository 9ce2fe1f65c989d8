//! Special functions needed by the analytic GFPT series.
//!
//! The series needs Bessel functions of the first kind of real (possibly
//! negative, non-integer) order and their positive zeros. These are modelled as
//! a capability, [`BesselSource`], so callers can plug in tabulated zeros or a
//! different implementation; a provider that cannot deliver returns `None` and
//! the series reports [`crate::Error::Unavailable`].
//!
//! [`NumericalBessel`] is the built-in provider:
//! - power series for `x < 15`,
//! - Hankel asymptotic expansion for `x >= 15`,
//! - `J_{-n} = (-1)^n J_n` for negative integer orders,
//! - zeros by scanning for sign changes and bisecting.

use std::f64::consts::PI;

/// Argument above which the asymptotic expansion replaces the power series.
const ASYMPTOTIC_FROM: f64 = 15.0;
/// Scan step when bracketing zeros; well below the smallest zero spacing for
/// orders in `(-1, 2)`.
const ZERO_SCAN_STEP: f64 = 0.05;
const ZERO_SCAN_START: f64 = 1e-4;

pub trait BesselSource {
    /// `J_order(x)` for `x > 0`.
    fn bessel_j(&self, order: f64, x: f64) -> Option<f64>;

    /// The first `count` positive zeros of `J_order`, ascending.
    fn bessel_j_zeros(&self, order: f64, count: usize) -> Option<Vec<f64>>;
}

/// Built-in double-precision Bessel provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericalBessel;

impl BesselSource for NumericalBessel {
    fn bessel_j(&self, order: f64, x: f64) -> Option<f64> {
        let v = bessel_j(order, x);
        v.is_finite().then_some(v)
    }

    fn bessel_j_zeros(&self, order: f64, count: usize) -> Option<Vec<f64>> {
        bessel_j_zeros(order, count)
    }
}

/// Gamma function (Lanczos approximation, g = 7), with reflection below 1/2.
pub fn gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEF: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Γ(x) Γ(1 − x) = π / sin(πx)
        return PI / ((PI * x).sin() * gamma(1.0 - x));
    }
    let x = x - 1.0;
    let mut a = COEF[0];
    let t = x + G + 0.5;
    for (i, &c) in COEF.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    (2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * a
}

/// Bessel function of the first kind `J_order(x)`, `x > 0`.
///
/// Returns NaN for `x <= 0` or non-finite input.
pub fn bessel_j(order: f64, x: f64) -> f64 {
    if !(x > 0.0) || !x.is_finite() || !order.is_finite() {
        return f64::NAN;
    }
    if order < 0.0 && order.fract() == 0.0 {
        let sign = if (order as i64) % 2 == 0 { 1.0 } else { -1.0 };
        return sign * bessel_j(-order, x);
    }
    if x < ASYMPTOTIC_FROM {
        series(order, x)
    } else {
        hankel(order, x)
    }
}

/// `Σ_m (−1)^m (x/2)^{2m+ν} / (m! Γ(m+ν+1))`
fn series(order: f64, x: f64) -> f64 {
    let half = 0.5 * x;
    let q = -half * half;
    let mut term = half.powf(order) / gamma(order + 1.0);
    let mut sum = term;
    let mut m = 0.0;
    loop {
        m += 1.0;
        term *= q / (m * (m + order));
        sum += term;
        if m > half && term.abs() <= 1e-17 * sum.abs().max(1e-300) {
            break;
        }
        if m > 500.0 {
            break;
        }
    }
    sum
}

/// Hankel expansion `√(2/πx) (P cos χ − Q sin χ)`, `χ = x − (ν/2 + 1/4)π`.
fn hankel(order: f64, x: f64) -> f64 {
    let mu = 4.0 * order * order;
    let mut p = 1.0;
    let mut q = 0.0;
    let mut term = 1.0f64;
    let mut k = 1.0;
    loop {
        let odd = 2.0 * k - 1.0;
        let next = term * (mu - odd * odd) / (k * 8.0 * x);
        if next.abs() >= term.abs() || next.abs() < 1e-17 {
            // Either converged or the asymptotic series started to diverge.
            if next.abs() < term.abs() {
                add_hankel_term(&mut p, &mut q, k as usize, next);
            }
            break;
        }
        add_hankel_term(&mut p, &mut q, k as usize, next);
        term = next;
        k += 1.0;
        if k > 60.0 {
            break;
        }
    }
    let chi = x - (0.5 * order + 0.25) * PI;
    (2.0 / (PI * x)).sqrt() * (p * chi.cos() - q * chi.sin())
}

/// `P = t0 − t2 + t4 − …`, `Q = t1 − t3 + t5 − …`
fn add_hankel_term(p: &mut f64, q: &mut f64, k: usize, t: f64) {
    match k % 4 {
        0 => *p += t,
        1 => *q += t,
        2 => *p -= t,
        _ => *q -= t,
    }
}

/// First `count` positive zeros of `J_order`.
///
/// Supported for `order > −1`, where `J_order` has only simple, real zeros.
pub fn bessel_j_zeros(order: f64, count: usize) -> Option<Vec<f64>> {
    if !(order > -1.0) || !order.is_finite() {
        return None;
    }
    let mut zeros = Vec::with_capacity(count);
    // McMahon: j_{ν,k} ≈ (k + ν/2 − 1/4)π; leave generous headroom.
    let limit = (count as f64 + 0.5 * order.abs() + 2.0) * PI + 10.0;

    let mut a = ZERO_SCAN_START;
    let mut fa = bessel_j(order, a);
    if zeros.len() < count && order < 0.0 && fa <= 0.0 {
        // For order near −1 the first zero, ≈ 2√(1 + order), lies below the scan start.
        zeros.push(if fa == 0.0 { a } else { first_zero_below(order, a)? });
    }
    while zeros.len() < count {
        let b = a + ZERO_SCAN_STEP;
        if b > limit {
            return None;
        }
        let fb = bessel_j(order, b);
        if !fa.is_finite() || !fb.is_finite() {
            return None;
        }
        if fb == 0.0 {
            zeros.push(b);
        } else if fa * fb < 0.0 {
            zeros.push(bisect(order, a, b, fa));
        }
        a = b;
        fa = fb;
    }
    Some(zeros)
}

/// Zero of `J_order` in `(0, hi)` for `−1 < order < 0`, where `J_order` is
/// positive near the origin and `J_order(hi) < 0`.
fn first_zero_below(order: f64, hi: f64) -> Option<f64> {
    let mut lo = (2.0 * (1.0 + order).sqrt()).min(hi) * 0.5;
    for _ in 0..200 {
        let flo = bessel_j(order, lo);
        if !flo.is_finite() || lo <= 0.0 {
            return None;
        }
        if flo > 0.0 {
            return Some(bisect(order, lo, hi, flo));
        }
        lo *= 0.5;
    }
    None
}

fn bisect(order: f64, mut lo: f64, mut hi: f64, mut flo: f64) -> f64 {
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if hi - lo <= 1e-15 * mid {
            break;
        }
        let fmid = bessel_j(order, mid);
        if fmid == 0.0 {
            return mid;
        }
        if flo * fmid < 0.0 {
            hi = mid;
        } else {
            lo = mid;
            flo = fmid;
        }
    }
    0.5 * (lo + hi)
}
