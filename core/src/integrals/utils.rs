//! Recursions of the McMurchie-Davidson scheme.
//!
//! [1] Goings, J. Integrals. https://joshuagoings.com/2017/04/28/integrals/
use nalgebra::Vector3;

/// Hermite expansion coefficient E^{ij}_t of the overlap distribution of two one
/// dimensional gaussians with exponents `a` and `b`, whose centers are `distance = A - B`
/// apart.
pub(crate) fn hermite_expansion([i, j, t]: [i32; 3], distance: f64, a: f64, b: f64) -> f64 {
    let p = a + b;
    let q = a * b / p;

    if i < 0 || j < 0 || t < 0 || t > i + j {
        0.0
    } else if i == 0 && j == 0 && t == 0 {
        f64::exp(-q * distance.powi(2))
    } else if j == 0 {
        // decrement i
        (2.0 * p).recip() * hermite_expansion([i - 1, j, t - 1], distance, a, b)
            - (q * distance / a) * hermite_expansion([i - 1, j, t], distance, a, b)
            + (t + 1) as f64 * hermite_expansion([i - 1, j, t + 1], distance, a, b)
    } else {
        // decrement j
        (2.0 * p).recip() * hermite_expansion([i, j - 1, t - 1], distance, a, b)
            + (q * distance / b) * hermite_expansion([i, j - 1, t], distance, a, b)
            + (t + 1) as f64 * hermite_expansion([i, j - 1, t + 1], distance, a, b)
    }
}

/// Hermite coulomb auxiliary integral R^n_{tuv}. `diff` is the vector between the
/// gaussian product center and the point charge (P - C), or between two product
/// centers (P - Q).
pub(crate) fn coulomb_auxiliary(t: i32, u: i32, v: i32, n: i32, p: f64, diff: Vector3<f64>) -> f64 {
    if t < 0 || u < 0 || v < 0 {
        return 0.0;
    }

    if t == 0 && u == 0 && v == 0 {
        let x = p * diff.norm_squared();
        return (-2.0 * p).powi(n) * boys::micb25::boys(n as _, x);
    }

    if t == 0 && u == 0 {
        (v - 1) as f64 * coulomb_auxiliary(t, u, v - 2, n + 1, p, diff)
            + diff.z * coulomb_auxiliary(t, u, v - 1, n + 1, p, diff)
    } else if t == 0 {
        (u - 1) as f64 * coulomb_auxiliary(t, u - 2, v, n + 1, p, diff)
            + diff.y * coulomb_auxiliary(t, u - 1, v, n + 1, p, diff)
    } else {
        (t - 1) as f64 * coulomb_auxiliary(t - 2, u, v, n + 1, p, diff)
            + diff.x * coulomb_auxiliary(t - 1, u, v, n + 1, p, diff)
    }
}
