// Kepler Solver - Eccentric anomaly by fixed-budget Newton-Raphson
// Shared by the planetary and comet propagators

use std::f64::consts::PI;

/// Iteration budget for near-circular orbits
pub const PLANET_ITERATIONS: usize = 5;

/// Iteration budget for high-eccentricity orbits (comets)
pub const COMET_ITERATIONS: usize = 10;

/// Above this eccentricity the solve starts from ±π instead of M
pub const HIGH_ECCENTRICITY: f64 = 0.8;

/// Lower bound on dM/dE = 1 - e*cos(E) as e approaches 1
const DERIVATIVE_FLOOR: f64 = 1e-6;

/// Default iteration budget for an orbit of eccentricity `e`.
pub fn iteration_budget(eccentricity: f64) -> usize {
    if eccentricity < HIGH_ECCENTRICITY {
        PLANET_ITERATIONS
    } else {
        COMET_ITERATIONS
    }
}

/// Wrap an angle into (-π, π].
pub fn wrap_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Solve Kepler's equation M = E - e*sin(E) with a fixed number of Newton steps.
///
/// `mean_anomaly` is in radians and is wrapped into (-π, π] first, so the
/// returned eccentric anomaly lies in the same branch. There is no convergence
/// check: the result is exact only up to what `iterations` steps achieve. For
/// e in [0, 0.99] the default budgets from [`iteration_budget`] leave a
/// residual below 1e-3 rad.
pub fn solve_kepler_equation(mean_anomaly: f64, eccentricity: f64, iterations: usize) -> f64 {
    let m = wrap_pi(mean_anomaly);
    if eccentricity <= 0.0 {
        return m;
    }

    // From ±π the iterates approach the root monotonically on the convex
    // branch; starting at M can overshoot past 2π when e is close to 1.
    let mut e_anom = if eccentricity < HIGH_ECCENTRICITY {
        m
    } else if m >= 0.0 {
        PI
    } else {
        -PI
    };

    for _ in 0..iterations {
        let f = e_anom - eccentricity * e_anom.sin() - m;
        let f_prime = (1.0 - eccentricity * e_anom.cos()).max(DERIVATIVE_FLOOR);
        e_anom -= f / f_prime;
    }

    e_anom
}

/// True anomaly from eccentric anomaly (half-angle atan2 form).
pub fn true_anomaly(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    2.0 * ((1.0 + eccentricity).sqrt() * (eccentric_anomaly / 2.0).sin())
        .atan2((1.0 - eccentricity).sqrt() * (eccentric_anomaly / 2.0).cos())
}

/// Distance from the focus: r = a(1 - e*cos E).
pub fn orbital_radius(semi_major_axis: f64, eccentricity: f64, eccentric_anomaly: f64) -> f64 {
    semi_major_axis * (1.0 - eccentricity * eccentric_anomaly.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residual(e_anom: f64, e: f64, m: f64) -> f64 {
        wrap_pi(e_anom - e * e_anom.sin() - m).abs()
    }

    #[test]
    fn test_kepler_equation_circular() {
        // For circular orbit e=0, E = M
        let e = solve_kepler_equation(1.0, 0.0, PLANET_ITERATIONS);
        assert!((e - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_kepler_equation_eccentric() {
        let e = solve_kepler_equation(0.5, 0.5, PLANET_ITERATIONS);
        let check = e - 0.5 * e.sin();
        assert!((check - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_residual_within_budget_across_eccentricities() {
        for ei in 0..=99 {
            let e = ei as f64 / 100.0;
            let budget = iteration_budget(e);
            for mi in -72..=72 {
                let m = mi as f64 * (2.0 * PI / 72.0) + 0.013;
                let e_anom = solve_kepler_equation(m, e, budget);
                assert!(e_anom.is_finite());
                let r = residual(e_anom, e, m);
                assert!(r < 1e-3, "e={e} M={m} residual={r}");
            }
        }
    }

    #[test]
    fn test_near_zero_mean_anomaly_high_eccentricity() {
        for &m in &[0.0, 1e-6, -1e-6, 1e-3, -1e-3, 0.1415, -0.1415] {
            let e_anom = solve_kepler_equation(m, 0.99, COMET_ITERATIONS);
            assert!(residual(e_anom, 0.99, m) < 1e-3, "M={m}");
        }
    }

    #[test]
    fn test_true_anomaly_matches_at_apsides() {
        assert!(true_anomaly(0.0, 0.6).abs() < 1e-12);
        assert!((true_anomaly(PI, 0.6).abs() - PI).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_pi_range() {
        for k in -20..20 {
            let w = wrap_pi(k as f64 * 0.9);
            assert!(w > -PI && w <= PI);
        }
        assert!((wrap_pi(3.0 * PI).abs() - PI).abs() < 1e-9);
        assert!((wrap_pi(2.0 * PI + 0.5) - 0.5).abs() < 1e-12);
    }
}
