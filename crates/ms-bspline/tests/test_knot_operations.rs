//! Knot insertion, refinement and domain reduction on interpolated splines.
//!
//! Every operation here changes the representation of a spline but not the
//! function it represents (within the retained domain), and every failing
//! operation leaves the spline exactly as it was.

use ms_bspline::{BSpline, BSplineType, DataTable};
use ms_core::Error;
use proptest::prelude::*;

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| if i + 1 == n { hi } else { lo + (hi - lo) * i as f64 / (n - 1) as f64 })
        .collect()
}

fn surface(x: f64, y: f64) -> f64 {
    (3.0 * x).sin() + y * y * (1.0 - x) + 0.5 * (x * y).exp()
}

fn interpolated(n: usize, kind: BSplineType) -> BSpline {
    let axis = linspace(0.0, 1.0, n);
    let mut table = DataTable::new();
    for &x in &axis {
        for &y in &axis {
            table.add_sample(&[x, y], surface(x, y)).unwrap();
        }
    }
    BSpline::interpolate(&table, kind).unwrap()
}

fn grid_points(lo: [f64; 2], hi: [f64; 2], n: usize) -> Vec<[f64; 2]> {
    let xs = linspace(lo[0], hi[0], n);
    let ys = linspace(lo[1], hi[1], n);
    xs.iter()
        .flat_map(|&x| ys.iter().map(move |&y| [x, y]))
        .collect()
}

fn assert_same_function(a: &BSpline, b: &BSpline, points: &[[f64; 2]], tol: f64) {
    for p in points {
        let (u, v) = (a.eval(p).unwrap(), b.eval(p).unwrap());
        assert!((u - v).abs() <= tol, "at {p:?}: {u} vs {v}");
    }
}

// ─── Knot insertion ───────────────────────────────────────────────────────────

#[test]
fn test_insertion_preserves_values() {
    let original = interpolated(8, BSplineType::Cubic);
    let mut spline = original.clone();
    spline.insert_knots(0.3, 0, 2).unwrap();
    spline.insert_knots(0.71, 1, 1).unwrap();
    assert_eq!(spline.num_basis_functions(), 10 * 9);
    assert_eq!(spline.basis().knot_multiplicity(0, 0.3).unwrap(), 2);
    assert_same_function(&original, &spline, &grid_points([0.0; 2], [1.0; 2], 9), 1e-12);
}

#[test]
fn test_insertion_at_domain_bounds_is_allowed_up_to_full_multiplicity() {
    let original = interpolated(6, BSplineType::Quadratic);
    let mut spline = original.clone();
    // End knots already have multiplicity 3 = degree + 1.
    let before = spline.clone();
    assert!(matches!(
        spline.insert_knots(0.0, 0, 1),
        Err(Error::KnotMultiplicity { multiplicity: 4, max: 3, .. })
    ));
    assert_eq!(spline, before);
    spline.insert_knots(0.5, 1, 3).unwrap();
    assert_same_function(&original, &spline, &grid_points([0.0; 2], [1.0; 2], 7), 1e-12);
}

#[test]
fn test_multiplicity_overflow_leaves_spline_unchanged() {
    let mut spline = interpolated(7, BSplineType::Cubic);
    spline.insert_knots(0.4, 1, 3).unwrap();
    let before = spline.clone();
    let err = spline.insert_knots(0.4, 1, 2).unwrap_err();
    assert!(matches!(err, Error::KnotMultiplicity { multiplicity: 5, max: 4, .. }));
    assert_eq!(spline, before);
}

#[test]
fn test_insertion_outside_domain_or_dimension_fails() {
    let mut spline = interpolated(5, BSplineType::Linear);
    let before = spline.clone();
    assert!(matches!(spline.insert_knots(1.5, 0, 1), Err(Error::Domain(_))));
    assert!(matches!(
        spline.insert_knots(0.5, 2, 1),
        Err(Error::IndexOutOfRange { index: 2, size: 2 })
    ));
    assert_eq!(spline, before);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_insertion_preserves_values(
        tau in 0.001f64..0.999,
        dim in 0usize..2,
        multiplicity in 1usize..=3,
    ) {
        let original = interpolated(6, BSplineType::Cubic);
        let mut spline = original.clone();
        spline.insert_knots(tau, dim, multiplicity).unwrap();
        prop_assert_eq!(
            spline.num_basis_functions(),
            original.num_basis_functions() + multiplicity * 6
        );
        for p in grid_points([0.0; 2], [1.0; 2], 6) {
            let (u, v) = (original.eval(&p).unwrap(), spline.eval(&p).unwrap());
            prop_assert!((u - v).abs() <= 1e-10, "at {:?}: {} vs {}", p, u, v);
        }
    }
}

// ─── Refinement ───────────────────────────────────────────────────────────────

#[test]
fn test_refinement_preserves_values() {
    let original = interpolated(6, BSplineType::Cubic);
    let mut spline = original.clone();
    spline.refine_knot_vectors().unwrap();
    // Free-end cubic knots over 6 values have 3 distinct intervals per variable.
    assert_eq!(spline.num_basis_functions(), 9 * 9);
    spline.refine_knot_vectors().unwrap();
    assert_eq!(spline.num_basis_functions(), 15 * 15);
    assert_same_function(&original, &spline, &grid_points([0.0; 2], [1.0; 2], 11), 1e-11);
}

#[test]
fn test_refinement_keeps_domain() {
    let mut spline = interpolated(5, BSplineType::Linear);
    let (lb, ub) = (spline.domain_lower_bound(), spline.domain_upper_bound());
    spline.refine_knot_vectors().unwrap();
    assert_eq!(spline.domain_lower_bound(), lb);
    assert_eq!(spline.domain_upper_bound(), ub);
    assert_eq!(spline.num_basis_functions(), 9 * 9);
}

// ─── Domain reduction ─────────────────────────────────────────────────────────

#[test]
fn test_reduce_domain_with_regularization() {
    let original = interpolated(10, BSplineType::Cubic);
    let mut spline = original.clone();
    let (lb, ub) = ([0.2, 0.15], [0.7, 0.9]);
    spline.reduce_domain(&lb, &ub, true, false).unwrap();

    assert_eq!(spline.domain_lower_bound(), lb.to_vec());
    assert_eq!(spline.domain_upper_bound(), ub.to_vec());
    assert_same_function(&original, &spline, &grid_points(lb, ub, 9), 1e-11);

    assert!(matches!(spline.eval(&[0.8, 0.5]), Err(Error::Domain(_))));
    assert!(matches!(spline.eval(&[0.5, 0.1]), Err(Error::Domain(_))));
}

#[test]
fn test_reduce_domain_with_refinement() {
    let original = interpolated(8, BSplineType::Quadratic);
    let mut spline = original.clone();
    let (lb, ub) = ([0.25, 0.0], [0.6, 0.5]);
    spline.reduce_domain(&lb, &ub, true, true).unwrap();
    assert_eq!(spline.domain_lower_bound(), lb.to_vec());
    assert_eq!(spline.domain_upper_bound(), ub.to_vec());
    assert_same_function(&original, &spline, &grid_points(lb, ub, 8), 1e-11);
}

#[test]
fn test_reduce_domain_without_regularization_contains_box() {
    let original = interpolated(10, BSplineType::Cubic);
    let mut spline = original.clone();
    let (lb, ub) = ([0.35, 0.35], [0.65, 0.65]);
    spline.reduce_domain(&lb, &ub, false, false).unwrap();

    assert!(spline.num_basis_functions() < original.num_basis_functions());
    let (new_lb, new_ub) = (spline.domain_lower_bound(), spline.domain_upper_bound());
    for k in 0..2 {
        assert!(new_lb[k] <= lb[k] && new_ub[k] >= ub[k]);
    }
    assert_same_function(&original, &spline, &grid_points(lb, ub, 7), 1e-12);
}

#[test]
fn test_reduce_domain_clips_to_current_domain() {
    let original = interpolated(6, BSplineType::Linear);
    let mut spline = original.clone();
    spline.reduce_domain(&[-5.0, 0.4], &[5.0, 3.0], true, false).unwrap();
    assert_eq!(spline.domain_lower_bound(), vec![0.0, 0.4]);
    assert_eq!(spline.domain_upper_bound(), vec![1.0, 1.0]);
}

#[test]
fn test_reduce_domain_rejects_empty_box_without_mutation() {
    let mut spline = interpolated(6, BSplineType::Cubic);
    let before = spline.clone();
    assert!(matches!(
        spline.reduce_domain(&[0.5, 0.2], &[0.5, 0.8], true, true),
        Err(Error::Domain(_))
    ));
    assert!(matches!(
        spline.reduce_domain(&[0.2, 0.9], &[0.8, 0.1], false, false),
        Err(Error::Domain(_))
    ));
    assert!(matches!(
        spline.reduce_domain(&[0.2, 0.2, 0.2], &[0.8, 0.8, 0.8], true, false),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(spline, before);
}

// ─── Derivatives ──────────────────────────────────────────────────────────────

#[test]
fn test_derivatives_match_finite_differences() {
    let spline = interpolated(9, BSplineType::Cubic);
    let h = 1e-5;
    for p in [[0.21, 0.33], [0.5, 0.77], [0.9, 0.12]] {
        let jac = spline.eval_jacobian(&p).unwrap();
        let hess = spline.eval_hessian(&p).unwrap();
        assert_eq!((jac.rows(), jac.cols()), (1, 2));
        assert_eq!((hess.rows(), hess.cols()), (2, 2));
        for k in 0..2 {
            let mut up = p;
            let mut down = p;
            up[k] += h;
            down[k] -= h;
            let fd = (spline.eval(&up).unwrap() - spline.eval(&down).unwrap()) / (2.0 * h);
            assert!((jac[(0, k)] - fd).abs() < 1e-6, "∂f/∂x{k}: {} vs {fd}", jac[(0, k)]);

            let gu = spline.eval_jacobian(&up).unwrap();
            let gd = spline.eval_jacobian(&down).unwrap();
            for c in 0..2 {
                let fd2 = (gu[(0, c)] - gd[(0, c)]) / (2.0 * h);
                assert!((hess[(k, c)] - fd2).abs() < 1e-4, "H[{k}][{c}]: {} vs {fd2}", hess[(k, c)]);
            }
        }
        assert_eq!(hess[(0, 1)], hess[(1, 0)]);
    }
}
