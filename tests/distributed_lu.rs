//! Integration tests for the distributed factorization and solve

mod common;

use common::{assert_allclose_f64, dominant_matrix, init_logger, mat_vec, needs_pivoting};
use meshlu::algorithm::linalg::reference::{
    gefa_ref, gefa_ref_nopvt, gesl_ref_nopvt, total_abs_error,
};
use meshlu::prelude::*;

fn factorize(
    a: &[f64],
    n: usize,
    b: usize,
    chunk: usize,
    strategy: FactorizationStrategy,
    topology: Topology,
) -> Result<(TiledMatrix<f64>, PivotTracker)> {
    let mut m = TiledMatrix::from_dense(a, n, b)?;
    let client = MeshClient::with_grid(n / b, b, chunk, topology)?.with_strategy(strategy);
    let sweep = client.factorize(&mut m)?;
    Ok((m, sweep.pivots))
}

#[test]
fn test_no_pivot_matches_reference_exactly() {
    init_logger();
    for (n, b, chunk) in [(8, 4, 2), (12, 4, 4), (16, 4, 1), (24, 8, 4)] {
        let a = dominant_matrix(n);
        let (m, pivots) = factorize(
            &a,
            n,
            b,
            chunk,
            FactorizationStrategy::NoPivot,
            Topology::Torus,
        )
        .unwrap();
        assert!(pivots.is_identity());

        let mut reference = a.clone();
        gefa_ref_nopvt(&mut reference, n).unwrap();
        assert_eq!(
            total_abs_error(&m.to_dense(), &reference),
            0.0,
            "n={n} b={b} chunk={chunk}"
        );
    }
}

#[test]
fn test_torus_and_bounded_agree() {
    let n = 16;
    let a = dominant_matrix(n);
    let (torus, _) = factorize(&a, n, 4, 2, FactorizationStrategy::NoPivot, Topology::Torus).unwrap();
    let (bounded, _) =
        factorize(&a, n, 4, 2, FactorizationStrategy::NoPivot, Topology::Bounded).unwrap();
    assert_eq!(torus.to_dense(), bounded.to_dense());
}

#[test]
fn test_solution_substitutes_back() {
    init_logger();
    let n = 16;
    let a = dominant_matrix(n);
    let x_expected: Vec<f64> = (0..n).map(|i| (i as f64 - 7.5) / 3.0).collect();
    let rhs = mat_vec(&a, &x_expected);

    let (m, pivots) = factorize(&a, n, 4, 2, FactorizationStrategy::NoPivot, Topology::Torus).unwrap();
    let solver = TriangularSolver::new(m, pivots).unwrap();
    let x = solver.solve(&rhs).unwrap();
    assert_allclose_f64(&x, &x_expected, 1e-12, 1e-12, "solution");
    assert_allclose_f64(&mat_vec(&a, &x), &rhs, 1e-12, 1e-12, "A x = b");

    let mut reference = a;
    let mut x_ref = rhs;
    gefa_ref_nopvt(&mut reference, n).unwrap();
    gesl_ref_nopvt(&reference, &mut x_ref, n).unwrap();
    assert!(total_abs_error(&x, &x_ref) < 1e-12);
}

#[test]
fn test_pivoted_recovers_planted_solution() {
    init_logger();
    let (n, b) = (16, 16);
    let a = needs_pivoting(n, b);
    let x_expected: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 * 0.25).collect();
    let rhs = mat_vec(&a, &x_expected);

    let (m, pivots) = factorize(
        &a,
        n,
        b,
        2,
        FactorizationStrategy::PartialPivot,
        Topology::Bounded,
    )
    .unwrap();
    assert!(!pivots.is_identity());
    // The zero on the first diagonal forces an interchange at the very first step
    assert_eq!(pivots.permutation_for(0)[0], 1);

    let solver = TriangularSolver::new(m, pivots).unwrap();
    let x = solver.solve(&rhs).unwrap();
    assert_allclose_f64(&x, &x_expected, 1e-10, 1e-10, "planted solution");
}

#[test]
fn test_no_pivot_breaks_down_where_pivoting_is_needed() {
    let (n, b) = (8, 4);
    let a = needs_pivoting(n, b);
    let (m, _) = factorize(&a, n, b, 2, FactorizationStrategy::NoPivot, Topology::Torus).unwrap();
    assert!(m.to_dense().iter().any(|v| !v.is_finite()));
}

#[test]
fn test_single_tile_pivoted_matches_reference_exactly() {
    let n = 8;
    let config = common::small_config(n, n, 4).with_diagonal_dominance(false);
    let a = generate_input_data::<f64>(&config)
        .unwrap()
        .original_matrix()
        .to_dense();
    let (m, pivots) = factorize(
        &a,
        n,
        n,
        4,
        FactorizationStrategy::PartialPivot,
        Topology::Torus,
    )
    .unwrap();

    let mut reference = a;
    let ipvt = gefa_ref(&mut reference, n).unwrap();
    assert_eq!(pivots.permutation_for(0), ipvt.as_slice());
    assert_eq!(m.to_dense(), reference);
}

#[test]
fn test_singular_tile_fails_the_sweep() {
    init_logger();
    let n = 8;
    let mut a = dominant_matrix(n);
    // Rows 4 and 5 become identical
    for c in 0..n {
        a[5 * n + c] = a[4 * n + c];
    }
    let err = factorize(
        &a,
        n,
        n,
        2,
        FactorizationStrategy::PartialPivot,
        Topology::Bounded,
    )
    .unwrap_err();
    assert!(matches!(err, Error::SingularPivot { tile: 0, .. }), "{err}");
}

#[test]
fn test_pivoting_rejected_for_tiled_grid() {
    let (n, b) = (16, 4);
    let a = needs_pivoting(n, b);
    let mut m = TiledMatrix::from_dense(&a, n, b).unwrap();
    let client = MeshClient::with_grid(n / b, b, 2, Topology::Torus)
        .unwrap()
        .with_strategy(FactorizationStrategy::PartialPivot);
    assert!(matches!(
        client.factorize(&mut m),
        Err(Error::Configuration { .. })
    ));
    assert_eq!(m.to_dense(), a);
}

#[test]
fn test_f32_sweep() {
    let n = 16;
    let a: Vec<f32> = dominant_matrix(n).iter().map(|&v| v as f32).collect();
    let x_expected = vec![1.0f32; n];
    let rhs: Vec<f32> = (0..n)
        .map(|i| (0..n).map(|j| a[i * n + j]).sum())
        .collect();

    let mut m = TiledMatrix::from_dense(&a, n, 4).unwrap();
    let client = MeshClient::with_grid(4, 4, 2, Topology::Torus).unwrap();
    let sweep = client.factorize(&mut m).unwrap();
    let x = TriangularSolver::new(m, sweep.pivots)
        .unwrap()
        .solve(&rhs)
        .unwrap();
    common::assert_allclose_f32(&x, &x_expected, 1e-4, 1e-4, "f32 solution");
}
