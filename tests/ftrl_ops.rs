use ftrl::{FtrlErr, FtrlOp, FtrlParams, FtrlSpec, SparseFtrlOp, optimization::ftrl_step};

const EPS: f64 = 1e-9;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn unit_params() -> FtrlParams<f64> {
    FtrlParams::new(1., 0., 0., 0.)
}

fn assert_close(got: &[f64], expected: &[f64]) {
    assert_eq!(got.len(), expected.len());
    for (i, (g, e)) in got.iter().zip(expected).enumerate() {
        assert!((g - e).abs() < EPS, "mismatch at {i}: got {g}, expected {e}");
    }
}

#[test]
fn dense_first_and_second_step() -> anyhow::Result<()> {
    init_logger();

    let op = FtrlOp::new(unit_params());
    let mut weights = [0.];
    let mut nz = [0., 0.];

    op.run(&mut weights, &mut nz, &[1.])?;
    assert_eq!(weights, [-1.]);
    assert_eq!(nz, [1., 1.]);

    op.run(&mut weights, &mut nz, &[1.])?;
    let sqrt2 = 2_f64.sqrt();
    assert_close(&weights, &[-(1. + sqrt2) / sqrt2]);
    assert_close(&nz, &[2., 1. + sqrt2]);
    Ok(())
}

#[test]
fn sparse_repeated_index_equals_two_sequential_steps() -> anyhow::Result<()> {
    init_logger();

    let params = unit_params();
    let op = SparseFtrlOp::new(params);
    let mut weights = [0.; 3];
    let mut nz = [0.; 6];

    op.run(&mut weights, &mut nz, 3, &[1_i32, 1], &[1., 1.])?;

    let (w, n, z) = ftrl_step(0., 0., 0., 1., &params);
    let (w, n, z) = ftrl_step(w, n, z, 1., &params);
    assert_eq!([weights[1], nz[2], nz[3]], [w, n, z]);
    assert!((weights[1] + 1.7071).abs() < 1e-4);
    assert!((nz[3] - 2.4142).abs() < 1e-4);
    assert_eq!([weights[0], weights[2]], [0., 0.]);
    Ok(())
}

#[test]
fn sparse_permutation_matches_dense() -> anyhow::Result<()> {
    init_logger();

    const ROWS: usize = 8;
    let params = FtrlParams::new(0.3, 1., 0.05, 0.2);
    let initial_weights: Vec<f64> = (0..ROWS).map(|i| i as f64 * 0.1 - 0.35).collect();
    let initial_nz: Vec<f64> = (0..ROWS * 2).map(|i| (i % 3) as f64 * 0.5).collect();
    let grad: Vec<f64> = (0..ROWS).map(|i| (i as f64 - 4.) * 0.3).collect();

    let mut dense_weights = initial_weights.clone();
    let mut dense_nz = initial_nz.clone();
    FtrlOp::new(params).run(&mut dense_weights, &mut dense_nz, &grad)?;

    let indices: [i64; ROWS] = [3, 7, 0, 5, 1, 6, 2, 4];
    let sparse_grad: Vec<f64> = indices.iter().map(|&i| grad[i as usize]).collect();

    for parallel in [false, true] {
        let mut sparse_weights = initial_weights.clone();
        let mut sparse_nz = initial_nz.clone();

        SparseFtrlOp::new(params).parallel(parallel).run(
            &mut sparse_weights,
            &mut sparse_nz,
            ROWS,
            &indices,
            &sparse_grad,
        )?;

        assert_eq!(sparse_weights, dense_weights, "parallel = {parallel}");
        assert_eq!(sparse_nz, dense_nz, "parallel = {parallel}");
    }

    Ok(())
}

#[test]
fn blocked_sparse_matches_dense_over_selected_rows() -> anyhow::Result<()> {
    init_logger();

    const BLOCK: usize = 4;
    let params = FtrlParams::new(0.1_f32, 1., 0.001, 0.01);
    let mut weights = vec![0.25_f32; 5 * BLOCK];
    let mut nz = vec![0.5_f32; 10 * BLOCK];
    let grad: Vec<f32> = (0..2 * BLOCK).map(|i| i as f32 - 3.5).collect();

    let mut row4 = vec![0.25_f32; BLOCK];
    let mut row4_nz = vec![0.5_f32; 2 * BLOCK];
    FtrlOp::new(params).run(&mut row4, &mut row4_nz, &grad[..BLOCK])?;

    let mut row1 = vec![0.25_f32; BLOCK];
    let mut row1_nz = vec![0.5_f32; 2 * BLOCK];
    FtrlOp::new(params).run(&mut row1, &mut row1_nz, &grad[BLOCK..])?;

    SparseFtrlOp::new(params).run(&mut weights, &mut nz, 5, &[4_u32, 1], &grad)?;

    assert_eq!(weights[4 * BLOCK..], row4[..]);
    assert_eq!(nz[8 * BLOCK..], row4_nz[..]);
    assert_eq!(weights[BLOCK..2 * BLOCK], row1[..]);
    assert_eq!(nz[2 * BLOCK..4 * BLOCK], row1_nz[..]);

    for untouched in [0, 2, 3] {
        let rows = &weights[untouched * BLOCK..(untouched + 1) * BLOCK];
        assert!(rows.iter().all(|&w| w == 0.25), "row {untouched} changed");
    }

    Ok(())
}

#[test]
fn sparse_rejects_negative_index_before_writing() {
    init_logger();

    let op = SparseFtrlOp::new(unit_params());
    let mut weights = [0.5; 4];
    let mut nz = [0.25; 8];

    let res = op.run(&mut weights, &mut nz, 4, &[0_i64, 2, -3], &[1., 1., 1.]);
    assert!(matches!(
        res,
        Err(FtrlErr::IndexOutOfBounds {
            position: 2,
            index: -3,
            rows: 4
        })
    ));
    assert_eq!(weights, [0.5; 4]);
    assert_eq!(nz, [0.25; 8]);

    let err = res.unwrap_err();
    assert_eq!(
        err.to_string(),
        "index out of bounds at position 2: -3, range 0 to 4"
    );
}

#[test]
fn out_of_place_dense_matches_in_place() -> anyhow::Result<()> {
    init_logger();

    let params = FtrlSpec::from_json(r#"{ "alpha": 0.2, "beta": 1.0, "lambda1": 0.1 }"#)?
        .build::<f64>()?;
    let op = FtrlOp::new(params);

    let weights = [0.3, -0.1, 0.0, 2.0];
    let nz = [0.1, 0.2, 0.0, 0.0, 1.0, -1.0, 4.0, 0.5];
    let grad = [0.05, -0.7, 0.0, 1.5];

    let mut out_weights = [0.; 4];
    let mut out_nz = [0.; 8];
    op.run_into(&weights, &nz, &grad, &mut out_weights, &mut out_nz)?;

    let mut in_place_weights = weights;
    let mut in_place_nz = nz;
    op.parallel(true).run(&mut in_place_weights, &mut in_place_nz, &grad)?;

    assert_eq!(out_weights, in_place_weights);
    assert_eq!(out_nz, in_place_nz);
    Ok(())
}

#[test]
fn strong_l1_keeps_weights_at_zero() -> anyhow::Result<()> {
    init_logger();

    let op = FtrlOp::new(FtrlParams::new(0.5_f32, 1., 10., 0.));
    let mut weights = [0.; 5];
    let mut nz = [0.; 10];

    for _ in 0..3 {
        op.run(&mut weights, &mut nz, &[0.5, -1., 2., -0.25, 1.])?;
    }

    assert_eq!(weights, [0.; 5]);
    Ok(())
}
