use interp::{DataLayout, Error, Result, ScaleSpec, Tensor};
use interp_cases::{
    InterpCase, RunConfig, all_cases, case_tensors, compare_outputs, find_case, random_input,
    run_case, run_cases,
};

#[test]
fn test_all_cases_pass() -> Result<()> {
    let config = RunConfig::default();
    let reports = run_cases(&all_cases(), &config)?;
    assert_eq!(reports.len(), all_cases().len());
    for report in reports.iter() {
        assert!(report.cross_checked, "{}", report.name);
        assert_eq!(report.max_abs_diff, 0., "{}", report.name);
    }
    Ok(())
}

#[test]
fn test_filter() -> Result<()> {
    let config = RunConfig { filter: Some("volume".to_string()), ..Default::default() };
    let reports = run_cases(&all_cases(), &config)?;
    let names: Vec<_> = reports.iter().map(|r| r.name).collect();
    assert_eq!(
        names,
        ["volume_case1", "volume_without_corners", "volume_ndhwc", "volume_scale"]
    );
    Ok(())
}

#[test]
fn test_output_shapes() -> Result<()> {
    let shape = |name: &str| -> Result<Vec<usize>> { find_case(name)?.output_shape() };
    assert_eq!(shape("default")?, [2, 3, 3, 3]);
    assert_eq!(shape("case4")?, [4, 1, 2, 2]);
    assert_eq!(shape("actual_shape")?, [3, 2, 66, 40]);
    assert_eq!(shape("data_layout")?, [2, 3, 8, 5]);
    assert_eq!(shape("scale3")?, [3, 2, 66, 40]);
    assert_eq!(shape("attr_tensor_case1")?, [3, 3, 8, 12]);
    assert_eq!(shape("attr_tensor_case3")?, [3, 2, 64, 32]);
    assert_eq!(shape("api_nhwc")?, [2, 12, 12, 3]);
    assert_eq!(shape("volume_ndhwc")?, [2, 2, 8, 10, 3]);
    assert_eq!(shape("volume_scale")?, [2, 3, 8, 12, 10]);
    Ok(())
}

#[test]
fn test_end_to_end_case2() -> Result<()> {
    let case = find_case("case2")?;
    let (xs, ys) = case_tensors(&case, &RunConfig::default())?;
    assert_eq!(ys.dims(), &[3, 3, 12, 12]);
    for n in 0..3 {
        for c in 0..3 {
            assert_eq!(ys.get(&[n, c, 0, 0])?, xs.get(&[n, c, 0, 0])?);
            assert_eq!(ys.get(&[n, c, 11, 11])?, xs.get(&[n, c, 8, 5])?);
            // Row 5 reads floor(40 / 11 + 0.5) = 4, column 7 reads floor(35 / 11 + 0.5) = 3.
            assert_eq!(ys.get(&[n, c, 5, 7])?, xs.get(&[n, c, 4, 3])?);
        }
    }
    Ok(())
}

#[test]
fn test_api_variants_agree() -> Result<()> {
    let xs = random_input(&[2, 3, 6, 6], 42)?;
    let expected = find_case("api")?.expected(&xs)?;
    for name in ["api_actual_shape", "api_scale"] {
        let ys = find_case(name)?.expected(&xs)?;
        assert!(ys.bitwise_eq(&expected), "{name}");
    }
    let ys = find_case("api_nhwc")?.expected(&xs.permute(&[0, 2, 3, 1])?)?;
    assert!(ys.bitwise_eq(&expected.permute(&[0, 2, 3, 1])?));
    Ok(())
}

#[test]
fn test_depth_one_matches_2d() -> Result<()> {
    let xs = random_input(&[2, 3, 1, 6, 5], 7)?;
    let case3d = InterpCase::new("depth_one", &[2, 3, 1, 6, 5], &[1, 9, 4]);
    let case2d = InterpCase::new("plane", &[2, 3, 6, 5], &[9, 4]);
    let ys3d = case3d.expected(&xs)?;
    let ys2d = case2d.expected(&xs.reshape((2, 3, 6, 5))?)?;
    assert!(ys3d.reshape((2, 3, 9, 4))?.bitwise_eq(&ys2d));
    Ok(())
}

#[test]
fn test_deterministic_inputs() -> Result<()> {
    let config = RunConfig::default();
    let case = find_case("scale2")?;
    let (x1, y1) = case_tensors(&case, &config)?;
    let (x2, y2) = case_tensors(&case, &config)?;
    assert!(x1.bitwise_eq(&x2));
    assert!(y1.bitwise_eq(&y2));
    let (x3, _) = case_tensors(&case, &RunConfig { seed: 1, ..config })?;
    assert!(!x1.bitwise_eq(&x3));
    Ok(())
}

#[test]
fn test_compare_engine_outputs() -> Result<()> {
    let config = RunConfig::default();
    let case = find_case("without_corners")?;
    let (xs, ys) = case_tensors(&case, &config)?;
    assert_eq!(compare_outputs(&case, &xs, &ys, &config)?, 0.);

    let mut data = ys.to_vec()?;
    data[5] += 0.25;
    let corrupted = Tensor::from_vec(data, ys.dims())?;
    let err = compare_outputs(&case, &xs, &corrupted, &config).unwrap_err();
    assert!(matches!(err.root(), Error::NotClose { index: 5, .. }), "{err}");
    let loose = RunConfig { atol: 0.5, ..config };
    assert!((compare_outputs(&case, &xs, &corrupted, &loose)? - 0.25).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_invalid_cases() -> Result<()> {
    let case = InterpCase::new("bad_layout", &[1, 2, 4, 4], &[8, 8]).with_layout(DataLayout::Ndhwc);
    let err = case.validate().unwrap_err();
    assert!(matches!(err.root(), Error::InvalidLayout { rank: 4, .. }), "{err}");

    let case =
        InterpCase::new("bad_scale", &[1, 2, 4, 4], &[8, 8]).with_scale(ScaleSpec::Uniform(-0.3));
    let err = run_case(&case, &RunConfig::default()).unwrap_err();
    assert!(matches!(err.root(), Error::NonPositiveScale { .. }), "{err}");

    let case = InterpCase::new("bad_size", &[1, 2, 4, 4], &[8, 8]).with_out_size(&[8, 8, 8]);
    assert!(case.resolve().is_err());

    // Without corners a 2x scale on 7 rows only reaches 14 output rows.
    let case = InterpCase::new("out_of_range", &[3, 2, 7, 5], &[64, 32])
        .with_scale(ScaleSpec::Uniform(2.))
        .with_out_size(&[64, 32])
        .with_align_corners(false);
    let err = run_case(&case, &RunConfig::default()).unwrap_err();
    assert!(
        matches!(err.root(), Error::SourceIndexOutOfRange { axis: 0, index: 7, extent: 7 }),
        "{err}"
    );
    Ok(())
}
