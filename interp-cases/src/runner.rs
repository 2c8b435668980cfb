use crate::case::InterpCase;
use interp::error::Context;
use interp::{Result, Tensor, check_allclose, interpolate, max_abs_diff};
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub seed: u64,
    pub rtol: f64,
    pub atol: f64,
    /// Only run the cases whose name contains this string.
    pub filter: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { seed: 299792458, rtol: 0., atol: 0., filter: None }
    }
}

impl RunConfig {
    pub fn selects(&self, case: &InterpCase) -> bool {
        self.filter.as_deref().is_none_or(|f| case.name.contains(f))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    pub name: &'static str,
    pub input_shape: Vec<usize>,
    pub output_shape: Vec<usize>,
    /// Whether the case also went through [`interp::interpolate`] and matched the oracle.
    /// Both paths share the same gather, so this checks how the arguments resolve to a
    /// scale and output extents, not the source index formula itself.
    pub cross_checked: bool,
    pub max_abs_diff: f64,
}

/// Uniform values in `[0, 1)` from a seeded generator.
pub fn random_input(dims: &[usize], seed: u64) -> Result<Tensor<f32>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let n: usize = dims.iter().product();
    let data: Vec<f32> = (0..n).map(|_| rng.random::<f32>()).collect();
    Tensor::from_vec(data, dims)
}

/// Each case gets its own seed so that filtering does not change the generated inputs.
fn case_seed(seed: u64, name: &str) -> u64 {
    name.bytes().fold(seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

/// The input of a case and the corresponding oracle output.
pub fn case_tensors(case: &InterpCase, config: &RunConfig) -> Result<(Tensor<f32>, Tensor<f32>)> {
    let xs = random_input(&case.input_shape, case_seed(config.seed, case.name))?;
    let ys = case.expected(&xs)?;
    Ok((xs, ys))
}

/// Compute the oracle output of a case and check it against the functional API.
///
/// The index formula is pinned by the hand-computed expectations of the oracle tests. Here
/// the functional API is only a second route to the same resize.
#[tracing::instrument(skip_all, fields(case = case.name))]
pub fn run_case(case: &InterpCase, config: &RunConfig) -> Result<CaseReport> {
    let (xs, expected) = case_tensors(case, config)?;
    let output_shape = case.output_shape()?;
    if expected.dims() != output_shape.as_slice() {
        interp::bail!("{}: oracle output {expected:?}, expected dims {output_shape:?}", case.name)
    }
    let (cross_checked, diff) = match case.functional_args()? {
        None => {
            tracing::info!("no functional equivalent, oracle only");
            (false, 0.)
        }
        Some(args) => {
            let ys = interpolate(
                &xs,
                args.size.as_deref(),
                &args.scale,
                "nearest",
                args.align_corners,
                args.data_format,
            )?;
            let diff = max_abs_diff(&ys, &expected)?;
            check_allclose(&ys, &expected, config.rtol, config.atol)
                .with_context(|| format!("functional output differs for case {}", case.name))?;
            (true, diff)
        }
    };
    tracing::debug!(?output_shape, cross_checked, diff, "case done");
    Ok(CaseReport {
        name: case.name,
        input_shape: case.input_shape.clone(),
        output_shape,
        cross_checked,
        max_abs_diff: diff,
    })
}

/// Run all the cases selected by the config, stopping on the first failure.
pub fn run_cases(cases: &[InterpCase], config: &RunConfig) -> Result<Vec<CaseReport>> {
    cases.iter().filter(|c| config.selects(c)).map(|c| run_case(c, config)).collect()
}

/// Check the output of an external engine for the input `xs` against the oracle.
pub fn compare_outputs<T: interp::WithDType>(
    case: &InterpCase,
    xs: &Tensor<T>,
    outputs: &Tensor<T>,
    config: &RunConfig,
) -> Result<f64> {
    let expected = case.expected(xs)?;
    let diff = max_abs_diff(outputs, &expected)?;
    check_allclose(outputs, &expected, config.rtol, config.atol)
        .with_context(|| format!("engine output differs for case {}", case.name))?;
    Ok(diff)
}
