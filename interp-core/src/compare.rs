use crate::{Error, Result, Tensor, WithDType, error::check_same_shape};

/// Largest absolute element-wise difference, computed in `f64`.
pub fn max_abs_diff<T: WithDType, U: WithDType>(lhs: &Tensor<T>, rhs: &Tensor<U>) -> Result<f64> {
    check_same_shape(lhs.shape(), rhs.shape(), "max_abs_diff")?;
    let diff = lhs
        .data()
        .iter()
        .zip(rhs.data().iter())
        .map(|(l, r)| (l.as_f64() - r.as_f64()).abs())
        .fold(0f64, f64::max);
    Ok(diff)
}

/// Element-wise check of `|actual - expected| <= atol + rtol * |expected|`.
///
/// Elements that are NaN on both sides compare as equal. The first offending element is
/// reported with its flat index.
pub fn check_allclose<T: WithDType, U: WithDType>(
    actual: &Tensor<T>,
    expected: &Tensor<U>,
    rtol: f64,
    atol: f64,
) -> Result<()> {
    check_same_shape(actual.shape(), expected.shape(), "allclose")?;
    for (index, (a, e)) in actual.data().iter().zip(expected.data().iter()).enumerate() {
        let (a, e) = (a.as_f64(), e.as_f64());
        if a.is_nan() && e.is_nan() {
            continue;
        }
        // Written so that a NaN on a single side fails the check.
        let close = a == e || (a - e).abs() <= atol + rtol * e.abs();
        if !close {
            Err(Error::NotClose { index, actual: a, expected: e, op: "allclose" }.bt())?
        }
    }
    Ok(())
}
