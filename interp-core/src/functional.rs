use crate::{
    DataLayout, Error, InterpMode, Result, ScaleSpec, Tensor, WithDType, geometry, interp,
};

/// Resize a 4d or 5d tensor, either to an explicit `size` or by a `scale` factor.
///
/// Arguments are checked the way the framework API does it: the input rank first, then the
/// mode, the data format and the scale. Exactly one of `size` and `scale` has to be set.
#[tracing::instrument(skip_all, fields(mode = %mode, data_format = %data_format))]
pub fn interpolate<T: WithDType>(
    xs: &Tensor<T>,
    size: Option<&[usize]>,
    scale: &ScaleSpec,
    mode: &str,
    align_corners: bool,
    data_format: &str,
) -> Result<Tensor<T>> {
    let rank = xs.rank();
    if rank != 4 && rank != 5 {
        Err(Error::UnexpectedInputRank { shape: xs.shape().clone() }.bt())?
    }
    let InterpMode::Nearest = mode.parse::<InterpMode>()?;
    let layout = DataLayout::for_rank(data_format, rank)?;
    scale.validate()?;
    match (size.is_some(), scale.is_none()) {
        (true, false) => crate::bail!("only one of size or scale should be set"),
        (false, true) => crate::bail!("one of size or scale should be set"),
        _ => {}
    }
    match layout.spatial_rank() {
        2 => interpolate_nd::<T, 2>(xs, size, scale, align_corners, layout),
        _ => interpolate_nd::<T, 3>(xs, size, scale, align_corners, layout),
    }
}

fn interpolate_nd<T: WithDType, const N: usize>(
    xs: &Tensor<T>,
    size: Option<&[usize]>,
    scale: &ScaleSpec,
    align_corners: bool,
    layout: DataLayout,
) -> Result<Tensor<T>> {
    // With an explicit size no axis carries a scale factor.
    let scale: [f64; N] = if size.is_some() { [0.; N] } else { scale.resolve::<N>()? };
    let in_dims = layout.spatial_dims(xs.dims())?;
    let out_dims = geometry::resolve_output_extents(in_dims, None, size, &scale)?;
    tracing::debug!(?in_dims, ?out_dims, ?scale, "interpolate");
    interp::nearest_interp(xs, &out_dims, &scale, align_corners, layout)
}
