use interp::error::Context;
use interp::{DataLayout, Error, Result, ScaleSpec, Tensor, WithDType, geometry};

/// A nearest-neighbor resize configuration, described the way an operator test sets it up:
/// static output attributes, an optional scale and optional runtime size overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpCase {
    pub name: &'static str,
    /// Input dims, in the order given by `layout`.
    pub input_shape: Vec<usize>,
    /// Static output attributes, one per spatial axis.
    pub out_dims: Vec<usize>,
    pub scale: ScaleSpec,
    /// Runtime output size.
    pub out_size: Option<Vec<usize>>,
    /// Runtime output shape, has precedence over `out_size`.
    pub actual_shape: Option<Vec<usize>>,
    pub align_corners: bool,
    pub layout: DataLayout,
}

/// Geometry of a case once all the overrides have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// One factor per spatial axis, `0.0` when the axis has no scale.
    pub scale: Vec<f64>,
    pub out_dims: Vec<usize>,
}

/// Arguments for [`interp::interpolate`] that describe the same resize as a case.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionalArgs {
    pub size: Option<Vec<usize>>,
    pub scale: ScaleSpec,
    pub align_corners: bool,
    pub data_format: &'static str,
}

impl InterpCase {
    /// A channel-first case with `align_corners` set and no scale or size override.
    pub fn new(name: &'static str, input_shape: &[usize], out_dims: &[usize]) -> Self {
        let layout = if input_shape.len() == 5 { DataLayout::Ncdhw } else { DataLayout::Nchw };
        Self {
            name,
            input_shape: input_shape.to_vec(),
            out_dims: out_dims.to_vec(),
            scale: ScaleSpec::None,
            out_size: None,
            actual_shape: None,
            align_corners: true,
            layout,
        }
    }

    pub fn with_scale(mut self, scale: ScaleSpec) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_out_size(mut self, out_size: &[usize]) -> Self {
        self.out_size = Some(out_size.to_vec());
        self
    }

    pub fn with_actual_shape(mut self, actual_shape: &[usize]) -> Self {
        self.actual_shape = Some(actual_shape.to_vec());
        self
    }

    pub fn with_align_corners(mut self, align_corners: bool) -> Self {
        self.align_corners = align_corners;
        self
    }

    pub fn with_layout(mut self, layout: DataLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Check that the layout fits the input rank and that the scale factors are usable.
    pub fn validate(&self) -> Result<()> {
        let rank = self.input_shape.len();
        if rank != self.layout.rank() {
            Err(Error::InvalidLayout { layout: self.layout.to_string(), rank }.bt())?
        }
        self.scale.validate()?;
        let spatial = self.layout.spatial_rank();
        for dims in [Some(&self.out_dims), self.out_size.as_ref(), self.actual_shape.as_ref()]
            .into_iter()
            .flatten()
        {
            if dims.len() != spatial {
                interp::bail!("{}: expected {spatial} output dims, got {dims:?}", self.name)
            }
        }
        Ok(())
    }

    /// Per-axis scale and output extents.
    ///
    /// The runtime shape wins over the runtime size, which wins over the static attributes.
    /// When a scale is set the static attributes are `floor(in * scale)`.
    pub fn resolve(&self) -> Result<Resolved> {
        self.validate()?;
        let scale = self.scale.resolve_dyn(self.layout.spatial_rank())?;
        let in_dims = self.layout.spatial_dims(&self.input_shape)?;
        let static_dims: Vec<usize> = if self.scale.is_none() {
            self.out_dims.clone()
        } else {
            in_dims.iter().zip(scale.iter()).map(|(&d, &s)| geometry::scaled_extent(d, s)).collect()
        };
        let explicit = self.actual_shape.as_deref().or(self.out_size.as_deref());
        let out_dims =
            geometry::resolve_output_extents(in_dims, Some(&static_dims[..]), explicit, &scale)?;
        Ok(Resolved { scale, out_dims })
    }

    /// Full output dims, in the order given by `layout`.
    pub fn output_shape(&self) -> Result<Vec<usize>> {
        let Resolved { out_dims, .. } = self.resolve()?;
        let n = self.input_shape[0];
        let c = if self.layout.is_channel_last() {
            self.input_shape[self.input_shape.len() - 1]
        } else {
            self.input_shape[1]
        };
        let mut shape = vec![n];
        if self.layout.is_channel_last() {
            shape.extend_from_slice(&out_dims);
            shape.push(c);
        } else {
            shape.push(c);
            shape.extend_from_slice(&out_dims);
        }
        Ok(shape)
    }

    /// The oracle output for `xs`.
    pub fn expected<T: WithDType>(&self, xs: &Tensor<T>) -> Result<Tensor<T>> {
        if xs.dims() != self.input_shape.as_slice() {
            interp::bail!("{}: expected input {:?}, got {:?}", self.name, self.input_shape, xs)
        }
        let Resolved { scale, out_dims } = self.resolve()?;
        interp::nearest_interp(xs, &out_dims, &scale, self.align_corners, self.layout)
            .with_context(|| format!("oracle failed for case {}", self.name))
    }

    /// How to request the same resize through the functional API, if it can express it.
    ///
    /// The functional API takes either a size or a scale. A scale combined with a size override
    /// only has an equivalent when `align_corners` is set, the scale being unused in that case.
    pub fn functional_args(&self) -> Result<Option<FunctionalArgs>> {
        let Resolved { scale, out_dims } = self.resolve()?;
        let in_dims = self.layout.spatial_dims(&self.input_shape)?;
        let scaled_dims: Vec<usize> = in_dims
            .iter()
            .zip(scale.iter())
            .map(|(&d, &s)| geometry::scaled_extent(d, s))
            .collect();
        let (size, scale) = if self.scale.is_none() {
            (Some(out_dims), ScaleSpec::None)
        } else if scaled_dims == out_dims {
            (None, self.scale.clone())
        } else if self.align_corners {
            (Some(out_dims), ScaleSpec::None)
        } else {
            return Ok(None);
        };
        Ok(Some(FunctionalArgs {
            size,
            scale,
            align_corners: self.align_corners,
            data_format: self.layout.as_str(),
        }))
    }
}

fn nhwc(name: &'static str, input_shape: &[usize], out_dims: &[usize]) -> InterpCase {
    InterpCase::new(name, input_shape, out_dims).with_layout(DataLayout::Nhwc)
}

/// The named resize cases.
pub fn all_cases() -> Vec<InterpCase> {
    vec![
        // 2d, static attributes with runtime size overrides.
        InterpCase::new("default", &[2, 3, 4, 5], &[2, 2]).with_out_size(&[3, 3]),
        InterpCase::new("case2", &[3, 3, 9, 6], &[12, 12]),
        InterpCase::new("case3", &[1, 1, 32, 64], &[64, 32]),
        InterpCase::new("case4", &[4, 1, 7, 8], &[1, 1]).with_out_size(&[2, 2]),
        InterpCase::new("case5", &[3, 3, 9, 6], &[12, 12]).with_out_size(&[11, 11]),
        InterpCase::new("case6", &[1, 1, 32, 64], &[64, 32]).with_out_size(&[65, 129]),
        InterpCase::new("same", &[2, 3, 32, 64], &[32, 64]),
        InterpCase::new("actual_shape", &[3, 2, 32, 16], &[64, 32]).with_actual_shape(&[66, 40]),
        nhwc("data_layout", &[2, 4, 4, 5], &[2, 2]).with_out_size(&[3, 8]),
        InterpCase::new("without_corners", &[2, 3, 4, 5], &[2, 2])
            .with_out_size(&[3, 3])
            .with_align_corners(false),
        // 2d with a scale.
        InterpCase::new("scale1", &[3, 2, 7, 5], &[64, 32])
            .with_scale(ScaleSpec::from_attr(2.))
            .with_out_size(&[66, 40]),
        InterpCase::new("scale2", &[3, 2, 5, 7], &[64, 32])
            .with_scale(ScaleSpec::from_attr(1.5))
            .with_out_size(&[66, 40]),
        InterpCase::new("scale3", &[3, 2, 7, 5], &[64, 32])
            .with_scale(ScaleSpec::PerAxis(vec![2., 3.]))
            .with_out_size(&[66, 40]),
        InterpCase::new("scale_without_corners", &[3, 2, 7, 5], &[64, 32])
            .with_scale(ScaleSpec::from_attr(2.))
            .with_align_corners(false),
        // Sizes and scales provided as tensors.
        InterpCase::new("attr_tensor", &[2, 5, 4, 4], &[3, 3]).with_out_size(&[3, 3]),
        InterpCase::new("attr_tensor_case1", &[3, 3, 9, 6], &[12, 12]).with_out_size(&[8, 12]),
        InterpCase::new("attr_tensor_case2", &[3, 2, 32, 16], &[64, 32])
            .with_out_size(&[66, 40]),
        InterpCase::new("attr_tensor_case3", &[3, 2, 32, 16], &[64, 32])
            .with_scale(ScaleSpec::from_attr(2.)),
        // Functional API usage.
        InterpCase::new("api", &[2, 3, 6, 6], &[12, 12]).with_align_corners(false),
        nhwc("api_nhwc", &[2, 6, 6, 3], &[12, 12]).with_align_corners(false),
        InterpCase::new("api_actual_shape", &[2, 3, 6, 6], &[4, 4])
            .with_actual_shape(&[12, 12])
            .with_align_corners(false),
        InterpCase::new("api_scale", &[2, 3, 6, 6], &[0, 0])
            .with_scale(ScaleSpec::Uniform(2.))
            .with_align_corners(false),
        // 3d.
        InterpCase::new("volume_case1", &[4, 1, 1, 7, 8], &[1, 1, 1]),
        InterpCase::new("volume_without_corners", &[2, 3, 4, 6, 5], &[2, 8, 10])
            .with_align_corners(false),
        InterpCase::new("volume_ndhwc", &[2, 4, 6, 5, 3], &[2, 8, 10])
            .with_align_corners(false)
            .with_layout(DataLayout::Ndhwc),
        InterpCase::new("volume_scale", &[2, 3, 4, 6, 5], &[0, 0, 0])
            .with_scale(ScaleSpec::Uniform(2.))
            .with_align_corners(false),
    ]
}

/// Look up a case by name.
pub fn find_case(name: &str) -> Result<InterpCase> {
    all_cases().into_iter().find(|c| c.name == name).with_context(|| format!("no case {name:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let cases = all_cases();
        let mut names: Vec<_> = cases.iter().map(|c| c.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), cases.len());
    }

    #[test]
    fn test_resolve_overrides() -> Result<()> {
        let r = find_case("scale1")?.resolve()?;
        assert_eq!(r.out_dims, [66, 40]);
        assert_eq!(r.scale, [2., 2.]);
        let r = find_case("scale_without_corners")?.resolve()?;
        assert_eq!(r.out_dims, [14, 10]);
        let r = find_case("api_actual_shape")?.resolve()?;
        assert_eq!(r.out_dims, [12, 12]);
        let r = find_case("scale3")?.with_scale(ScaleSpec::PerAxis(vec![2., 3.])).resolve()?;
        assert_eq!(r.scale, [2., 3.]);
        assert_eq!(find_case("scale2")?.scale, ScaleSpec::Uniform(1.5));
        assert_eq!(find_case("case2")?.scale, ScaleSpec::from_attr(0.));
        Ok(())
    }
}
