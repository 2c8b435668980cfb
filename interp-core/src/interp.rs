//! Reference nearest-neighbor resize.
//!
//! Each output element is a copy of a single input element, the source coordinate being
//! computed independently on every spatial axis:
//! - `align_corners`: `src = floor(ratio * i + 0.5)` with `ratio = (in - 1) / (out - 1)`,
//! - otherwise: `src = floor(ratio * i)` with `ratio = 1 / scale` when a positive scale is
//!   provided for the axis and `ratio = in / out` otherwise.
//!
//! The ratio is zero on axes with an output extent of at most one. Source coordinates are not
//! clamped, an out of range coordinate results in [`Error::SourceIndexOutOfRange`].
use crate::{DataLayout, Error, Result, Tensor, WithDType};
use rayon::prelude::*;

/// Interpolation methods. Only nearest-neighbor has a reference implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpMode {
    Nearest,
}

impl std::str::FromStr for InterpMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nearest" => Ok(Self::Nearest),
            _ => Err(Error::UnsupportedMode { mode: s.to_string() }.bt()),
        }
    }
}

/// Ratio between input and output coordinates on a single axis.
pub fn axis_ratio(in_size: usize, out_size: usize, scale: f64, align_corners: bool) -> f64 {
    if out_size <= 1 {
        0.
    } else if align_corners {
        (in_size as f64 - 1.) / (out_size as f64 - 1.)
    } else if scale > 0. {
        1. / scale
    } else {
        in_size as f64 / out_size as f64
    }
}

/// Source coordinate for the output coordinate `i`, before any bound check.
pub fn source_index(ratio: f64, i: usize, align_corners: bool) -> usize {
    let pos = ratio * i as f64;
    if align_corners { (pos + 0.5) as usize } else { pos as usize }
}

fn source_indices(
    axis: usize,
    in_size: usize,
    out_size: usize,
    scale: f64,
    align_corners: bool,
) -> Result<Vec<usize>> {
    let ratio = axis_ratio(in_size, out_size, scale, align_corners);
    tracing::debug!(axis, in_size, out_size, ratio, "nearest ratio");
    (0..out_size)
        .map(|i| {
            let index = source_index(ratio, i, align_corners);
            if index >= in_size {
                Err(Error::SourceIndexOutOfRange { axis, index, extent: in_size }.bt())
            } else {
                Ok(index)
            }
        })
        .collect()
}

/// Offsets in an input plane for every position of an output plane, in row-major order.
fn plane_offsets(indices: &[Vec<usize>], in_dims: &[usize]) -> Vec<usize> {
    let mut offsets = vec![0usize];
    for (axis_indices, &in_size) in indices.iter().zip(in_dims.iter()) {
        offsets = offsets
            .iter()
            .flat_map(|&o| axis_indices.iter().map(move |&s| o * in_size + s))
            .collect();
    }
    offsets
}

/// Resize of a channel-first tensor `(N, C, spatial...)`.
fn nearest_channel_first<T: WithDType>(
    xs: &Tensor<T>,
    out_dims: &[usize],
    scale: &[f64],
    align_corners: bool,
) -> Result<Tensor<T>> {
    let dims = xs.dims();
    let (n, c) = (dims[0], dims[1]);
    let in_dims = &dims[2..];
    let indices = in_dims
        .iter()
        .zip(out_dims.iter())
        .zip(scale.iter())
        .enumerate()
        .map(|(axis, ((&in_size, &out_size), &scale))| {
            source_indices(axis, in_size, out_size, scale, align_corners)
        })
        .collect::<Result<Vec<_>>>()?;
    let offsets = plane_offsets(&indices, in_dims);

    let in_plane: usize = in_dims.iter().product();
    let out_plane: usize = out_dims.iter().product();
    let mut dst = vec![T::zero(); n * c * out_plane];
    // Empty planes on either side leave nothing to gather.
    if in_plane > 0 && out_plane > 0 {
        dst.par_chunks_mut(out_plane).zip(xs.data().par_chunks(in_plane)).for_each(
            |(dst, src)| {
                for (d, &o) in dst.iter_mut().zip(offsets.iter()) {
                    *d = src[o]
                }
            },
        );
    }
    let mut out_shape = vec![n, c];
    out_shape.extend_from_slice(out_dims);
    Tensor::from_vec(dst, out_shape)
}

/// Nearest-neighbor resize over an arbitrary number of spatial axes, `out_dims` and `scale`
/// having one entry per spatial axis.
#[tracing::instrument(skip_all)]
pub fn nearest_interp<T: WithDType>(
    xs: &Tensor<T>,
    out_dims: &[usize],
    scale: &[f64],
    align_corners: bool,
    layout: DataLayout,
) -> Result<Tensor<T>> {
    let spatial = layout.spatial_rank();
    if xs.rank() != layout.rank() {
        Err(Error::UnexpectedNumberOfDims { expected: layout.rank(), shape: xs.shape().clone() }
            .bt())?
    }
    if out_dims.len() != spatial || scale.len() != spatial {
        crate::bail!(
            "nearest_interp: {layout} expects {spatial} output dims and scales, \
             got {out_dims:?} and {scale:?}"
        )
    }
    let xs = layout.to_channel_first(xs)?;
    let ys = nearest_channel_first(&xs, out_dims, scale, align_corners)?;
    layout.from_channel_first(&ys)
}

/// Nearest-neighbor resize of a `NCHW` or `NHWC` tensor to `(out_h, out_w)`.
pub fn nearest_interp2d<T: WithDType>(
    xs: &Tensor<T>,
    out_dims: [usize; 2],
    scale: [f64; 2],
    align_corners: bool,
    layout: DataLayout,
) -> Result<Tensor<T>> {
    nearest_interp(xs, &out_dims, &scale, align_corners, layout)
}

/// Nearest-neighbor resize of a `NCDHW` or `NDHWC` tensor to `(out_d, out_h, out_w)`.
pub fn nearest_interp3d<T: WithDType>(
    xs: &Tensor<T>,
    out_dims: [usize; 3],
    scale: [f64; 3],
    align_corners: bool,
    layout: DataLayout,
) -> Result<Tensor<T>> {
    nearest_interp(xs, &out_dims, &scale, align_corners, layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios() {
        assert_eq!(axis_ratio(9, 12, 0., true), 8. / 11.);
        assert_eq!(axis_ratio(6, 12, 0., true), 5. / 11.);
        assert_eq!(axis_ratio(7, 64, 2., false), 0.5);
        // align_corners ignores the scale.
        assert_eq!(axis_ratio(7, 64, 2., true), 6. / 63.);
        assert_eq!(axis_ratio(4, 3, 0., false), 4. / 3.);
        assert_eq!(axis_ratio(7, 1, 2., false), 0.);
        assert_eq!(axis_ratio(7, 0, 0., true), 0.);
    }

    #[test]
    fn test_indices() {
        assert_eq!(source_index(0.5, 3, false), 1);
        assert_eq!(source_index(0.5, 3, true), 2);
        assert_eq!(source_index(0., 10, true), 0);
        let idxs: Vec<usize> = (0..3).map(|i| source_index(4. / 3., i, false)).collect();
        assert_eq!(idxs, [0, 1, 2]);
    }

    #[test]
    fn test_offsets() {
        let offsets = plane_offsets(&[vec![0, 2], vec![1, 1, 0]], &[3, 2]);
        assert_eq!(offsets, [1, 1, 0, 5, 5, 4]);
        assert_eq!(plane_offsets(&[], &[]), [0]);
    }

    #[test]
    fn test_out_of_range() {
        // A ratio of 0.5 on 7 rows only covers 14 output rows.
        let err = source_indices(0, 7, 16, 2., false).unwrap_err();
        assert!(
            matches!(err.root(), Error::SourceIndexOutOfRange { axis: 0, index: 7, extent: 7 }),
            "{err}"
        );
    }

    #[test]
    fn test_mode() {
        assert_eq!("nearest".parse::<InterpMode>().unwrap(), InterpMode::Nearest);
        for mode in ["bilinear", "BILINEAR", "trilinear", "NEAREST", ""] {
            let err = mode.parse::<InterpMode>().unwrap_err();
            assert!(matches!(err.root(), Error::UnsupportedMode { .. }), "{err}");
        }
    }
}
