use crate::Result;

/// Output spatial extents of a resize, picked in priority order:
/// - `explicit_size`, a size provided at runtime (size tensor or actual shape),
/// - `static_dims`, the static output attributes,
/// - `floor(in * scale)` on each axis, when all the axes have a positive scale.
///
/// All the slices are spatial extents, outermost axis first.
pub fn resolve_output_extents(
    in_dims: &[usize],
    static_dims: Option<&[usize]>,
    explicit_size: Option<&[usize]>,
    scale: &[f64],
) -> Result<Vec<usize>> {
    let n = in_dims.len();
    let check_len = |dims: &[usize], what: &str| -> Result<()> {
        if dims.len() != n {
            crate::bail!("{what} has {} entries but the input has {n} spatial dims", dims.len())
        }
        Ok(())
    };
    if let Some(dims) = explicit_size {
        check_len(dims, "explicit output size")?;
        tracing::debug!(?dims, "output extents from explicit size");
        return Ok(dims.to_vec());
    }
    if let Some(dims) = static_dims {
        check_len(dims, "static output size")?;
        return Ok(dims.to_vec());
    }
    if scale.len() != n {
        crate::bail!("scale has {} entries but the input has {n} spatial dims", scale.len())
    }
    if scale.iter().all(|&s| s > 0.) {
        let dims = in_dims.iter().zip(scale.iter()).map(|(&d, &s)| scaled_extent(d, s)).collect();
        return Ok(dims);
    }
    crate::bail!("one of the output size or a positive scale has to be provided")
}

/// `floor(extent * scale)`, computed in `f64`.
pub fn scaled_extent(extent: usize, scale: f64) -> usize {
    (extent as f64 * scale) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority() -> Result<()> {
        let in_dims = [7, 5];
        let scale = [2.0, 2.0];
        let static_dims: &[usize] = &[64, 32];
        let size: &[usize] = &[66, 40];
        let dims = resolve_output_extents(&in_dims, Some(static_dims), Some(size), &scale)?;
        assert_eq!(dims, [66, 40]);
        let dims = resolve_output_extents(&in_dims, Some(static_dims), None, &scale)?;
        assert_eq!(dims, [64, 32]);
        let dims = resolve_output_extents(&in_dims, None, None, &scale)?;
        assert_eq!(dims, [14, 10]);
        let dims = resolve_output_extents(&[5, 7], None, None, &[1.5, 1.5])?;
        assert_eq!(dims, [7, 10]);
        Ok(())
    }

    #[test]
    fn test_unresolvable() {
        assert!(resolve_output_extents(&[4, 4], None, None, &[0., 0.]).is_err());
        assert!(resolve_output_extents(&[4, 4], None, None, &[2., 0.]).is_err());
        assert!(resolve_output_extents(&[4, 4], Some(&[1, 2, 3][..]), None, &[0., 0.]).is_err());
        let size: &[usize] = &[1, 2];
        assert!(resolve_output_extents(&[4, 4, 4], None, Some(size), &[0.; 3]).is_err());
    }
}
