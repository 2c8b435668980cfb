use crate::{Error, Result};

/// Scale factors as they can be specified by a caller: absent, one factor shared by all
/// spatial axes, or one factor per spatial axis (outermost first, e.g. `[h, w]`).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScaleSpec {
    #[default]
    None,
    Uniform(f64),
    PerAxis(Vec<f64>),
}

impl std::str::FromStr for ScaleSpec {
    type Err = Error;

    /// Parse `"2"`, `"1.5"` or a comma separated list such as `"2.0,3.0"`. An empty string
    /// means no scale.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::None);
        }
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::ScaleType { got: s.to_string() }.bt())?;
        match values.as_slice() {
            [v] => Ok(Self::Uniform(*v)),
            _ => Ok(Self::PerAxis(values)),
        }
    }
}

impl ScaleSpec {
    /// Attribute style scale where a non-positive value stands for "no scale".
    pub fn from_attr(scale: f64) -> Self {
        if scale > 0. { Self::Uniform(scale) } else { Self::None }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn values(&self) -> &[f64] {
        match self {
            Self::None => &[],
            Self::Uniform(v) => std::slice::from_ref(v),
            Self::PerAxis(vs) => vs.as_slice(),
        }
    }

    /// Check that all the factors are strictly positive and finite.
    pub fn validate(&self) -> Result<()> {
        if let Self::PerAxis(vs) = self
            && vs.is_empty()
        {
            Err(Error::ScaleType { got: "[]".to_string() }.bt())?
        }
        for &value in self.values() {
            if !(value.is_finite() && value > 0.) {
                Err(Error::NonPositiveScale { value }.bt())?
            }
        }
        Ok(())
    }

    /// Expand to one factor per spatial axis, `0.0` meaning that the axis has no scale.
    pub fn resolve<const N: usize>(&self) -> Result<[f64; N]> {
        let mut out = [0.; N];
        out.copy_from_slice(&self.resolve_dyn(N)?);
        Ok(out)
    }

    /// Same as [`ScaleSpec::resolve`] when the number of spatial axes is only known at runtime.
    pub fn resolve_dyn(&self, n: usize) -> Result<Vec<f64>> {
        match self {
            Self::None => Ok(vec![0.; n]),
            Self::Uniform(v) => Ok(vec![*v; n]),
            Self::PerAxis(vs) if vs.len() == 1 => Ok(vec![vs[0]; n]),
            Self::PerAxis(vs) if vs.len() == n => Ok(vs.clone()),
            Self::PerAxis(vs) => Err(Error::ScaleLength { expected: n, got: vs.len() }.bt()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() -> Result<()> {
        assert_eq!("".parse::<ScaleSpec>()?, ScaleSpec::None);
        assert_eq!("2".parse::<ScaleSpec>()?, ScaleSpec::Uniform(2.));
        assert_eq!(" 2.0, 3.0".parse::<ScaleSpec>()?, ScaleSpec::PerAxis(vec![2., 3.]));
        let err = "two".parse::<ScaleSpec>().unwrap_err();
        assert!(matches!(err.root(), Error::ScaleType { .. }), "{err}");
        Ok(())
    }

    #[test]
    fn test_attr() {
        assert_eq!(ScaleSpec::from_attr(0.), ScaleSpec::None);
        assert_eq!(ScaleSpec::from_attr(-1.), ScaleSpec::None);
        assert_eq!(ScaleSpec::from_attr(1.5), ScaleSpec::Uniform(1.5));
    }

    #[test]
    fn test_resolve() -> Result<()> {
        assert_eq!(ScaleSpec::None.resolve::<3>()?, [0.; 3]);
        assert_eq!(ScaleSpec::Uniform(2.).resolve::<2>()?, [2., 2.]);
        assert_eq!(ScaleSpec::PerAxis(vec![1.5]).resolve::<3>()?, [1.5; 3]);
        assert_eq!(ScaleSpec::PerAxis(vec![2., 3.]).resolve::<2>()?, [2., 3.]);
        let err = ScaleSpec::PerAxis(vec![2., 3.]).resolve::<3>().unwrap_err();
        assert!(matches!(err.root(), Error::ScaleLength { expected: 3, got: 2 }), "{err}");
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(ScaleSpec::None.validate().is_ok());
        assert!(ScaleSpec::PerAxis(vec![0.5, 4.]).validate().is_ok());
        for scale in [ScaleSpec::Uniform(0.), ScaleSpec::Uniform(f64::INFINITY)] {
            let err = scale.validate().unwrap_err();
            assert!(matches!(err.root(), Error::NonPositiveScale { .. }), "{err}");
        }
        let err = ScaleSpec::PerAxis(vec![]).validate().unwrap_err();
        assert!(matches!(err.root(), Error::ScaleType { .. }), "{err}");
    }
}
