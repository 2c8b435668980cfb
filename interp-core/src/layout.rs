use crate::{Error, Result, Tensor, WithDType};

/// Position of the channel axis, for 4d (images) and 5d (volumes) tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataLayout {
    Nchw,
    Nhwc,
    Ncdhw,
    Ndhwc,
}

impl std::str::FromStr for DataLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NCHW" => Ok(Self::Nchw),
            "NHWC" => Ok(Self::Nhwc),
            "NCDHW" => Ok(Self::Ncdhw),
            "NDHWC" => Ok(Self::Ndhwc),
            _ => Err(Error::UnknownLayout { layout: s.to_string() }.bt()),
        }
    }
}

impl std::fmt::Display for DataLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DataLayout {
    /// Parse a data format name and check that it applies to a tensor of the given rank.
    pub fn for_rank(name: &str, rank: usize) -> Result<Self> {
        let invalid = || Error::InvalidLayout { layout: name.to_string(), rank }.bt();
        let layout: Self = name.parse().map_err(|_| invalid())?;
        if layout.rank() != rank {
            Err(invalid())?
        }
        Ok(layout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nchw => "NCHW",
            Self::Nhwc => "NHWC",
            Self::Ncdhw => "NCDHW",
            Self::Ndhwc => "NDHWC",
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Self::Nchw | Self::Nhwc => 4,
            Self::Ncdhw | Self::Ndhwc => 5,
        }
    }

    pub fn spatial_rank(&self) -> usize {
        self.rank() - 2
    }

    pub fn is_channel_last(&self) -> bool {
        matches!(self, Self::Nhwc | Self::Ndhwc)
    }

    /// The spatial extents of a tensor stored with this layout, outermost first.
    pub fn spatial_dims<'a>(&self, dims: &'a [usize]) -> Result<&'a [usize]> {
        if dims.len() != self.rank() {
            crate::bail!("{self} expects a tensor of rank {}, got dims {dims:?}", self.rank())
        }
        if self.is_channel_last() { Ok(&dims[1..dims.len() - 1]) } else { Ok(&dims[2..]) }
    }

    /// Permutation moving the channel axis from last to position 1.
    fn last_to_first(rank: usize) -> Vec<usize> {
        let mut idxs = Vec::with_capacity(rank);
        idxs.push(0);
        idxs.push(rank - 1);
        idxs.extend(1..rank - 1);
        idxs
    }

    /// Permutation moving the channel axis from position 1 to last.
    fn first_to_last(rank: usize) -> Vec<usize> {
        let mut idxs = Vec::with_capacity(rank);
        idxs.push(0);
        idxs.extend(2..rank);
        idxs.push(1);
        idxs
    }

    fn check_rank<T: WithDType>(&self, xs: &Tensor<T>) -> Result<()> {
        if xs.rank() != self.rank() {
            Err(Error::UnexpectedNumberOfDims { expected: self.rank(), shape: xs.shape().clone() }
                .bt())?
        }
        Ok(())
    }

    /// Bring a tensor stored with this layout to the channel-first order. Channel-first
    /// tensors are returned as is, sharing their storage.
    pub fn to_channel_first<T: WithDType>(&self, xs: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_rank(xs)?;
        if self.is_channel_last() {
            xs.permute(&Self::last_to_first(xs.rank()))
        } else {
            Ok(xs.clone())
        }
    }

    /// Inverse of [`DataLayout::to_channel_first`].
    pub fn from_channel_first<T: WithDType>(&self, xs: &Tensor<T>) -> Result<Tensor<T>> {
        self.check_rank(xs)?;
        if self.is_channel_last() {
            xs.permute(&Self::first_to_last(xs.rank()))
        } else {
            Ok(xs.clone())
        }
    }
}
