use crate::{DType, Error, Result, Shape, WithDType, shape::Dim};
use std::ops::RangeBounds;
use std::sync::Arc;

/// Resolve a `RangeBounds<usize>` into `(start, len)` given a dimension size.
pub(crate) fn resolve_range(range: impl RangeBounds<usize>, dim_size: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        std::ops::Bound::Included(&s) => s,
        std::ops::Bound::Excluded(&s) => s + 1,
        std::ops::Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        std::ops::Bound::Included(&e) => e + 1,
        std::ops::Bound::Excluded(&e) => e,
        std::ops::Bound::Unbounded => dim_size,
    };
    (start, end.saturating_sub(start))
}

/// Copy a strided n-dimensional block of `src` into the contiguous `dst`.
fn copy_strided<T: WithDType>(
    dst: &mut Vec<T>,
    src: &[T],
    src_offset: usize,
    dims: &[usize],
    src_strides: &[usize],
) {
    let total: usize = dims.iter().product();
    if total == 0 {
        return;
    }
    let rank = dims.len();
    if rank == 0 {
        dst.push(src[src_offset]);
        return;
    }
    // The innermost dimension is copied as a block when it is contiguous.
    let inner = dims[rank - 1];
    let inner_stride = src_strides[rank - 1];
    let mut index = vec![0usize; rank - 1];
    let mut base = src_offset;
    loop {
        if inner_stride == 1 {
            dst.extend_from_slice(&src[base..base + inner]);
        } else {
            dst.extend((0..inner).map(|i| src[base + i * inner_stride]));
        }
        // Increment the outer multi-index, last axis first.
        let mut d = rank - 1;
        loop {
            if d == 0 {
                return;
            }
            d -= 1;
            index[d] += 1;
            base += src_strides[d];
            if index[d] < dims[d] {
                break;
            }
            base -= index[d] * src_strides[d];
            index[d] = 0;
        }
    }
}

impl<T: WithDType> Clone for Tensor<T> {
    fn clone(&self) -> Self {
        Tensor { data: Arc::clone(&self.data), shape: self.shape.clone() }
    }
}

/// A dense, contiguous, row-major tensor living in main memory.
///
/// The storage is shared between clones and never mutated once the tensor has been built,
/// operations always allocate a fresh output.
pub struct Tensor<T: WithDType> {
    pub(crate) data: Arc<Vec<T>>,
    pub(crate) shape: Shape,
}

pub enum TypedTensor {
    F16(Tensor<half::f16>),
    BF16(Tensor<half::bf16>),
    F32(Tensor<f32>),
    F64(Tensor<f64>),
}

impl std::fmt::Debug for TypedTensor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::F16(t) => write!(f, "{t:?}"),
            Self::BF16(t) => write!(f, "{t:?}"),
            Self::F32(t) => write!(f, "{t:?}"),
            Self::F64(t) => write!(f, "{t:?}"),
        }
    }
}

impl TypedTensor {
    pub fn dtype(&self) -> DType {
        match self {
            Self::F16(_) => DType::F16,
            Self::BF16(_) => DType::BF16,
            Self::F32(_) => DType::F32,
            Self::F64(_) => DType::F64,
        }
    }

    pub fn shape(&self) -> &Shape {
        match self {
            Self::F16(t) => t.shape(),
            Self::BF16(t) => t.shape(),
            Self::F32(t) => t.shape(),
            Self::F64(t) => t.shape(),
        }
    }

    /// Convert to a tensor of the requested element type, whatever the stored dtype.
    pub fn to_dtype<U: WithDType>(&self) -> Result<Tensor<U>> {
        match self {
            Self::F16(t) => t.to_dtype(),
            Self::BF16(t) => t.to_dtype(),
            Self::F32(t) => t.to_dtype(),
            Self::F64(t) => t.to_dtype(),
        }
    }
}

impl<T: WithDType> Tensor<T> {
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn dim(&self, index: impl Dim) -> Result<usize> {
        self.shape.dim(index)
    }

    /// Borrow the underlying contiguous data.
    pub fn data(&self) -> &[T] {
        self.data.as_slice()
    }

    pub fn to_vec(&self) -> Result<Vec<T>> {
        Ok(self.data.to_vec())
    }

    pub fn from_vec(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.elem_count() {
            crate::bail!(
                "from_vec: data length {} does not match shape {:?} with {} elements",
                data.len(),
                shape,
                shape.elem_count()
            );
        }
        Ok(Tensor { data: Arc::new(data), shape })
    }

    pub fn full(value: T, shape: impl Into<Shape>) -> Result<Self> {
        let shape: Shape = shape.into();
        let data = vec![value; shape.elem_count()];
        Ok(Tensor { data: Arc::new(data), shape })
    }

    pub fn zeros(shape: impl Into<Shape>) -> Result<Self> {
        Self::full(T::zero(), shape)
    }

    /// A tensor filled with `0, 1, 2, ...` in row-major order.
    pub fn arange(shape: impl Into<Shape>) -> Result<Self> {
        let shape: Shape = shape.into();
        let data = (0..shape.elem_count()).map(|i| T::from_f64(i as f64)).collect();
        Ok(Tensor { data: Arc::new(data), shape })
    }

    /// Reshape the tensor to a new shape with the same number of elements.
    /// This operation shares the underlying data (no copy).
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Self> {
        let shape: Shape = shape.into();
        if shape.elem_count() != self.elem_count() {
            crate::bail!(
                "reshape: cannot reshape tensor of {} elements to shape {:?} ({} elements)",
                self.elem_count(),
                shape,
                shape.elem_count()
            );
        }
        Ok(Tensor { data: Arc::clone(&self.data), shape })
    }

    /// Read a single element.
    pub fn get(&self, index: &[usize]) -> Result<T> {
        if index.len() != self.rank() {
            crate::bail!("get: index {index:?} does not match shape {:?}", self.shape)
        }
        let mut offset = 0;
        for (dim_idx, (&i, &d)) in index.iter().zip(self.dims().iter()).enumerate() {
            if i >= d {
                crate::bail!("get: index {i} out of range for dim {dim_idx} of size {d}")
            }
            offset = offset * d + i;
        }
        Ok(self.data[offset])
    }

    /// Reorder the dimensions, `idxs[i]` being the source dimension that ends up at
    /// position `i`. The result is contiguous.
    #[tracing::instrument(skip_all)]
    pub fn permute(&self, idxs: &[usize]) -> Result<Self> {
        let rank = self.rank();
        if idxs.len() != rank {
            Err(Error::UnexpectedNumberOfDims { expected: idxs.len(), shape: self.shape.clone() }
                .bt())?
        }
        let mut seen = vec![false; rank];
        for &i in idxs.iter() {
            if i >= rank || seen[i] {
                Err(Error::DuplicateDimIndex {
                    shape: self.shape.clone(),
                    dims: idxs.to_vec(),
                    op: "permute",
                }
                .bt())?
            }
            seen[i] = true;
        }
        let strides = self.shape.stride_contiguous();
        let dims: Vec<usize> = idxs.iter().map(|&i| self.dims()[i]).collect();
        let src_strides: Vec<usize> = idxs.iter().map(|&i| strides[i]).collect();
        let mut data = Vec::with_capacity(self.elem_count());
        copy_strided(&mut data, self.data(), 0, &dims, &src_strides);
        Ok(Tensor { data: Arc::new(data), shape: Shape::from(dims) })
    }

    pub fn transpose<D1: Dim, D2: Dim>(&self, dim1: D1, dim2: D2) -> Result<Self> {
        let dim1 = dim1.to_index(self.shape(), "transpose")?;
        let dim2 = dim2.to_index(self.shape(), "transpose")?;
        let mut idxs: Vec<usize> = (0..self.rank()).collect();
        idxs.swap(dim1, dim2);
        self.permute(&idxs)
    }

    /// Extract a slice of the tensor along a given dimension, as a new contiguous tensor.
    #[tracing::instrument(skip_all)]
    pub fn narrow<D: Dim>(&self, dim: D, range: impl RangeBounds<usize>) -> Result<Self> {
        let dim = dim.to_index(self.shape(), "narrow")?;
        let dim_size = self.dims()[dim];
        let (start, len) = resolve_range(range, dim_size);
        if start + len > dim_size {
            crate::bail!(
                "narrow: range {start}..{} out of bounds for dim of size {dim_size}",
                start + len
            )
        }
        let strides = self.shape.stride_contiguous();
        let mut dims = self.dims().to_vec();
        dims[dim] = len;
        let mut data = Vec::with_capacity(dims.iter().product());
        copy_strided(&mut data, self.data(), start * strides[dim], &dims, &strides);
        Ok(Tensor { data: Arc::new(data), shape: Shape::from(dims) })
    }

    /// Convert the elements to another dtype, going through `f64`.
    pub fn to_dtype<U: WithDType>(&self) -> Result<Tensor<U>> {
        let data = self.data.iter().map(|v| U::from_f64(v.as_f64())).collect();
        Ok(Tensor { data: Arc::new(data), shape: self.shape.clone() })
    }

    pub(crate) fn same_storage(&self, rhs: &Self) -> bool {
        Arc::ptr_eq(&self.data, &rhs.data)
    }

    /// Whether both tensors have the same shape and bit-identical elements.
    pub fn bitwise_eq(&self, rhs: &Self) -> bool {
        if self.shape != rhs.shape {
            return false;
        }
        if self.same_storage(rhs) {
            return true;
        }
        self.data
            .iter()
            .zip(rhs.data.iter())
            .all(|(a, b)| a.as_f64().to_bits() == b.as_f64().to_bits())
    }
}

impl<T: WithDType> std::fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Tensor[")?;
        match self.dims() {
            [] => {
                if let Some(v) = self.data.first() {
                    write!(f, "{v}")?
                }
            }
            [s] if *s < 10 => {
                for (i, v) in self.data.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
            }
            dims => {
                write!(f, "dims ")?;
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{d}")?;
                }
            }
        }
        write!(f, "; {:?}]", self.dtype())
    }
}
