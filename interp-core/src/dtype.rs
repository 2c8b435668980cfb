use half::{bf16, f16};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
}

/// Element types a tensor can hold. Conversions go through `f64` which represents every
/// supported element type exactly.
pub trait WithDType:
    Sized
    + Copy
    + num_traits::NumAssign
    + PartialOrd
    + 'static
    + Clone
    + Send
    + Sync
    + std::fmt::Debug
    + std::fmt::Display
{
    const DTYPE: DType;
    const BYTE_SIZE: usize;

    fn as_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;

    /// Append the little-endian encoding of `self` to `dst`.
    fn extend_le_bytes(self, dst: &mut Vec<u8>);

    /// Convert a little-endian byte slice to a Vec of Self.
    /// This handles alignment safely by copying the bytes into a fresh allocation.
    fn vec_from_le_bytes(src: &[u8]) -> Vec<Self> {
        let len = src.len() / Self::BYTE_SIZE;
        let mut dst: Vec<Self> = Vec::with_capacity(len);
        // SAFETY: We allocate `len` elements, initialize all bytes via copy, then set length.
        unsafe {
            std::ptr::copy_nonoverlapping(
                src.as_ptr(),
                dst.spare_capacity_mut().as_mut_ptr().cast::<u8>(),
                len * Self::BYTE_SIZE,
            );
            dst.set_len(len);
        }
        dst
    }
}

impl WithDType for f16 {
    const DTYPE: DType = DType::F16;
    const BYTE_SIZE: usize = 2;

    fn as_f64(self) -> f64 {
        f16::to_f64(self)
    }

    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }

    fn extend_le_bytes(self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.to_le_bytes())
    }
}

impl WithDType for bf16 {
    const DTYPE: DType = DType::BF16;
    const BYTE_SIZE: usize = 2;

    fn as_f64(self) -> f64 {
        bf16::to_f64(self)
    }

    fn from_f64(v: f64) -> Self {
        bf16::from_f64(v)
    }

    fn extend_le_bytes(self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.to_le_bytes())
    }
}

impl WithDType for f32 {
    const DTYPE: DType = DType::F32;
    const BYTE_SIZE: usize = 4;

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn extend_le_bytes(self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.to_le_bytes())
    }
}

impl WithDType for f64 {
    const DTYPE: DType = DType::F64;
    const BYTE_SIZE: usize = 8;

    fn as_f64(self) -> f64 {
        self
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn extend_le_bytes(self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.to_le_bytes())
    }
}
