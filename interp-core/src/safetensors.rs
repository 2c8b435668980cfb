use crate::tensor::TypedTensor;
use crate::{DType, Result, Shape, Tensor, WithDType};
use std::borrow::Cow;
use std::collections::HashMap;

fn load_tensor<T: WithDType>(data: &[u8], shape: Shape) -> Result<Tensor<T>> {
    let vec = T::vec_from_le_bytes(data);
    Tensor::from_vec(vec, shape)
}

fn tensors_from_safetensors(
    st: &safetensors::SafeTensors<'_>,
) -> Result<HashMap<String, TypedTensor>> {
    let mut map = HashMap::new();
    for (name, tensor) in st.tensors() {
        let shape: Shape = tensor.shape().into();
        let data = tensor.data();
        let typed = match tensor.dtype() {
            safetensors::Dtype::F16 => TypedTensor::F16(load_tensor::<half::f16>(data, shape)?),
            safetensors::Dtype::BF16 => TypedTensor::BF16(load_tensor::<half::bf16>(data, shape)?),
            safetensors::Dtype::F32 => TypedTensor::F32(load_tensor::<f32>(data, shape)?),
            safetensors::Dtype::F64 => TypedTensor::F64(load_tensor::<f64>(data, shape)?),
            dtype => {
                tracing::warn!(%name, ?dtype, "skipping tensor with unsupported dtype");
                continue;
            }
        };
        map.insert(name, typed);
    }
    Ok(map)
}

/// Load all tensors from a safetensors byte buffer.
/// Tensors with non-float data types are skipped.
pub fn load_from_buffer(buffer: &[u8]) -> Result<HashMap<String, TypedTensor>> {
    let st = safetensors::SafeTensors::deserialize(buffer)?;
    tensors_from_safetensors(&st)
}

/// Load all tensors from a safetensors file.
/// Tensors with non-float data types are skipped.
pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<HashMap<String, TypedTensor>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| crate::Error::from(e).with_path(path))?;
    let mmap = unsafe { memmap2::MmapOptions::new().map(&file)? };
    let st = safetensors::SafeTensors::deserialize(&mmap)?;
    tensors_from_safetensors(&st)
}

fn dtype_to_safetensors(dtype: DType) -> safetensors::Dtype {
    match dtype {
        DType::F16 => safetensors::Dtype::F16,
        DType::BF16 => safetensors::Dtype::BF16,
        DType::F32 => safetensors::Dtype::F32,
        DType::F64 => safetensors::Dtype::F64,
    }
}

/// Little-endian encoding of the elements, as stored in safetensors files.
fn to_le_bytes<T: WithDType>(vs: &[T]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vs.len() * T::BYTE_SIZE);
    for &v in vs.iter() {
        v.extend_le_bytes(&mut bytes)
    }
    bytes
}

/// A pre-materialized view of tensor data for safetensors serialization.
struct SaveView {
    data: Vec<u8>,
    shape: Vec<usize>,
    dtype: safetensors::Dtype,
}

impl safetensors::tensor::View for SaveView {
    fn dtype(&self) -> safetensors::Dtype {
        self.dtype
    }
    fn shape(&self) -> &[usize] {
        &self.shape
    }
    fn data(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.data)
    }
    fn data_len(&self) -> usize {
        self.data.len()
    }
}

fn save_view<T: WithDType>(t: &Tensor<T>) -> Result<SaveView> {
    Ok(SaveView {
        data: to_le_bytes(t.data()),
        shape: t.dims().to_vec(),
        dtype: dtype_to_safetensors(T::DTYPE),
    })
}

fn typed_tensor_to_save_view(tensor: &TypedTensor) -> Result<SaveView> {
    match tensor {
        TypedTensor::F16(t) => save_view(t),
        TypedTensor::BF16(t) => save_view(t),
        TypedTensor::F32(t) => save_view(t),
        TypedTensor::F64(t) => save_view(t),
    }
}

/// Save tensors to a safetensors file.
pub fn save<K: AsRef<str> + Ord + std::fmt::Display>(
    tensors: &HashMap<K, TypedTensor>,
    path: impl AsRef<std::path::Path>,
) -> Result<()> {
    let views: Vec<(&K, SaveView)> = tensors
        .iter()
        .map(|(name, tensor)| Ok((name, typed_tensor_to_save_view(tensor)?)))
        .collect::<Result<_>>()?;
    Ok(safetensors::tensor::serialize_to_file(views, &None, path.as_ref())?)
}

impl<T: WithDType> Tensor<T> {
    /// Save this tensor to a safetensors file with the given name.
    pub fn save_safetensors(&self, name: &str, path: impl AsRef<std::path::Path>) -> Result<()> {
        let view = save_view(self)?;
        Ok(safetensors::tensor::serialize_to_file([(name, view)], &None, path.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_le_bytes() {
        assert_eq!(to_le_bytes(&[1f32, -2.]), [0, 0, 128, 63, 0, 0, 0, 192]);
        assert_eq!(to_le_bytes(&[half::f16::ONE]), [0, 60]);
        assert_eq!(to_le_bytes(&[half::bf16::ONE]), [128, 63]);
        assert_eq!(to_le_bytes(&[1f64]), 1f64.to_le_bytes());
    }

    #[test]
    fn test_serialize_then_load() -> Result<()> {
        // Odd element count so that the byte buffer is not a multiple of the f64 alignment.
        let xs: Tensor<half::bf16> = Tensor::<f32>::arange((3, 1))?.to_dtype()?;
        let view = save_view(&xs)?;
        assert_eq!(view.data.len(), 6);
        let buffer = safetensors::tensor::serialize([("xs", view)], &None)?;
        let loaded = load_from_buffer(&buffer)?;
        assert_eq!(loaded["xs"].dtype(), DType::BF16);
        assert!(loaded["xs"].to_dtype::<half::bf16>()?.bitwise_eq(&xs));
        Ok(())
    }
}
