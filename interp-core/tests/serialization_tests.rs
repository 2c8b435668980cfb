use interp::{DType, Error, Result, Tensor, TypedTensor, safetensors};
use std::collections::HashMap;

fn tmp_path(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("interp-tests-{}", std::process::id()));
    let _ = std::fs::create_dir_all(&dir);
    dir.join(name)
}

#[test]
fn test_save_and_load() -> Result<()> {
    let xs: Tensor<f32> = Tensor::arange((2, 3, 4, 5))?;
    let ys: Tensor<half::f16> = xs.narrow(2, ..2)?.to_dtype()?;
    let mut tensors = HashMap::new();
    tensors.insert("x", TypedTensor::F32(xs.clone()));
    tensors.insert("y", TypedTensor::F16(ys.clone()));
    let path = tmp_path("save_and_load.safetensors");
    safetensors::save(&tensors, &path)?;

    let loaded = safetensors::load_from_file(&path)?;
    assert_eq!(loaded.len(), 2);
    let x = &loaded["x"];
    assert_eq!(x.dtype(), DType::F32);
    assert_eq!(x.shape().dims(), &[2, 3, 4, 5]);
    assert!(x.to_dtype::<f32>()?.bitwise_eq(&xs));
    let y = &loaded["y"];
    assert_eq!(y.dtype(), DType::F16);
    assert!(y.to_dtype::<half::f16>()?.bitwise_eq(&ys));

    let buffer = std::fs::read(&path)?;
    let from_buffer = safetensors::load_from_buffer(&buffer)?;
    assert_eq!(from_buffer["y"].shape().dims(), &[2, 3, 2, 5]);
    Ok(())
}

#[test]
fn test_save_single() -> Result<()> {
    let xs: Tensor<f64> = Tensor::from_vec(vec![0.25, -1.5, 3.0, 7.0], (1, 1, 2, 2))?;
    let path = tmp_path("save_single.safetensors");
    xs.save_safetensors("out", &path)?;
    let loaded = safetensors::load_from_file(&path)?;
    let out = loaded.get("out").map(|t| t.to_dtype::<f64>()).transpose()?;
    assert!(out.is_some_and(|out| out.bitwise_eq(&xs)));
    Ok(())
}

#[test]
fn test_missing_file() {
    let err = safetensors::load_from_file(tmp_path("does-not-exist.safetensors")).unwrap_err();
    assert!(matches!(err.root(), Error::Io(_)), "{err}");
    assert!(err.to_string().contains("does-not-exist"), "{err}");
}

#[test]
fn test_invalid_buffer() {
    assert!(safetensors::load_from_buffer(b"not a safetensors file").is_err());
}
