pub mod compare;
pub mod dtype;
pub mod error;
pub mod functional;
pub mod geometry;
pub mod interp;
pub mod layout;
pub mod safetensors;
pub mod scale;
pub mod shape;
pub mod tensor;

pub use compare::{check_allclose, max_abs_diff};
pub use dtype::{DType, WithDType};
pub use error::{Error, Result};
pub use functional::interpolate;
pub use geometry::resolve_output_extents;
pub use interp::{InterpMode, nearest_interp, nearest_interp2d, nearest_interp3d};
pub use layout::DataLayout;
pub use scale::ScaleSpec;
pub use shape::{D, Dim, Shape};
pub use tensor::{Tensor, TypedTensor};

pub fn get_num_threads() -> usize {
    rayon::current_num_threads()
}
