//! CPU-side mesh data and the OBJ text-format loader.

mod data;
mod obj;

pub use data::CpuMesh;
pub use obj::{load_obj, parse_obj};
