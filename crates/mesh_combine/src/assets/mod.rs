//! Asset import and export

pub mod obj_loader;
pub mod obj_writer;

pub use obj_loader::{ObjError, ObjLoader};
pub use obj_writer::{to_obj_string, write_obj};
