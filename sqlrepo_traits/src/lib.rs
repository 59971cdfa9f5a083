#![forbid(unsafe_code)]

mod entity;
mod relation;
mod value;

pub use entity::*;
pub use relation::*;
pub use value::*;
