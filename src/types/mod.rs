//! BOSS value types: the dynamic value sum type and the ordered struct model.

mod struct_value;
mod value;

pub use struct_value::StructValue;
pub use value::Value;
