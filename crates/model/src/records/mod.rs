pub mod decode;
pub mod row;
