pub mod comment;
pub mod errors;
pub mod reaction;
pub mod repository;
pub mod tree;
pub mod value_objects;
