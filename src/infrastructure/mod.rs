pub mod remote;
pub mod repositories;
