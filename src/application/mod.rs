pub mod comments;
pub mod session;
