pub mod comments;
pub mod session;
pub mod user;
