pub mod errors;
pub mod postgrest_client;
pub mod query;
pub mod session_token;
pub mod traits;
