pub mod auth;
pub mod operator;
pub mod rate_limit;
