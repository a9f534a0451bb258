pub mod auth;
pub mod comments;
pub mod health;
pub mod market;
pub mod posts;
pub mod profile;
