pub mod auth;
pub mod batch;
pub mod prs;
pub mod teams;
pub mod users;
