pub mod prs;
pub mod stats;
pub mod teams;
pub mod tokens;
pub mod users;
