pub mod auth;
pub mod forum;
pub mod model;
pub mod reset;
pub mod topic;
