pub mod achievement;
pub mod alert;
pub mod auth;
pub mod stats;
pub mod student;
pub mod user;
