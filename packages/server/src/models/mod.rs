pub mod achievement;
pub mod alert;
pub mod auth;
pub mod shared;
pub mod stats;
pub mod student;
