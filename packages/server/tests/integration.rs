#[path = "integration/common/mod.rs"]
mod common;

#[path = "integration/achievement.rs"]
mod achievement;
#[path = "integration/auth.rs"]
mod auth;
#[path = "integration/stats.rs"]
mod stats;
