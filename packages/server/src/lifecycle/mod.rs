mod coordinator;

pub use coordinator::{AchievementView, LifecycleCoordinator, ListScope};
