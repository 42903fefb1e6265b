pub mod analytics;
pub mod periods;
