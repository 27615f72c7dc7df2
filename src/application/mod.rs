// Application layer - Use cases and stateful components
pub mod alarm_center;
pub mod engine;
pub mod refresh_scheduler;
pub mod resampler;
pub mod selection;
pub mod series_cache;
pub mod telemetry_repository;
