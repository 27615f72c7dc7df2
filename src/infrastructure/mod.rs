// Infrastructure layer - External dependencies and adapters
pub mod archive_repository;
pub mod config;

