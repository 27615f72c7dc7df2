// Domain layer - Core types and pure algorithms
pub mod alarm;
pub mod error;
pub mod series;
pub mod stats;
pub mod threshold;
pub mod window;
