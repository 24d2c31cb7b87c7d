pub mod difficulty;
pub mod export;
pub mod metadata;
pub mod model;
