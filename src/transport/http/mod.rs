pub mod router;
pub mod types;
pub mod handlers {
    pub mod books;
    pub mod common;
    pub mod export;
    pub mod generation;
    pub mod health;
    pub mod metadata;
    pub mod progress;
    pub mod scan;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
