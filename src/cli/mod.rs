pub mod export;
pub mod holdings;
pub mod plan;
pub mod research;
pub mod setup;
pub mod ui;
