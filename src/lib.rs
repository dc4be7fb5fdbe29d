pub mod app;
pub mod config;
pub mod dataset;
pub mod db;
pub mod error;
pub mod models;
pub mod scheduler;

pub use app::App;
pub use config::Config;
pub use error::{AppError, Result};
