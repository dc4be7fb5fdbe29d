mod queries;
mod repository;
mod schema;
mod settings;
mod watch;

pub use repository::Repository;
pub use watch::{QuoteChange, QuoteWatch};
