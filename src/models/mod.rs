mod filter;
mod quote;
mod settings;

pub use filter::{CountView, DistinctColumn, QueryFilter, TOP_100_TAG};
pub use quote::{DatasetQuote, NewQuote, Quote};
pub(crate) use settings::compose_title;
pub use settings::{Preferences, SettingKey};
