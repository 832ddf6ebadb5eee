pub mod cache_ops;
pub mod health;

pub use cache_ops::{get_value, put_values};
pub use health::status;
