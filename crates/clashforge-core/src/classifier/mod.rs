//! Label classification for proxy endpoints.
//!
//! Maps display names to geographic and operator categories.

mod category;
mod keyword;

pub use category::{Category, CategoryMatch, Classification};
pub use keyword::KeywordClassifier;
