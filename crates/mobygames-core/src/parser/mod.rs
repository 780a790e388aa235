//! JSON parsers for MobyGames responses
//!
//! Contains modules for parsing different endpoint responses.

pub mod assets;
pub mod metadata;
pub mod platforms;
pub mod search;

pub use assets::{parse_covers, parse_screenshots};
pub use metadata::build_metadata;
pub use platforms::parse_platform_catalog;
pub use search::{SearchContext, parse_search_results};
