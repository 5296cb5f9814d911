pub mod models;
pub mod parse;
pub mod time;

pub use models::{IssueRecord, ProfileRecord, RepoListing, StargazerRecord};
pub use parse::Parse;
pub use time::to_naive_utc;
