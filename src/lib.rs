// pr-status library.
// Fetches open GitHub pull requests with Link-header pagination and a local TTL cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod doctor;
pub mod error;
pub mod github;
pub mod render;
pub mod server;
pub mod summarize;
pub mod tools;

pub use config::Settings;
pub use error::{PrStatusError, Result};
pub use github::{GitHubClient, ListPullRequestsOptions, OpenPullRequestsResult, PullRequestSummary};
