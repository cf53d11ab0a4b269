// GitHub API module.
// Provides the client, pagination helpers, and types for the GitHub REST API.

pub mod client;
pub mod endpoints;
pub mod link;
pub mod types;

pub use client::{GitHubClient, PageRequest};
pub use endpoints::{
    ListPullRequestsOptions, ListRepositoriesOptions, parse_repository_identifier,
};
pub use link::parse_link_header;
pub use types::*;
