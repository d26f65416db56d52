//! Session handling: the GitHub access token cookie and the OAuth exchange that sets it.

pub mod handlers;
pub mod oauth;
pub mod session;

pub use oauth::OAuthClient;
pub use session::{AccessToken, GitHubSession};
