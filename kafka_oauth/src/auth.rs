mod credential;
mod credential_fetcher;
mod credential_source;
mod jwt;
mod oidc_token;
mod token_refresh_bridge;
mod token_sink;

pub use credential::*;
pub use credential_fetcher::*;
pub use credential_source::*;
pub use oidc_token::*;
pub use token_refresh_bridge::*;
pub use token_sink::*;
