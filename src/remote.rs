//! Network collaborators: the mirror/relay backend and the music catalog.
//!
//! Both are reached through traits so the resolver and the poller can be
//! driven by in-memory fakes; the HTTP implementations use `reqwest`.

mod client;
mod error;
mod normalize;
mod wire;

pub use client::{
    Credential, HttpBackend, MirrorBackend, MusicCatalog, SpotifyCatalog, iso_timestamp,
};
pub use error::RemoteError;
pub use normalize::{MirroredSnapshot, normalize_featured, normalize_relay};
pub use wire::*;

/// Build the HTTP client shared by every collaborator.
pub fn http_client() -> Result<reqwest::Client, RemoteError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("mirrortune/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
