//! HTTP collaborators: the remote option-link, cascade and template
//! providers behind the `stockgrid_core::store` traits.

pub mod client;
pub mod error;
pub mod sources;

pub use client::RemoteClient;
pub use error::RemoteError;
pub use sources::{RemoteCascadeSource, RemoteLinkSource, RemoteTemplateSource};
