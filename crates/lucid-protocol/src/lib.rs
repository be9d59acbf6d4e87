//! Wire conventions for the Lucid client.
//!
//! This crate knows what a Lucid server looks like from the outside:
//!
//! - **Addresses** ([`ServerAddress`]): validated base URLs and how paths
//!   are appended to them.
//! - **Sentinel paths and signatures** ([`VERSION_PATH`], [`CHECK_TOKEN_PATH`],
//!   [`VERSION_SIGNATURE`]): the fixed probes used to confirm identity.
//! - **Bodies** ([`ErrorBody`], [`PatchBody`]): the JSON shapes the server
//!   sends and accepts.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how structured values
//!   become bytes.
//!
//! ```text
//! Transport (bytes) → Protocol (addresses, bodies) → Session / Gateway
//! ```

mod address;
mod codec;
mod error;
mod types;

pub use address::ServerAddress;
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    bearer, error_message, ErrorBody, KeyOperation, PatchBody, CHECK_TOKEN_PATH,
    DEFAULT_SERVER_URI, KV_PATH, STATE_KEY, VERSION_PATH, VERSION_SIGNATURE,
};
