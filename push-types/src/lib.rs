//! # zeropush-types
//!
//! Wire format types for the ZeroPush zero-knowledge push relay.
//!
//! - [`PushDestination`], [`PushNativeIdentifier`], [`DevicePushType`] - what a
//!   sealed identifier decrypts to
//! - [`PushData`], [`PushToInput`] - push requests
//! - [`PushToOutput`], [`PushFailure`] - relay replies
//! - [`TypesError`] - Error types
//!
//! All messages are MessagePack-encoded.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod destination;
mod error;
mod push;

pub use destination::{DevicePushType, PushDestination, PushNativeIdentifier};
pub use error::TypesError;
pub use push::{ErrorKind, Priority, PushData, PushFailure, PushToInput, PushToOutput};

/// Content type used for MessagePack request and reply bodies.
pub const MSGPACK_CONTENT_TYPE: &str = "application/msgpack";
