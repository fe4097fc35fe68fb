//! Domain layer: value objects, entities, errors and the collaborator
//! interfaces the broadcast core depends on.
//!
//! Concrete collaborators (stores, verifiers, transforms) live in the
//! infrastructure layer and are injected through these traits.

pub mod entity;
pub mod error;
pub mod store;
pub mod transform;
pub mod value_object;
pub mod verifier;

use tokio::sync::mpsc;

pub use entity::{BroadcastItem, Identity, MessageRecord};
pub use error::{RegistryError, RejectReason, StoreError, SubmitError, ValueObjectError, VerifyError};
pub use store::MessageStore;
pub use transform::TextTransform;
pub use value_object::{ConnectionId, DisplayName, MessageBody, Timestamp};
pub use verifier::{TokenClaims, TokenVerifier};

/// Outbound half of a connection: every frame written to a client goes
/// through this channel and is flushed to the socket by its pusher task.
///
/// Bounded per connection. Writers use `try_send`, so a client that stops
/// reading shows up as a full buffer instead of unbounded memory growth.
pub type PusherChannel = mpsc::Sender<String>;
