//! UseCase layer: the connection lifecycle built on top of the registry and
//! dispatcher.

pub mod authenticate;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod publish_presence;
pub mod send_message;
pub mod session;

pub use authenticate::IdentityGate;
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, SendMessageError};
pub use publish_presence::PresencePublisher;
pub use send_message::SendMessageUseCase;
pub use session::{CloseCause, SessionLoop, SessionOutcome, SessionState};
