//! Infrastructure layer: concrete implementations of the broadcast core and
//! of the collaborator traits defined in the domain layer.

pub mod dispatcher;
pub mod dto;
pub mod registry;
pub mod store;
pub mod transform;
pub mod verifier;
