//! Shared state and messaging between the capture thread and the display
//!
//! Configuration reaches the recognizer as immutable snapshots; results go
//! back to the display context over a channel so only that context mutates
//! what rendering observes.

pub mod messages;
pub mod state;

pub use messages::RecognizerToDisplay;
pub use state::{DisplayState, SharedAppState};
