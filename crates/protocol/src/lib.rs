//! Wire protocol shared by the sending and receiving peer.

pub mod constants;
pub mod envelope;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::MessageType;
pub use envelope::Message;
pub use messages::{CancelTransfer, ChunkMessage};
pub use types::{TransferProgress, TransferStatus};
