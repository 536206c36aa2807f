//! Sink implementations
//!
//! Log reporters for every concern, JSON-lines file and UDP feedback
//! reporters, and the token-store backed invalid-token handler.

mod file;
mod log;
mod network;
mod token_store;

pub use self::file::{FileFeedbackReporter, FileSinkConfig};
pub use self::log::{LogFeedbackReporter, LogInvalidTokenHandler, LogStatsReporter};
pub use self::network::{NetworkFeedbackReporter, NetworkSinkConfig};
pub use self::token_store::{InMemoryTokenStore, TokenStore, TokenStoreHandler};
