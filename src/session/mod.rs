//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! login / register / logout / refresh
//!     → manager.rs (validate input, call gateway)
//!     → token_store.rs (persist or remove the bearer token under "token")
//!     → notifier.rs (tell listeners the user changed)
//!
//! ResourceClient
//!     → SessionManager::token() (read-through at call time)
//!     → SessionManager::invalidate() on a 401
//! ```

pub mod manager;
pub mod notifier;
pub mod token_store;
pub mod types;

pub use crate::api::models::{Session, User};
pub use manager::{SessionManager, TOKEN_KEY};
pub use notifier::{ListenerId, SessionNotifier};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError, UnavailableTokenStore};
pub use types::SessionError;
