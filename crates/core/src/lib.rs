//! Dashboard core types and utilities
//!
//! Domain models shared by the HTTP client and the CLI, the credential
//! [`TokenStore`], and the tracing bootstrap.

pub mod error;
pub mod state_dir;
pub mod token_store;
#[cfg(feature = "tracing")]
pub mod tracing;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use state_dir::default_state_dir;
pub use token_store::{CredentialPair, FileTokenStore, MemoryTokenStore, TokenKey, TokenStore};
pub use types::{ListQuery, OwnerSummary, Page, Product, ProductOwner, Role, User};
