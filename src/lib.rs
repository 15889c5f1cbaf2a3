//! # UserForge
//!
//! **UserForge** is a cross-platform library for resolving system user accounts in Rust.
//! It abstracts away the platform account database (`/etc/passwd` and friends on Unix,
//! the local account store on Windows), providing a safe, idiomatic value type for
//! answering "who is running this process?" and "which account does this name or id refer to?".
//!

mod error;
mod sys;
mod types;
mod user;

// Re-export public types to keep the API flat
pub use error::{UserError, UserResult};
#[cfg(unix)]
pub use types::{GidType, UidType};
pub use user::User;
