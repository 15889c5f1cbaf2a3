// =========================================================================
// Platform Identity Types
// =========================================================================

use std::path::PathBuf;

/// Numeric user id (Unix).
#[cfg(unix)]
pub type UidType = libc::uid_t;

/// Numeric group id (Unix).
#[cfg(unix)]
pub type GidType = libc::gid_t;

// --- UNIX (account records carry numeric ids) ---
#[cfg(unix)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AccountEntry {
    pub(crate) username: String,
    pub(crate) user_id: UidType,
    pub(crate) group_id: GidType,
    pub(crate) home_path: PathBuf,
}

// --- WINDOWS (identity is name-based only) ---
#[cfg(not(unix))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AccountEntry {
    pub(crate) username: String,
    pub(crate) home_path: PathBuf,
}
