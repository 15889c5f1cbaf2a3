use std::env;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::UserResult;
use crate::sys;
use crate::types::AccountEntry;
#[cfg(unix)]
use crate::types::{GidType, UidType};

/// Username reported for the all-users sentinel.
const ALL_USERS_MARKER: &str = "*";

#[cfg(unix)]
const HOME_ENV_VAR: &str = "HOME";
#[cfg(not(unix))]
const HOME_ENV_VAR: &str = "USERPROFILE";

/// Represents a system user account.
///
/// A `User` is fully resolved against the platform account database when it
/// is constructed and is immutable afterwards. It is always in exactly one
/// of four states:
///
/// - a concrete account that resolved successfully (`exists()` is true),
/// - a lookup that found no account (`exists()` is false, not a sentinel),
/// - the "all users" sentinel ([`User::all_users`]),
/// - the empty user ([`User::empty`], also the default).
///
/// Lookup failures in the constructors are absorbed into the second state
/// rather than reported as errors; query [`User::exists`] afterwards. Only
/// [`User::current`] surfaces failure to the caller, because not knowing
/// who the process runs as is usually actionable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    state: State,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Account successfully resolved against the account database.
    Resolved(AccountEntry),
    /// A lookup that did not resolve. Distinct from the sentinels.
    NotFound,
    AllUsers,
    Empty,
}

impl User {
    /// Creates a user by numeric user id.
    ///
    /// If the id has no entry in the account database, or the lookup itself
    /// fails, the returned object reports `exists() == false` and its
    /// accessors return empty/zero values.
    #[cfg(unix)]
    pub fn from_id(user_id: UidType) -> Self {
        match sys::account_by_uid(user_id) {
            Ok(Some(entry)) => User {
                state: State::Resolved(entry),
            },
            Ok(None) => {
                debug!("no account database entry for uid {}", user_id);
                User {
                    state: State::NotFound,
                }
            }
            Err(err) => {
                debug!("account lookup for uid {} failed: {}", user_id, err);
                User {
                    state: State::NotFound,
                }
            }
        }
    }

    /// Creates a user by username.
    ///
    /// The name is passed to the account database verbatim; a purely
    /// numeric string resolves only if an account is literally named that
    /// way. Failure behavior matches [`User::from_id`].
    pub fn from_name(username: &str) -> Self {
        match sys::account_by_name(username) {
            Ok(Some(entry)) => User {
                state: State::Resolved(entry),
            },
            Ok(None) => {
                debug!("no account database entry for user '{}'", username);
                User {
                    state: State::NotFound,
                }
            }
            Err(err) => {
                debug!("account lookup for user '{}' failed: {}", username, err);
                User {
                    state: State::NotFound,
                }
            }
        }
    }

    /// Creates the sentinel representing all users.
    ///
    /// The sentinel has no id, group, or home; its username reads as `"*"`.
    /// No account lookup occurs.
    pub fn all_users() -> Self {
        User {
            state: State::AllUsers,
        }
    }

    /// Creates the empty user. No account lookup occurs.
    pub fn empty() -> Self {
        User {
            state: State::Empty,
        }
    }

    /// Gets the user the current process is executing on behalf of,
    /// by effective user id on Unix and by reported username on Windows.
    ///
    /// Returns an existing, fully-resolved user on success. On failure
    /// (account not found, OS call failure) no user value is produced.
    pub fn current() -> UserResult<User> {
        let entry = sys::current_account()?;
        Ok(User {
            state: State::Resolved(entry),
        })
    }

    /// Resolves the current user's home directory, honoring overrides.
    ///
    /// `env_override` is a `|`-separated list of environment variable names
    /// checked in order; the first set, non-empty variable wins. After the
    /// overrides, the platform home variable (`HOME` on Unix, `USERPROFILE`
    /// on Windows) is consulted, and finally the account database. Returns
    /// the empty path if every source comes up empty.
    pub fn current_home_path(env_override: &str) -> PathBuf {
        for var in env_override.split('|') {
            let var = var.trim();
            if var.is_empty() {
                continue;
            }
            match env::var_os(var) {
                Some(home) if !home.is_empty() => return PathBuf::from(home),
                _ => {}
            }
        }

        match env::var_os(HOME_ENV_VAR) {
            Some(home) if !home.is_empty() => return PathBuf::from(home),
            _ => {}
        }

        match User::current() {
            Ok(user) => user.home_path().to_path_buf(),
            Err(err) => {
                debug!("home path fallback via account database failed: {}", err);
                PathBuf::new()
            }
        }
    }

    // --- Accessors ---

    /// Gets the id of this user. Meaningful only when `exists()` is true;
    /// zero otherwise.
    #[cfg(unix)]
    pub fn user_id(&self) -> UidType {
        match &self.state {
            State::Resolved(entry) => entry.user_id,
            _ => 0,
        }
    }

    /// Gets the id of this user's primary group. Meaningful only when
    /// `exists()` is true; zero otherwise.
    #[cfg(unix)]
    pub fn group_id(&self) -> GidType {
        match &self.state {
            State::Resolved(entry) => entry.group_id,
            _ => 0,
        }
    }

    /// Returns the name of this user (`"*"` for all users, `""` for the
    /// empty user and for failed lookups).
    pub fn username(&self) -> &str {
        match &self.state {
            State::Resolved(entry) => &entry.username,
            State::AllUsers => ALL_USERS_MARKER,
            State::NotFound | State::Empty => "",
        }
    }

    /// Gets the user home path, if it exists; the empty path otherwise.
    pub fn home_path(&self) -> &Path {
        match &self.state {
            State::Resolved(entry) => &entry.home_path,
            _ => Path::new(""),
        }
    }

    /// Checks whether the user represented by this object exists on the
    /// system. False for both sentinels and for failed lookups.
    pub fn exists(&self) -> bool {
        matches!(self.state, State::Resolved(_))
    }

    /// Returns whether this object represents all users.
    pub fn is_all_users(&self) -> bool {
        matches!(self.state, State::AllUsers)
    }

    /// Checks whether this is the empty user.
    pub fn is_empty(&self) -> bool {
        matches!(self.state, State::Empty)
    }
}

impl Default for User {
    /// The empty user.
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_SUCH_NAME: &str = "user_forge_no_such_account";
    // Well above any uid a real system hands out.
    #[cfg(unix)]
    const NO_SUCH_UID: UidType = 3_000_000_000;

    #[test]
    fn default_is_the_empty_user() {
        let user = User::default();
        assert_eq!(user, User::empty());
        assert!(user.is_empty());
        assert!(!user.is_all_users());
        assert!(!user.exists());
        assert_eq!(user.username(), "");
        assert_eq!(user.home_path(), Path::new(""));
    }

    #[test]
    fn all_users_reads_as_wildcard() {
        let user = User::all_users();
        assert!(user.is_all_users());
        assert!(!user.is_empty());
        assert!(!user.exists());
        assert_eq!(user.username(), "*");
        assert_eq!(user.home_path(), Path::new(""));
    }

    #[test]
    fn failed_lookup_is_not_a_sentinel() {
        let user = User::from_name(NO_SUCH_NAME);
        assert!(!user.exists());
        assert!(!user.is_empty());
        assert!(!user.is_all_users());
        assert_eq!(user.username(), "");
        assert_eq!(user.home_path(), Path::new(""));
    }

    #[cfg(unix)]
    #[test]
    fn unknown_uid_does_not_exist() {
        let user = User::from_id(NO_SUCH_UID);
        assert!(!user.exists());
        assert_eq!(user.user_id(), 0);
        assert_eq!(user.group_id(), 0);
        assert_eq!(user.username(), "");
    }

    #[cfg(unix)]
    #[test]
    fn root_resolves_by_uid() {
        let user = User::from_id(0);
        assert!(user.exists());
        assert_eq!(user.user_id(), 0);
        assert!(!user.username().is_empty());
        assert!(!user.is_empty());
        assert!(!user.is_all_users());
    }

    #[test]
    fn current_user_exists() {
        let user = User::current().expect("current user should resolve");
        assert!(user.exists());
        assert!(!user.is_empty());
        assert!(!user.is_all_users());
        assert!(!user.username().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn current_user_matches_effective_uid() {
        let user = User::current().expect("current user should resolve");
        assert_eq!(user.user_id(), unsafe { libc::geteuid() });
    }

    #[cfg(unix)]
    #[test]
    fn username_round_trips_to_same_uid() {
        let original = User::current().expect("current user should resolve");
        let again = User::from_name(original.username());
        assert!(again.exists());
        assert_eq!(again.user_id(), original.user_id());
        assert_eq!(again.group_id(), original.group_id());
    }

    #[test]
    fn numeric_names_resolve_only_literally() {
        let user = User::from_name("0");
        if user.exists() {
            // Resolution happened, so the database really has an account
            // literally named "0"; no uid shortcut was taken.
            assert_eq!(user.username(), "0");
        }
    }

    #[test]
    fn clones_are_indistinguishable() {
        let resolved = User::current().expect("current user should resolve");
        for user in [resolved, User::all_users(), User::empty(), User::from_name(NO_SUCH_NAME)] {
            let copy = user.clone();
            assert_eq!(copy, user);
            assert_eq!(copy.username(), user.username());
            assert_eq!(copy.home_path(), user.home_path());
            assert_eq!(copy.exists(), user.exists());
            assert_eq!(copy.is_all_users(), user.is_all_users());
            assert_eq!(copy.is_empty(), user.is_empty());
        }
    }

    #[test]
    fn home_override_wins_when_set() {
        unsafe { env::set_var("USER_FORGE_TEST_HOME", "/opt/forge-home") };
        let home = User::current_home_path("USER_FORGE_TEST_HOME|USER_FORGE_TEST_UNSET");
        unsafe { env::remove_var("USER_FORGE_TEST_HOME") };
        assert_eq!(home, PathBuf::from("/opt/forge-home"));
    }

    #[test]
    fn home_falls_back_to_platform_variable() {
        if let Some(home) = env::var_os(HOME_ENV_VAR) {
            if !home.is_empty() {
                assert_eq!(User::current_home_path(""), PathBuf::from(home));
            }
        }
    }
}
