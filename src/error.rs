use std::fmt;

/// Custom error type for UserForge.
/// Provides specific details about why an account resolution failed.
#[derive(Debug)]
pub enum UserError {
    /// The account database has no entry for the requested user.
    NotFound(String),
    /// (Windows) Specific Win32 API error code.
    #[cfg(not(unix))]
    Win32Error(u32),
    /// (Unix) Specific system call failure (getpwuid_r, getpwnam_r).
    #[cfg(unix)]
    SyscallError { call: &'static str, errno: i32 },
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserError::NotFound(who) => write!(f, "User '{}' not found", who),
            #[cfg(not(unix))]
            UserError::Win32Error(code) => write!(f, "Win32 API Error Code: {}", code),
            #[cfg(unix)]
            UserError::SyscallError { call, errno } => {
                write!(f, "Syscall '{}' failed with errno {}", call, errno)
            }
        }
    }
}

impl std::error::Error for UserError {}

/// A specialized Result type for UserForge operations.
pub type UserResult<T> = Result<T, UserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_key() {
        let err = UserError::NotFound("uid 4242".to_owned());
        assert_eq!(err.to_string(), "User 'uid 4242' not found");
    }

    #[cfg(unix)]
    #[test]
    fn syscall_error_names_the_call() {
        let err = UserError::SyscallError {
            call: "getpwnam_r",
            errno: libc::EINTR,
        };
        assert!(err.to_string().contains("getpwnam_r"));
    }
}
