use crate::error::{UserError, UserResult};
use crate::types::{AccountEntry, UidType};
use std::ffi::{CStr, CString};
use std::path::PathBuf;

use log::{debug, trace};

// Fallback buffer size when sysconf cannot report one.
const DEFAULT_PWD_BUF_SIZE: usize = 1024;
// Upper bound for the ERANGE retry loop.
const MAX_PWD_BUF_SIZE: usize = 1 << 20;

/// Effective uid of the calling process. This call cannot fail.
pub(crate) fn current_user_id() -> UidType {
    unsafe { libc::geteuid() }
}

/// Looks up an account database entry by numeric user id.
///
/// Returns `Ok(None)` if the id has no entry; `Err` only for genuine
/// syscall failures.
pub(crate) fn account_by_uid(user_id: UidType) -> UserResult<Option<AccountEntry>> {
    trace!("looking up account database entry for uid {}", user_id);
    lookup_passwd("getpwuid_r", |pwd, buf, buflen, result| unsafe {
        libc::getpwuid_r(user_id, pwd, buf, buflen, result)
    })
}

/// Looks up an account database entry by username.
///
/// The name is handed to the database verbatim; a purely numeric string
/// resolves only if an account is literally named that way.
pub(crate) fn account_by_name(username: &str) -> UserResult<Option<AccountEntry>> {
    trace!("looking up account database entry for user '{}'", username);
    let cname = match CString::new(username) {
        Ok(cname) => cname,
        // A name with an interior NUL cannot exist in the database.
        Err(_) => return Ok(None),
    };
    lookup_passwd("getpwnam_r", |pwd, buf, buflen, result| unsafe {
        libc::getpwnam_r(cname.as_ptr(), pwd, buf, buflen, result)
    })
}

/// Resolves the account the current process is executing as.
pub(crate) fn current_account() -> UserResult<AccountEntry> {
    let user_id = current_user_id();
    account_by_uid(user_id)?.ok_or_else(|| {
        debug!("effective uid {} has no account database entry", user_id);
        UserError::NotFound(format!("uid {}", user_id))
    })
}

/// Runs one of the reentrant passwd lookups, growing the string buffer
/// on ERANGE until the entry fits.
fn lookup_passwd<F>(call: &'static str, mut lookup: F) -> UserResult<Option<AccountEntry>>
where
    F: FnMut(
        *mut libc::passwd,
        *mut libc::c_char,
        libc::size_t,
        *mut *mut libc::passwd,
    ) -> libc::c_int,
{
    let mut buflen = initial_buf_size();
    loop {
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut buf = vec![0 as libc::c_char; buflen];
        let mut result: *mut libc::passwd = std::ptr::null_mut();

        let rc = lookup(&mut pwd, buf.as_mut_ptr(), buf.len(), &mut result);
        if rc == 0 {
            if result.is_null() {
                return Ok(None);
            }
            return Ok(Some(unsafe { entry_from_passwd(&pwd) }));
        }

        if rc == libc::ERANGE && buflen < MAX_PWD_BUF_SIZE {
            buflen *= 2;
            continue;
        }

        // Several platforms report "no entry" through these errnos
        // instead of a null result.
        match rc {
            libc::ENOENT | libc::ESRCH | libc::EBADF | libc::EPERM => return Ok(None),
            errno => return Err(UserError::SyscallError { call, errno }),
        }
    }
}

fn initial_buf_size() -> usize {
    match unsafe { libc::sysconf(libc::_SC_GETPW_R_SIZE_MAX) } {
        n if n > 0 => n as usize,
        _ => DEFAULT_PWD_BUF_SIZE,
    }
}

/// Copies the borrowed C record into an owned entry.
///
/// The passwd struct must have been filled by a successful lookup and the
/// backing buffer must still be alive.
unsafe fn entry_from_passwd(pwd: &libc::passwd) -> AccountEntry {
    AccountEntry {
        username: unsafe { string_from_cstr(pwd.pw_name) },
        user_id: pwd.pw_uid,
        group_id: pwd.pw_gid,
        home_path: PathBuf::from(unsafe { string_from_cstr(pwd.pw_dir) }),
    }
}

unsafe fn string_from_cstr(ptr: *const libc::c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_has_an_account() {
        let entry = current_account().expect("current account should resolve");
        assert_eq!(entry.user_id, current_user_id());
        assert!(!entry.username.is_empty());
    }

    #[test]
    fn uid_and_name_lookups_agree() {
        let by_uid = account_by_uid(current_user_id())
            .expect("lookup should not fail")
            .expect("current uid should have an entry");
        let by_name = account_by_name(&by_uid.username)
            .expect("lookup should not fail")
            .expect("resolved name should round-trip");
        assert_eq!(by_uid, by_name);
    }

    #[test]
    fn unknown_name_is_none_not_error() {
        let entry = account_by_name("user_forge_no_such_account").expect("lookup should not fail");
        assert!(entry.is_none());
    }

    #[test]
    fn interior_nul_cannot_resolve() {
        let entry = account_by_name("ro\0ot").expect("lookup should not fail");
        assert!(entry.is_none());
    }
}
