use crate::error::{UserError, UserResult};
use crate::types::AccountEntry;
use std::env;
use std::io;
use std::path::PathBuf;

use log::{debug, trace};

mod win_api {
    use std::ffi::c_void;

    // USER_INFO_1, as laid out by lmaccess.h.
    #[repr(C)]
    #[allow(dead_code)] // The layout must match the API; most fields are never read
    pub struct UserInfo1 {
        pub usri1_name: *mut u16,
        pub usri1_password: *mut u16,
        pub usri1_password_age: u32,
        pub usri1_priv: u32,
        pub usri1_home_dir: *mut u16,
        pub usri1_comment: *mut u16,
        pub usri1_flags: u32,
        pub usri1_script_path: *mut u16,
    }

    pub const NERR_USER_NOT_FOUND: u32 = 2221;

    #[link(name = "advapi32")]
    unsafe extern "system" {
        pub fn GetUserNameW(lpBuffer: *mut u16, pcbBuffer: *mut u32) -> i32;
    }

    #[link(name = "netapi32")]
    unsafe extern "system" {
        pub fn NetUserGetInfo(
            servername: *const u16,
            username: *const u16,
            level: u32,
            bufptr: *mut *mut u8,
        ) -> u32;

        pub fn NetApiBufferFree(buffer: *mut c_void) -> u32;
    }
}

struct ScopedNetBuffer(*mut u8);

impl Drop for ScopedNetBuffer {
    fn drop(&mut self) {
        unsafe {
            if !self.0.is_null() {
                win_api::NetApiBufferFree(self.0 as *mut std::ffi::c_void);
            }
        }
    }
}

// UNLEN plus the terminating NUL.
const USERNAME_BUF_LEN: usize = 257;

/// Name of the account the current process is executing as.
pub(crate) fn current_username() -> UserResult<String> {
    let mut buffer = [0u16; USERNAME_BUF_LEN];
    let mut len = buffer.len() as u32;

    let ok = unsafe { win_api::GetUserNameW(buffer.as_mut_ptr(), &mut len) };
    if ok == 0 {
        return Err(UserError::Win32Error(
            io::Error::last_os_error().raw_os_error().unwrap_or(0) as u32,
        ));
    }

    // The reported length includes the terminating NUL.
    Ok(String::from_utf16_lossy(&buffer[..len.saturating_sub(1) as usize]))
}

/// Looks up the local account store entry for a username.
///
/// Returns `Ok(None)` if no such account exists. The home directory comes
/// from the account record when set; for the current user it falls back to
/// the profile directory, and may otherwise be empty.
pub(crate) fn account_by_name(username: &str) -> UserResult<Option<AccountEntry>> {
    trace!("looking up local account entry for user '{}'", username);

    let wide_name = to_wide_nul(username);
    let mut raw: *mut u8 = std::ptr::null_mut();

    let status =
        unsafe { win_api::NetUserGetInfo(std::ptr::null(), wide_name.as_ptr(), 1, &mut raw) };
    let _guard = ScopedNetBuffer(raw);

    if status == win_api::NERR_USER_NOT_FOUND {
        return Ok(None);
    }
    if status != 0 {
        return Err(UserError::Win32Error(status));
    }

    let info = unsafe { &*(raw as *const win_api::UserInfo1) };
    let resolved_name = unsafe { string_from_wide(info.usri1_name) };
    let mut home = unsafe { string_from_wide(info.usri1_home_dir) };

    // Local accounts rarely carry an explicit home directory; for the
    // current user the profile directory is the authoritative fallback.
    if home.is_empty() && is_current_user(username) {
        home = env::var("USERPROFILE").unwrap_or_default();
    }

    Ok(Some(AccountEntry {
        username: resolved_name,
        home_path: PathBuf::from(home),
    }))
}

/// Resolves the account the current process is executing as.
///
/// `GetUserNameW` vouches for the name, so the account is treated as
/// existing even when the local account store cannot see it (e.g. domain
/// accounts).
pub(crate) fn current_account() -> UserResult<AccountEntry> {
    let username = current_username()?;
    match account_by_name(&username) {
        Ok(Some(entry)) => Ok(entry),
        Ok(None) => Ok(fallback_entry(username)),
        Err(err) => {
            debug!("local account store lookup for '{}' failed: {}", username, err);
            Ok(fallback_entry(username))
        }
    }
}

fn fallback_entry(username: String) -> AccountEntry {
    AccountEntry {
        username,
        home_path: env::var_os("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_default(),
    }
}

fn is_current_user(username: &str) -> bool {
    current_username()
        .map(|current| current.eq_ignore_ascii_case(username))
        .unwrap_or(false)
}

fn to_wide_nul(s: &str) -> Vec<u16> {
    let mut wide: Vec<u16> = s.encode_utf16().collect();
    wide.push(0);
    wide
}

unsafe fn string_from_wide(ptr: *const u16) -> String {
    if ptr.is_null() {
        return String::new();
    }
    let mut len = 0;
    while unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }
    String::from_utf16_lossy(unsafe { std::slice::from_raw_parts(ptr, len) })
}
