//! C symbols for host-language wrappers.
//!
//! Every function returning a string hands ownership to the caller, who must
//! release it exactly once with [`didkit_free_string`]. A null return signals
//! failure; [`didkit_error_code`] and [`didkit_error_message`] then describe it
//! until the next failure on the same thread.

use std::{
    cell::RefCell,
    collections::HashSet,
    ffi::{c_char, c_int, CStr, CString},
    future::Future,
    panic::{catch_unwind, AssertUnwindSafe},
    ptr,
};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::Error;

static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();

// Addresses of the strings handed out and not yet released.
static ISSUED: Lazy<Mutex<HashSet<usize>>> = Lazy::new(|| Mutex::new(HashSet::new()));

thread_local! {
    static LAST_ERROR: RefCell<Option<(c_int, CString)>> = const { RefCell::new(None) };
}

fn set_last_error(err: &Error) {
    tracing::debug!(code = err.code(), %err, "call failed");

    let message = CString::new(err.to_string().replace('\0', "")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some((err.code(), message)));
}

/// Reads a caller-provided string argument.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives the call.
unsafe fn arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, Error> {
    if ptr.is_null() {
        return Err(Error::BoundaryMisuse(format!("{name} is null")));
    }

    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| Error::BoundaryMisuse(format!("{name} is not valid UTF-8")))
}

fn block_on<F>(future: F) -> Result<String, Error>
where
    F: Future<Output = Result<String, Error>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| Error::Internal(format!("cannot start runtime: {err}")))?
        .block_on(future)
}

/// Runs an operation, turning its outcome into an owned string or null.
fn respond(operation: impl FnOnce() -> Result<String, Error>) -> *const c_char {
    let outcome = catch_unwind(AssertUnwindSafe(operation))
        .unwrap_or_else(|_| Err(Error::Internal("operation panicked".to_string())))
        .and_then(|text| CString::new(text).map_err(|_| Error::Internal("output contains a NUL byte".to_string())));

    match outcome {
        Ok(text) => {
            let ptr = text.into_raw();
            ISSUED.lock().insert(ptr as usize);
            ptr
        }
        Err(err) => {
            set_last_error(&err);
            ptr::null()
        }
    }
}

#[no_mangle]
pub extern "C" fn didkit_get_version() -> *const c_char {
    VERSION.as_ptr().cast()
}

/// Code of the last failure on this thread, or 0 if none happened yet.
#[no_mangle]
pub extern "C" fn didkit_error_code() -> c_int {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(0, |(code, _)| *code))
}

/// Message of the last failure on this thread, or null if none happened yet.
///
/// The pointer is owned by the library and must not be released.
#[no_mangle]
pub extern "C" fn didkit_error_message() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(ptr::null(), |(_, message)| message.as_ptr()))
}

#[no_mangle]
pub extern "C" fn didkit_init_tracing() {
    crate::init_tracing();
}

#[no_mangle]
pub extern "C" fn didkit_vc_generate_ed25519_key() -> *const c_char {
    respond(crate::generate_ed25519_key)
}

/// # Safety
///
/// Arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn didkit_key_to_did(method_pattern: *const c_char, key: *const c_char) -> *const c_char {
    respond(|| crate::key_to_did(arg(method_pattern, "method pattern")?, arg(key, "key")?))
}

/// # Safety
///
/// Arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn didkit_key_to_verification_method(
    method_pattern: *const c_char,
    key: *const c_char,
) -> *const c_char {
    respond(|| {
        let method_pattern = arg(method_pattern, "method pattern")?;
        let key = arg(key, "key")?;
        block_on(crate::key_to_verification_method(method_pattern, key))
    })
}

/// # Safety
///
/// Arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn didkit_vc_issue_credential(
    credential: *const c_char,
    options: *const c_char,
    key: *const c_char,
) -> *const c_char {
    respond(|| {
        let credential = arg(credential, "credential")?;
        let options = arg(options, "options")?;
        let key = arg(key, "key")?;
        block_on(crate::issue_credential(credential, options, key))
    })
}

/// # Safety
///
/// Arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn didkit_vc_verify_credential(credential: *const c_char, options: *const c_char) -> *const c_char {
    respond(|| {
        let credential = arg(credential, "credential")?;
        let options = arg(options, "options")?;
        block_on(crate::verify_credential(credential, options))
    })
}

/// # Safety
///
/// Arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn didkit_vc_issue_presentation(
    presentation: *const c_char,
    options: *const c_char,
    key: *const c_char,
) -> *const c_char {
    respond(|| {
        let presentation = arg(presentation, "presentation")?;
        let options = arg(options, "options")?;
        let key = arg(key, "key")?;
        block_on(crate::issue_presentation(presentation, options, key))
    })
}

/// # Safety
///
/// Arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn didkit_vc_verify_presentation(
    presentation: *const c_char,
    options: *const c_char,
) -> *const c_char {
    respond(|| {
        let presentation = arg(presentation, "presentation")?;
        let options = arg(options, "options")?;
        block_on(crate::verify_presentation(presentation, options))
    })
}

/// # Safety
///
/// Arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn didkit_did_resolve(did: *const c_char, input_metadata: *const c_char) -> *const c_char {
    respond(|| {
        let did = arg(did, "did")?;
        let input_metadata = arg(input_metadata, "input metadata")?;
        block_on(crate::resolve_did(did, input_metadata))
    })
}

/// # Safety
///
/// Arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn didkit_did_url_dereference(
    did_url: *const c_char,
    input_metadata: *const c_char,
) -> *const c_char {
    respond(|| {
        let did_url = arg(did_url, "did url")?;
        let input_metadata = arg(input_metadata, "input metadata")?;
        block_on(crate::dereference_did_url(did_url, input_metadata))
    })
}

/// # Safety
///
/// Arguments must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn didkit_did_auth(
    did: *const c_char,
    options: *const c_char,
    key: *const c_char,
) -> *const c_char {
    respond(|| {
        let did = arg(did, "did")?;
        let options = arg(options, "options")?;
        let key = arg(key, "key")?;
        block_on(crate::did_auth(did, options, key))
    })
}

/// Releases a string returned by this library.
///
/// Null is ignored. A pointer this library did not hand out, or has already
/// released, is left untouched and recorded as a failure with code -1.
///
/// # Safety
///
/// `string` must not be used after it is released.
#[no_mangle]
pub unsafe extern "C" fn didkit_free_string(string: *const c_char) {
    if string.is_null() {
        return;
    }

    if !ISSUED.lock().remove(&(string as usize)) {
        tracing::error!(address = string as usize, "refusing to release an unknown string");
        set_last_error(&Error::BoundaryMisuse("string was not issued by didkit or is already released".to_string()));
        return;
    }

    drop(CString::from_raw(string.cast_mut()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(ptr: *const c_char) -> String {
        assert!(!ptr.is_null(), "call failed with code {}", didkit_error_code());
        let text = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        unsafe { didkit_free_string(ptr) };
        text
    }

    #[test]
    fn test_version() {
        let version = unsafe { CStr::from_ptr(didkit_get_version()) };
        assert_eq!(version.to_str().unwrap(), crate::VERSION);
    }

    #[test]
    fn test_null_argument() {
        let key = CString::new(owned(didkit_vc_generate_ed25519_key())).unwrap();

        let result = unsafe { didkit_key_to_did(ptr::null(), key.as_ptr()) };
        assert!(result.is_null());
        assert_eq!(didkit_error_code(), -1);

        let message = unsafe { CStr::from_ptr(didkit_error_message()) };
        assert_eq!(message.to_str().unwrap(), "method pattern is null");
    }

    #[test]
    fn test_invalid_utf8_argument() {
        let bytes = CString::new(vec![0xff, 0xfe]).unwrap();
        let key = CString::new(owned(didkit_vc_generate_ed25519_key())).unwrap();

        let result = unsafe { didkit_key_to_did(bytes.as_ptr(), key.as_ptr()) };
        assert!(result.is_null());
        assert_eq!(didkit_error_code(), -1);
    }

    #[test]
    fn test_double_release_is_rejected() {
        let ptr = didkit_vc_generate_ed25519_key();
        assert!(!ptr.is_null());

        unsafe { didkit_free_string(ptr) };
        unsafe { didkit_free_string(ptr) };
        assert_eq!(didkit_error_code(), -1);
    }

    #[test]
    fn test_foreign_pointer_is_rejected() {
        let foreign = CString::new("not ours").unwrap();

        unsafe { didkit_free_string(foreign.as_ptr()) };
        assert_eq!(didkit_error_code(), -1);
    }

    #[test]
    fn test_last_error_is_per_thread() {
        let pattern = CString::new("unknown").unwrap();
        let key = CString::new("{}").unwrap();

        let result = unsafe { didkit_key_to_did(pattern.as_ptr(), key.as_ptr()) };
        assert!(result.is_null());
        assert_eq!(didkit_error_code(), 2);

        let other = std::thread::spawn(|| didkit_error_code()).join().unwrap();
        assert_eq!(other, 0);
        assert_eq!(didkit_error_code(), 2);
    }
}
