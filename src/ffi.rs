//! FFI bindings for SilentRisk
//!
//! C-compatible functions for embedding the check-in core in a native app.
//! All strings are null-terminated UTF-8. Strings returned by this module are
//! heap-allocated and must be released with `silentrisk_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::CheckinError;
use crate::flow::{Action, FlowController};
use crate::report::ReportBuilder;
use crate::storage::{FileStorage, DEFAULT_STORAGE_KEY};
use crate::session::Session;
use crate::types::{Accuracy, CheckinData, ContextData, FeedbackData, Influence};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Map a result to the C status convention (0 ok, -1 error)
fn status(result: Result<(), CheckinError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score a check-in and return the results report as JSON.
///
/// `checkin_json` is a CheckinData object (camelCase fields); `context_json`
/// is a ContextData object or NULL for no context.
///
/// # Safety
/// - `checkin_json` must be a valid null-terminated C string.
/// - `context_json` must be NULL or a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `silentrisk_free_string`.
/// - Returns NULL on error; call `silentrisk_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_assess(
    checkin_json: *const c_char,
    context_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let checkin_str = match cstr_to_string(checkin_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid check-in string pointer");
            return ptr::null_mut();
        }
    };

    let result = (|| -> Result<String, CheckinError> {
        let checkin: CheckinData = serde_json::from_str(&checkin_str)?;
        let context: ContextData = match cstr_to_string(context_json) {
            Some(s) => {
                let raw: ContextData = serde_json::from_str(&s)?;
                raw.with_influences(&raw.influences)
            }
            None => ContextData::default(),
        };
        ReportBuilder::new()
            .build_parts(&checkin, &context, &FeedbackData::default())
            .to_json()
    })();

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Session API
// ============================================================================

/// Opaque handle to a persisted check-in session
pub struct SessionHandle {
    flow: FlowController<FileStorage>,
}

/// Open (or restore) the session stored in `storage_dir`.
///
/// # Safety
/// - `storage_dir` must be a valid null-terminated C string.
/// - Returns a pointer that must be freed with `silentrisk_session_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_session_open(storage_dir: *const c_char) -> *mut SessionHandle {
    clear_last_error();

    let dir = match cstr_to_string(storage_dir) {
        Some(s) => s,
        None => {
            set_last_error("Invalid storage directory pointer");
            return ptr::null_mut();
        }
    };

    let session = Session::open_with_key(FileStorage::new(dir), DEFAULT_STORAGE_KEY);
    let handle = Box::new(SessionHandle {
        flow: FlowController::with_session(session),
    });
    Box::into_raw(handle)
}

/// Free a session handle. Stored data is kept.
///
/// # Safety
/// - `handle` must be a pointer returned by `silentrisk_session_open`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_session_free(handle: *mut SessionHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Apply a screen action (`get_started`, `accept_consent`, `back`,
/// `complete_checkin`, `analyze`, `start_over`).
///
/// # Safety
/// - `handle` must be a valid session handle.
/// - `action` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_session_dispatch(
    handle: *mut SessionHandle,
    action: *const c_char,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    let handle = &mut *handle;

    let action_str = match cstr_to_string(action) {
        Some(s) => s,
        None => {
            set_last_error("Invalid action string pointer");
            return -1;
        }
    };

    status((|| {
        let action: Action = serde_json::from_value(serde_json::Value::String(action_str))?;
        handle.flow.dispatch(action).map(|_| ())
    })())
}

/// Answer the active check-in question.
///
/// # Safety
/// - `handle` must be a valid session handle.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_session_answer(handle: *mut SessionHandle, value: i32) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    let handle = &mut *handle;

    status(handle.flow.answer(value).map(|_| ()))
}

/// Move to the next (`direction > 0`) or previous (`direction <= 0`) question.
///
/// # Safety
/// - `handle` must be a valid session handle.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_session_step_question(
    handle: *mut SessionHandle,
    direction: i32,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    let handle = &mut *handle;

    let result = if direction > 0 {
        handle.flow.next_question()
    } else {
        handle.flow.previous_question()
    };
    status(result.map(|_| ()))
}

/// Toggle an influence tag on the context screen.
///
/// # Safety
/// - `handle` must be a valid session handle.
/// - `tag` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_session_toggle_influence(
    handle: *mut SessionHandle,
    tag: *const c_char,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    let handle = &mut *handle;

    let tag_str = match cstr_to_string(tag) {
        Some(s) => s,
        None => {
            set_last_error("Invalid tag string pointer");
            return -1;
        }
    };

    status((|| {
        let tag: Influence = tag_str.parse()?;
        handle.flow.toggle_influence(tag).map(|_| ())
    })())
}

/// Record the accuracy answer on the results screen (`yes`, `somewhat`, `no`).
///
/// # Safety
/// - `handle` must be a valid session handle.
/// - `accuracy` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_session_feedback(
    handle: *mut SessionHandle,
    accuracy: *const c_char,
) -> i32 {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    let handle = &mut *handle;

    let accuracy_str = match cstr_to_string(accuracy) {
        Some(s) => s,
        None => {
            set_last_error("Invalid accuracy string pointer");
            return -1;
        }
    };

    status((|| {
        let accuracy: Accuracy = accuracy_str.parse()?;
        handle.flow.record_feedback(accuracy).map(|_| ())
    })())
}

/// Current session state as JSON.
///
/// # Safety
/// - `handle` must be a valid session handle.
/// - Returns a newly allocated string that must be freed with `silentrisk_free_string`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_session_state(handle: *mut SessionHandle) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }
    let handle = &*handle;

    match serde_json::to_string(handle.flow.state()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Results report for the session as JSON, recomputed on each call.
///
/// # Safety
/// - `handle` must be a valid session handle.
/// - Returns a newly allocated string that must be freed with `silentrisk_free_string`.
/// - Returns NULL when the results screen is not active or on error.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_session_report(handle: *mut SessionHandle) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }
    let handle = &mut *handle;

    let Some(report) = handle.flow.results() else {
        set_last_error("Results screen is not active");
        return ptr::null_mut();
    };

    match report.to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by SilentRisk functions.
///
/// # Safety
/// - `ptr` must be a pointer returned by a SilentRisk function, or NULL.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is thread-local and valid until the next SilentRisk call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn silentrisk_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
