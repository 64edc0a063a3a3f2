//! Error callback bridge.
//!
//! libxml2 reports problems through callbacks rather than return values.
//! This module routes those callbacks into an [`ErrorCapture`], which tags
//! each report with a [`FindingKind`] and appends it to an ordered list.
//!
//! Two routes exist:
//!
//! - **Context-scoped** (preferred): schema validation and schema parser
//!   contexts accept a per-context handler
//!   (`xmlSchemaSetValidStructuredErrors`,
//!   `xmlSchemaSetParserStructuredErrors`), so the capture is simply passed
//!   as the callback's user data. No global state.
//! - **Process-global**: `xmlReadMemory` has no per-call handler and reports
//!   through the global structured-error slot. [`GlobalErrorGuard`] guards
//!   that slot with a process-wide mutex: install the capture, run the
//!   parse, reset the slot to the neutral default on drop. The reset runs on
//!   every exit path, including unwinding. Concurrent parses on other
//!   threads block on the mutex, so at most one custom receiver is ever
//!   installed.

use std::ffi::CStr;
use std::marker::PhantomData;
use std::ptr;
use std::sync::{Mutex, MutexGuard};

use libc::{c_char, c_void};

use crate::finding::{Finding, FindingKind};
use crate::libxml2::{XML_ERR_ERROR, xmlError, xmlSetStructuredErrorFunc};

/// Serializes use of libxml2's global structured-error slot.
static GLOBAL_ERROR_SLOT: Mutex<()> = Mutex::new(());

/// Ordered sink for errors reported by libxml2 during one operation.
///
/// Every captured report becomes one [`Finding`] of the capture's kind, in
/// the order libxml2 delivered it.
#[derive(Debug)]
pub struct ErrorCapture {
    kind: FindingKind,
    findings: Vec<Finding>,
}

impl ErrorCapture {
    pub fn new(kind: FindingKind) -> Self {
        Self {
            kind,
            findings: Vec::new(),
        }
    }

    /// Append one report. Used by the FFI callback and by the engine for
    /// synthesized findings (e.g. a parse failure libxml2 stayed silent on).
    pub(crate) fn record(&mut self, message: &str, line: Option<u32>) {
        self.findings.push(Finding {
            kind: self.kind,
            message: message.to_string(),
            line,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Consume the capture, yielding the findings in discovery order.
    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}

/// Callback registered with libxml2 for structured error reports.
///
/// `user_data` must point at a live `ErrorCapture`. Warnings (below
/// `XML_ERR_ERROR`) are ignored; messages that are not valid UTF-8 are
/// dropped rather than garbled.
pub(crate) unsafe extern "C" fn capture_structured_error(
    user_data: *mut c_void,
    error: *mut xmlError,
) {
    if user_data.is_null() || error.is_null() {
        return;
    }
    let capture = unsafe { &mut *(user_data as *mut ErrorCapture) };
    let error = unsafe { &*error };

    if error.level < XML_ERR_ERROR || error.message.is_null() {
        return;
    }

    let message = unsafe { CStr::from_ptr(error.message as *const c_char) };
    if let Ok(message) = message.to_str() {
        let line = if error.line > 0 {
            Some(error.line as u32)
        } else {
            None
        };
        capture.record(message.trim(), line);
    }
}

/// Scoped ownership of the global structured-error slot.
///
/// Holds the slot mutex for its lifetime; `Drop` resets the slot to the
/// neutral default before the mutex is released.
pub(crate) struct GlobalErrorGuard<'a> {
    _slot: MutexGuard<'static, ()>,
    _capture: PhantomData<&'a mut ErrorCapture>,
}

impl<'a> GlobalErrorGuard<'a> {
    /// Acquire the slot and point it at `capture`.
    ///
    /// Blocks until no other thread holds the slot. A poisoned mutex is
    /// recovered: the slot itself carries no state that can be left
    /// inconsistent, since every guard resets it on drop.
    pub(crate) fn install(capture: &'a mut ErrorCapture) -> Self {
        let slot = GLOBAL_ERROR_SLOT
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        unsafe {
            xmlSetStructuredErrorFunc(
                capture as *mut ErrorCapture as *mut c_void,
                Some(capture_structured_error),
            );
        }
        Self {
            _slot: slot,
            _capture: PhantomData,
        }
    }
}

impl Drop for GlobalErrorGuard<'_> {
    fn drop(&mut self) {
        // Reset before the mutex guard is released (fields drop after this
        // body runs).
        unsafe {
            xmlSetStructuredErrorFunc(ptr::null_mut(), None);
        }
    }
}
