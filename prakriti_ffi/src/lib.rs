#![allow(clippy::missing_safety_doc)]

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use prakriti_core::{ConstitutionResult, Dosha, Method};
use prakriti_engine::{ConstitutionEngine, EngineConfig};
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// FFI ABI version for prakriti_ffi.
///
/// Bump this when any `#[repr(C)]` struct layout or exported function signature changes.
pub const PRAKRITI_FFI_VERSION: u32 = 1;

#[no_mangle]
pub extern "C" fn prakriti_ffi_version() -> u32 {
    PRAKRITI_FFI_VERSION
}

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns 1 if this call installed it, 0 if one was already installed.
#[no_mangle]
pub extern "C" fn prakriti_init_logging() -> u8 {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok() as u8
}

/// Opaque handle exposed over FFI.
pub struct PrkEngine {
    inner: ConstitutionEngine,
}

/// FFI string view (UTF-8 bytes).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PrkStr {
    pub ptr: *const u8,
    pub len: usize,
}

impl PrkStr {
    unsafe fn as_str(&self) -> Option<&str> {
        if self.ptr.is_null() {
            return None;
        }
        let bytes = std::slice::from_raw_parts(self.ptr, self.len);
        std::str::from_utf8(bytes).ok()
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrkDosha {
    Vata = 0,
    Pitta = 1,
    Kapha = 2,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrkMethod {
    Heuristic = 0,
    Model = 1,
    Hybrid = 2,
    Fallback = 3,
}

/// Flat prediction result. The composite label is `label_ptr[..label_len]`, owned by the
/// result and released by `prakriti_result_free`.
#[repr(C)]
pub struct PrkResult {
    pub vata: f64,
    pub pitta: f64,
    pub kapha: f64,
    pub confidence: f64,
    pub dominant: PrkDosha,
    pub secondary: PrkDosha,
    pub method: PrkMethod,
    pub label_ptr: *mut u8,
    pub label_len: usize,
}

/// Owned byte buffer (JSON report).
#[repr(C)]
pub struct PrkBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

fn dosha_to_ffi(d: Dosha) -> PrkDosha {
    match d {
        Dosha::Vata => PrkDosha::Vata,
        Dosha::Pitta => PrkDosha::Pitta,
        Dosha::Kapha => PrkDosha::Kapha,
    }
}

fn method_to_ffi(m: Method) -> PrkMethod {
    match m {
        Method::Heuristic => PrkMethod::Heuristic,
        Method::Model => PrkMethod::Model,
        Method::Hybrid => PrkMethod::Hybrid,
        Method::Fallback => PrkMethod::Fallback,
    }
}

fn leak_bytes(buf: Vec<u8>) -> (*mut u8, usize) {
    let mut boxed = buf.into_boxed_slice();
    let ptr = boxed.as_mut_ptr();
    let len = boxed.len();
    // Freed by the matching *_free function.
    std::mem::forget(boxed);
    (ptr, len)
}

unsafe fn free_bytes(ptr: *mut u8, len: usize) {
    if !ptr.is_null() {
        let slice_ptr = std::ptr::slice_from_raw_parts_mut(ptr, len);
        drop(Box::from_raw(slice_ptr));
    }
}

fn result_to_ffi(r: &ConstitutionResult) -> PrkResult {
    let (label_ptr, label_len) = leak_bytes(r.composite_label.as_bytes().to_vec());
    PrkResult {
        vata: r.distribution.vata,
        pitta: r.distribution.pitta,
        kapha: r.distribution.kapha,
        confidence: r.confidence,
        dominant: dosha_to_ffi(r.dominant),
        secondary: dosha_to_ffi(r.secondary),
        method: method_to_ffi(r.method),
        label_ptr,
        label_len,
    }
}

/// Parse a JSON payload. Invalid UTF-8 or JSON is treated as an empty submission.
unsafe fn payload_value(payload: PrkStr) -> Value {
    let Some(text) = payload.as_str() else {
        return Value::Null;
    };
    serde_json::from_str(text).unwrap_or_else(|e| {
        warn!(error = %e, "payload is not valid JSON; treating as empty");
        Value::Null
    })
}

/// Create an engine handle.
///
/// `config_path` may be null/empty (defaults plus `MODEL_DIR` / `PRAKRITI_MODEL_ENABLED`).
/// An unreadable config file is logged and replaced by defaults. Never returns null.
#[no_mangle]
pub unsafe extern "C" fn prakriti_engine_new(config_path: PrkStr) -> *mut PrkEngine {
    let cfg = match config_path.as_str().filter(|p| !p.is_empty()) {
        Some(path) => EngineConfig::load(path).unwrap_or_else(|e| {
            warn!(path, error = %e, "config file unusable; using defaults");
            EngineConfig::default()
        }),
        None => EngineConfig::default(),
    }
    .with_env_overrides();

    Box::into_raw(Box::new(PrkEngine {
        inner: ConstitutionEngine::new(cfg),
    }))
}

#[no_mangle]
pub unsafe extern "C" fn prakriti_engine_free(h: *mut PrkEngine) {
    if !h.is_null() {
        drop(Box::from_raw(h));
    }
}

/// Load the classifier if needed. Returns 1 when one is available.
#[no_mangle]
pub unsafe extern "C" fn prakriti_engine_model_available(h: *const PrkEngine) -> u8 {
    if h.is_null() {
        return 0;
    }
    let handle = &*h;
    catch_unwind(AssertUnwindSafe(|| handle.inner.warm_up())).unwrap_or(false) as u8
}

/// Predict from a JSON payload. A null handle or garbage payload yields the fallback result.
/// Free with `prakriti_result_free`.
#[no_mangle]
pub unsafe extern "C" fn prakriti_predict(h: *const PrkEngine, payload: PrkStr) -> PrkResult {
    let value = payload_value(payload);
    let result = if h.is_null() {
        ConstitutionResult::fallback(0)
    } else {
        (*h).inner.predict_value(&value)
    };
    result_to_ffi(&result)
}

#[no_mangle]
pub unsafe extern "C" fn prakriti_result_free(r: PrkResult) {
    free_bytes(r.label_ptr, r.label_len);
}

/// Predict from a JSON payload and return the JSON report. Free with `prakriti_bytes_free`.
#[no_mangle]
pub unsafe extern "C" fn prakriti_predict_json(h: *const PrkEngine, payload: PrkStr) -> PrkBytes {
    let value = payload_value(payload);
    let report = if h.is_null() {
        ConstitutionResult::fallback(0).report(1)
    } else {
        (*h).inner.report(&value)
    };
    match serde_json::to_vec(&report) {
        Ok(buf) => {
            let (ptr, len) = leak_bytes(buf);
            PrkBytes { ptr, len }
        }
        Err(e) => {
            warn!(error = %e, "report serialization failed");
            PrkBytes { ptr: ptr::null_mut(), len: 0 }
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn prakriti_bytes_free(b: PrkBytes) {
    free_bytes(b.ptr, b.len);
}
