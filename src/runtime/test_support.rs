//! Fake native pieces for runtime unit tests.

use super::error::NativeException;
use super::handle::{RawException, RawHandle};
use super::outcome::ExceptionReader;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Exception records are boxed `NativeException`s.
pub struct BoxedExceptionReader;

impl ExceptionReader for BoxedExceptionReader {
    unsafe fn read(raw: RawException) -> NativeException {
        *unsafe { Box::from_raw(raw as *mut NativeException) }
    }
}

/// Allocate an exception record the way the native side would.
pub fn raise(severity: u32, message: &str) -> RawException {
    Box::into_raw(Box::new(NativeException::new(severity, message, None))) as RawException
}

/// A fake native instance whose address is a dispose counter.
pub struct DisposeCounter(Box<AtomicUsize>);

impl DisposeCounter {
    pub fn new() -> Self {
        Self(Box::new(AtomicUsize::new(0)))
    }

    pub fn handle(&self) -> RawHandle {
        &*self.0 as *const AtomicUsize as RawHandle
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub unsafe extern "C" fn counting_dispose(instance: RawHandle) {
    let counter = unsafe { &*(instance as *const AtomicUsize) };
    counter.fetch_add(1, Ordering::SeqCst);
}
