use std::ffi::c_void;
use std::ptr::NonNull;

use crate::ffi;

/// A native drawable target (`ANativeWindow*`) owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeWindow(NonNull<ffi::ANativeWindow>);

impl NativeWindow {
    /// Wraps a window pointer obtained from the platform, `None` when null.
    ///
    /// # Safety
    ///
    /// `ptr` must be a valid `ANativeWindow*` that outlives every session
    /// configured with it.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr.cast()).map(Self)
    }

    pub fn as_ptr(self) -> *mut ffi::ANativeWindow {
        self.0.as_ptr()
    }
}

/// The rendering-surface capability handed to a session by its owner.
///
/// Returning `None` is valid and selects host-memory output.
pub trait Surface {
    fn native_window(&self) -> Option<NativeWindow>;
}

impl Surface for NativeWindow {
    fn native_window(&self) -> Option<NativeWindow> {
        Some(*self)
    }
}

impl<S: Surface + ?Sized> Surface for &S {
    fn native_window(&self) -> Option<NativeWindow> {
        (**self).native_window()
    }
}
