//! Memory protection for secret material
//!
//! Two hardening measures for the bytes a signing session touches:
//!
//! 1. **Core dump prevention** via `setrlimit(RLIMIT_CORE, 0)`, so a crash in
//!    the host process never writes a seed to disk.
//!
//! 2. **Locked buffers**: fixed-size heap buffers that are `mlock`ed while alive
//!    and zeroized before being unlocked and freed.
//!
//! Both are best effort. Containers and unprivileged users frequently refuse
//! `mlock`, so failures are logged at `warn` level and never abort.

use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;
use zeroize::Zeroize;

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Callers that hold seeds for any length of time should invoke this once at
/// startup. Returns `true` if core dumps are (now or already) disabled.
///
/// ```
/// ownproof_core::memory::disable_core_dumps();
/// ```
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.swap(true, Ordering::SeqCst) {
        return true;
    }

    #[cfg(unix)]
    let disabled = sys::disable_core_dumps();

    #[cfg(not(unix))]
    let disabled = {
        warn!("core dump prevention is not supported on this platform");
        false
    };

    if !disabled {
        CORE_DUMPS_DISABLED.store(false, Ordering::SeqCst);
    }
    disabled
}

/// A fixed-size, heap-allocated byte buffer that is locked into RAM for its
/// whole lifetime and zeroized on drop.
///
/// The contents live behind a `Box` so that moving the `LockedBuffer` never
/// copies the secret bytes to a new, unlocked location.
pub struct LockedBuffer<const N: usize> {
    data: Box<[u8; N]>,
    locked: bool,
}

impl<const N: usize> LockedBuffer<N> {
    /// Allocate a zero-filled buffer and try to lock it.
    pub fn zeroed() -> Self {
        let data = Box::new([0u8; N]);
        let locked = sys::lock(data.as_ptr(), N);
        if !locked {
            warn!("could not lock {} bytes of secret memory; it may be swapped", N);
        }
        Self { data, locked }
    }

    /// Allocate a locked buffer holding a copy of `bytes`.
    pub fn from_array(bytes: &[u8; N]) -> Self {
        let mut buf = Self::zeroed();
        buf.data.copy_from_slice(bytes);
        buf
    }

    pub fn as_array(&self) -> &[u8; N] {
        &self.data
    }

    pub fn as_mut_array(&mut self) -> &mut [u8; N] {
        &mut self.data
    }

    /// Whether the OS accepted the lock request.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl<const N: usize> Drop for LockedBuffer<N> {
    fn drop(&mut self) {
        self.data.zeroize();
        if self.locked {
            sys::unlock(self.data.as_ptr(), N);
        }
    }
}

#[cfg(unix)]
mod sys {
    use log::warn;

    pub fn disable_core_dumps() -> bool {
        let rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit only reads the struct we pass it.
        let result = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) };
        if result != 0 {
            warn!(
                "failed to disable core dumps: {}",
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    pub fn lock(ptr: *const u8, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        // SAFETY: callers pass a pointer to a live allocation of `len` bytes.
        unsafe { libc::mlock(ptr as *const libc::c_void, len) == 0 }
    }

    pub fn unlock(ptr: *const u8, len: usize) {
        if len == 0 {
            return;
        }
        // SAFETY: same region that was passed to `lock`.
        unsafe {
            libc::munlock(ptr as *const libc::c_void, len);
        }
    }
}

#[cfg(not(unix))]
mod sys {
    pub fn lock(_ptr: *const u8, len: usize) -> bool {
        len == 0
    }

    pub fn unlock(_ptr: *const u8, _len: usize) {}
}
