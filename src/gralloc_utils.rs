// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! gralloc_utils: error type, result alias and usage flags shared by the
//! rest of the crate.

use libc::c_int;
use remain::sorted;
use thiserror::Error;

/// An error generated while using this crate.
#[sorted]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GrallocError {
    /// A handle was requested with a zero width or height.
    #[error("invalid gralloc handle dimensions")]
    InvalidDimensions,
    /// A handle encoding had the wrong length.
    #[error("handle encoding has invalid length: {0} bytes")]
    InvalidEncoding(usize),
    /// A handle failed structural validation (version, counts or magic).
    #[error("invalid gralloc handle")]
    InvalidHandle,
}

impl GrallocError {
    /// Status code for C callers, following the kernel convention of
    /// negated errno values.
    pub fn errno(&self) -> c_int {
        match self {
            GrallocError::InvalidDimensions => -libc::EINVAL,
            GrallocError::InvalidEncoding(_) => -libc::EINVAL,
            GrallocError::InvalidHandle => -libc::EINVAL,
        }
    }
}

/// The result of an operation in this crate.
pub type GrallocResult<T> = std::result::Result<T, GrallocError>;

/*
 * Usage bits are copied from minigbm; redundant legacy flags are left out.
 */
const GRALLOC_USE_SCANOUT: u32 = 1 << 0;
const GRALLOC_USE_RENDERING: u32 = 1 << 2;
const GRALLOC_USE_LINEAR: u32 = 1 << 4;
const GRALLOC_USE_TEXTURING: u32 = 1 << 5;
const GRALLOC_USE_PROTECTED: u32 = 1 << 8;
const GRALLOC_USE_SW_READ_OFTEN: u32 = 1 << 9;
const GRALLOC_USE_SW_WRITE_OFTEN: u32 = 1 << 11;

/// Usage flags describing what a buffer allocation will be used for.  The
/// handle stores the raw bitmask; this type exists so callers can build one
/// without spelling out bit positions.
#[derive(Copy, Clone, Eq, PartialEq, Default)]
pub struct GrallocUsageFlags(pub u32);

impl GrallocUsageFlags {
    /// Returns an empty set of flags.
    #[inline(always)]
    pub fn empty() -> GrallocUsageFlags {
        GrallocUsageFlags(0)
    }

    /// Wraps a raw usage bitmask, e.g. one read back from a handle.
    #[inline(always)]
    pub fn new(raw: u32) -> GrallocUsageFlags {
        GrallocUsageFlags(raw)
    }

    fn set_flag(self, bitmask: u32, set: bool) -> GrallocUsageFlags {
        if set {
            GrallocUsageFlags(self.0 | bitmask)
        } else {
            GrallocUsageFlags(self.0 & !bitmask)
        }
    }

    /// Sets the scanout flag's presence.
    #[inline(always)]
    pub fn use_scanout(self, e: bool) -> GrallocUsageFlags {
        self.set_flag(GRALLOC_USE_SCANOUT, e)
    }

    /// Sets the rendering flag's presence.
    #[inline(always)]
    pub fn use_rendering(self, e: bool) -> GrallocUsageFlags {
        self.set_flag(GRALLOC_USE_RENDERING, e)
    }

    /// Sets the linear-layout flag's presence.
    #[inline(always)]
    pub fn use_linear(self, e: bool) -> GrallocUsageFlags {
        self.set_flag(GRALLOC_USE_LINEAR, e)
    }

    /// Sets the texturing flag's presence.
    #[inline(always)]
    pub fn use_texturing(self, e: bool) -> GrallocUsageFlags {
        self.set_flag(GRALLOC_USE_TEXTURING, e)
    }

    /// Sets the protected-content flag's presence.
    #[inline(always)]
    pub fn use_protected(self, e: bool) -> GrallocUsageFlags {
        self.set_flag(GRALLOC_USE_PROTECTED, e)
    }

    /// Sets the SW read flag's presence.
    #[inline(always)]
    pub fn use_sw_read(self, e: bool) -> GrallocUsageFlags {
        self.set_flag(GRALLOC_USE_SW_READ_OFTEN, e)
    }

    /// Sets the SW write flag's presence.
    #[inline(always)]
    pub fn use_sw_write(self, e: bool) -> GrallocUsageFlags {
        self.set_flag(GRALLOC_USE_SW_WRITE_OFTEN, e)
    }

    /// Returns true if the rendering flag is set.
    #[inline(always)]
    pub fn uses_rendering(self) -> bool {
        self.0 & GRALLOC_USE_RENDERING != 0
    }

    /// Returns true if the buffer will be accessed by the CPU.
    #[inline(always)]
    pub fn host_visible(self) -> bool {
        self.0 & GRALLOC_USE_SW_READ_OFTEN != 0 || self.0 & GRALLOC_USE_SW_WRITE_OFTEN != 0
    }
}

impl From<GrallocUsageFlags> for u32 {
    fn from(flags: GrallocUsageFlags) -> u32 {
        flags.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_set_and_clear() {
        let flags = GrallocUsageFlags::empty()
            .use_scanout(true)
            .use_rendering(true);
        assert!(flags.uses_rendering());

        let flags = flags.use_rendering(false);
        assert!(!flags.uses_rendering());
        assert_eq!(u32::from(flags), GRALLOC_USE_SCANOUT);
    }

    #[test]
    fn host_visible_tracks_sw_access() {
        assert!(!GrallocUsageFlags::empty().host_visible());
        assert!(GrallocUsageFlags::empty().use_sw_read(true).host_visible());
        assert!(GrallocUsageFlags::empty().use_sw_write(true).host_visible());
    }

    #[test]
    fn errno_follows_kernel_convention() {
        assert_eq!(GrallocError::InvalidHandle.errno(), -libc::EINVAL);
        assert_eq!(GrallocError::InvalidDimensions.errno(), -libc::EINVAL);
    }
}
