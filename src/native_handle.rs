// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! native_handle: the generic transport header embedded at the start of
//! every platform buffer handle.  The transport only looks at this header
//! (version plus descriptor/integer counts); everything after it is payload
//! owned by the handle type.

use std::mem::size_of;

use zerocopy::AsBytes;
use zerocopy::FromBytes;

/// An OS file descriptor slot as carried inside a handle.
pub type RawDescriptor = libc::c_int;

/// The structural version stamped into every header.  Matches the C
/// convention of `version == sizeof(native_handle_t)`.
pub const NATIVE_HANDLE_VERSION: u32 = size_of::<NativeHandleHeader>() as u32;

/// Leading header of a native handle: declared size, then the number of
/// descriptor slots and plain integer slots that follow it.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AsBytes, FromBytes)]
pub struct NativeHandleHeader {
    pub version: u32,
    pub num_fds: u32,
    pub num_ints: u32,
}

impl NativeHandleHeader {
    /// Returns a header describing a handle with `num_fds` descriptor slots
    /// and `num_ints` integer slots.
    pub fn new(num_fds: u32, num_ints: u32) -> NativeHandleHeader {
        NativeHandleHeader {
            version: NATIVE_HANDLE_VERSION,
            num_fds,
            num_ints,
        }
    }

    /// Returns true if the header declares exactly the given shape.  A
    /// mismatch means the handle was produced by a different build of the
    /// platform and must not be trusted.
    pub fn matches(&self, num_fds: u32, num_ints: u32) -> bool {
        self.version == NATIVE_HANDLE_VERSION
            && self.num_fds == num_fds
            && self.num_ints == num_ints
    }
}
