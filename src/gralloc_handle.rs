// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! gralloc_handle: the platform buffer handle itself.  Drivers and the
//! display framework only ever go through the functions here, never through
//! the layout, so the layout can change without recompiling them.

use std::mem::size_of;
use std::sync::atomic::compiler_fence;
use std::sync::atomic::Ordering;

use libc::pid_t;
use log::error;
use zerocopy::AsBytes;
use zerocopy::FromBytes;

use crate::gralloc_utils::GrallocError;
use crate::gralloc_utils::GrallocResult;
use crate::native_handle::NativeHandleHeader;
use crate::native_handle::RawDescriptor;

/// Tag stamped into every live handle.  Value taken from the libdrm gralloc
/// handle so both sides of the driver boundary agree.
pub const GRALLOC_HANDLE_MAGIC: u32 = 0x6058_5350;

/// Number of descriptor slots in the handle.
pub const GRALLOC_HANDLE_NUM_FDS: u32 = 1;

/// Number of integer slots in the handle, derived from the payload size so
/// the constant can never drift from the layout.
pub const GRALLOC_HANDLE_NUM_INTS: u32 = ((size_of::<GrallocHandle>()
    - size_of::<NativeHandleHeader>())
    / size_of::<u32>()) as u32
    - GRALLOC_HANDLE_NUM_FDS;

/// A gralloc buffer handle: the native-handle header followed by the buffer
/// metadata, in the field order every participating component was compiled
/// against.
///
/// `width`, `height`, `format` and `usage` are fixed at creation.  The
/// mutable fields require `&mut`, so exclusive write access is enforced by
/// the borrow checker rather than by caller discipline as in the C layout.
/// Readers holding `&GrallocHandle` are expected to have validated it first;
/// accessors do not re-check.
#[repr(C)]
#[derive(Debug, AsBytes, FromBytes)]
pub struct GrallocHandle {
    header: NativeHandleHeader,
    fd: RawDescriptor,
    magic: u32,
    width: u32,
    height: u32,
    format: u32,
    stride: u32,
    usage: u32,
    pid: pid_t,
    /// Explicit padding so `data` stays 8-aligned and the layout has no
    /// compiler-inserted holes.
    pad: u32,
    data: u64,
}

impl GrallocHandle {
    /// Creates a handle for a buffer of the given dimensions, pixel format
    /// and usage bitmask.  The descriptor starts out unset (-1) and the
    /// stride at 0 until the allocator fills them in.
    pub fn new(width: u32, height: u32, format: u32, usage: u32) -> GrallocResult<Box<GrallocHandle>> {
        if width == 0 || height == 0 {
            return Err(GrallocError::InvalidDimensions);
        }

        Ok(Box::new(GrallocHandle {
            header: NativeHandleHeader::new(GRALLOC_HANDLE_NUM_FDS, GRALLOC_HANDLE_NUM_INTS),
            fd: -1,
            magic: GRALLOC_HANDLE_MAGIC,
            width,
            height,
            format,
            stride: 0,
            usage,
            pid: 0,
            pad: 0,
            data: 0,
        }))
    }

    /// Destroys the handle.  Equivalent to dropping the box; provided so
    /// every `new` has a named counterpart.
    pub fn free(self: Box<Self>) {
        drop(self);
    }

    fn invalidate(&mut self) {
        self.magic = 0;
        // The cleared tag must be visible before the allocation is
        // reclaimed, so a racing validator never trusts freed memory.
        compiler_fence(Ordering::SeqCst);
    }

    /// Gets the prime fd, or -1 if none has been assigned.
    pub fn fd(&self) -> RawDescriptor {
        self.fd
    }

    /// Sets the prime fd.  The handle stores the value only; it does not
    /// take ownership of the descriptor.
    pub fn set_fd(&mut self, fd: RawDescriptor) {
        self.fd = fd;
    }

    /// Gets the width in pixels; immutable.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Gets the height in pixels; immutable.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Gets the fourcc pixel format; immutable.
    pub fn format(&self) -> u32 {
        self.format
    }

    /// Gets the usage bitmask; immutable.
    pub fn usage(&self) -> u32 {
        self.usage
    }

    /// Gets the stride in pixels, 0 until the allocator has set it.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Sets the stride in pixels.
    pub fn set_stride(&mut self, stride: u32) {
        self.stride = stride;
    }

    /// Gets the driver-private data word, typically a buffer-object pointer
    /// in the owning process.
    pub fn data(&self) -> u64 {
        self.data
    }

    /// Gets the pid of the process that owns the data word.
    pub fn data_owner(&self) -> pid_t {
        self.pid
    }

    /// Sets the driver-private data word along with its owner.  The two are
    /// only meaningful together, so there is no way to set one alone.
    pub fn set_data(&mut self, data: u64, data_owner: pid_t) {
        self.data = data;
        self.pid = data_owner;
    }

    /// Returns the handle's bytes in declared field order, suitable for
    /// handing to the native-handle transport.
    pub fn encode(&self) -> &[u8] {
        self.as_bytes()
    }

    /// Reconstructs a handle from its encoded bytes, rejecting anything
    /// whose length, header or tag does not match this build.
    ///
    /// The descriptor slot decodes verbatim: it names a descriptor in the
    /// sending process only, until the transport re-plumbs it on the
    /// receiving side.
    pub fn decode(bytes: &[u8]) -> GrallocResult<Box<GrallocHandle>> {
        if bytes.len() != size_of::<GrallocHandle>() {
            return Err(GrallocError::InvalidEncoding(bytes.len()));
        }

        let handle = GrallocHandle::read_from(bytes).ok_or(GrallocError::InvalidHandle)?;
        if !handle
            .header
            .matches(GRALLOC_HANDLE_NUM_FDS, GRALLOC_HANDLE_NUM_INTS)
            || handle.magic != GRALLOC_HANDLE_MAGIC
        {
            return Err(GrallocError::InvalidHandle);
        }

        Ok(Box::new(handle))
    }
}

impl Drop for GrallocHandle {
    fn drop(&mut self) {
        self.invalidate();
    }
}

/// Validates a possibly-absent handle.  `None` is trivially valid; anything
/// else must carry the expected header shape and magic tag.  Failures are
/// logged with the caller tag and surfaced as `InvalidHandle`; use the
/// `gralloc_handle_validate!` macro to fill the tag in automatically.
pub fn validate_tagged(
    handle: Option<&GrallocHandle>,
    func: &str,
    line: u32,
) -> GrallocResult<()> {
    let Some(hnd) = handle else {
        return Ok(());
    };

    if !hnd
        .header
        .matches(GRALLOC_HANDLE_NUM_FDS, GRALLOC_HANDLE_NUM_INTS)
        || hnd.magic != GRALLOC_HANDLE_MAGIC
    {
        error!(
            "{}({}): invalid handle: version={}, num_ints={}, num_fds={}, magic={:#x}",
            func, line, hnd.header.version, hnd.header.num_ints, hnd.header.num_fds, hnd.magic
        );
        return Err(GrallocError::InvalidHandle);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::DRM_FORMAT_NV12;
    use crate::gralloc_handle_validate;
    use crate::formats::DRM_FORMAT_XRGB8888;
    use crate::gralloc_utils::GrallocUsageFlags;

    #[test]
    fn layout_matches_platform_constants() {
        assert_eq!(size_of::<GrallocHandle>(), 56);
        assert_eq!(GRALLOC_HANDLE_NUM_FDS, 1);
        assert_eq!(GRALLOC_HANDLE_NUM_INTS, 10);
    }

    #[test]
    fn create_copies_immutable_fields() {
        let usage = GrallocUsageFlags::empty().use_scanout(true).use_linear(true);
        let handle = GrallocHandle::new(1920, 1080, DRM_FORMAT_XRGB8888, usage.into()).unwrap();

        assert_eq!(handle.width(), 1920);
        assert_eq!(handle.height(), 1080);
        assert_eq!(handle.format(), DRM_FORMAT_XRGB8888);
        assert_eq!(handle.usage(), u32::from(usage));
        assert_eq!(handle.stride(), 0);
        assert_eq!(handle.fd(), -1);
        assert_eq!(handle.data(), 0);
        assert_eq!(handle.data_owner(), 0);
        assert!(gralloc_handle_validate!(Some(&handle)).is_ok());
    }

    #[test]
    fn create_rejects_zero_dimensions() {
        assert_eq!(
            GrallocHandle::new(0, 1080, DRM_FORMAT_XRGB8888, 0).unwrap_err(),
            GrallocError::InvalidDimensions
        );
        assert_eq!(
            GrallocHandle::new(1920, 0, DRM_FORMAT_XRGB8888, 0).unwrap_err(),
            GrallocError::InvalidDimensions
        );
    }

    #[test]
    fn setters_round_trip() {
        let mut handle = GrallocHandle::new(640, 480, DRM_FORMAT_NV12, 0).unwrap();

        handle.set_fd(27);
        assert_eq!(handle.fd(), 27);

        handle.set_stride(768);
        assert_eq!(handle.stride(), 768);

        handle.set_data(0xdead_beef_cafe, 4242);
        assert_eq!(handle.data(), 0xdead_beef_cafe);
        assert_eq!(handle.data_owner(), 4242);

        // Releasing the pair back to "unset" goes through the same setter.
        handle.set_data(0, 0);
        assert_eq!(handle.data(), 0);
        assert_eq!(handle.data_owner(), 0);
    }

    #[test]
    fn mutation_leaves_immutable_fields_alone() {
        let mut handle = GrallocHandle::new(640, 480, DRM_FORMAT_NV12, 0x30).unwrap();

        handle.set_fd(5);
        handle.set_stride(704);
        handle.set_data(0x1000, 99);

        assert_eq!(handle.width(), 640);
        assert_eq!(handle.height(), 480);
        assert_eq!(handle.format(), DRM_FORMAT_NV12);
        assert_eq!(handle.usage(), 0x30);
        assert_eq!(handle.fd(), 5);
        assert_eq!(handle.stride(), 704);
        assert_eq!(handle.data(), 0x1000);
        assert_eq!(handle.data_owner(), 99);
    }

    #[test]
    fn validate_accepts_absent_handle() {
        assert!(gralloc_handle_validate!(None).is_ok());
    }

    #[test]
    fn validate_rejects_cleared_tag() {
        let mut handle = GrallocHandle::new(16, 16, DRM_FORMAT_XRGB8888, 0).unwrap();
        assert!(gralloc_handle_validate!(Some(&handle)).is_ok());

        handle.invalidate();
        assert_eq!(
            gralloc_handle_validate!(Some(&handle)).unwrap_err(),
            GrallocError::InvalidHandle
        );
    }

    #[test]
    fn validate_rejects_header_skew() {
        let mut handle = GrallocHandle::new(16, 16, DRM_FORMAT_XRGB8888, 0).unwrap();
        handle.header.num_ints += 1;
        assert_eq!(
            gralloc_handle_validate!(Some(&handle)).unwrap_err(),
            GrallocError::InvalidHandle
        );
    }

    #[test]
    fn encode_decode_round_trips() {
        let mut handle = GrallocHandle::new(1280, 720, DRM_FORMAT_XRGB8888, 0x205).unwrap();
        handle.set_fd(11);
        handle.set_stride(1280);
        handle.set_data(0xab54_a98c_eb1f_0ad2, 31337);

        let decoded = GrallocHandle::decode(handle.encode()).unwrap();

        assert_eq!(decoded.width(), 1280);
        assert_eq!(decoded.height(), 720);
        assert_eq!(decoded.format(), DRM_FORMAT_XRGB8888);
        assert_eq!(decoded.usage(), 0x205);
        assert_eq!(decoded.fd(), 11);
        assert_eq!(decoded.stride(), 1280);
        assert_eq!(decoded.data(), 0xab54_a98c_eb1f_0ad2);
        assert_eq!(decoded.data_owner(), 31337);
        assert!(gralloc_handle_validate!(Some(&decoded)).is_ok());
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let handle = GrallocHandle::new(16, 16, DRM_FORMAT_XRGB8888, 0).unwrap();
        let bytes = handle.encode();

        assert_eq!(
            GrallocHandle::decode(&bytes[..bytes.len() - 4]).unwrap_err(),
            GrallocError::InvalidEncoding(bytes.len() - 4)
        );
    }

    #[test]
    fn decode_rejects_corrupt_payload() {
        let handle = GrallocHandle::new(16, 16, DRM_FORMAT_XRGB8888, 0).unwrap();

        // The magic sits right after the header and descriptor slot.
        let mut bytes = handle.encode().to_vec();
        bytes[16..20].fill(0);
        assert_eq!(
            GrallocHandle::decode(&bytes).unwrap_err(),
            GrallocError::InvalidHandle
        );

        // Descriptor-count skew in the header is rejected the same way.
        let mut bytes = handle.encode().to_vec();
        bytes[4] += 1;
        assert_eq!(
            GrallocHandle::decode(&bytes).unwrap_err(),
            GrallocError::InvalidHandle
        );
    }

    #[test]
    fn free_consumes_the_handle() {
        let handle = GrallocHandle::new(16, 16, DRM_FORMAT_XRGB8888, 0).unwrap();
        handle.free();
    }
}
