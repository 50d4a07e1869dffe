// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! formats: DRM fourcc constants for the handle's `format` field.  Only the
//! formats gralloc clients actually request are listed.

/// Packs a [fourcc](https://en.wikipedia.org/wiki/FourCC) code into the
/// little-endian u32 the handle stores.
pub const fn drm_fourcc(code: [u8; 4]) -> u32 {
    (code[0] as u32) | (code[1] as u32) << 8 | (code[2] as u32) << 16 | (code[3] as u32) << 24
}

pub const DRM_FORMAT_R8: u32 = drm_fourcc(*b"R8  ");

pub const DRM_FORMAT_RGB565: u32 = drm_fourcc(*b"RG16");

pub const DRM_FORMAT_XRGB8888: u32 = drm_fourcc(*b"XR24");
pub const DRM_FORMAT_XBGR8888: u32 = drm_fourcc(*b"XB24");

pub const DRM_FORMAT_ARGB8888: u32 = drm_fourcc(*b"AR24");
pub const DRM_FORMAT_ABGR8888: u32 = drm_fourcc(*b"AB24");

pub const DRM_FORMAT_XRGB2101010: u32 = drm_fourcc(*b"XR30");
pub const DRM_FORMAT_ABGR2101010: u32 = drm_fourcc(*b"AB30");

pub const DRM_FORMAT_NV12: u32 = drm_fourcc(*b"NV12");
pub const DRM_FORMAT_YVU420: u32 = drm_fourcc(*b"YV12");
