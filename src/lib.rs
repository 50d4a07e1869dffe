// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! A crate for creating, validating and inspecting gralloc buffer handles
//! without exposing their platform-specific layout.

mod formats;
mod gralloc_handle;
mod gralloc_utils;
#[macro_use]
mod macros;
mod native_handle;

pub use crate::formats::*;
pub use crate::gralloc_handle::validate_tagged;
pub use crate::gralloc_handle::GrallocHandle;
pub use crate::gralloc_handle::GRALLOC_HANDLE_MAGIC;
pub use crate::gralloc_handle::GRALLOC_HANDLE_NUM_FDS;
pub use crate::gralloc_handle::GRALLOC_HANDLE_NUM_INTS;
pub use crate::gralloc_utils::*;
pub use crate::native_handle::NativeHandleHeader;
pub use crate::native_handle::RawDescriptor;
pub use crate::native_handle::NATIVE_HANDLE_VERSION;
