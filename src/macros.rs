// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Macros for gralloc_handle.

/// Validates a possibly-absent handle reference, tagging any failure log
/// with the calling module and line.
#[macro_export]
macro_rules! gralloc_handle_validate {
    ($handle:expr) => {
        $crate::validate_tagged($handle, module_path!(), line!())
    };
}
