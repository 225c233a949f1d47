/*******************************************************************************
*   (c) 2024 Zondax GmbH
*
*  Licensed under the Apache License, Version 2.0 (the "License");
*  you may not use this file except in compliance with the License.
*  You may obtain a copy of the License at
*
*      http://www.apache.org/licenses/LICENSE-2.0
*
*  Unless required by applicable law or agreed to in writing, software
*  distributed under the License is distributed on an "AS IS" BASIS,
*  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
*  See the License for the specific language governing permissions and
*  limitations under the License.
********************************************************************************/
//! Thin layer over the device services the core consumes
//!
//! On the secure element these are provided by the C stub, on any other
//! target they are routed to `tracing` so host builds stay observable.

use crate::parser::ParserError;

#[cfg(target_os = "none")]
mod ffi {
    extern "C" {
        pub fn zemu_log_stack(s: *const u8);
    }
}

/// Emit a stack-probe marker, `msg` is expected to be NUL terminated
#[inline(always)]
pub fn zemu_log_stack(msg: &str) {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "none")] {
            unsafe { ffi::zemu_log_stack(msg.as_ptr()) }
        } else {
            tracing::trace!(target: "zemu", "{}", msg.trim_end_matches('\0'));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    NoData,
    Reject,
}

impl From<ParserError> for ViewError {
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::NoData
            | ParserError::DisplayIdxOutOfRange
            | ParserError::DisplayPageOutOfRange => Self::NoData,
            _ => Self::Unknown,
        }
    }
}

/// Surface driven by the review UI once a request has been parsed
pub trait Viewable {
    /// Return the number of items to render
    fn num_items(&mut self) -> Result<u8, ViewError>;

    /// Render `item_idx` into `title` and `message`
    ///
    /// If an item is too long to render in the output, the number of "pages" is returned,
    /// and each page can be retrieved via the `page_idx` parameter
    fn render_item(
        &mut self,
        item_idx: u8,
        title: &mut [u8],
        message: &mut [u8],
        page_idx: u8,
    ) -> Result<u8, ViewError>;

    /// Called when the last item shown has been "accepted"
    ///
    /// `out` is the apdu_buffer
    ///
    /// Return is number of bytes written to out and the return code
    fn accept(&mut self, apdu_response: &mut [u8]) -> (usize, u16);

    /// Called when the last item shows has been "rejected"
    /// `out` is the apdu_buffer
    ///
    /// Return is number of bytes written to out and the return code
    fn reject(&mut self, apdu_response: &mut [u8]) -> (usize, u16);
}
