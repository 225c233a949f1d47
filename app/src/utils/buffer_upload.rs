/*******************************************************************************
*   (c) 2021 Zondax GmbH
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
use core::convert::TryFrom;

use crate::{constants::ApduError as Error, sys};

use super::{ApduBufferRead, ChunkBuffer};

/// Phase of a chunked upload, carried in P1
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub enum PacketType {
    Init = 0,
    Add = 1,
    Last = 2,
}

impl TryFrom<u8> for PacketType {
    type Error = Error;

    fn try_from(from: u8) -> Result<Self, Self::Error> {
        match from {
            0 => Ok(Self::Init),
            1 => Ok(Self::Add),
            2 => Ok(Self::Last),
            _ => Err(Error::InvalidP1P2),
        }
    }
}

impl PacketType {
    pub fn is_init(&self) -> bool {
        matches!(self, Self::Init)
    }

    pub fn is_last(&self) -> bool {
        matches!(self, Self::Last)
    }
}

/// What a single packet did to the upload
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub enum Upload<'p> {
    /// The buffer was rewound, carries the INIT payload for the caller to interpret
    Started(&'p [u8]),
    /// More data is expected
    Pending,
    /// The final chunk was appended, the buffer holds the whole request
    Complete,
}

/// Reassembles a multi-packet request into a [`ChunkBuffer`]
pub struct Uploader<'b, 's> {
    buffer: &'b mut ChunkBuffer<'s>,
    initialized: bool,
}

impl<'b, 's> Uploader<'b, 's> {
    /// `initialized` tells whether an INIT was accepted for the request in flight
    pub fn new(buffer: &'b mut ChunkBuffer<'s>, initialized: bool) -> Self {
        Self {
            buffer,
            initialized,
        }
    }

    #[inline(never)]
    pub fn upload<'p>(self, apdu: &'p ApduBufferRead<'_>) -> Result<Upload<'p>, Error> {
        sys::zemu_log_stack("Uploader::upload\x00");

        let packet_type = PacketType::try_from(apdu.p1())?;
        let payload = apdu.payload().map_err(|_| Error::WrongLength)?;

        if packet_type.is_init() {
            self.buffer.reset();
            return Ok(Upload::Started(payload));
        }

        if !self.initialized {
            return Err(Error::TxNotInitialized);
        }

        self.buffer.append(payload).map_err(|e| {
            tracing::warn!(needed = e.needed, available = e.available, "request too large");
            Error::OutputBufferTooSmall
        })?;

        if packet_type.is_last() {
            Ok(Upload::Complete)
        } else {
            Ok(Upload::Pending)
        }
    }
}
