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
// Based on ISO7816
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApduError {
    ExecutionError = 0x6400,
    WrongLength = 0x6700,
    ApduCodeEmptyBuffer = 0x6982,
    OutputBufferTooSmall = 0x6983,
    DataInvalid = 0x6984,
    ApduCodeConditionsNotSatisfied = 0x6985,
    CommandNotAllowed = 0x6986,
    TxNotInitialized = 0x6987,
    BadKeyHandle = 0x6A80,
    InvalidP1P2 = 0x6B00,
    InsNotSupported = 0x6D00,
    ClaNotSupported = 0x6E00,
    Unknown = 0x6F00,
    SignVerifyError = 0x6F01,
    Success = 0x9000,
    Busy = 0x9001,
}

#[derive(Debug)]
pub enum ConvertApduError {
    Length { expected: usize, found: usize },
    Unknown(u16),
}

impl std::convert::TryFrom<&[u8]> for ApduError {
    type Error = ConvertApduError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() != 2 {
            return Err(Self::Error::Length {
                expected: 2,
                found: value.len(),
            });
        }

        let value = {
            let mut array = [0; 2];
            array.copy_from_slice(value);
            u16::from_be_bytes(array)
        };

        Self::try_from(value)
    }
}

impl std::convert::TryFrom<u16> for ApduError {
    type Error = ConvertApduError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x6400 => Ok(Self::ExecutionError),
            0x6700 => Ok(Self::WrongLength),
            0x6982 => Ok(Self::ApduCodeEmptyBuffer),
            0x6983 => Ok(Self::OutputBufferTooSmall),
            0x6984 => Ok(Self::DataInvalid),
            0x6985 => Ok(Self::ApduCodeConditionsNotSatisfied),
            0x6986 => Ok(Self::CommandNotAllowed),
            0x6987 => Ok(Self::TxNotInitialized),
            0x6A80 => Ok(Self::BadKeyHandle),
            0x6B00 => Ok(Self::InvalidP1P2),
            0x6D00 => Ok(Self::InsNotSupported),
            0x6E00 => Ok(Self::ClaNotSupported),
            0x6F00 => Ok(Self::Unknown),
            0x6F01 => Ok(Self::SignVerifyError),
            0x9000 => Ok(Self::Success),
            0x9001 => Ok(Self::Busy),
            err => Err(Self::Error::Unknown(err)),
        }
    }
}

pub const APDU_INDEX_CLA: usize = 0;
pub const APDU_INDEX_INS: usize = 1;
pub const APDU_INDEX_P1: usize = 2;
pub const APDU_INDEX_P2: usize = 3;
pub const APDU_INDEX_LEN: usize = 4;

pub const APDU_MIN_LENGTH: u32 = 5;

/// Set in `flags` when the response is sent later, once the review is over
pub const IO_ASYNCH_REPLY: u32 = 0x10;

pub mod instructions {
    pub const CLA: u8 = 0x00;

    pub const INS_GET_VERSION: u8 = 0x20;
    pub const INS_GET_ADDR: u8 = 0x21;
    pub const INS_SIGN: u8 = 0x22;
    pub const INS_SIGN_HASH: u8 = 0x23;
    pub const INS_SIGN_TRANSFER: u8 = 0x24;
}

pub use instructions::*;

/// Length of the derivation path sent with every INIT packet
pub const HDPATH_LEN_DEFAULT: usize = 5;
pub const HDPATH_0_DEFAULT: u32 = 0x8000_0000 | 0x2c;
pub const HDPATH_1_DEFAULT: u32 = 0x8000_0000 | 0x272;

pub const PUB_KEY_LENGTH: usize = 32;
pub const ED25519_SIGNATURE_SIZE: usize = 64;
pub const BLAKE2B_DIGEST_SIZE: usize = 32;
/// 32 bytes in (padded) base64
pub const BASE64_HASH_LEN: usize = 44;
pub const ADDRESS_HEX_LEN: usize = PUB_KEY_LENGTH * 2;

cfg_if::cfg_if! {
    if #[cfg(feature = "nanos")] {
        pub const RAM_BUFFER_SIZE: usize = 256;
        pub const FLASH_BUFFER_SIZE: usize = 8192 - 1024;
        pub const TARGET_ID: u32 = 0x3110_0004;
    } else {
        pub const RAM_BUFFER_SIZE: usize = 8192;
        pub const FLASH_BUFFER_SIZE: usize = 16384 - 1024;
        pub const TARGET_ID: u32 = 0x3300_0004;
    }
}

/// Backing store for the JSON expanded from a binary transfer template
pub const TEMPLATE_BUFFER_SIZE: usize = FLASH_BUFFER_SIZE;

pub const MAX_NUMBER_OF_TOKENS: usize = 768;
/// Containers nested deeper than this are refused by the tokenizer
pub const MAX_JSON_DEPTH: usize = 24;
pub const MAX_NUMBER_OF_ITEMS: usize = 25;

/// Unknown capabilities whose raw args span more than this are not rendered
pub const MAX_ITEM_LENGTH_TO_DISPLAY: usize = 256;
/// Unknown capabilities with more args than this are not rendered
pub const MAX_DISPLAYABLE_ARGS: usize = 5;

/// Scratch space for a fully rendered value, before pagination
pub const MAX_RENDERED_VALUE_LEN: usize = 512;
pub const MAX_ITEM_LENGTH_IN_PAGE: usize = 40;
pub const MAX_KEY_LENGTH: usize = 24;

pub mod version {
    kadena_app_derive::version!("Makefile.version");
}
