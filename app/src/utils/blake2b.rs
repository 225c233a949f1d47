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
use base64::{engine::general_purpose::URL_SAFE, Engine};
use blake2b_simd::{Params, State};

use crate::{
    constants::{BASE64_HASH_LEN, BLAKE2B_DIGEST_SIZE},
    parser::ParserError,
};

pub trait Hasher {
    /// Absorb additional input. Can be called multiple times.
    fn update(&mut self, input: &[u8]);

    /// Pad and squeeze the state to the output.
    fn finalize(self, output: &mut [u8; BLAKE2B_DIGEST_SIZE]);
}

/// Unkeyed blake2b with a 256 bit digest
pub struct Blake2b {
    state: State,
}

impl Default for Blake2b {
    fn default() -> Self {
        Self::new()
    }
}

impl Blake2b {
    pub fn new() -> Self {
        Self {
            state: Params::new().hash_length(BLAKE2B_DIGEST_SIZE).to_state(),
        }
    }

    /// One-shot digest of `input`
    pub fn digest(input: &[u8]) -> [u8; BLAKE2B_DIGEST_SIZE] {
        let mut hasher = Self::new();
        hasher.update(input);

        let mut out = [0; BLAKE2B_DIGEST_SIZE];
        hasher.finalize(&mut out);
        out
    }
}

impl Hasher for Blake2b {
    fn update(&mut self, input: &[u8]) {
        self.state.update(input);
    }

    fn finalize(self, output: &mut [u8; BLAKE2B_DIGEST_SIZE]) {
        output.copy_from_slice(self.state.finalize().as_bytes());
    }
}

/// Digest of the request together with its display form
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct TxHash {
    digest: [u8; BLAKE2B_DIGEST_SIZE],
    encoded: [u8; BASE64_HASH_LEN],
}

impl TxHash {
    pub const fn empty() -> Self {
        Self {
            digest: [0; BLAKE2B_DIGEST_SIZE],
            encoded: [0; BASE64_HASH_LEN],
        }
    }

    pub fn new(digest: [u8; BLAKE2B_DIGEST_SIZE]) -> Result<Self, ParserError> {
        let mut encoded = [0; BASE64_HASH_LEN];
        let written = URL_SAFE
            .encode_slice(digest, &mut encoded)
            .map_err(|_| ParserError::UnexpectedError)?;

        if written != BASE64_HASH_LEN {
            return Err(ParserError::UnexpectedError);
        }

        Ok(Self { digest, encoded })
    }

    /// Hash the whole buffer at once
    pub fn of(buffer: &[u8]) -> Result<Self, ParserError> {
        Self::new(Blake2b::digest(buffer))
    }

    pub fn digest(&self) -> &[u8; BLAKE2B_DIGEST_SIZE] {
        &self.digest
    }

    /// URL-safe base64 of the digest
    pub fn base64(&self) -> &[u8] {
        &self.encoded[..]
    }
}
