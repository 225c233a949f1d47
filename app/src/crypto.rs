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
//! Boundary towards key derivation and signing, which live outside this crate

use nom::{multi::fill, number::complete::le_u32};

use crate::{
    constants::{
        ApduError, BLAKE2B_DIGEST_SIZE, ED25519_SIGNATURE_SIZE, HDPATH_0_DEFAULT,
        HDPATH_1_DEFAULT, HDPATH_LEN_DEFAULT, PUB_KEY_LENGTH,
    },
    parser::ParserError,
};

/// Ed25519 derivation path, always of full depth
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct HdPath([u32; HDPATH_LEN_DEFAULT]);

impl HdPath {
    pub fn new(components: [u32; HDPATH_LEN_DEFAULT]) -> Result<Self, ApduError> {
        if components[0] != HDPATH_0_DEFAULT || components[1] != HDPATH_1_DEFAULT {
            tracing::warn!(
                purpose = components[0],
                coin = components[1],
                "refused derivation path"
            );
            return Err(ApduError::DataInvalid);
        }

        Ok(Self(components))
    }

    /// Read the little endian components at the start of an INIT payload
    pub fn read(payload: &[u8]) -> Result<Self, ApduError> {
        let mut components = [0; HDPATH_LEN_DEFAULT];
        fill(le_u32::<_, ParserError>, &mut components)(payload)
            .map_err(|_| ApduError::WrongLength)?;

        Self::new(components)
    }

    pub fn components(&self) -> &[u32; HDPATH_LEN_DEFAULT] {
        &self.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct CryptoError;

/// Key material collaborator
pub trait KeyProvider {
    /// Ed25519 public key derived at `path`
    fn public_key(&self, path: &HdPath) -> Result<[u8; PUB_KEY_LENGTH], CryptoError>;

    /// Sign the transaction digest with the key derived at `path`
    fn sign(
        &self,
        path: &HdPath,
        digest: &[u8; BLAKE2B_DIGEST_SIZE],
    ) -> Result<[u8; ED25519_SIGNATURE_SIZE], CryptoError>;
}

impl<K: KeyProvider + ?Sized> KeyProvider for &K {
    fn public_key(&self, path: &HdPath) -> Result<[u8; PUB_KEY_LENGTH], CryptoError> {
        (**self).public_key(path)
    }

    fn sign(
        &self,
        path: &HdPath,
        digest: &[u8; BLAKE2B_DIGEST_SIZE],
    ) -> Result<[u8; ED25519_SIGNATURE_SIZE], CryptoError> {
        (**self).sign(path, digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(components: [u32; HDPATH_LEN_DEFAULT]) -> [u8; 20] {
        let mut out = [0; 20];
        for (chunk, c) in out.chunks_mut(4).zip(components) {
            chunk.copy_from_slice(&c.to_le_bytes());
        }
        out
    }

    #[test]
    fn read_path() {
        let components = [HDPATH_0_DEFAULT, HDPATH_1_DEFAULT, 0x8000_0000, 0, 7];
        let path = HdPath::read(&encode(components)).unwrap();
        assert_eq!(path.components(), &components);
    }

    #[test]
    fn short_path() {
        let raw = encode([HDPATH_0_DEFAULT, HDPATH_1_DEFAULT, 0, 0, 0]);
        assert_eq!(HdPath::read(&raw[..19]), Err(ApduError::WrongLength));
    }

    #[test]
    fn foreign_coin() {
        let raw = encode([HDPATH_0_DEFAULT, 0x8000_003c, 0, 0, 0]);
        assert_eq!(HdPath::read(&raw), Err(ApduError::DataInvalid));
    }
}
