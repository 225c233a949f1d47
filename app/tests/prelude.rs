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
#![allow(unused_imports, dead_code)]

use rslib::constants::{
    APDU_INDEX_CLA, APDU_INDEX_INS, APDU_INDEX_LEN, APDU_INDEX_P1, APDU_INDEX_P2,
    MAX_ITEM_LENGTH_IN_PAGE,
};
pub use rslib::{
    constants::{self, ApduError, CLA, HDPATH_0_DEFAULT, HDPATH_1_DEFAULT, IO_ASYNCH_REPLY},
    crypto::{CryptoError, HdPath, KeyProvider},
    handle_apdu,
    sys::Viewable,
    App, PacketType, RequestStorage,
};

pub use std::convert::TryInto;

use blake2b_simd::Params;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

pub const PATH: [u32; 5] = [HDPATH_0_DEFAULT, HDPATH_1_DEFAULT, 0x8000_0000, 0, 0];

pub fn blake2b(input: &[u8]) -> [u8; 32] {
    let mut out = [0; 32];
    out.copy_from_slice(Params::new().hash_length(32).hash(input).as_bytes());
    out
}

/// Deterministic software keys, one per path
pub struct TestKeys;

impl TestKeys {
    pub fn signing_key(path: &HdPath) -> SigningKey {
        let seed: Vec<u8> = path
            .components()
            .iter()
            .flat_map(|c| c.to_le_bytes())
            .collect();
        SigningKey::from_bytes(&blake2b(&seed))
    }

    pub fn verifying_key(path: [u32; 5]) -> VerifyingKey {
        Self::signing_key(&HdPath::new(path).unwrap()).verifying_key()
    }

    pub fn verify(path: [u32; 5], digest: &[u8], signature: &[u8]) -> bool {
        let signature = match Signature::from_slice(signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        Self::verifying_key(path).verify(digest, &signature).is_ok()
    }
}

impl KeyProvider for TestKeys {
    fn public_key(&self, path: &HdPath) -> Result<[u8; 32], CryptoError> {
        Ok(Self::signing_key(path).verifying_key().to_bytes())
    }

    fn sign(&self, path: &HdPath, digest: &[u8; 32]) -> Result<[u8; 64], CryptoError> {
        Ok(Self::signing_key(path).sign(digest).to_bytes())
    }
}

pub fn path_bytes(path: [u32; 5]) -> Vec<u8> {
    path.iter().flat_map(|c| c.to_le_bytes()).collect()
}

/// Split message in chunks ready to send to the handler
pub fn chunk(ins: u8, p2: u8, init_data: &[u8], msg: &[u8]) -> Vec<[u8; 260]> {
    let mut buffer = [0; 260];
    buffer[APDU_INDEX_CLA] = CLA;
    buffer[APDU_INDEX_INS] = ins;
    buffer[APDU_INDEX_P2] = p2;
    let buffer = buffer; //make immutable

    let mut first_buffer = buffer;
    first_buffer[APDU_INDEX_P1] = PacketType::Init as u8;

    first_buffer[APDU_INDEX_LEN] = init_data.len() as u8;
    first_buffer[APDU_INDEX_LEN + 1..][..init_data.len()].copy_from_slice(init_data);
    let first_buffer = first_buffer; //make immutable

    //split message in chunks of 255
    let chunks_iter = msg.chunks(255).map(|data| {
        let mut buf = buffer;
        buf[APDU_INDEX_P1] = PacketType::Add as u8;
        buf[APDU_INDEX_LEN] = data.len() as u8;
        buf[APDU_INDEX_LEN + 1..][..data.len()].copy_from_slice(data);

        buf
    });

    let mut chunks = Vec::with_capacity(1 + chunks_iter.len());
    chunks.push(first_buffer);
    chunks.extend(chunks_iter);

    //set last message to Last
    chunks.last_mut().unwrap()[APDU_INDEX_P1] = PacketType::Last as u8;

    chunks
}

/// Outcome of the last packet of an exchange
pub struct Exchange {
    pub flags: u32,
    pub tx: u32,
    pub buffer: [u8; 260],
}

impl Exchange {
    pub fn status(&self) -> ApduError {
        let pos = self.tx as usize;
        (&self.buffer[pos - 2..pos]).try_into().unwrap()
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.tx as usize - 2]
    }

    pub fn is_async(&self) -> bool {
        self.flags & IO_ASYNCH_REPLY != 0
    }
}

/// Send every chunk, stopping at the first one that does not succeed
pub fn send<K: KeyProvider>(app: &mut App<'_, K>, chunks: Vec<[u8; 260]>) -> Exchange {
    let mut last = None;

    for mut buffer in chunks {
        let rx = 5 + buffer[APDU_INDEX_LEN] as u32;
        let (mut flags, mut tx) = (0, 0);
        handle_apdu(app, &mut flags, &mut tx, rx, &mut buffer);

        let exchange = Exchange { flags, tx, buffer };
        let ok = exchange.status() == ApduError::Success;
        last = Some(exchange);
        if !ok {
            break;
        }
    }

    last.expect("no chunks sent")
}

/// Every (title, value) pair of the pending review, pages joined back together
pub fn review_items<V: Viewable>(review: &mut V) -> Vec<(String, String)> {
    let num_items = review.num_items().unwrap();

    (0..num_items)
        .map(|idx| {
            let mut title = [0; 32];
            let mut value = Vec::new();
            let mut page = 0;
            loop {
                let mut message = [0; MAX_ITEM_LENGTH_IN_PAGE + 1];
                let pages = review
                    .render_item(idx, &mut title, &mut message, page)
                    .unwrap();
                let len = message.iter().position(|&c| c == 0).unwrap();
                value.extend_from_slice(&message[..len]);

                page += 1;
                if page >= pages {
                    break;
                }
            }

            let title_len = title.iter().position(|&c| c == 0).unwrap();
            (
                String::from_utf8(title[..title_len].to_vec()).unwrap(),
                String::from_utf8(value).unwrap(),
            )
        })
        .collect()
}

#[macro_export]
macro_rules! assert_error_code {
    ($tx:expr, $buffer:ident, $expected:expr) => {
        let pos: usize = $tx as _;
        let actual: ApduError = (&$buffer[pos - 2..pos]).try_into().unwrap();
        assert_eq!(actual, $expected);
    };
}
