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
use rslib::{
    crypto::{CryptoError, HdPath, KeyProvider},
    handle_apdu,
    sys::Viewable,
    App, RequestStorage,
};

/// Keys that never fail, the fuzzer only cares about the request path
struct ZeroKeys;

impl KeyProvider for ZeroKeys {
    fn public_key(&self, _: &HdPath) -> Result<[u8; 32], CryptoError> {
        Ok([0x42; 32])
    }

    fn sign(&self, _: &HdPath, _: &[u8; 32]) -> Result<[u8; 64], CryptoError> {
        Ok([0; 64])
    }
}

fn main() {
    let mut storage = RequestStorage::new();
    let mut app = App::new(ZeroKeys, &mut storage);
    app.mode_mut().set_expert(true);

    loop {
        honggfuzz::fuzz!(|data: &[u8]| {
            // every 260 bytes is one packet, so a run can span INIT/ADD/LAST
            for packet in data.chunks(260) {
                let mut flags = 0;
                let mut tx = 0;

                let mut buffer = [0; 260];
                buffer[..packet.len()].copy_from_slice(packet);

                handle_apdu(&mut app, &mut flags, &mut tx, packet.len() as u32, &mut buffer);
            }

            if let Some(mut review) = app.review() {
                let num_items = review.num_items().unwrap_or(0);
                for idx in 0..num_items {
                    let mut title = [0; 32];
                    let mut message = [0; 40];
                    let mut page = 0;
                    while let Ok(pages) = review.render_item(idx, &mut title, &mut message, page) {
                        page += 1;
                        if page >= pages {
                            break;
                        }
                    }
                }
                review.reject(&mut [0; 2]);
            }
        });
    }
}
