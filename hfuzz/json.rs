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
use rslib::parser::{
    json::{tokenize, JsonDocument, Tokens},
    Transaction,
};

const KEYS: [&str; 6] = ["signers", "pubKey", "clist", "name", "args", "meta"];

fn main() {
    let mut tokens = Tokens::new();
    let mut tx = Transaction::new();

    loop {
        honggfuzz::fuzz!(|data: &[u8]| {
            if tokenize(data, &mut tokens).is_ok() {
                let doc = JsonDocument::new(data, &tokens);
                for key in KEYS.iter() {
                    let _ = doc.object_get_value(JsonDocument::ROOT, key);
                    let _ = doc.object_get_field(JsonDocument::ROOT, key);
                }
            }

            if tx.parse_json(data, &[0x42; 32]).is_err() {
                return;
            }

            let view = tx.view(data);
            if view.validate().is_err() {
                return;
            }

            for idx in 0..tx.items().len() {
                let mut title = [0; 32];
                let mut message = [0; 40];
                let mut page = 0;
                while let Ok(pages) = view.get_item(idx, page, &mut title, &mut message) {
                    page += 1;
                    if page >= pages {
                        break;
                    }
                }
            }
        });
    }
}
