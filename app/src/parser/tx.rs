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
use core::convert::TryInto;

use crate::{
    constants::{
        ADDRESS_HEX_LEN, BLAKE2B_DIGEST_SIZE, MAX_KEY_LENGTH, MAX_RENDERED_VALUE_LEN,
        PUB_KEY_LENGTH,
    },
    parser::{
        items::ItemArray,
        items_format::{paginate, Renderer},
        json::{tokenize, JsonDocument, Tokens},
        template::TransferTemplate,
        DisplayableItem, ParserError,
    },
    sys::{self, ViewError},
    utils::{hex_encode, Blake2b, ChunkBuffer, Hasher, TxHash},
};

/// Which payload a signing request carried
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub enum TxKind {
    /// Full command JSON
    Json,
    /// A bare digest, only accepted in expert mode
    Hash,
    /// Compact transfer, expanded on device
    Transfer,
}

/// Decoding context for the request in flight
///
/// Tokens and items are reused between requests and reset before each parse.
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct Transaction {
    tokens: Tokens,
    items: ItemArray,
    hash: TxHash,
    address: [u8; ADDRESS_HEX_LEN],
    kind: TxKind,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    pub fn new() -> Self {
        Self {
            tokens: Tokens::new(),
            items: ItemArray::new(),
            hash: TxHash::empty(),
            address: [0; ADDRESS_HEX_LEN],
            kind: TxKind::Json,
        }
    }

    pub fn reset(&mut self) {
        self.tokens.clear();
        self.items.reset();
        self.hash = TxHash::empty();
        self.address = [0; ADDRESS_HEX_LEN];
        self.kind = TxKind::Json;
    }

    pub fn kind(&self) -> TxKind {
        self.kind
    }

    pub fn hash(&self) -> &TxHash {
        &self.hash
    }

    pub fn items(&self) -> &ItemArray {
        &self.items
    }

    fn set_address(&mut self, pubkey: &[u8; PUB_KEY_LENGTH]) -> Result<(), ParserError> {
        hex_encode(pubkey, &mut self.address).map_err(|_| ParserError::UnexpectedError)?;
        Ok(())
    }

    fn decode(&mut self, buffer: &[u8]) -> Result<(), ParserError> {
        tokenize(buffer, &mut self.tokens)?;
        let doc = JsonDocument::new(buffer, &self.tokens);
        self.items.decode(&doc)
    }

    /// Parse a full command JSON, hashing the whole buffer
    #[inline(never)]
    pub fn parse_json(
        &mut self,
        buffer: &[u8],
        pubkey: &[u8; PUB_KEY_LENGTH],
    ) -> Result<(), ParserError> {
        sys::zemu_log_stack("Transaction::parse_json\x00");
        self.reset();

        self.set_address(pubkey)?;
        self.decode(buffer)?;
        self.hash = TxHash::of(buffer)?;
        Ok(())
    }

    /// Accept a precomputed digest as the whole request
    #[inline(never)]
    pub fn parse_hash(
        &mut self,
        buffer: &[u8],
        pubkey: &[u8; PUB_KEY_LENGTH],
        expert: bool,
    ) -> Result<(), ParserError> {
        sys::zemu_log_stack("Transaction::parse_hash\x00");
        self.reset();

        if !expert {
            return Err(ParserError::ExpertModeRequired);
        }

        let digest: [u8; BLAKE2B_DIGEST_SIZE] = buffer
            .try_into()
            .map_err(|_| ParserError::UnexpectedBufferEnd)?;

        self.kind = TxKind::Hash;
        self.set_address(pubkey)?;
        self.hash = TxHash::new(digest)?;
        self.items.decode_hash()
    }

    /// Expand a compact transfer into `out` and parse the result
    ///
    /// The hash is computed while expanding, so the JSON is never read twice for it.
    #[inline(never)]
    pub fn parse_transfer(
        &mut self,
        buffer: &[u8],
        pubkey: &[u8; PUB_KEY_LENGTH],
        out: &mut ChunkBuffer<'_>,
    ) -> Result<(), ParserError> {
        sys::zemu_log_stack("Transaction::parse_transfer\x00");
        self.reset();

        self.kind = TxKind::Transfer;
        self.set_address(pubkey)?;

        let template = TransferTemplate::from_bytes(buffer)?;
        let mut hasher = Blake2b::new();
        template.expand(&self.address, out, &mut hasher)?;

        let mut digest = [0; BLAKE2B_DIGEST_SIZE];
        hasher.finalize(&mut digest);
        self.hash = TxHash::new(digest)?;

        self.decode(out.contents())
    }

    /// Review surface over the parsed request
    ///
    /// `buffer` must be the JSON the items were decoded from: the request for
    /// [`TxKind::Json`], the expansion for [`TxKind::Transfer`].
    pub fn view<'a>(&'a self, buffer: &'a [u8]) -> TxView<'a> {
        let doc = match self.kind {
            TxKind::Hash => JsonDocument::empty(),
            TxKind::Json | TxKind::Transfer => JsonDocument::new(buffer, &self.tokens),
        };

        TxView { tx: self, doc }
    }
}

pub struct TxView<'a> {
    tx: &'a Transaction,
    doc: JsonDocument<'a>,
}

impl<'a> TxView<'a> {
    fn renderer(&self) -> Renderer<'_, 'a> {
        Renderer {
            doc: &self.doc,
            hash: &self.tx.hash,
            address: &self.tx.address,
        }
    }

    /// Render every item once, so nothing can fail after the user starts reviewing
    #[inline(never)]
    pub fn validate(&self) -> Result<(), ParserError> {
        sys::zemu_log_stack("TxView::validate\x00");

        let renderer = self.renderer();
        let mut title = [0; MAX_KEY_LENGTH];
        let mut value = [0; MAX_RENDERED_VALUE_LEN];

        for (idx, item) in self.tx.items.iter().enumerate() {
            item.kind.title(&mut title)?;
            renderer.render(item, &mut value).map_err(|e| {
                tracing::warn!(idx, error = e.description(), "item cannot be rendered");
                e
            })?;
        }

        Ok(())
    }

    /// Title and page `page` of item `index`, returns the page count
    #[inline(never)]
    pub fn get_item(
        &self,
        index: usize,
        page: u8,
        title: &mut [u8],
        message: &mut [u8],
    ) -> Result<u8, ParserError> {
        let item = self
            .tx
            .items
            .get(index)
            .ok_or(ParserError::DisplayIdxOutOfRange)?;

        item.kind.title(title)?;

        let mut value = [0; MAX_RENDERED_VALUE_LEN];
        let len = self.renderer().render(item, &mut value)?;
        paginate(&value[..len], message, page)
    }
}

impl<'a> DisplayableItem for TxView<'a> {
    fn num_items(&self) -> usize {
        self.tx.items.len()
    }

    #[inline(never)]
    fn render_item(
        &self,
        item_n: u8,
        title: &mut [u8],
        message: &mut [u8],
        page: u8,
    ) -> Result<u8, ViewError> {
        sys::zemu_log_stack("TxView::render_item\x00");

        self.get_item(item_n as usize, page, title, message)
            .map_err(ViewError::from)
    }
}
