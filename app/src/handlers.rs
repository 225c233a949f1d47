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
use crate::{
    constants::{
        ApduError as Error, ED25519_SIGNATURE_SIZE, FLASH_BUFFER_SIZE, PUB_KEY_LENGTH,
        RAM_BUFFER_SIZE, TEMPLATE_BUFFER_SIZE,
    },
    crypto::{HdPath, KeyProvider},
    parser::{DisplayableItem, Transaction, TxKind},
    sys::{ViewError, Viewable},
    utils::{hex_encode, AppMode, ChunkBuffer},
};

pub mod address;
pub mod signing;
pub mod version;

/// Memory backing the request buffers of an [`App`]
pub struct RequestStorage {
    ram: [u8; RAM_BUFFER_SIZE],
    flash: [u8; FLASH_BUFFER_SIZE],
    template: [u8; TEMPLATE_BUFFER_SIZE],
}

impl Default for RequestStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStorage {
    pub const fn new() -> Self {
        Self {
            ram: [0; RAM_BUFFER_SIZE],
            flash: [0; FLASH_BUFFER_SIZE],
            template: [0; TEMPLATE_BUFFER_SIZE],
        }
    }
}

/// What the device holder is currently asked to approve
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub(crate) enum Pending {
    Nothing,
    Sign,
    Address([u8; PUB_KEY_LENGTH]),
}

/// State of the application between commands
///
/// There is exactly one request in flight, every new INIT starts over.
pub struct App<'s, K> {
    pub(crate) keys: K,
    pub(crate) mode: AppMode,
    pub(crate) buffer: ChunkBuffer<'s>,
    pub(crate) template: ChunkBuffer<'s>,
    pub(crate) tx: Transaction,
    /// Path and payload kind accepted by the last INIT
    pub(crate) request: Option<(HdPath, TxKind)>,
    /// Whether ADD and LAST packets are accepted
    pub(crate) uploading: bool,
    pub(crate) pending: Pending,
}

impl<'s, K: KeyProvider> App<'s, K> {
    pub fn new(keys: K, storage: &'s mut RequestStorage) -> Self {
        // expansions go straight to the persistent tier
        let (template_ram, template_flash) = storage.template.split_at_mut(0);

        Self {
            keys,
            mode: AppMode::new(),
            buffer: ChunkBuffer::new(&mut storage.ram, &mut storage.flash),
            template: ChunkBuffer::new(template_ram, template_flash),
            tx: Transaction::new(),
            request: None,
            uploading: false,
            pending: Pending::Nothing,
        }
    }

    pub fn mode(&self) -> &AppMode {
        &self.mode
    }

    pub fn mode_mut(&mut self) -> &mut AppMode {
        &mut self.mode
    }

    /// Drop the request in flight and anything waiting for approval
    pub fn reset(&mut self) {
        tracing::debug!("request state reset");
        self.buffer.reset();
        self.template.reset();
        self.tx.reset();
        self.request = None;
        self.uploading = false;
        self.pending = Pending::Nothing;
    }

    /// The JSON the pending items refer to
    pub(crate) fn json(&self) -> &[u8] {
        match self.tx.kind() {
            TxKind::Json => self.buffer.contents(),
            TxKind::Transfer => self.template.contents(),
            TxKind::Hash => &[],
        }
    }

    /// The approval flow, if a request is waiting for one
    pub fn review(&mut self) -> Option<Review<'_, 's, K>> {
        match self.pending {
            Pending::Nothing => None,
            _ => Some(Review { app: self }),
        }
    }
}

/// The review UI's handle on a pending request
pub struct Review<'a, 's, K> {
    app: &'a mut App<'s, K>,
}

impl<'a, 's, K: KeyProvider> Review<'a, 's, K> {
    const ADDRESS_TITLE: &'static [u8] = b"Address";

    fn render_address(
        pubkey: &[u8; PUB_KEY_LENGTH],
        title: &mut [u8],
        message: &mut [u8],
        page: u8,
    ) -> Result<u8, ViewError> {
        use crate::{constants::ADDRESS_HEX_LEN, parser::items_format::paginate};

        let title_len = Self::ADDRESS_TITLE.len();
        if title.len() <= title_len {
            return Err(ViewError::Unknown);
        }
        title[..title_len].copy_from_slice(Self::ADDRESS_TITLE);
        title[title_len] = 0;

        let mut address = [0; ADDRESS_HEX_LEN];
        hex_encode(pubkey, &mut address).map_err(|_| ViewError::Unknown)?;

        paginate(&address, message, page).map_err(ViewError::from)
    }
}

impl<'a, 's, K: KeyProvider> Viewable for Review<'a, 's, K> {
    fn num_items(&mut self) -> Result<u8, ViewError> {
        match self.app.pending {
            Pending::Nothing => Err(ViewError::NoData),
            Pending::Sign => Ok(self.app.tx.view(self.app.json()).num_items() as u8),
            Pending::Address(_) => Ok(1),
        }
    }

    #[inline(never)]
    fn render_item(
        &mut self,
        item_idx: u8,
        title: &mut [u8],
        message: &mut [u8],
        page_idx: u8,
    ) -> Result<u8, ViewError> {
        match &self.app.pending {
            Pending::Nothing => Err(ViewError::NoData),
            Pending::Sign => {
                self.app
                    .tx
                    .view(self.app.json())
                    .render_item(item_idx, title, message, page_idx)
            }
            Pending::Address(_) if item_idx > 0 => Err(ViewError::NoData),
            Pending::Address(pubkey) => Self::render_address(pubkey, title, message, page_idx),
        }
    }

    fn accept(&mut self, out: &mut [u8]) -> (usize, u16) {
        let pending = self.app.pending;
        let request = self.app.request;

        let reply: (usize, u16) = match (pending, request) {
            (Pending::Sign, Some((path, _))) => {
                let digest = self.app.tx.hash().digest();
                match self.app.keys.sign(&path, digest) {
                    Ok(signature) if out.len() >= ED25519_SIGNATURE_SIZE => {
                        out[..ED25519_SIGNATURE_SIZE].copy_from_slice(&signature);
                        (ED25519_SIGNATURE_SIZE, Error::Success as _)
                    }
                    Ok(_) => (0, Error::OutputBufferTooSmall as _),
                    Err(_) => (0, Error::SignVerifyError as _),
                }
            }
            (Pending::Address(pubkey), _) if out.len() >= PUB_KEY_LENGTH => {
                out[..PUB_KEY_LENGTH].copy_from_slice(&pubkey);
                (PUB_KEY_LENGTH, Error::Success as _)
            }
            (Pending::Address(_), _) => (0, Error::OutputBufferTooSmall as _),
            _ => (0, Error::ApduCodeConditionsNotSatisfied as _),
        };

        self.app.reset();
        reply
    }

    fn reject(&mut self, _: &mut [u8]) -> (usize, u16) {
        self.app.reset();
        (0, Error::CommandNotAllowed as _)
    }
}
