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
//! Turns a parsed transaction into the ordered list of items shown for review

use arrayvec::ArrayVec;
use lexical_core::FormattedSize;

use crate::{
    constants::{MAX_DISPLAYABLE_ARGS, MAX_ITEM_LENGTH_TO_DISPLAY, MAX_NUMBER_OF_ITEMS},
    parser::{
        json::{JsonDocument, TokenKind},
        ParserError,
    },
    sys,
};

pub const CAP_TRANSFER: &[u8] = b"coin.TRANSFER";
pub const CAP_TRANSFER_XCHAIN: &[u8] = b"coin.TRANSFER_XCHAIN";
pub const CAP_ROTATE: &[u8] = b"coin.ROTATE";
pub const CAP_GAS: &[u8] = b"coin.GAS";

/// Keys `meta` must carry, in this exact order
pub const META_KEYS: [&[u8]; 6] = [
    b"creationTime",
    b"ttl",
    b"gasLimit",
    b"chainId",
    b"gasPrice",
    b"sender",
];

/// What an item shows, which also decides how its value is rendered
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub enum ItemKind {
    Signing,
    Network,
    Requiring,
    SignerKey,
    UnscopedSigner,
    PayingGas,
    Transfer(u8),
    CrossTransfer(u8),
    Rotate,
    UnknownCapability(u8),
    Unsafe,
    Caution,
    Chain,
    Gas,
    TooLarge,
    Hash,
    SignForAddress,
}

impl ItemKind {
    fn label(&self) -> &'static [u8] {
        match self {
            Self::Signing => b"Signing",
            Self::Network => b"On Network",
            Self::Requiring => b"Requiring",
            Self::SignerKey => b"Of Key",
            Self::UnscopedSigner => b"Unscoped Signer",
            Self::PayingGas => b"Paying Gas",
            Self::Transfer(_) | Self::CrossTransfer(_) => b"Transfer",
            Self::Rotate => b"Rotate for account",
            Self::UnknownCapability(_) => b"Unknown Capability",
            Self::Unsafe | Self::TooLarge => b"WARNING",
            Self::Caution => b"CAUTION",
            Self::Chain => b"On Chain",
            Self::Gas => b"Using Gas",
            Self::Hash => b"Transaction hash",
            Self::SignForAddress => b"Sign for Address",
        }
    }

    fn number(&self) -> Option<u8> {
        match *self {
            Self::Transfer(n) | Self::CrossTransfer(n) | Self::UnknownCapability(n) => Some(n),
            _ => None,
        }
    }

    /// Write the NUL terminated title into `out`, returns its length
    pub fn title(&self, out: &mut [u8]) -> Result<usize, ParserError> {
        let label = self.label();

        let mut number = [0; u8::FORMATTED_SIZE_DECIMAL];
        let number: &[u8] = match self.number() {
            Some(n) => lexical_core::write(n, &mut number),
            None => &[],
        };

        let len = label.len() + if number.is_empty() { 0 } else { 1 + number.len() };
        if len >= out.len() {
            return Err(ParserError::DataTooLarge);
        }

        out[..label.len()].copy_from_slice(label);
        if !number.is_empty() {
            out[label.len()] = b' ';
            out[label.len() + 1..len].copy_from_slice(number);
        }
        out[len] = 0;

        Ok(len)
    }
}

/// One review line, pointing back into the token array when it shows transaction data
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct DisplayItem {
    pub kind: ItemKind,
    pub token: u16,
    pub can_display: bool,
}

impl DisplayItem {
    pub const NO_TOKEN: u16 = 0;

    fn new(kind: ItemKind, token: usize) -> Self {
        Self {
            kind,
            token: token as u16,
            can_display: true,
        }
    }

    pub fn token(&self) -> usize {
        self.token as usize
    }
}

#[derive(Clone)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct ItemArray {
    items: ArrayVec<DisplayItem, MAX_NUMBER_OF_ITEMS>,
    unknown_capabilities: u8,
    transfers: u8,
}

impl Default for ItemArray {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemArray {
    pub const fn new() -> Self {
        Self {
            items: ArrayVec::new_const(),
            unknown_capabilities: 0,
            transfers: 0,
        }
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.unknown_capabilities = 0;
        self.transfers = 0;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&DisplayItem> {
        self.items.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayItem> {
        self.items.iter()
    }

    fn push(&mut self, item: DisplayItem) -> Result<(), ParserError> {
        self.items.try_push(item).map_err(|_| {
            tracing::warn!(capacity = MAX_NUMBER_OF_ITEMS, "item list overflow");
            ParserError::TooManyItems
        })
    }

    fn next_transfer(&mut self) -> u8 {
        self.transfers += 1;
        self.transfers
    }

    fn next_unknown(&mut self) -> u8 {
        self.unknown_capabilities += 1;
        self.unknown_capabilities
    }

    /// Items for a request that is only a precomputed digest
    #[inline(never)]
    pub fn decode_hash(&mut self) -> Result<(), ParserError> {
        sys::zemu_log_stack("ItemArray::decode_hash\x00");
        self.reset();

        self.push(DisplayItem::new(ItemKind::Hash, DisplayItem::NO_TOKEN as usize))?;
        self.push_sign_for_address()
    }

    /// Walk the transaction in `doc` and build the review items
    #[inline(never)]
    pub fn decode(&mut self, doc: &JsonDocument<'_>) -> Result<(), ParserError> {
        sys::zemu_log_stack("ItemArray::decode\x00");
        self.reset();

        let decoder = Decoder { doc };

        self.push(DisplayItem::new(ItemKind::Signing, DisplayItem::NO_TOKEN as usize))?;

        if let Some(network) = decoder.field(JsonDocument::ROOT, "networkId")? {
            self.push(DisplayItem::new(ItemKind::Network, network))?;
        }

        self.push(DisplayItem::new(ItemKind::Requiring, DisplayItem::NO_TOKEN as usize))?;

        let signer_key = decoder.signer_key()?;
        if let Some(key) = signer_key {
            self.push(DisplayItem::new(ItemKind::SignerKey, key))?;
        }

        let clist = decoder.clist()?;

        if let Some(key) = signer_key {
            if !decoder.is_scoped(key, clist)? {
                self.push(DisplayItem::new(ItemKind::UnscopedSigner, key))?;
            }
        }

        match clist {
            Some(clist) => {
                let gas = self.store_paying_gas(&decoder, clist)?;
                self.store_capabilities(&decoder, clist, gas)?;
            }
            None => self.push(DisplayItem::new(ItemKind::Unsafe, DisplayItem::NO_TOKEN as usize))?,
        }

        match decoder.valid_meta()? {
            Some(meta) => {
                if let Some(chain) = decoder.field(meta, "chainId")? {
                    self.push(DisplayItem::new(ItemKind::Chain, chain))?;
                }
                self.push(DisplayItem::new(ItemKind::Gas, meta))?;
            }
            None => self.push(DisplayItem::new(ItemKind::Caution, DisplayItem::NO_TOKEN as usize))?,
        }

        if self.items.iter().any(|item| !item.can_display) {
            self.push(DisplayItem::new(ItemKind::TooLarge, DisplayItem::NO_TOKEN as usize))?;
        }

        self.push(DisplayItem::new(ItemKind::Hash, DisplayItem::NO_TOKEN as usize))?;
        self.push_sign_for_address()
    }

    fn push_sign_for_address(&mut self) -> Result<(), ParserError> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "sign-for-address")] {
                self.push(DisplayItem::new(ItemKind::SignForAddress, DisplayItem::NO_TOKEN as usize))
            } else {
                Ok(())
            }
        }
    }

    /// Classify the first `coin.GAS` grant, returning its token
    fn store_paying_gas(
        &mut self,
        decoder: &Decoder<'_, '_>,
        clist: usize,
    ) -> Result<Option<usize>, ParserError> {
        for cap in decoder.doc.children(clist)? {
            if decoder.capability_name(cap)? != Some(CAP_GAS) {
                continue;
            }

            // a gas grant with arguments is not the one we know
            match decoder.num_args(cap)? {
                Some(0) => self.push(DisplayItem::new(ItemKind::PayingGas, cap))?,
                _ => self.store_unknown(decoder, cap)?,
            }
            return Ok(Some(cap));
        }

        Ok(None)
    }

    /// Every capability except the gas grant already shown
    fn store_capabilities(
        &mut self,
        decoder: &Decoder<'_, '_>,
        clist: usize,
        gas: Option<usize>,
    ) -> Result<(), ParserError> {
        for cap in decoder.doc.children(clist)? {
            if gas == Some(cap) {
                continue;
            }

            let name = match decoder.capability_name(cap)? {
                Some(name) => name,
                None => {
                    self.store_unknown(decoder, cap)?;
                    continue;
                }
            };
            let num_args = decoder.num_args(cap)?;

            match (name, num_args) {
                (CAP_TRANSFER, Some(3)) => {
                    let n = self.next_transfer();
                    self.push(DisplayItem::new(ItemKind::Transfer(n), cap))?;
                }
                (CAP_TRANSFER_XCHAIN, Some(4)) => {
                    let n = self.next_transfer();
                    self.push(DisplayItem::new(ItemKind::CrossTransfer(n), cap))?;
                }
                (CAP_ROTATE, Some(1)) => {
                    self.push(DisplayItem::new(ItemKind::Rotate, cap))?;
                }
                _ => self.store_unknown(decoder, cap)?,
            }
        }

        Ok(())
    }

    fn store_unknown(&mut self, decoder: &Decoder<'_, '_>, cap: usize) -> Result<(), ParserError> {
        let n = self.next_unknown();
        let mut item = DisplayItem::new(ItemKind::UnknownCapability(n), cap);

        if let Some(args) = decoder.field(cap, "args")? {
            item.can_display = match decoder.doc.kind(args)? {
                TokenKind::Array => {
                    let num_args = decoder.doc.array_element_count(args)?;
                    let span = decoder.doc.token(args)?.len();
                    num_args <= MAX_DISPLAYABLE_ARGS && span <= MAX_ITEM_LENGTH_TO_DISPLAY
                }
                // anything but a list cannot be shown as arguments
                _ => false,
            };
        }

        self.push(item)
    }
}

/// Schema aware lookups over a transaction document
///
/// Fields are resolved on their own level only, so values nested inside
/// `payload` or capability arguments can never stand in for them.
pub(crate) struct Decoder<'d, 'b> {
    pub doc: &'d JsonDocument<'b>,
}

/// `NoData` means absent, any other error is fatal
fn optional(res: Result<usize, ParserError>) -> Result<Option<usize>, ParserError> {
    match res {
        Ok(idx) => Ok(Some(idx)),
        Err(ParserError::NoData) => Ok(None),
        Err(e) => Err(e),
    }
}

impl<'d, 'b> Decoder<'d, 'b> {
    /// Value of `key` in `object`, absent when missing or `null`
    pub fn field(&self, object: usize, key: &str) -> Result<Option<usize>, ParserError> {
        Ok(optional(self.doc.object_get_field(object, key))?.filter(|&idx| !self.doc.is_null(idx)))
    }

    fn first_signer(&self) -> Result<Option<usize>, ParserError> {
        match self.field(JsonDocument::ROOT, "signers")? {
            Some(signers) => optional(self.doc.array_nth_element(signers, 0)),
            None => Ok(None),
        }
    }

    pub fn signer_key(&self) -> Result<Option<usize>, ParserError> {
        match self.first_signer()? {
            Some(signer) => self.field(signer, "pubKey"),
            None => Ok(None),
        }
    }

    /// The first signer's capability list, if it is a proper array
    pub fn clist(&self) -> Result<Option<usize>, ParserError> {
        let clist = match self.first_signer()? {
            Some(signer) => self.field(signer, "clist")?,
            None => None,
        };

        Ok(clist.filter(|&idx| matches!(self.doc.kind(idx), Ok(TokenKind::Array))))
    }

    pub fn capability_name(&self, cap: usize) -> Result<Option<&'b [u8]>, ParserError> {
        match self.field(cap, "name")? {
            Some(name) if self.doc.is_string(name) => self.doc.text(name).map(Some),
            _ => Ok(None),
        }
    }

    pub fn args(&self, cap: usize) -> Result<Option<usize>, ParserError> {
        Ok(self
            .field(cap, "args")?
            .filter(|&idx| matches!(self.doc.kind(idx), Ok(TokenKind::Array))))
    }

    fn num_args(&self, cap: usize) -> Result<Option<usize>, ParserError> {
        match self.args(cap)? {
            Some(args) => self.doc.array_element_count(args).map(Some),
            None => Ok(None),
        }
    }

    /// Whether the signer `key` is bound by the transfer capabilities in `clist`
    ///
    /// A missing list never scopes the signer; a list without any transfer does.
    pub fn is_scoped(&self, key: usize, clist: Option<usize>) -> Result<bool, ParserError> {
        let clist = match clist {
            Some(clist) => clist,
            None => return Ok(false),
        };
        let key = self.doc.text(key)?;

        let mut has_transfer = false;
        for cap in self.doc.children(clist)? {
            match self.capability_name(cap)? {
                Some(CAP_TRANSFER) | Some(CAP_TRANSFER_XCHAIN) => has_transfer = true,
                _ => continue,
            }

            if let Some(args) = self.args(cap)? {
                for arg in self.doc.children(args)? {
                    if !self.doc.is_string(arg) {
                        continue;
                    }
                    let account = self.doc.text(arg)?;
                    let account = account.strip_prefix(b"k:").unwrap_or(account);
                    if account == key {
                        return Ok(true);
                    }
                }
            }
        }

        Ok(!has_transfer)
    }

    /// `meta` if its keys are exactly the expected ones, in order
    pub fn valid_meta(&self) -> Result<Option<usize>, ParserError> {
        let meta = match self.field(JsonDocument::ROOT, "meta")? {
            Some(meta) if matches!(self.doc.kind(meta), Ok(TokenKind::Object)) => meta,
            _ => return Ok(None),
        };

        if self.doc.object_element_count(meta)? != META_KEYS.len() {
            return Ok(None);
        }

        for (i, expected) in META_KEYS.iter().enumerate() {
            let key = self.doc.object_nth_key(meta, i)?;
            if !self.doc.string_eq(key, expected) {
                return Ok(None);
            }
        }

        Ok(Some(meta))
    }
}
