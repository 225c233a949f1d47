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
use lexical_core::FormattedSize;

use crate::{
    constants::MAX_ITEM_LENGTH_IN_PAGE,
    parser::{
        items::{Decoder, DisplayItem, ItemKind},
        json::JsonDocument,
        ParserError,
    },
    utils::TxHash,
};

pub const WARNING_TEXT: &[u8] = b"UNSAFE TRANSACTION. This transaction's code was not recognized and does not limit capabilities for all signers. Signing this transaction may make arbitrary actions on the chain including loss of all funds.";
pub const CAUTION_TEXT: &[u8] = b"'meta' field of transaction not recognized";
pub const TX_TOO_LARGE_TEXT: &[u8] =
    b"Transaction too large for Ledger to display.  PROCEED WITH GREAT CAUTION.  Do you want to continue?";
pub const ARGS_TOO_LARGE_TEXT: &[u8] = b"args cannot be displayed on Ledger";

/// Bounded appender over a caller supplied buffer
///
/// One byte is always kept free for the terminator, a write that would
/// need it fails instead of being cut short.
pub struct Writer<'o> {
    out: &'o mut [u8],
    pos: usize,
}

impl<'o> Writer<'o> {
    pub fn new(out: &'o mut [u8]) -> Self {
        Self { out, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<&mut Self, ParserError> {
        let end = self.pos + bytes.len();
        if end >= self.out.len() {
            return Err(ParserError::DataTooLarge);
        }

        self.out[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(self)
    }

    pub fn push_quoted(&mut self, bytes: &[u8]) -> Result<&mut Self, ParserError> {
        self.push(b"\"")?.push(bytes)?.push(b"\"")
    }

    pub fn push_number(&mut self, n: usize) -> Result<&mut Self, ParserError> {
        let mut buffer = [0; usize::FORMATTED_SIZE_DECIMAL];
        let digits = lexical_core::write(n, &mut buffer);
        self.push(digits)
    }

    /// Terminate the output, returning the length without the terminator
    pub fn finish(self) -> Result<usize, ParserError> {
        let slot = self.out.get_mut(self.pos).ok_or(ParserError::DataTooLarge)?;
        *slot = 0;
        Ok(self.pos)
    }
}

/// Everything the value of an item may draw from
pub struct Renderer<'r, 'b> {
    pub doc: &'r JsonDocument<'b>,
    pub hash: &'r TxHash,
    pub address: &'r [u8],
}

impl<'r, 'b> Renderer<'r, 'b> {
    fn decoder(&self) -> Decoder<'r, 'b> {
        Decoder { doc: self.doc }
    }

    /// Write the value of `item` into `out`, NUL terminated
    ///
    /// Returns the value length, never writes past `out`.
    #[inline(never)]
    pub fn render(&self, item: &DisplayItem, out: &mut [u8]) -> Result<usize, ParserError> {
        let mut w = Writer::new(out);

        match item.kind {
            ItemKind::Signing => w.push(b"Transaction")?,
            ItemKind::Requiring => w.push(b"Capabilities")?,
            ItemKind::PayingGas => w.push(b" ")?,
            ItemKind::Unsafe => w.push(WARNING_TEXT)?,
            ItemKind::Caution => w.push(CAUTION_TEXT)?,
            ItemKind::TooLarge => w.push(TX_TOO_LARGE_TEXT)?,
            ItemKind::Hash => w.push(self.hash.base64())?,
            ItemKind::SignForAddress => w.push(self.address)?,
            ItemKind::Network | ItemKind::SignerKey | ItemKind::UnscopedSigner | ItemKind::Chain => {
                self.plain(item, &mut w)?
            }
            ItemKind::Transfer(_) => self.transfer(item, &mut w)?,
            ItemKind::CrossTransfer(_) => w.push(b"Cross-chain ").and_then(|w| self.transfer(item, w))?,
            ItemKind::Rotate => self.rotate(item, &mut w)?,
            ItemKind::Gas => self.gas(item, &mut w)?,
            ItemKind::UnknownCapability(_) => self.unknown(item, &mut w)?,
        };

        w.finish()
    }

    fn plain<'w, 'o>(&self, item: &DisplayItem, w: &'w mut Writer<'o>) -> Result<&'w mut Writer<'o>, ParserError> {
        let value = self.doc.text(item.token())?;
        if value.is_empty() {
            return Err(ParserError::DataLengthZero);
        }
        w.push(value)
    }

    fn arg(&self, cap: usize, n: usize) -> Result<&'b [u8], ParserError> {
        let args = self.decoder().args(cap)?.ok_or(ParserError::NoData)?;
        let arg = self.doc.array_nth_element(args, n)?;
        self.doc.text(arg)
    }

    fn transfer<'w, 'o>(&self, item: &DisplayItem, w: &'w mut Writer<'o>) -> Result<&'w mut Writer<'o>, ParserError> {
        let cap = item.token();
        let from = self.arg(cap, 0)?;
        let to = self.arg(cap, 1)?;
        let amount = self.arg(cap, 2)?;

        w.push(amount)?
            .push(b" from ")?
            .push_quoted(from)?
            .push(b" to ")?
            .push_quoted(to)?;

        if let ItemKind::CrossTransfer(_) = item.kind {
            let chain = self.arg(cap, 3)?;
            w.push(b" to chain ")?.push_quoted(chain)?;
        }

        Ok(w)
    }

    fn rotate<'w, 'o>(&self, item: &DisplayItem, w: &'w mut Writer<'o>) -> Result<&'w mut Writer<'o>, ParserError> {
        let account = self.arg(item.token(), 0)?;
        w.push_quoted(account)
    }

    fn gas<'w, 'o>(&self, item: &DisplayItem, w: &'w mut Writer<'o>) -> Result<&'w mut Writer<'o>, ParserError> {
        let meta = item.token();
        let limit = self.doc.object_get_field(meta, "gasLimit")?;
        let price = self.doc.object_get_field(meta, "gasPrice")?;

        w.push(b"at most ")?
            .push(self.doc.text(limit)?)?
            .push(b" at price ")?
            .push(self.doc.text(price)?)
    }

    fn unknown<'w, 'o>(&self, item: &DisplayItem, w: &'w mut Writer<'o>) -> Result<&'w mut Writer<'o>, ParserError> {
        let cap = item.token();
        let name = self.doc.object_get_field(cap, "name")?;
        w.push(b"name: ")?.push(self.doc.text(name)?)?.push(b", ")?;

        if !item.can_display {
            return w.push(ARGS_TOO_LARGE_TEXT);
        }

        let args = match self.decoder().args(cap)? {
            Some(args) if self.doc.array_element_count(args)? > 0 => args,
            _ => return w.push(b"no args"),
        };

        for (i, arg) in self.doc.children(args)?.enumerate() {
            if i > 0 {
                w.push(b", ")?;
            }
            w.push(b"arg ")?.push_number(i + 1)?.push(b": ")?;

            let text = self.doc.text(arg)?;
            if self.doc.is_string(arg) {
                w.push_quoted(text)?;
            } else {
                w.push(text)?;
            }
        }

        Ok(w)
    }
}

/// Copy page `page` of `value` into `out`, NUL terminated
///
/// Pages are as wide as `out` minus the terminator, and never wider than
/// [`MAX_ITEM_LENGTH_IN_PAGE`]. Returns the page count.
pub fn paginate(value: &[u8], out: &mut [u8], page: u8) -> Result<u8, ParserError> {
    let width = out
        .len()
        .checked_sub(1)
        .filter(|&w| w > 0)
        .ok_or(ParserError::DataTooLarge)?;
    let width = core::cmp::min(width, MAX_ITEM_LENGTH_IN_PAGE);
    let pages = core::cmp::max(1, (value.len() + width - 1) / width);
    let pages = u8::try_from(pages).map_err(|_| ParserError::DataTooLarge)?;

    if page >= pages {
        return Err(ParserError::DisplayPageOutOfRange);
    }

    let start = page as usize * width;
    let end = core::cmp::min(start + width, value.len());
    let chunk = &value[start..end];

    out[..chunk.len()].copy_from_slice(chunk);
    out[chunk.len()] = 0;

    Ok(pages)
}
