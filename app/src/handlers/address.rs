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
    constants::{ApduError as Error, IO_ASYNCH_REPLY, PUB_KEY_LENGTH},
    crypto::{HdPath, KeyProvider},
    dispatcher::ApduHandler,
    handlers::{App, Pending},
    sys,
    utils::ApduBufferRead,
};

/// Public key at the requested path, optionally confirmed on screen first
pub struct GetAddress<'a, 's, K> {
    app: &'a mut App<'s, K>,
}

impl<'a, 's, K: KeyProvider> GetAddress<'a, 's, K> {
    pub fn new(app: &'a mut App<'s, K>) -> Self {
        Self { app }
    }
}

impl<'a, 's, K: KeyProvider> ApduHandler for GetAddress<'a, 's, K> {
    #[inline(never)]
    fn handle(
        &mut self,
        flags: &mut u32,
        tx: &mut u32,
        buffer: ApduBufferRead<'_>,
    ) -> Result<(), Error> {
        sys::zemu_log_stack("GetAddress::handle\x00");
        *tx = 0;

        let require_confirmation = buffer.p1() >= 1;
        let payload = buffer.payload().map_err(|_| Error::WrongLength)?;
        let path = HdPath::read(payload)?;

        let pubkey = self
            .app
            .keys
            .public_key(&path)
            .map_err(|_| Error::ExecutionError)?;

        if require_confirmation {
            // an address review replaces whatever was in flight
            self.app.reset();
            self.app.pending = Pending::Address(pubkey);
            *flags |= IO_ASYNCH_REPLY;
            return Ok(());
        }

        let out = buffer.write();
        if out.len() < PUB_KEY_LENGTH + 2 {
            return Err(Error::OutputBufferTooSmall);
        }
        out[..PUB_KEY_LENGTH].copy_from_slice(&pubkey);
        *tx = PUB_KEY_LENGTH as u32;

        Ok(())
    }
}
