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
    constants::{ApduError as Error, IO_ASYNCH_REPLY},
    crypto::{HdPath, KeyProvider},
    dispatcher::ApduHandler,
    handlers::{App, Pending},
    parser::{ParserError, TxKind},
    sys,
    utils::{ApduBufferRead, Upload, Uploader},
};

/// Chunked signing request, for any of the payload kinds
pub struct Sign<'a, 's, K> {
    app: &'a mut App<'s, K>,
    kind: TxKind,
}

impl<'a, 's, K: KeyProvider> Sign<'a, 's, K> {
    pub fn new(app: &'a mut App<'s, K>, kind: TxKind) -> Self {
        Self { app, kind }
    }

    /// Parse the reassembled request and make sure every item renders
    #[inline(never)]
    fn start_sign(&mut self, pubkey: &[u8; 32]) -> Result<(), ParserError> {
        let app = &mut *self.app;

        match self.kind {
            TxKind::Json => app.tx.parse_json(app.buffer.contents(), pubkey)?,
            TxKind::Hash => app
                .tx
                .parse_hash(app.buffer.contents(), pubkey, app.mode.expert())?,
            TxKind::Transfer => {
                app.tx
                    .parse_transfer(app.buffer.contents(), pubkey, &mut app.template)?
            }
        }

        app.tx.view(app.json()).validate()
    }

    /// Write the refusal reason as the response and drop the request
    fn refuse(&mut self, err: ParserError, out: &mut [u8], tx: &mut u32) -> Error {
        tracing::warn!(error = err.description(), "signing request refused");

        let msg = err.description().as_bytes();
        // keep room for the status word
        let len = core::cmp::min(msg.len(), out.len().saturating_sub(2));
        out[..len].copy_from_slice(&msg[..len]);
        *tx = len as u32;

        self.app.reset();
        Error::DataInvalid
    }
}

impl<'a, 's, K: KeyProvider> ApduHandler for Sign<'a, 's, K> {
    #[inline(never)]
    fn handle(
        &mut self,
        flags: &mut u32,
        tx: &mut u32,
        buffer: ApduBufferRead<'_>,
    ) -> Result<(), Error> {
        sys::zemu_log_stack("Sign::handle\x00");
        *tx = 0;

        let initialized = self.app.uploading
            && matches!(self.app.request, Some((_, kind)) if kind == self.kind);
        let upload = Uploader::new(&mut self.app.buffer, initialized).upload(&buffer);

        let path = match upload {
            Ok(Upload::Started(payload)) => {
                self.app.reset();
                let path = HdPath::read(payload)?;
                self.app.request = Some((path, self.kind));
                self.app.uploading = true;
                return Ok(());
            }
            Ok(Upload::Pending) => return Ok(()),
            Ok(Upload::Complete) => {
                // the buffer is frozen from now on
                self.app.uploading = false;
                match self.app.request {
                    Some((path, _)) => path,
                    None => return Err(Error::TxNotInitialized),
                }
            }
            Err(e) => {
                self.app.reset();
                return Err(e);
            }
        };

        let pubkey = match self.app.keys.public_key(&path) {
            Ok(pubkey) => pubkey,
            Err(_) => {
                self.app.reset();
                return Err(Error::ExecutionError);
            }
        };

        match self.start_sign(&pubkey) {
            Ok(()) => {
                tracing::debug!(items = self.app.tx.items().len(), "request ready for review");
                self.app.pending = Pending::Sign;
                *flags |= IO_ASYNCH_REPLY;
                Ok(())
            }
            Err(err) => Err(self.refuse(err, buffer.write(), tx)),
        }
    }
}
