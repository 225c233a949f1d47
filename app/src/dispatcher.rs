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
use crate::constants::{instructions::*, ApduError};

use crate::handlers::{address::GetAddress, signing::Sign, version::GetVersion, App};

use crate::{crypto::KeyProvider, parser::TxKind, utils::ApduBufferRead};

pub trait ApduHandler {
    fn handle(
        &mut self,
        flags: &mut u32,
        tx: &mut u32,
        apdu_buffer: ApduBufferRead<'_>,
    ) -> Result<(), ApduError>;
}

#[inline(never)]
pub fn apdu_dispatch<K: KeyProvider>(
    app: &mut App<'_, K>,
    flags: &mut u32,
    tx: &mut u32,
    apdu_buffer: ApduBufferRead<'_>,
) -> Result<(), ApduError> {
    crate::sys::zemu_log_stack("apdu_dispatch\x00");
    *flags = 0;
    *tx = 0;

    if apdu_buffer.cla() != CLA {
        return Err(ApduError::ClaNotSupported);
    }

    match apdu_buffer.ins() {
        INS_GET_VERSION => GetVersion.handle(flags, tx, apdu_buffer),
        INS_GET_ADDR => GetAddress::new(app).handle(flags, tx, apdu_buffer),
        INS_SIGN => Sign::new(app, TxKind::Json).handle(flags, tx, apdu_buffer),
        INS_SIGN_HASH => Sign::new(app, TxKind::Hash).handle(flags, tx, apdu_buffer),
        INS_SIGN_TRANSFER => Sign::new(app, TxKind::Transfer).handle(flags, tx, apdu_buffer),
        _ => Err(ApduError::InsNotSupported),
    }
}

impl<'s, K: KeyProvider> ApduHandler for App<'s, K> {
    fn handle(
        &mut self,
        flags: &mut u32,
        tx: &mut u32,
        apdu_buffer: ApduBufferRead<'_>,
    ) -> Result<(), ApduError> {
        apdu_dispatch(self, flags, tx, apdu_buffer)
    }
}

/// Run one command and append the status word to the response
pub fn handle_apdu<H: ApduHandler>(
    handler: &mut H,
    flags: &mut u32,
    tx: &mut u32,
    rx: u32,
    apdu_buffer: &mut [u8],
) {
    crate::sys::zemu_log_stack("handle_apdu\x00");

    //construct reader
    let status_word = match ApduBufferRead::new(apdu_buffer, rx) {
        Ok(reader) => match handler.handle(flags, tx, reader) {
            Ok(()) => ApduError::Success,
            Err(e) => e,
        },
        Err(_) => ApduError::WrongLength,
    } as u16;

    let txu = *tx as usize;
    match apdu_buffer.get_mut(txu..txu + 2) {
        Some(sw) => {
            sw.copy_from_slice(status_word.to_be_bytes().as_ref());
            *tx += 2;
        }
        None => *tx = 0,
    }
}
