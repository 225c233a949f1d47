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
    constants::{version, ApduError as Error, TARGET_ID},
    dispatcher::ApduHandler,
    sys,
    utils::ApduBufferRead,
};

pub struct GetVersion;

impl GetVersion {
    /// Test flag, major, minor, patch, locked flag and target id
    pub const RESPONSE_LEN: usize = 1 + 2 * 3 + 1 + 4;
}

impl ApduHandler for GetVersion {
    #[inline(never)]
    fn handle(
        &mut self,
        _: &mut u32,
        tx: &mut u32,
        buffer: ApduBufferRead<'_>,
    ) -> Result<(), Error> {
        sys::zemu_log_stack("GetVersion::handle\x00");
        *tx = 0;

        let out = buffer.write();
        if out.len() < Self::RESPONSE_LEN + 2 {
            return Err(Error::OutputBufferTooSmall);
        }

        out[0] = cfg!(feature = "dev") as u8;
        out[1..3].copy_from_slice(&(version::APPVERSION_M as u16).to_be_bytes());
        out[3..5].copy_from_slice(&(version::APPVERSION_N as u16).to_be_bytes());
        out[5..7].copy_from_slice(&(version::APPVERSION_P as u16).to_be_bytes());
        // commands only reach the app while the device is unlocked
        out[7] = 0;
        out[8..12].copy_from_slice(&TARGET_ID.to_be_bytes());

        *tx = Self::RESPONSE_LEN as u32;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::instructions::*, dispatcher::handle_apdu};

    #[test]
    fn version_layout() {
        let mut buffer = [0u8; 260];
        buffer[..5].copy_from_slice(&[CLA, INS_GET_VERSION, 0, 0, 0]);

        let (mut flags, mut tx) = (0, 0);
        handle_apdu(&mut GetVersion, &mut flags, &mut tx, 5, &mut buffer);

        assert_eq!(tx as usize, GetVersion::RESPONSE_LEN + 2);
        assert_eq!(&buffer[1..3], &[0, version::APPVERSION_M]);
        assert_eq!(&buffer[3..5], &[0, version::APPVERSION_N]);
        assert_eq!(&buffer[5..7], &[0, version::APPVERSION_P]);
        assert_eq!(&buffer[8..12], &TARGET_ID.to_be_bytes());
        assert_eq!(&buffer[12..14], &[0x90, 0x00]);
    }
}
