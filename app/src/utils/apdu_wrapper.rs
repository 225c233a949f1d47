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
use crate::constants::{
    APDU_INDEX_CLA, APDU_INDEX_INS, APDU_INDEX_LEN, APDU_INDEX_P1, APDU_INDEX_P2, APDU_MIN_LENGTH,
};

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub enum ApduBufferReadError {
    BufferTooSmall { got: usize, expected: usize },
    WrongPayloadLength { len: usize, rx: usize },
}

/// Read access to an incoming command
///
/// Wraps the whole apdu buffer, which is also where the response is written,
/// together with the number of bytes actually received.
pub struct ApduBufferRead<'apdu> {
    buf: &'apdu mut [u8],
    rx: usize,
}

impl<'apdu> ApduBufferRead<'apdu> {
    pub fn new(buf: &'apdu mut [u8], rx: u32) -> Result<Self, ApduBufferReadError> {
        let rx = rx as usize;
        if rx < APDU_MIN_LENGTH as usize {
            return Err(ApduBufferReadError::BufferTooSmall {
                got: rx,
                expected: APDU_MIN_LENGTH as usize,
            });
        }

        if buf.len() < rx {
            return Err(ApduBufferReadError::BufferTooSmall {
                got: buf.len(),
                expected: rx,
            });
        }

        Ok(Self { buf, rx })
    }

    pub fn cla(&self) -> u8 {
        self.buf[APDU_INDEX_CLA]
    }

    pub fn ins(&self) -> u8 {
        self.buf[APDU_INDEX_INS]
    }

    pub fn p1(&self) -> u8 {
        self.buf[APDU_INDEX_P1]
    }

    pub fn p2(&self) -> u8 {
        self.buf[APDU_INDEX_P2]
    }

    /// The command data, as delimited by the length byte
    pub fn payload(&self) -> Result<&[u8], ApduBufferReadError> {
        let len = self.buf[APDU_INDEX_LEN] as usize;
        let start = APDU_MIN_LENGTH as usize;

        if start + len > self.rx {
            return Err(ApduBufferReadError::WrongPayloadLength { len, rx: self.rx });
        }

        Ok(&self.buf[start..start + len])
    }

    /// Give up read access and obtain the buffer to write the response into
    pub fn write(self) -> &'apdu mut [u8] {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_payload() {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&[0x00, 0x22, 0x01, 0x00, 0x03, 0xaa, 0xbb, 0xcc]);

        let apdu = ApduBufferRead::new(&mut buf, 8).unwrap();
        assert_eq!(apdu.ins(), 0x22);
        assert_eq!(apdu.p1(), 0x01);
        assert_eq!(apdu.payload().unwrap(), &[0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn length_byte_beyond_rx() {
        let mut buf = [0u8; 16];
        buf[4] = 10;

        let apdu = ApduBufferRead::new(&mut buf, 8).unwrap();
        assert_eq!(
            apdu.payload().unwrap_err(),
            ApduBufferReadError::WrongPayloadLength { len: 10, rx: 8 }
        );
    }

    #[test]
    fn too_short() {
        let mut buf = [0u8; 4];
        assert!(ApduBufferRead::new(&mut buf, 4).is_err());
        let mut buf = [0u8; 4];
        assert!(ApduBufferRead::new(&mut buf, 5).is_err());
    }
}
