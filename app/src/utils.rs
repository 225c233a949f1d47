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
mod apdu_wrapper;
pub use apdu_wrapper::*;

mod buffer_upload;
pub use buffer_upload::*;

mod swapping_buffer;
pub use swapping_buffer::*;

mod blake2b;
pub use blake2b::*;

mod app_mode;
pub use app_mode::*;

#[cfg(test)]
#[macro_export]
macro_rules! assert_error_code {
    ($tx:expr, $buffer:ident, $expected:expr) => {
        let pos: usize = $tx as _;
        let actual: ApduError = (&$buffer[pos - 2..pos]).try_into().unwrap();
        assert_eq!(actual, $expected);
    };
}

/// This function returns the index of the
/// first null byte in the slice or the total len of the slice,
/// whichever comes first
pub fn rs_strlen(s: &[u8]) -> usize {
    s.iter().position(|&c| c == 0).unwrap_or(s.len())
}

#[cfg_attr(test, derive(Debug))]
pub struct OutputBufferTooSmall;

pub fn hex_encode(
    input: impl AsRef<[u8]>,
    output: &mut [u8],
) -> Result<usize, OutputBufferTooSmall> {
    let input = input.as_ref();

    if input.len() * 2 > output.len() {
        return Err(OutputBufferTooSmall);
    }

    const HEX_CHARS_LOWER: &[u8; 16] = b"0123456789abcdef";

    for (byte, out) in input.iter().zip(output.chunks_mut(2)) {
        // output length was checked above
        out[0] = HEX_CHARS_LOWER[((byte & 0xf0) >> 4) as usize];
        out[1] = HEX_CHARS_LOWER[(byte & 0xf) as usize];
    }

    Ok(input.len() * 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_lowercase() {
        let mut out = [0; 8];
        let len = hex_encode([0xde, 0xad, 0x0b, 0x01], &mut out).unwrap();
        assert_eq!(&out[..len], b"dead0b01");

        assert!(hex_encode([0; 5], &mut out).is_err());
    }

    #[test]
    fn strlen() {
        assert_eq!(rs_strlen(b"abc\0def"), 3);
        assert_eq!(rs_strlen(b"abc"), 3);
    }
}
