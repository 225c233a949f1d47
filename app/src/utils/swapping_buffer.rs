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
use educe::Educe;

use crate::sys;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Ram,
    Flash,
}

/// Not enough room left for an append, nothing was written
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct OutOfSpace {
    pub needed: usize,
    pub available: usize,
}

/// Append-only accumulator over a small fast tier and a large persistent tier
///
/// Data lands in RAM while it fits, the first append that would overflow RAM
/// moves everything to flash, which then stays in use until [`reset`].
/// An append is all or nothing.
///
/// Flash holds every request larger than RAM, and is only written once RAM is
/// exhausted.
///
/// [`reset`]: ChunkBuffer::reset
#[derive(Educe)]
#[educe(Debug)]
pub struct ChunkBuffer<'s> {
    #[educe(Debug(ignore))]
    ram: &'s mut [u8],
    ram_pos: usize,
    #[educe(Debug(ignore))]
    flash: &'s mut [u8],
    flash_pos: usize,
    tier: Tier,
}

impl<'s> ChunkBuffer<'s> {
    pub fn new(ram: &'s mut [u8], flash: &'s mut [u8]) -> Self {
        Self {
            ram,
            ram_pos: 0,
            flash,
            flash_pos: 0,
            tier: Tier::Ram,
        }
    }

    /// Rewind both tiers, stale bytes are never read back
    pub fn reset(&mut self) {
        self.ram_pos = 0;
        self.flash_pos = 0;
        self.tier = Tier::Ram;
    }

    /// Largest request this buffer can hold
    pub fn capacity(&self) -> usize {
        core::cmp::max(self.ram.len(), self.flash.len())
    }

    pub fn len(&self) -> usize {
        match self.tier {
            Tier::Ram => self.ram_pos,
            Tier::Flash => self.flash_pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flash(&self) -> bool {
        self.tier == Tier::Flash
    }

    /// Everything appended since the last reset
    pub fn contents(&self) -> &[u8] {
        match self.tier {
            Tier::Ram => &self.ram[..self.ram_pos],
            Tier::Flash => &self.flash[..self.flash_pos],
        }
    }

    pub fn append(&mut self, data: &[u8]) -> Result<usize, OutOfSpace> {
        match self.tier {
            Tier::Ram if self.ram.len() - self.ram_pos >= data.len() => {
                self.ram[self.ram_pos..][..data.len()].copy_from_slice(data);
                self.ram_pos += data.len();
            }
            Tier::Ram => {
                let needed = self.ram_pos + data.len();
                if needed > self.flash.len() {
                    return Err(OutOfSpace {
                        needed,
                        available: self.flash.len(),
                    });
                }

                sys::zemu_log_stack("ChunkBuffer::swap\x00");
                tracing::debug!(moved = self.ram_pos, "chunk buffer moved to flash");

                self.flash[..self.ram_pos].copy_from_slice(&self.ram[..self.ram_pos]);
                self.flash[self.ram_pos..needed].copy_from_slice(data);
                self.flash_pos = needed;
                self.ram_pos = 0;
                self.tier = Tier::Flash;
            }
            Tier::Flash => {
                let available = self.flash.len() - self.flash_pos;
                if available < data.len() {
                    return Err(OutOfSpace {
                        needed: data.len(),
                        available,
                    });
                }

                self.flash[self.flash_pos..][..data.len()].copy_from_slice(data);
                self.flash_pos += data.len();
            }
        }

        Ok(data.len())
    }
}
