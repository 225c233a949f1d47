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
/// Settings the device holder can toggle at runtime
#[derive(Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct AppMode {
    expert: bool,
}

impl AppMode {
    pub const fn new() -> Self {
        Self { expert: false }
    }

    /// Expert mode unlocks signing bare hashes
    pub fn expert(&self) -> bool {
        self.expert
    }

    pub fn set_expert(&mut self, enabled: bool) {
        tracing::debug!(enabled, "expert mode toggled");
        self.expert = enabled;
    }
}
