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
//! Allocation free JSON handling
//!
//! The tokenizer scans a buffer once into a flat array of [`Token`]s that only
//! hold offsets into that buffer, [`JsonDocument`] pairs both back together and
//! answers structural queries by comparing token offsets.

mod navigator;
mod tokenizer;

pub use navigator::{Children, JsonDocument};
pub use tokenizer::{tokenize, Token, TokenKind, Tokens};
