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

//! Compile-time helpers for the kadena app
//!
//! See [macro@version] for more documentation

use proc_macro::TokenStream;
use proc_macro_error::proc_macro_error;

mod version;
#[proc_macro]
#[proc_macro_error]
/// Reads the file located at the provided input path extracts the version variables from it.
///
/// The expected contents of the file is a list of definitions of the format
/// `NAME=VALUE`, lines starting with `#` are ignored.
///
/// Each value is parsed and saved as an `u8`, and each definition will
/// be made available in the macro call site with the provided name.
///
/// # Note
///
/// The provided path will be made relative to the `CARGO_MANIFEST_DIR` of the invoking crate.
///
/// In other words, the provided input path will have the current crate's root directory prepended
pub fn version(input: TokenStream) -> TokenStream {
    version::version(input)
}
