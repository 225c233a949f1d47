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
use proc_macro::TokenStream;
use proc_macro2::Span;
use proc_macro_error::abort;
use quote::quote;
use syn::{parse_macro_input, Error, Ident, LitInt, LitStr};

use std::path::{Path, PathBuf};

/// A single `NAME=VALUE` line of the version file
struct Definition {
    name: String,
    value: u8,
}

pub fn version(input: TokenStream) -> TokenStream {
    let data_filepath = parse_macro_input!(input as LitStr);

    let data = match retrieve_data(data_filepath.value(), data_filepath.span()) {
        Err(e) => return e.into_compile_error().into(),
        Ok(data) => data,
    };

    let consts = data.iter().map(|Definition { name, value }| {
        let name = Ident::new(name, Span::call_site());
        let value = LitInt::new(&value.to_string(), Span::call_site());

        quote! {
            pub const #name: u8 = #value;
        }
    });

    let out = quote! {
        #(#consts)*
    };

    out.into()
}

fn retrieve_data(path: impl AsRef<Path>, path_span: Span) -> Result<Vec<Definition>, Error> {
    let base_path: PathBuf = match ::std::env::var_os("CARGO_MANIFEST_DIR") {
        Some(dir) => dir.into(),
        None => abort!(path_span, "Missing `CARGO_MANIFEST_DIR` env var"),
    };

    let mut data_path = base_path;
    data_path.push(path.as_ref());

    let data = std::fs::read_to_string(data_path.as_path()).map_err(|err| {
        Error::new(
            path_span,
            format!("Could not read file. Path: {:?}; err={:?}", data_path, err),
        )
    })?;

    let mut definitions: Vec<Definition> = Vec::new();
    for (i, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, value) = line.split_once('=').ok_or_else(|| {
            Error::new(
                path_span,
                format!("Line #{} is not of the form NAME=VALUE: {}", i + 1, line),
            )
        })?;
        let name = name.trim();

        let value = value.trim().parse::<u8>().map_err(|err| {
            Error::new(
                path_span,
                format!("Line #{}'s value is not a valid u8; err={:?}", i + 1, err),
            )
        })?;

        if definitions.iter().any(|d| d.name == name) {
            abort!(path_span, "{} is defined more than once", name);
        }

        definitions.push(Definition {
            name: name.to_string(),
            value,
        });
    }

    Ok(definitions)
}
