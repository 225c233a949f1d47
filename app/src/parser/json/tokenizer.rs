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
use arrayvec::ArrayVec;

use crate::{
    constants::{MAX_JSON_DEPTH, MAX_NUMBER_OF_TOKENS},
    parser::ParserError,
    sys,
};

/// Marks a container whose closing byte has not been seen yet
const OPEN: u16 = u16::MAX;

pub type Tokens = ArrayVec<Token, MAX_NUMBER_OF_TOKENS>;

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub enum TokenKind {
    Object,
    Array,
    String,
    Primitive,
}

/// One syntactic unit of a JSON buffer
///
/// Containers span from their opening to one past their closing byte,
/// strings span their contents without the surrounding quotes.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct Token {
    kind: TokenKind,
    start: u16,
    end: u16,
}

impl Token {
    fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            start: start as u16,
            end: end as u16,
        }
    }

    fn open(kind: TokenKind, start: usize) -> Self {
        Self {
            kind,
            start: start as u16,
            end: OPEN,
        }
    }

    fn is_open(&self) -> bool {
        self.end == OPEN
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn start(&self) -> usize {
        self.start as usize
    }

    pub fn end(&self) -> usize {
        self.end as usize
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, TokenKind::Object | TokenKind::Array)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// right after `[`, a value or `]`
    FirstValue,
    Value,
    /// right after `{`, a key or `}`
    FirstKey,
    Key,
    Colon,
    /// after a complete value, `,` or the closing byte of the parent
    Separator,
}

/// Index of the innermost container still waiting for its closing byte
fn innermost_open(tokens: &Tokens) -> Option<usize> {
    tokens.iter().rposition(Token::is_open)
}

fn push(tokens: &mut Tokens, token: Token) -> Result<(), ParserError> {
    tokens
        .try_push(token)
        .map_err(|_| ParserError::JsonTooManyTokens)
}

/// Returns the index of the closing quote of a string whose contents start at `from`
fn scan_string(buffer: &[u8], from: usize) -> Result<usize, ParserError> {
    let mut i = from;
    while i < buffer.len() {
        match buffer[i] {
            b'"' => return Ok(i),
            b'\\' => {
                i += 1;
                match buffer.get(i) {
                    None => return Err(ParserError::JsonIncomplete),
                    Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'r' | b'n' | b't') => {}
                    Some(b'u') => {
                        for k in 1..=4 {
                            match buffer.get(i + k) {
                                None => return Err(ParserError::JsonIncomplete),
                                Some(h) if h.is_ascii_hexdigit() => {}
                                Some(_) => return Err(ParserError::UnexpectedCharacters),
                            }
                        }
                        i += 4;
                    }
                    Some(_) => return Err(ParserError::UnexpectedCharacters),
                }
            }
            _ => {}
        }
        i += 1;
    }

    Err(ParserError::JsonIncomplete)
}

/// Returns one past the last byte of a primitive starting at `from`
fn scan_primitive(buffer: &[u8], from: usize) -> Result<usize, ParserError> {
    for (i, &c) in buffer.iter().enumerate().skip(from) {
        match c {
            b'\t' | b'\r' | b'\n' | b' ' | b',' | b':' | b']' | b'}' | b'"' | b'[' | b'{' => {
                return Ok(i)
            }
            32..=126 => {}
            _ => return Err(ParserError::UnexpectedCharacters),
        }
    }

    Ok(buffer.len())
}

/// Scan `buffer` into `tokens`, which is cleared first
///
/// Tokens are stored in discovery order, so index 0 is always the root value.
/// Exactly one root value is accepted, surrounded by optional whitespace.
#[inline(never)]
pub fn tokenize(buffer: &[u8], tokens: &mut Tokens) -> Result<(), ParserError> {
    sys::zemu_log_stack("json::tokenize\x00");
    tokens.clear();

    if buffer.len() >= OPEN as usize {
        return Err(ParserError::ValueOutOfRange);
    }

    let mut expect = Expect::Value;
    let mut depth = 0usize;
    let mut root_done = false;

    let mut pos = 0;
    while pos < buffer.len() {
        let c = buffer[pos];
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => {}
            _ if root_done => return Err(ParserError::UnexpectedCharacters),
            b'{' | b'[' => {
                if !matches!(expect, Expect::Value | Expect::FirstValue) {
                    return Err(ParserError::UnexpectedCharacters);
                }
                depth += 1;
                if depth > MAX_JSON_DEPTH {
                    return Err(ParserError::JsonTooDeep);
                }

                let (kind, next) = if c == b'{' {
                    (TokenKind::Object, Expect::FirstKey)
                } else {
                    (TokenKind::Array, Expect::FirstValue)
                };
                push(tokens, Token::open(kind, pos))?;
                expect = next;
            }
            b'}' | b']' => {
                let kind = if c == b'}' {
                    TokenKind::Object
                } else {
                    TokenKind::Array
                };
                match (expect, kind) {
                    (Expect::Separator, _)
                    | (Expect::FirstKey, TokenKind::Object)
                    | (Expect::FirstValue, TokenKind::Array) => {}
                    _ => return Err(ParserError::UnexpectedCharacters),
                }

                let idx = innermost_open(tokens).ok_or(ParserError::UnexpectedCharacters)?;
                let container = &mut tokens[idx];
                if container.kind != kind {
                    return Err(ParserError::UnexpectedCharacters);
                }
                container.end = (pos + 1) as u16;
                depth -= 1;

                expect = Expect::Separator;
                root_done = depth == 0;
            }
            b'"' => {
                let end = scan_string(buffer, pos + 1)?;
                expect = match expect {
                    Expect::Value | Expect::FirstValue => Expect::Separator,
                    Expect::Key | Expect::FirstKey => Expect::Colon,
                    _ => return Err(ParserError::UnexpectedCharacters),
                };
                push(tokens, Token::new(TokenKind::String, pos + 1, end))?;

                root_done = depth == 0;
                pos = end;
            }
            b':' => {
                if expect != Expect::Colon {
                    return Err(ParserError::UnexpectedCharacters);
                }
                expect = Expect::Value;
            }
            b',' => {
                if expect != Expect::Separator {
                    return Err(ParserError::UnexpectedCharacters);
                }
                let parent = innermost_open(tokens).ok_or(ParserError::UnexpectedCharacters)?;
                expect = match tokens[parent].kind {
                    TokenKind::Object => Expect::Key,
                    _ => Expect::Value,
                };
            }
            b'-' | b'0'..=b'9' | b't' | b'f' | b'n' => {
                if !matches!(expect, Expect::Value | Expect::FirstValue) {
                    return Err(ParserError::UnexpectedCharacters);
                }
                let end = scan_primitive(buffer, pos)?;
                push(tokens, Token::new(TokenKind::Primitive, pos, end))?;

                expect = Expect::Separator;
                root_done = depth == 0;
                pos = end - 1;
            }
            _ => return Err(ParserError::UnexpectedCharacters),
        }
        pos += 1;
    }

    if tokens.is_empty() {
        return Err(ParserError::JsonZeroTokens);
    }
    if depth != 0 {
        return Err(ParserError::JsonIncomplete);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::{string::String, vec::Vec};

    fn parse(input: &str) -> Result<Tokens, ParserError> {
        let mut tokens = Tokens::new();
        tokenize(input.as_bytes(), &mut tokens).map(|_| tokens)
    }

    fn spans(input: &str) -> Vec<(TokenKind, &str)> {
        parse(input)
            .unwrap()
            .iter()
            .map(|t| (t.kind(), &input[t.start()..t.end()]))
            .collect()
    }

    #[test]
    fn flat_object() {
        let input = r#"{"a":1,"b":"two","c":null}"#;
        assert_eq!(
            spans(input),
            [
                (TokenKind::Object, input),
                (TokenKind::String, "a"),
                (TokenKind::Primitive, "1"),
                (TokenKind::String, "b"),
                (TokenKind::String, "two"),
                (TokenKind::String, "c"),
                (TokenKind::Primitive, "null"),
            ]
        );
    }

    #[test]
    fn nested_with_whitespace() {
        let input = " { \"k\" : [ 1 , { \"x\" : true } , [ ] ] } \n";
        let tokens = spans(input);
        assert_eq!(tokens.len(), 8);
        assert_eq!(tokens[2], (TokenKind::Array, "[ 1 , { \"x\" : true } , [ ] ]"));
        assert_eq!(tokens[4], (TokenKind::Object, "{ \"x\" : true }"));
        assert_eq!(tokens[6], (TokenKind::Primitive, "true"));
        assert_eq!(tokens[7], (TokenKind::Array, "[ ]"));
    }

    #[test]
    fn escapes_stay_raw() {
        let input = r#"{"code":"(coin.transfer \"k:a\" 1.0)A"}"#;
        let tokens = spans(input);
        assert_eq!(tokens[2].1, r#"(coin.transfer \"k:a\" 1.0)A"#);
    }

    #[test]
    fn errors() {
        assert_eq!(parse("").unwrap_err(), ParserError::JsonZeroTokens);
        assert_eq!(parse("   ").unwrap_err(), ParserError::JsonZeroTokens);
        assert_eq!(parse(r#"{"a":"#).unwrap_err(), ParserError::JsonIncomplete);
        assert_eq!(parse(r#"{"a":"b"#).unwrap_err(), ParserError::JsonIncomplete);
        assert_eq!(parse(r#"["\u12"#).unwrap_err(), ParserError::JsonIncomplete);
        assert_eq!(parse(r#"{"a" "b"}"#).unwrap_err(), ParserError::UnexpectedCharacters);
        assert_eq!(parse(r#"{"a":1,}"#).unwrap_err(), ParserError::UnexpectedCharacters);
        assert_eq!(parse(r#"{"a"}"#).unwrap_err(), ParserError::UnexpectedCharacters);
        assert_eq!(parse(r#"[1}"#).unwrap_err(), ParserError::UnexpectedCharacters);
        assert_eq!(parse(r#"{1:2}"#).unwrap_err(), ParserError::UnexpectedCharacters);
        assert_eq!(parse(r#"{} {}"#).unwrap_err(), ParserError::UnexpectedCharacters);
        assert_eq!(parse(r#"["\x"]"#).unwrap_err(), ParserError::UnexpectedCharacters);
        assert_eq!(parse("]").unwrap_err(), ParserError::UnexpectedCharacters);
    }

    #[test]
    fn too_many_tokens() {
        let mut input = String::from("[");
        for i in 0..MAX_NUMBER_OF_TOKENS {
            if i > 0 {
                input.push(',');
            }
            input.push('1');
        }
        input.push(']');

        assert_eq!(parse(&input).unwrap_err(), ParserError::JsonTooManyTokens);
    }

    #[test]
    fn too_deep() {
        let input: String = "[".repeat(MAX_JSON_DEPTH + 1) + &"]".repeat(MAX_JSON_DEPTH + 1);
        assert_eq!(parse(&input).unwrap_err(), ParserError::JsonTooDeep);

        let input: String = "[".repeat(MAX_JSON_DEPTH) + &"]".repeat(MAX_JSON_DEPTH);
        assert_eq!(parse(&input).unwrap().len(), MAX_JSON_DEPTH);
    }

    #[test]
    fn reparse_is_idempotent() {
        let input = br#"{"signers":[{"pubKey":"ab","clist":[]}],"meta":{}}"#;
        let mut first = Tokens::new();
        let mut second = Tokens::new();
        tokenize(input, &mut first).unwrap();
        tokenize(input, &mut second).unwrap();
        tokenize(input, &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[cfg(not(miri))]
    proptest! {
        #[test]
        fn offsets_stay_in_bounds(input in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut tokens = Tokens::new();
            if tokenize(&input, &mut tokens).is_ok() {
                for t in tokens.iter() {
                    prop_assert!(t.start() <= t.end());
                    prop_assert!(t.end() <= input.len());
                }
            }
        }

        #[test]
        fn serialized_documents_parse(values in proptest::collection::vec(any::<i64>(), 0..64), key in "[a-z]{2,8}") {
            let doc = serde_json::json!({ key.clone(): values, "s": key });
            let text = serde_json::to_string(&doc).unwrap();
            let tokens = parse(&text).unwrap();
            // root, two keys, array, string value and every number
            prop_assert_eq!(tokens.len(), 5 + values.len());
        }
    }
}
