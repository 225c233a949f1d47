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
use crate::parser::ParserError;

use super::{Token, TokenKind};

/// A tokenized buffer
///
/// Every query is read only and answers `NoData` for absent keys, out of
/// range indices or containers of the wrong kind.
#[derive(Clone, Copy)]
pub struct JsonDocument<'b> {
    buffer: &'b [u8],
    tokens: &'b [Token],
}

/// Walks the direct children of a container token
///
/// Tokens nested inside an already visited child are skipped by comparing their
/// start against the end of that child.
pub struct Children<'b> {
    tokens: &'b [Token],
    next: usize,
    container_end: usize,
    prev_end: usize,
}

impl<'b> Iterator for Children<'b> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(token) = self.tokens.get(self.next) {
            if token.start() >= self.container_end {
                return None;
            }

            let idx = self.next;
            self.next += 1;

            if token.start() < self.prev_end {
                continue;
            }

            self.prev_end = token.end();
            return Some(idx);
        }

        None
    }
}

impl<'b> JsonDocument<'b> {
    pub const ROOT: usize = 0;

    pub fn new(buffer: &'b [u8], tokens: &'b [Token]) -> Self {
        Self { buffer, tokens }
    }

    pub fn empty() -> Self {
        Self {
            buffer: &[],
            tokens: &[],
        }
    }

    pub fn num_tokens(&self) -> usize {
        self.tokens.len()
    }

    pub fn token(&self, idx: usize) -> Result<&'b Token, ParserError> {
        self.tokens.get(idx).ok_or(ParserError::NoData)
    }

    pub fn kind(&self, idx: usize) -> Result<TokenKind, ParserError> {
        self.token(idx).map(Token::kind)
    }

    /// Raw bytes of a token, strings without their quotes and with escapes untouched
    pub fn text(&self, idx: usize) -> Result<&'b [u8], ParserError> {
        let token = self.token(idx)?;
        self.buffer
            .get(token.start()..token.end())
            .ok_or(ParserError::UnexpectedBufferEnd)
    }

    /// Whether `idx` is the `null` literal
    pub fn is_null(&self, idx: usize) -> bool {
        matches!(self.token(idx), Ok(t) if t.kind() == TokenKind::Primitive)
            && matches!(self.text(idx), Ok(b"null"))
    }

    pub fn is_string(&self, idx: usize) -> bool {
        matches!(self.kind(idx), Ok(TokenKind::String))
    }

    /// Whether `idx` is a string token with exactly `value` as contents
    pub fn string_eq(&self, idx: usize, value: &[u8]) -> bool {
        self.is_string(idx) && matches!(self.text(idx), Ok(text) if text == value)
    }

    pub fn children(&self, idx: usize) -> Result<Children<'b>, ParserError> {
        let container = self.token(idx)?;

        Ok(Children {
            tokens: self.tokens,
            next: idx + 1,
            container_end: if container.is_container() {
                container.end()
            } else {
                container.start()
            },
            prev_end: container.start(),
        })
    }

    fn expect(&self, idx: usize, kind: TokenKind) -> Result<(), ParserError> {
        if self.kind(idx)? != kind {
            return Err(ParserError::NoData);
        }
        Ok(())
    }

    pub fn array_element_count(&self, array_idx: usize) -> Result<usize, ParserError> {
        self.expect(array_idx, TokenKind::Array)?;
        Ok(self.children(array_idx)?.count())
    }

    pub fn array_nth_element(&self, array_idx: usize, n: usize) -> Result<usize, ParserError> {
        self.expect(array_idx, TokenKind::Array)?;
        self.children(array_idx)?.nth(n).ok_or(ParserError::NoData)
    }

    pub fn object_element_count(&self, object_idx: usize) -> Result<usize, ParserError> {
        self.expect(object_idx, TokenKind::Object)?;
        Ok(self.children(object_idx)?.count() / 2)
    }

    pub fn object_nth_key(&self, object_idx: usize, n: usize) -> Result<usize, ParserError> {
        self.expect(object_idx, TokenKind::Object)?;
        self.children(object_idx)?
            .nth(n * 2)
            .ok_or(ParserError::NoData)
    }

    pub fn object_nth_value(&self, object_idx: usize, n: usize) -> Result<usize, ParserError> {
        self.expect(object_idx, TokenKind::Object)?;
        self.children(object_idx)?
            .nth(n * 2 + 1)
            .ok_or(ParserError::NoData)
    }

    /// Look up `key` among the direct members of the object at `object_idx`
    ///
    /// Unlike [`object_get_value`] this never descends into nested values.
    ///
    /// [`object_get_value`]: JsonDocument::object_get_value
    pub fn object_get_field(&self, object_idx: usize, key: &str) -> Result<usize, ParserError> {
        self.expect(object_idx, TokenKind::Object)?;

        let mut children = self.children(object_idx)?;
        while let Some(key_idx) = children.next() {
            let value_idx = children.next().ok_or(ParserError::NoData)?;
            if self.string_eq(key_idx, key.as_bytes()) {
                return Ok(value_idx);
            }
        }

        Err(ParserError::NoData)
    }

    /// Look up `key` in the object at `object_idx`
    ///
    /// Pairs are visited in order and a container value is searched before its
    /// own key is compared, so a match nested at any depth inside an earlier
    /// value wins over a later sibling. Returns the index of the value token.
    #[inline(never)]
    pub fn object_get_value(&self, object_idx: usize, key: &str) -> Result<usize, ParserError> {
        self.expect(object_idx, TokenKind::Object)?;

        let mut children = self.children(object_idx)?;
        while let Some(key_idx) = children.next() {
            let value_idx = children.next().ok_or(ParserError::NoData)?;

            if let Some(found) = self.search_nested(value_idx, key) {
                return Ok(found);
            }

            if self.string_eq(key_idx, key.as_bytes()) {
                return Ok(value_idx);
            }
        }

        Err(ParserError::NoData)
    }

    fn search_nested(&self, idx: usize, key: &str) -> Option<usize> {
        match self.kind(idx).ok()? {
            TokenKind::Object => self.object_get_value(idx, key).ok(),
            TokenKind::Array => self
                .children(idx)
                .ok()?
                .find_map(|elem| self.search_nested(elem, key)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::json::{tokenize, Tokens};
    use proptest::prelude::*;
    use std::string::ToString;

    fn with_doc<R>(input: &str, f: impl FnOnce(JsonDocument<'_>) -> R) -> R {
        let mut tokens = Tokens::new();
        tokenize(input.as_bytes(), &mut tokens).unwrap();
        f(JsonDocument::new(input.as_bytes(), &tokens))
    }

    #[test]
    fn array_walk_skips_nested() {
        with_doc(r#"[1,[2,3,[4]],{"a":[5,6]},"x"]"#, |doc| {
            assert_eq!(doc.array_element_count(0).unwrap(), 4);

            let second = doc.array_nth_element(0, 1).unwrap();
            assert_eq!(doc.array_element_count(second).unwrap(), 3);

            let last = doc.array_nth_element(0, 3).unwrap();
            assert_eq!(doc.text(last).unwrap(), b"x");

            assert_eq!(doc.array_nth_element(0, 4), Err(ParserError::NoData));
        });
    }

    #[test]
    fn empty_containers() {
        with_doc(r#"{"a":[],"b":{},"c":""}"#, |doc| {
            assert_eq!(doc.object_element_count(0).unwrap(), 3);
            let a = doc.object_get_value(0, "a").unwrap();
            assert_eq!(doc.array_element_count(a).unwrap(), 0);
            let b = doc.object_get_value(0, "b").unwrap();
            assert_eq!(doc.object_element_count(b).unwrap(), 0);
            let c = doc.object_get_value(0, "c").unwrap();
            assert!(doc.token(c).unwrap().is_empty());
        });
    }

    #[test]
    fn object_pairs() {
        with_doc(r#"{"one":1,"two":{"x":null},"three":[true]}"#, |doc| {
            assert_eq!(doc.object_element_count(0).unwrap(), 3);

            let key = doc.object_nth_key(0, 2).unwrap();
            assert_eq!(doc.text(key).unwrap(), b"three");

            let value = doc.object_nth_value(0, 1).unwrap();
            assert_eq!(doc.kind(value).unwrap(), TokenKind::Object);

            let x = doc.object_nth_value(value, 0).unwrap();
            assert!(doc.is_null(x));

            assert_eq!(doc.object_nth_key(0, 3), Err(ParserError::NoData));
        });
    }

    #[test]
    fn wrong_kind_is_no_data() {
        with_doc(r#"{"a":[1]}"#, |doc| {
            assert_eq!(doc.array_element_count(0), Err(ParserError::NoData));
            let a = doc.object_get_value(0, "a").unwrap();
            assert_eq!(doc.object_element_count(a), Err(ParserError::NoData));
            assert_eq!(doc.object_get_value(a, "a"), Err(ParserError::NoData));
        });
    }

    #[test]
    fn get_value_descends() {
        let input = r#"{"payload":{"exec":{"data":{}}},"signers":[{"pubKey":"abc","clist":[]}]}"#;
        with_doc(input, |doc| {
            let pubkey = doc.object_get_value(0, "pubKey").unwrap();
            assert_eq!(doc.text(pubkey).unwrap(), b"abc");

            let data = doc.object_get_value(0, "data").unwrap();
            assert_eq!(doc.kind(data).unwrap(), TokenKind::Object);

            assert_eq!(doc.object_get_value(0, "missing"), Err(ParserError::NoData));
        });
    }

    #[test]
    fn get_value_exact_key() {
        with_doc(r#"{"metadata":1,"met":2,"meta":3}"#, |doc| {
            let meta = doc.object_get_value(0, "meta").unwrap();
            assert_eq!(doc.text(meta).unwrap(), b"3");
        });
    }

    #[test]
    fn get_value_ignores_string_values() {
        with_doc(r#"{"a":"meta","meta":"b"}"#, |doc| {
            let meta = doc.object_get_value(0, "meta").unwrap();
            assert_eq!(doc.text(meta).unwrap(), b"b");
        });
    }

    #[test]
    fn get_field_stays_on_level() {
        with_doc(r#"{"data":{"meta":1},"meta":2}"#, |doc| {
            let meta = doc.object_get_field(0, "meta").unwrap();
            assert_eq!(doc.text(meta).unwrap(), b"2");

            let nested = doc.object_get_value(0, "meta").unwrap();
            assert_eq!(doc.text(nested).unwrap(), b"1");
        });
        with_doc(r#"{"data":{"x":1}}"#, |doc| {
            assert_eq!(doc.object_get_field(0, "x"), Err(ParserError::NoData));
        });
    }

    #[test]
    fn get_value_nested_first() {
        with_doc(r#"{"outer":{"id":1},"id":2}"#, |doc| {
            let id = doc.object_get_value(0, "id").unwrap();
            assert_eq!(doc.text(id).unwrap(), b"1");
        });
    }

    #[cfg(not(miri))]
    proptest! {
        #[test]
        fn count_and_nth_agree(values in proptest::collection::vec(proptest::collection::vec(any::<u32>(), 0..4), 0..16)) {
            let text = serde_json::to_string(&values).unwrap();
            with_doc(&text, |doc| {
                let count = doc.array_element_count(0).unwrap();
                prop_assert_eq!(count, values.len());
                for i in 0..count {
                    let elem = doc.array_nth_element(0, i).unwrap();
                    prop_assert_eq!(doc.array_element_count(elem).unwrap(), values[i].len());
                }
                prop_assert_eq!(doc.array_nth_element(0, count), Err(ParserError::NoData));
                Ok(())
            })?;
        }

        #[test]
        fn nested_keys_are_found(depth in 0usize..8, value in any::<u32>()) {
            let mut doc = serde_json::json!({ "target": value });
            for i in 0..depth {
                doc = if i % 2 == 0 {
                    serde_json::json!({ "wrap": doc, "other": 1 })
                } else {
                    serde_json::json!([0, doc])
                };
            }
            let text = serde_json::to_string(&serde_json::json!({ "root": doc })).unwrap();
            with_doc(&text, |doc| {
                let found = doc.object_get_value(0, "target").unwrap();
                let expected = value.to_string();
                prop_assert_eq!(doc.text(found).unwrap(), expected.as_bytes());
                Ok(())
            })?;
        }
    }
}
