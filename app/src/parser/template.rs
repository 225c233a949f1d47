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
//! Compact transfer requests and their expansion into the canonical command JSON

use core::convert::TryFrom;

use nom::{bytes::complete::take, number::complete::be_u8};

use crate::{
    constants::PUB_KEY_LENGTH,
    parser::ParserError,
    sys,
    utils::{ChunkBuffer, Hasher},
};

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub enum TransferKind {
    Transfer = 0,
    TransferCreate = 1,
    CrossChain = 2,
}

impl TryFrom<u8> for TransferKind {
    type Error = ParserError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Transfer),
            1 => Ok(Self::TransferCreate),
            2 => Ok(Self::CrossChain),
            _ => Err(ParserError::InvalidTxType),
        }
    }
}

impl TransferKind {
    fn function(&self) -> &'static [u8] {
        match self {
            Self::Transfer => b".transfer",
            Self::TransferCreate => b".transfer-create",
            Self::CrossChain => b".transfer-crosschain",
        }
    }
}

/// The recipient is always a full hex encoded key, every other field has an upper bound
const RECIPIENT_LEN: usize = PUB_KEY_LENGTH * 2;
const MAX_RECIPIENT_CHAIN_LEN: usize = 2;
const MAX_NETWORK_LEN: usize = 20;
const MAX_AMOUNT_LEN: usize = 32;
const MAX_NAMESPACE_LEN: usize = 16;
const MAX_MODULE_LEN: usize = 32;
const MAX_GAS_PRICE_LEN: usize = 10;
const MAX_GAS_LIMIT_LEN: usize = 20;
const MAX_CREATION_TIME_LEN: usize = 12;
const MAX_CHAIN_ID_LEN: usize = 2;
const MAX_NONCE_LEN: usize = 32;
const MAX_TTL_LEN: usize = 20;

/// Fields of a compact transfer, borrowed from the request buffer
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub struct TransferTemplate<'b> {
    pub kind: TransferKind,
    pub recipient: &'b [u8],
    pub recipient_chain: &'b [u8],
    pub network: &'b [u8],
    pub amount: &'b [u8],
    pub namespace: &'b [u8],
    pub module: &'b [u8],
    pub gas_price: &'b [u8],
    pub gas_limit: &'b [u8],
    pub creation_time: &'b [u8],
    pub chain_id: &'b [u8],
    pub nonce: &'b [u8],
    pub ttl: &'b [u8],
}

fn field(input: &[u8], max: usize) -> Result<(&[u8], &[u8]), nom::Err<ParserError>> {
    let (rem, len) = be_u8::<_, ParserError>(input)?;
    if len as usize > max {
        return Err(ParserError::ValueOutOfRange.into());
    }
    take(len as usize)(rem)
}

impl<'b> TransferTemplate<'b> {
    #[inline(never)]
    pub fn from_bytes(input: &'b [u8]) -> Result<Self, ParserError> {
        sys::zemu_log_stack("TransferTemplate::from_bytes\x00");

        let (rem, kind) = be_u8::<_, ParserError>(input)?;
        let kind = TransferKind::try_from(kind)?;

        let (rem, recipient) = field(rem, RECIPIENT_LEN)?;
        if recipient.len() != RECIPIENT_LEN {
            return Err(ParserError::ValueOutOfRange);
        }
        let (rem, recipient_chain) = field(rem, MAX_RECIPIENT_CHAIN_LEN)?;
        let (rem, network) = field(rem, MAX_NETWORK_LEN)?;
        let (rem, amount) = field(rem, MAX_AMOUNT_LEN)?;
        let (rem, namespace) = field(rem, MAX_NAMESPACE_LEN)?;
        let (rem, module) = field(rem, MAX_MODULE_LEN)?;
        let (rem, gas_price) = field(rem, MAX_GAS_PRICE_LEN)?;
        let (rem, gas_limit) = field(rem, MAX_GAS_LIMIT_LEN)?;
        let (rem, creation_time) = field(rem, MAX_CREATION_TIME_LEN)?;
        let (rem, chain_id) = field(rem, MAX_CHAIN_ID_LEN)?;
        let (rem, nonce) = field(rem, MAX_NONCE_LEN)?;
        let (rem, ttl) = field(rem, MAX_TTL_LEN)?;

        if !rem.is_empty() {
            tracing::warn!(trailing = rem.len(), "compact transfer with unparsed bytes");
            return Err(ParserError::UnexpectedUnparsedBytes);
        }

        Ok(Self {
            kind,
            recipient,
            recipient_chain,
            network,
            amount,
            namespace,
            module,
            gas_price,
            gas_limit,
            creation_time,
            chain_id,
            nonce,
            ttl,
        })
    }

    /// Write the command JSON for this transfer into `out`, feeding every byte to `hasher`
    ///
    /// `address` is the hex encoded public key of the signer.
    #[inline(never)]
    pub fn expand<H: Hasher>(
        &self,
        address: &[u8],
        out: &mut ChunkBuffer<'_>,
        hasher: &mut H,
    ) -> Result<(), ParserError> {
        sys::zemu_log_stack("TransferTemplate::expand\x00");
        out.reset();

        let mut sink = Sink { out, hasher };
        let cross = self.kind == TransferKind::CrossChain;

        sink.put(b"{\"networkId\":\"")?
            .put(self.network)?
            .put(b"\",\"payload\":{\"exec\":{\"data\":")?;

        if self.kind == TransferKind::Transfer {
            sink.put(b"{}")?;
        } else {
            sink.put(b"{\"ks\":{\"pred\":\"keys-all\",\"keys\":[\"")?
                .put(self.recipient)?
                .put(b"\"]}}")?;
        }

        sink.put(b",\"code\":\"(")?;
        self.module_name(&mut sink)?;
        sink.put(self.kind.function())?
            .put(b" \\\"k:")?
            .put(address)?
            .put(b"\\\" \\\"k:")?
            .put(self.recipient)?
            .put(b"\\\"")?;

        if self.kind != TransferKind::Transfer {
            sink.put(b" (read-keyset \\\"ks\\\")")?;
        }
        if cross {
            sink.put(b" \\\"")?.put(self.recipient_chain)?.put(b"\\\"")?;
        }

        sink.put(b" ")?
            .put(self.amount)?
            .put(b")\"}},\"signers\":[{\"pubKey\":\"")?
            .put(address)?
            .put(b"\",\"clist\":[{\"args\":[\"k:")?
            .put(address)?
            .put(b"\",\"k:")?
            .put(self.recipient)?
            .put(b"\",")?
            .put(self.amount)?;

        if cross {
            sink.put(b",\"")?.put(self.recipient_chain)?.put(b"\"")?;
        }

        sink.put(b"],\"name\":\"")?;
        self.module_name(&mut sink)?;
        sink.put(b".TRANSFER")?;
        if cross {
            sink.put(b"_XCHAIN")?;
        }

        sink.put(b"\"},{\"args\":[],\"name\":\"coin.GAS\"}]}],\"meta\":{\"creationTime\":")?
            .put(self.creation_time)?
            .put(b",\"ttl\":")?
            .put(self.ttl)?
            .put(b",\"gasLimit\":")?
            .put(self.gas_limit)?
            .put(b",\"chainId\":\"")?
            .put(self.chain_id)?
            .put(b"\",\"gasPrice\":")?
            .put(self.gas_price)?
            .put(b",\"sender\":\"k:")?
            .put(address)?
            .put(b"\"},\"nonce\":\"")?
            .put(self.nonce)?
            .put(b"\"}")?;

        Ok(())
    }

    fn module_name<H: Hasher>(&self, sink: &mut Sink<'_, '_, '_, H>) -> Result<(), ParserError> {
        if self.namespace.is_empty() || self.module.is_empty() {
            sink.put(b"coin")?;
        } else {
            sink.put(self.namespace)?.put(b".")?.put(self.module)?;
        }
        Ok(())
    }
}

struct Sink<'a, 'o, 's, H> {
    out: &'a mut ChunkBuffer<'s>,
    hasher: &'o mut H,
}

impl<'a, 'o, 's, H: Hasher> Sink<'a, 'o, 's, H> {
    fn put(&mut self, bytes: &[u8]) -> Result<&mut Self, ParserError> {
        self.out.append(bytes).map_err(|e| {
            tracing::warn!(needed = e.needed, available = e.available, "template expansion overflow");
            ParserError::DataTooLarge
        })?;
        self.hasher.update(bytes);
        Ok(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::Blake2b;
    use std::prelude::v1::*;

    pub const RECIPIENT: &[u8] = b"83934c0f9b005f378ba3520f9dea952fb0a90e5aa36f1b5ff837d9b30c471790";
    pub const ADDRESS: &[u8] = b"aa0f9b005f378ba3520f9dea952fb0a90e5aa36f1b5ff837d9b30c4717908393";

    pub fn encode(kind: u8, fields: &[&[u8]]) -> Vec<u8> {
        let mut out = std::vec![kind];
        for f in fields {
            out.push(f.len() as u8);
            out.extend_from_slice(f);
        }
        out
    }

    pub fn sample(kind: u8) -> Vec<u8> {
        encode(
            kind,
            &[
                RECIPIENT,
                b"2",
                b"mainnet01",
                b"1.23",
                b"",
                b"",
                b"1.0e-6",
                b"2300",
                b"1700000000",
                b"0",
                b"nonce-1",
                b"600",
            ],
        )
    }

    fn expand(input: &[u8]) -> Result<(Vec<u8>, [u8; 32]), ParserError> {
        let template = TransferTemplate::from_bytes(input)?;

        let mut ram = [0u8; 0];
        let mut flash = [0u8; 2048];
        let mut out = ChunkBuffer::new(&mut ram, &mut flash);
        let mut hasher = Blake2b::new();
        template.expand(ADDRESS, &mut out, &mut hasher)?;

        let mut digest = [0; 32];
        hasher.finalize(&mut digest);
        Ok((out.contents().to_vec(), digest))
    }

    #[test]
    fn plain_transfer() {
        let (json, digest) = expand(&sample(0)).unwrap();
        let expected = std::format!(
            concat!(
                r#"{{"networkId":"mainnet01","payload":{{"exec":{{"data":{{}},"code":"(coin.transfer \"k:{a}\" \"k:{r}\" 1.23)"}}}},"#,
                r#""signers":[{{"pubKey":"{a}","clist":[{{"args":["k:{a}","k:{r}",1.23],"name":"coin.TRANSFER"}},{{"args":[],"name":"coin.GAS"}}]}}],"#,
                r#""meta":{{"creationTime":1700000000,"ttl":600,"gasLimit":2300,"chainId":"0","gasPrice":1.0e-6,"sender":"k:{a}"}},"nonce":"nonce-1"}}"#
            ),
            a = std::str::from_utf8(ADDRESS).unwrap(),
            r = std::str::from_utf8(RECIPIENT).unwrap(),
        );

        assert_eq!(std::str::from_utf8(&json).unwrap(), expected);
        assert_eq!(digest, Blake2b::digest(&json));
        serde_json::from_slice::<serde_json::Value>(&json).unwrap();
    }

    #[test]
    fn cross_chain_transfer() {
        let (json, _) = expand(&sample(2)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();

        let code = value["payload"]["exec"]["code"].as_str().unwrap();
        assert!(code.starts_with("(coin.transfer-crosschain "));
        assert!(code.ends_with(r#"(read-keyset "ks") "2" 1.23)"#));

        let cap = &value["signers"][0]["clist"][0];
        assert_eq!(cap["name"], "coin.TRANSFER_XCHAIN");
        assert_eq!(cap["args"].as_array().unwrap().len(), 4);
        assert_eq!(
            value["payload"]["exec"]["data"]["ks"]["keys"][0].as_str().unwrap().as_bytes(),
            RECIPIENT
        );
    }

    #[test]
    fn namespaced_module() {
        let mut fields: [&[u8]; 12] = [
            RECIPIENT, b"", b"testnet04", b"5", b"free", b"token", b"1", b"1", b"1", b"1", b"n", b"1",
        ];
        let input = encode(1, &fields);
        let (json, _) = expand(&input).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert!(value["payload"]["exec"]["code"]
            .as_str()
            .unwrap()
            .starts_with("(free.token.transfer-create "));
        assert_eq!(value["signers"][0]["clist"][0]["name"], "free.token.TRANSFER");

        // either part missing falls back to coin
        fields[5] = &[];
        let (json, _) = expand(&encode(1, &fields)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["signers"][0]["clist"][0]["name"], "coin.TRANSFER");
    }

    #[test]
    fn malformed_templates() {
        assert_eq!(
            TransferTemplate::from_bytes(&sample(3)).unwrap_err(),
            ParserError::InvalidTxType
        );

        let input = sample(0);
        assert_eq!(
            TransferTemplate::from_bytes(&input[..input.len() - 1]).unwrap_err(),
            ParserError::UnexpectedBufferEnd
        );

        let mut trailing = sample(0);
        trailing.push(0);
        assert_eq!(
            TransferTemplate::from_bytes(&trailing).unwrap_err(),
            ParserError::UnexpectedUnparsedBytes
        );

        let short = encode(0, &[&RECIPIENT[..62]]);
        assert_eq!(
            TransferTemplate::from_bytes(&short).unwrap_err(),
            ParserError::ValueOutOfRange
        );

        let fields: [&[u8]; 12] = [
            RECIPIENT, b"123", b"", b"", b"", b"", b"", b"", b"", b"", b"", b"",
        ];
        assert_eq!(
            TransferTemplate::from_bytes(&encode(0, &fields)).unwrap_err(),
            ParserError::ValueOutOfRange
        );

        assert_eq!(
            TransferTemplate::from_bytes(&[]).unwrap_err(),
            ParserError::UnexpectedBufferEnd
        );
    }

    #[test]
    fn expansion_overflow() {
        let input = sample(2);
        let template = TransferTemplate::from_bytes(&input).unwrap();

        let mut ram = [0u8; 0];
        let mut flash = [0u8; 64];
        let mut out = ChunkBuffer::new(&mut ram, &mut flash);
        let mut hasher = Blake2b::new();
        assert_eq!(
            template.expand(ADDRESS, &mut out, &mut hasher),
            Err(ParserError::DataTooLarge)
        );
    }
}
