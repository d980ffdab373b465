//! Thin list helpers over `alloy-rlp` for the transaction codec.
//!
//! Transactions are flat RLP lists whose length decides the variant (for
//! example a legacy list has 6 or 9 items), so the decoder counts items
//! before reading them.

use alloy_primitives::Address;
use alloy_rlp::{Decodable, Encodable, Header, EMPTY_STRING_CODE};
use chaincall_core::error::CodecError;

fn rlp_error(context: &str, err: alloy_rlp::Error) -> CodecError {
    CodecError::transaction(format!("{context}: {err}"))
}

/// Sequential reader over the items of one RLP list.
pub(crate) struct ListDecoder<'a> {
    payload: &'a [u8],
}

impl<'a> ListDecoder<'a> {
    /// Open a list that must span all of `data`, with no trailing bytes.
    pub(crate) fn new(data: &'a [u8]) -> Result<Self, CodecError> {
        let mut buf = data;
        let header = Header::decode(&mut buf).map_err(|e| rlp_error("list header", e))?;
        if !header.list {
            return Err(CodecError::transaction("expected an RLP list"));
        }
        if buf.len() < header.payload_length {
            return Err(CodecError::transaction("RLP list is truncated"));
        }
        if buf.len() > header.payload_length {
            return Err(CodecError::transaction(format!(
                "{} trailing byte(s) after RLP list",
                buf.len() - header.payload_length
            )));
        }
        Ok(Self { payload: buf })
    }

    /// Number of items left in the list.
    pub(crate) fn remaining(&self) -> Result<usize, CodecError> {
        let mut buf = self.payload;
        let mut count = 0;
        while !buf.is_empty() {
            let header = Header::decode(&mut buf).map_err(|e| rlp_error("list item", e))?;
            if buf.len() < header.payload_length {
                return Err(CodecError::transaction("RLP item is truncated"));
            }
            buf = &buf[header.payload_length..];
            count += 1;
        }
        Ok(count)
    }

    /// Decode the next item. Integers must be canonical (no leading zeros)
    /// and fit the target type.
    pub(crate) fn next<T: Decodable>(&mut self, field: &str) -> Result<T, CodecError> {
        T::decode(&mut self.payload).map_err(|e| rlp_error(field, e))
    }

    /// Decode a `to` field: the empty string means contract creation.
    pub(crate) fn next_to(&mut self) -> Result<Option<Address>, CodecError> {
        match self.payload.first() {
            Some(&EMPTY_STRING_CODE) => {
                self.payload = &self.payload[1..];
                Ok(None)
            }
            _ => self.next("to").map(Some),
        }
    }

    /// Decode the next item as a `u8`-range flag (y-parity).
    pub(crate) fn next_parity(&mut self) -> Result<bool, CodecError> {
        match self.next::<u64>("yParity")? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(CodecError::transaction(format!("yParity must be 0 or 1, got {v}"))),
        }
    }

    pub(crate) fn finish(self) -> Result<(), CodecError> {
        if self.payload.is_empty() {
            Ok(())
        } else {
            Err(CodecError::transaction("unexpected trailing RLP items"))
        }
    }
}

/// Builder for one RLP list.
#[derive(Default)]
pub(crate) struct ListEncoder {
    payload: Vec<u8>,
}

impl ListEncoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push<T: Encodable + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode(&mut self.payload);
        self
    }

    /// `to` field: the empty string for contract creation.
    pub(crate) fn push_to(&mut self, to: Option<&Address>) -> &mut Self {
        match to {
            Some(address) => self.push(address),
            None => {
                self.payload.push(EMPTY_STRING_CODE);
                self
            }
        }
    }

    /// Header followed by the payload.
    pub(crate) fn finish(&self) -> Vec<u8> {
        let header = Header {
            list: true,
            payload_length: self.payload.len(),
        };
        let mut out = Vec::with_capacity(header.length() + self.payload.len());
        header.encode(&mut out);
        out.extend_from_slice(&self.payload);
        out
    }
}
