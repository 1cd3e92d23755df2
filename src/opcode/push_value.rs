//! Constant values represented as opcodes.

#![allow(non_camel_case_types)]

use alloc::vec::Vec;

use crate::{interpreter, num::Number, opcode};

/// How a [`LargeValue`] records the length of its data.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[allow(missing_docs)]
pub enum Prefix {
    /// The opcode byte itself is the length, 1..=75.
    PushdataBytelength,
    /// A one-byte length follows the opcode.
    OP_PUSHDATA1,
    /// A two-byte little-endian length follows the opcode.
    OP_PUSHDATA2,
    /// A four-byte little-endian length follows the opcode.
    OP_PUSHDATA4,
}

impl Prefix {
    const PUSHDATA1_BYTE: u8 = 0x4c;
    const PUSHDATA2_BYTE: u8 = 0x4d;
    const PUSHDATA4_BYTE: u8 = 0x4e;

    /// The number of length bytes following the opcode.
    fn size_size(self) -> usize {
        match self {
            Self::PushdataBytelength => 0,
            Self::OP_PUSHDATA1 => 1,
            Self::OP_PUSHDATA2 => 2,
            Self::OP_PUSHDATA4 => 4,
        }
    }

    /// The largest payload this prefix can describe.
    fn max_len(self) -> usize {
        match self {
            Self::PushdataBytelength => usize::from(Self::PUSHDATA1_BYTE - 1),
            Self::OP_PUSHDATA1 => usize::from(u8::MAX),
            Self::OP_PUSHDATA2 => usize::from(u16::MAX),
            Self::OP_PUSHDATA4 => usize::try_from(u32::MAX).unwrap_or(usize::MAX),
        }
    }

    fn min_len(self) -> usize {
        match self {
            // Zero bytes would be OP_0.
            Self::PushdataBytelength => 1,
            _ => 0,
        }
    }
}

/// Data values that aren’t represented within their opcode byte.
///
/// The payload may exceed [`LargeValue::MAX_SIZE`]; such a push is representable, but fails when
/// it is run.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LargeValue {
    prefix: Prefix,
    data: interpreter::Element,
}

impl LargeValue {
    /// The maximum number of bytes able to be pushed onto the stack.
    pub const MAX_SIZE: usize = 520; // bytes

    /// Wraps `data` with the given prefix, if the prefix can describe its length.
    pub fn new(prefix: Prefix, data: &[u8]) -> Option<Self> {
        if (prefix.min_len()..=prefix.max_len()).contains(&data.len()) {
            Some(LargeValue {
                prefix,
                data: interpreter::Element::from(data),
            })
        } else {
            None
        }
    }

    /// Returns the shortest [`LargeValue`] holding `v`. Unlike [`PushValue::from_slice`], this
    /// never falls back to a [`SmallValue`].
    pub fn from_slice(v: &[u8]) -> Option<LargeValue> {
        [
            Prefix::PushdataBytelength,
            Prefix::OP_PUSHDATA1,
            Prefix::OP_PUSHDATA2,
            Prefix::OP_PUSHDATA4,
        ]
        .into_iter()
        .find_map(|prefix| Self::new(prefix, v))
    }

    /// How the length is recorded.
    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    /// Get the stack element represented by this [`LargeValue`].
    pub fn value(&self) -> &interpreter::Element {
        &self.data
    }

    /// The number of bytes this requires in a script.
    pub fn byte_len(&self) -> usize {
        1 + self.prefix.size_size() + self.data.len()
    }

    fn split_value(script: &[u8], needed_bytes: usize) -> (Result<&[u8], opcode::Error>, &[u8]) {
        if needed_bytes <= script.len() {
            let (value, remainder) = script.split_at(needed_bytes);
            (Ok(value), remainder)
        } else {
            (
                Err(opcode::Error::Read {
                    expected_bytes: needed_bytes,
                    available_bytes: script.len(),
                }),
                &[],
            )
        }
    }

    /// First splits `size_size` bytes to determine the size of the value to read, then splits the
    /// value.
    fn split_tagged_value(
        script: &[u8],
        size_size: usize,
    ) -> (Result<&[u8], opcode::Error>, &[u8]) {
        let (res, rem) = Self::split_value(script, size_size);
        match res {
            Err(_) => (res, rem),
            Ok(bytes) => {
                let mut size = 0;
                for byte in bytes.iter().rev() {
                    size <<= 8;
                    size |= usize::from(*byte);
                }
                Self::split_value(rem, size)
            }
        }
    }

    /// Parse a single [`LargeValue`] from a script. Returns `None` if the first byte doesn’t
    /// correspond to a [`LargeValue`].
    pub(crate) fn parse(script: &[u8]) -> Option<(Result<LargeValue, opcode::Error>, &[u8])> {
        let (leading_byte, script) = script.split_first()?;
        let (prefix, (res, rem)) = match *leading_byte {
            0x01..Prefix::PUSHDATA1_BYTE => (
                Prefix::PushdataBytelength,
                Self::split_value(script, (*leading_byte).into()),
            ),
            Prefix::PUSHDATA1_BYTE => (Prefix::OP_PUSHDATA1, Self::split_tagged_value(script, 1)),
            Prefix::PUSHDATA2_BYTE => (Prefix::OP_PUSHDATA2, Self::split_tagged_value(script, 2)),
            Prefix::PUSHDATA4_BYTE => (Prefix::OP_PUSHDATA4, Self::split_tagged_value(script, 4)),
            _ => return None,
        };
        Some((
            res.map(|v| LargeValue {
                prefix,
                data: interpreter::Element::from(v),
            }),
            rem,
        ))
    }
}

impl From<&LargeValue> for Vec<u8> {
    fn from(value: &LargeValue) -> Self {
        let len = value.data.len();
        let mut result = Vec::with_capacity(value.byte_len());
        match value.prefix {
            // `new` and `parse` bound the lengths, so these casts are lossless.
            Prefix::PushdataBytelength => result.push(len as u8),
            Prefix::OP_PUSHDATA1 => result.extend([Prefix::PUSHDATA1_BYTE, len as u8]),
            Prefix::OP_PUSHDATA2 => {
                result.push(Prefix::PUSHDATA2_BYTE);
                result.extend((len as u16).to_le_bytes());
            }
            Prefix::OP_PUSHDATA4 => {
                result.push(Prefix::PUSHDATA4_BYTE);
                result.extend((len as u32).to_le_bytes());
            }
        }
        result.extend_from_slice(&value.data);
        result
    }
}

/// Data values represented entirely by their opcode byte.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[allow(missing_docs)]
#[repr(u8)]
pub enum SmallValue {
    // push value
    OP_0 = 0x00,
    OP_1NEGATE = 0x4f,
    OP_1 = 0x51,
    OP_2 = 0x52,
    OP_3 = 0x53,
    OP_4 = 0x54,
    OP_5 = 0x55,
    OP_6 = 0x56,
    OP_7 = 0x57,
    OP_8 = 0x58,
    OP_9 = 0x59,
    OP_10 = 0x5a,
    OP_11 = 0x5b,
    OP_12 = 0x5c,
    OP_13 = 0x5d,
    OP_14 = 0x5e,
    OP_15 = 0x5f,
    OP_16 = 0x60,
}

use SmallValue::*;

impl SmallValue {
    /// Decodes this opcode from its byte encoding.
    pub(crate) fn decode(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(OP_0),
            0x4f => Some(OP_1NEGATE),
            0x51 => Some(OP_1),
            0x52 => Some(OP_2),
            0x53 => Some(OP_3),
            0x54 => Some(OP_4),
            0x55 => Some(OP_5),
            0x56 => Some(OP_6),
            0x57 => Some(OP_7),
            0x58 => Some(OP_8),
            0x59 => Some(OP_9),
            0x5a => Some(OP_10),
            0x5b => Some(OP_11),
            0x5c => Some(OP_12),
            0x5d => Some(OP_13),
            0x5e => Some(OP_14),
            0x5f => Some(OP_15),
            0x60 => Some(OP_16),
            _ => None,
        }
    }

    /// Returns the byte encoding of this opcode.
    pub fn encode(self) -> u8 {
        // This is how you get the discriminant, but using `as` everywhere is too much code smell
        self as u8
    }

    /// Returns the numeric value of the opcode. It will always be in the range -1..=16.
    pub fn to_num(self) -> i8 {
        match self {
            OP_0 => 0,
            OP_1NEGATE => -1,
            _ => (self.encode() - (OP_1.encode() - 1)) as i8,
        }
    }

    /// Get the stack element represented by this [`SmallValue`].
    pub fn value(&self) -> Vec<u8> {
        Number::from(i64::from(self.to_num())).to_bytes()
    }
}

/// Operations that push a constant onto the stack.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PushValue {
    /// Constants that are represented by a single byte.
    SmallValue(SmallValue),
    /// Constants that contain data in addition to the opcode byte.
    LargeValue(LargeValue),
}

impl PushValue {
    /// Produces the minimal push of `v`, preferring a [`SmallValue`] when one encodes the same
    /// stack element.
    pub fn from_slice(v: &[u8]) -> Option<PushValue> {
        match v {
            [] => Some(PushValue::SmallValue(OP_0)),
            [0x81] => Some(PushValue::SmallValue(OP_1NEGATE)),
            [b @ 1..=16] => SmallValue::decode(b + (OP_1.encode() - 1)).map(PushValue::SmallValue),
            _ => LargeValue::from_slice(v).map(PushValue::LargeValue),
        }
    }

    /// The push a data literal is serialized as: `OP_0` when empty, otherwise the shortest
    /// length-prefixed form. Signature-hash subscripts drop endorsements encoded this way.
    pub fn literal(v: &[u8]) -> Option<PushValue> {
        if v.is_empty() {
            Some(PushValue::SmallValue(OP_0))
        } else {
            LargeValue::from_slice(v).map(PushValue::LargeValue)
        }
    }

    /// The number of bytes this requires in a script.
    pub fn byte_len(&self) -> usize {
        match self {
            PushValue::LargeValue(pv) => pv.byte_len(),
            PushValue::SmallValue(_) => 1,
        }
    }

    /// Get the stack element represented by this [`PushValue`].
    pub fn value(&self) -> interpreter::Element {
        match self {
            PushValue::LargeValue(lv) => lv.value().clone(),
            PushValue::SmallValue(sv) => interpreter::Element::from(sv.value()),
        }
    }

    /// Pushes the value. Larger values share their buffer with the operation.
    pub(crate) fn eval(&self, program: &mut interpreter::Program) {
        program.push(self.value())
    }
}

impl From<SmallValue> for PushValue {
    fn from(value: SmallValue) -> Self {
        Self::SmallValue(value)
    }
}

impl From<LargeValue> for PushValue {
    fn from(value: LargeValue) -> Self {
        Self::LargeValue(value)
    }
}

impl From<&PushValue> for Vec<u8> {
    fn from(value: &PushValue) -> Self {
        match value {
            PushValue::SmallValue(v) => vec![(*v).encode()],
            PushValue::LargeValue(v) => v.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use hex::FromHex;

    use super::{LargeValue, Prefix, PushValue, SmallValue};
    use crate::opcode;

    #[test]
    fn small_values_push_their_number() {
        assert_eq!(SmallValue::OP_0.value(), Vec::<u8>::new());
        assert_eq!(SmallValue::OP_1NEGATE.value(), vec![0x81]);
        assert_eq!(SmallValue::OP_1.value(), vec![0x01]);
        assert_eq!(SmallValue::OP_16.value(), vec![0x10]);
        assert_eq!(SmallValue::OP_16.to_num(), 16);
    }

    #[test]
    fn prefixes_bound_their_lengths() {
        assert!(LargeValue::new(Prefix::PushdataBytelength, &[]).is_none());
        assert!(LargeValue::new(Prefix::PushdataBytelength, &[0; 75]).is_some());
        assert!(LargeValue::new(Prefix::PushdataBytelength, &[0; 76]).is_none());
        assert!(LargeValue::new(Prefix::OP_PUSHDATA1, &[]).is_some());
        assert!(LargeValue::new(Prefix::OP_PUSHDATA1, &[0; 256]).is_none());
        assert!(LargeValue::new(Prefix::OP_PUSHDATA2, &[0; 256]).is_some());
        // Representable, even though it can’t be run.
        assert!(LargeValue::new(Prefix::OP_PUSHDATA4, &[0; 521]).is_some());
    }

    #[test]
    fn encodes_lengths_little_endian() {
        let lv = LargeValue::new(Prefix::OP_PUSHDATA2, &[0xab; 0x0102]).expect("fits");
        let bytes = Vec::from(&lv);
        assert_eq!(bytes[..3], [0x4d, 0x02, 0x01]);
        assert_eq!(bytes.len(), lv.byte_len());

        let lv = LargeValue::new(Prefix::OP_PUSHDATA4, &[0xab; 3]).expect("fits");
        assert_eq!(
            Vec::from(&lv),
            <Vec<u8>>::from_hex("4e03000000ababab").expect("valid hex")
        );
    }

    #[test]
    fn parses_what_it_encodes() {
        for data in [&[0x01u8; 1][..], &[0x02; 75], &[0x03; 76], &[0x04; 300]] {
            let lv = LargeValue::from_slice(data).expect("fits");
            let bytes = Vec::from(&lv);
            let (res, rem) = LargeValue::parse(&bytes).expect("is a large value");
            assert_eq!(res, Ok(lv));
            assert!(rem.is_empty());
        }
    }

    #[test]
    fn truncated_pushes_fail_to_parse() {
        let (res, rem) = LargeValue::parse(&[0x4c, 0x05, 0x01]).expect("is a large value");
        assert_eq!(
            res,
            Err(opcode::Error::Read {
                expected_bytes: 5,
                available_bytes: 1
            })
        );
        assert!(rem.is_empty());
        assert!(LargeValue::parse(&[0x51]).is_none());
    }

    #[test]
    fn minimal_and_literal_pushes() {
        assert_eq!(
            PushValue::from_slice(&[5]),
            Some(PushValue::SmallValue(SmallValue::OP_5))
        );
        assert_eq!(
            PushValue::literal(&[5]),
            LargeValue::from_slice(&[5]).map(PushValue::LargeValue)
        );
        assert_eq!(
            PushValue::literal(&[]),
            Some(PushValue::SmallValue(SmallValue::OP_0))
        );
    }
}
