//! Convenience definitions for all push values.

use crate::opcode::{
    push_value::{LargeValue, Prefix},
    PushValue::{self, *},
    SmallValue::*,
};

#[allow(missing_docs)]
pub const _0: PushValue = SmallValue(OP_0);
#[allow(missing_docs)]
pub const _1NEGATE: PushValue = SmallValue(OP_1NEGATE);
#[allow(missing_docs)]
pub const _1: PushValue = SmallValue(OP_1);
#[allow(missing_docs)]
pub const _2: PushValue = SmallValue(OP_2);
#[allow(missing_docs)]
pub const _3: PushValue = SmallValue(OP_3);
#[allow(missing_docs)]
pub const _4: PushValue = SmallValue(OP_4);
#[allow(missing_docs)]
pub const _5: PushValue = SmallValue(OP_5);
#[allow(missing_docs)]
pub const _6: PushValue = SmallValue(OP_6);
#[allow(missing_docs)]
pub const _7: PushValue = SmallValue(OP_7);
#[allow(missing_docs)]
pub const _8: PushValue = SmallValue(OP_8);
#[allow(missing_docs)]
pub const _9: PushValue = SmallValue(OP_9);
#[allow(missing_docs)]
pub const _10: PushValue = SmallValue(OP_10);
#[allow(missing_docs)]
pub const _11: PushValue = SmallValue(OP_11);
#[allow(missing_docs)]
pub const _12: PushValue = SmallValue(OP_12);
#[allow(missing_docs)]
pub const _13: PushValue = SmallValue(OP_13);
#[allow(missing_docs)]
pub const _14: PushValue = SmallValue(OP_14);
#[allow(missing_docs)]
pub const _15: PushValue = SmallValue(OP_15);
#[allow(missing_docs)]
pub const _16: PushValue = SmallValue(OP_16);

/// Pushes 1..=75 bytes, with the length as the opcode.
pub fn pushdata_bytelength(value: &[u8]) -> Option<PushValue> {
    LargeValue::new(Prefix::PushdataBytelength, value).map(LargeValue)
}

/// Pushes up to 255 bytes, with a one-byte length.
pub fn pushdata1(value: &[u8]) -> Option<PushValue> {
    LargeValue::new(Prefix::OP_PUSHDATA1, value).map(LargeValue)
}

/// Pushes up to 65535 bytes, with a two-byte length.
pub fn pushdata2(value: &[u8]) -> Option<PushValue> {
    LargeValue::new(Prefix::OP_PUSHDATA2, value).map(LargeValue)
}

/// Pushes up to 2**32-1 bytes, with a four-byte length.
pub fn pushdata4(value: &[u8]) -> Option<PushValue> {
    LargeValue::new(Prefix::OP_PUSHDATA4, value).map(LargeValue)
}

/// Produces a minimally-encoded data value. It fails if the slice is larger than
/// [`LargeValue::MAX_SIZE`], since such a push could never be run.
pub fn push_value(value: &[u8]) -> Option<PushValue> {
    if value.len() <= LargeValue::MAX_SIZE {
        PushValue::from_slice(value)
    } else {
        None
    }
}

/// Pushes the minimal encoding of a number.
pub fn push_num(n: i64) -> Option<PushValue> {
    push_value(&crate::num::Number::from(n).to_bytes())
}
