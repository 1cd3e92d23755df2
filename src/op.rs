//! Convenience definitions for all opcodes.

#![allow(missing_docs)]

use crate::{
    opcode::{Bad::*, Control::*, Disabled::*, Normal::*, Splice::*},
    pv,
    Operation::{self, *},
};

pub const _0: Operation = PushValue(pv::_0);
pub const _1NEGATE: Operation = PushValue(pv::_1NEGATE);
pub const _1: Operation = PushValue(pv::_1);
pub const _2: Operation = PushValue(pv::_2);
pub const _3: Operation = PushValue(pv::_3);
pub const _4: Operation = PushValue(pv::_4);
pub const _5: Operation = PushValue(pv::_5);
pub const _6: Operation = PushValue(pv::_6);
pub const _7: Operation = PushValue(pv::_7);
pub const _8: Operation = PushValue(pv::_8);
pub const _9: Operation = PushValue(pv::_9);
pub const _10: Operation = PushValue(pv::_10);
pub const _11: Operation = PushValue(pv::_11);
pub const _12: Operation = PushValue(pv::_12);
pub const _13: Operation = PushValue(pv::_13);
pub const _14: Operation = PushValue(pv::_14);
pub const _15: Operation = PushValue(pv::_15);
pub const _16: Operation = PushValue(pv::_16);

pub fn pushdata_bytelength(value: &[u8]) -> Option<Operation> {
    pv::pushdata_bytelength(value).map(PushValue)
}

pub fn pushdata1(value: &[u8]) -> Option<Operation> {
    pv::pushdata1(value).map(PushValue)
}

pub fn pushdata2(value: &[u8]) -> Option<Operation> {
    pv::pushdata2(value).map(PushValue)
}

pub fn pushdata4(value: &[u8]) -> Option<Operation> {
    pv::pushdata4(value).map(PushValue)
}

pub const IF: Operation = Control(OP_IF);
pub const NOTIF: Operation = Control(OP_NOTIF);
pub const ELSE: Operation = Control(OP_ELSE);
pub const ENDIF: Operation = Control(OP_ENDIF);
pub const NOP: Operation = Normal(OP_NOP);
pub const VERIFY: Operation = Normal(OP_VERIFY);
pub const RETURN: Operation = Normal(OP_RETURN);
pub const TOALTSTACK: Operation = Normal(OP_TOALTSTACK);
pub const FROMALTSTACK: Operation = Normal(OP_FROMALTSTACK);
pub const _2DROP: Operation = Normal(OP_2DROP);
pub const _2DUP: Operation = Normal(OP_2DUP);
pub const _3DUP: Operation = Normal(OP_3DUP);
pub const _2OVER: Operation = Normal(OP_2OVER);
pub const _2ROT: Operation = Normal(OP_2ROT);
pub const _2SWAP: Operation = Normal(OP_2SWAP);
pub const IFDUP: Operation = Normal(OP_IFDUP);
pub const DEPTH: Operation = Normal(OP_DEPTH);
pub const DROP: Operation = Normal(OP_DROP);
pub const DUP: Operation = Normal(OP_DUP);
pub const NIP: Operation = Normal(OP_NIP);
pub const OVER: Operation = Normal(OP_OVER);
pub const PICK: Operation = Normal(OP_PICK);
pub const ROLL: Operation = Normal(OP_ROLL);
pub const ROT: Operation = Normal(OP_ROT);
pub const SWAP: Operation = Normal(OP_SWAP);
pub const TUCK: Operation = Normal(OP_TUCK);
pub const SIZE: Operation = Normal(OP_SIZE);
pub const EQUAL: Operation = Normal(OP_EQUAL);
pub const EQUALVERIFY: Operation = Normal(OP_EQUALVERIFY);
pub const _1ADD: Operation = Normal(OP_1ADD);
pub const _1SUB: Operation = Normal(OP_1SUB);
pub const NEGATE: Operation = Normal(OP_NEGATE);
pub const ABS: Operation = Normal(OP_ABS);
pub const NOT: Operation = Normal(OP_NOT);
pub const _0NOTEQUAL: Operation = Normal(OP_0NOTEQUAL);
pub const ADD: Operation = Normal(OP_ADD);
pub const SUB: Operation = Normal(OP_SUB);
pub const BOOLAND: Operation = Normal(OP_BOOLAND);
pub const BOOLOR: Operation = Normal(OP_BOOLOR);
pub const NUMEQUAL: Operation = Normal(OP_NUMEQUAL);
pub const NUMEQUALVERIFY: Operation = Normal(OP_NUMEQUALVERIFY);
pub const NUMNOTEQUAL: Operation = Normal(OP_NUMNOTEQUAL);
pub const LESSTHAN: Operation = Normal(OP_LESSTHAN);
pub const GREATERTHAN: Operation = Normal(OP_GREATERTHAN);
pub const LESSTHANOREQUAL: Operation = Normal(OP_LESSTHANOREQUAL);
pub const GREATERTHANOREQUAL: Operation = Normal(OP_GREATERTHANOREQUAL);
pub const MIN: Operation = Normal(OP_MIN);
pub const MAX: Operation = Normal(OP_MAX);
pub const WITHIN: Operation = Normal(OP_WITHIN);
pub const RIPEMD160: Operation = Normal(OP_RIPEMD160);
pub const SHA1: Operation = Normal(OP_SHA1);
pub const SHA256: Operation = Normal(OP_SHA256);
pub const HASH160: Operation = Normal(OP_HASH160);
pub const HASH256: Operation = Normal(OP_HASH256);
pub const CODESEPARATOR: Operation = Normal(OP_CODESEPARATOR);
pub const CHECKSIG: Operation = Normal(OP_CHECKSIG);
pub const CHECKSIGVERIFY: Operation = Normal(OP_CHECKSIGVERIFY);
pub const CHECKMULTISIG: Operation = Normal(OP_CHECKMULTISIG);
pub const CHECKMULTISIGVERIFY: Operation = Normal(OP_CHECKMULTISIGVERIFY);
pub const NOP1: Operation = Normal(OP_NOP1);
pub const CHECKLOCKTIMEVERIFY: Operation = Normal(OP_CHECKLOCKTIMEVERIFY);
pub const CHECKSEQUENCEVERIFY: Operation = Normal(OP_CHECKSEQUENCEVERIFY);
pub const NOP4: Operation = Normal(OP_NOP4);
pub const NOP5: Operation = Normal(OP_NOP5);
pub const NOP6: Operation = Normal(OP_NOP6);
pub const NOP7: Operation = Normal(OP_NOP7);
pub const NOP8: Operation = Normal(OP_NOP8);
pub const NOP9: Operation = Normal(OP_NOP9);
pub const NOP10: Operation = Normal(OP_NOP10);
pub const CAT: Operation = Splice(OP_CAT);
pub const SUBSTR: Operation = Splice(OP_SUBSTR);
pub const AND: Operation = Splice(OP_AND);
pub const OR: Operation = Splice(OP_OR);
pub const XOR: Operation = Splice(OP_XOR);
pub const LEFT: Operation = Disabled(OP_LEFT);
pub const RIGHT: Operation = Disabled(OP_RIGHT);
pub const INVERT: Operation = Disabled(OP_INVERT);
pub const _2MUL: Operation = Disabled(OP_2MUL);
pub const _2DIV: Operation = Disabled(OP_2DIV);
pub const MUL: Operation = Disabled(OP_MUL);
pub const DIV: Operation = Disabled(OP_DIV);
pub const MOD: Operation = Disabled(OP_MOD);
pub const LSHIFT: Operation = Disabled(OP_LSHIFT);
pub const RSHIFT: Operation = Disabled(OP_RSHIFT);
pub const RESERVED: Operation = Bad(OP_RESERVED);
pub const VER: Operation = Bad(OP_VER);
pub const VERIF: Operation = Bad(OP_VERIF);
pub const VERNOTIF: Operation = Bad(OP_VERNOTIF);
pub const RESERVED1: Operation = Bad(OP_RESERVED1);
pub const RESERVED2: Operation = Bad(OP_RESERVED2);

/// An opcode byte with no assigned meaning. Passing an assigned byte produces an operation that
/// serializes to it, but doesn’t behave like it.
pub fn unknown(byte: u8) -> Operation {
    Bad(Unknown(byte))
}
