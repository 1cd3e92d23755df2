//! The closed set of opcodes, split by how the run loop treats them, and the handler for each.

#![allow(non_camel_case_types)]

pub mod push_value;

use alloc::vec::Vec;
use core::cmp::{max, min};

use thiserror::Error;

use crate::{
    external::hash,
    interpreter::{self, cast_to_bool, Element, Flags, Program},
    num::{self, Number},
};
pub use push_value::{LargeValue, PushValue, SmallValue};

/// Failures that belong to an opcode itself, rather than to what it does when run. These are
/// reported even on a branch that isn’t executing.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("expected {expected_bytes} bytes, but only {available_bytes} bytes available")]
    Read {
        expected_bytes: usize,
        available_bytes: usize,
    },

    #[error("push of {} bytes exceeds the maximum of {} bytes", .0.map_or("unknown".into(), |n| format!("{n}")), LargeValue::MAX_SIZE)]
    PushSize(Option<usize>),

    #[error("disabled opcode 0x{0:02x} encountered")]
    Disabled(u8),
}

/// Control operations are evaluated regardless of whether the current branch is active.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[allow(missing_docs)]
#[repr(u8)]
pub enum Control {
    OP_IF = 0x63,
    OP_NOTIF = 0x64,
    OP_ELSE = 0x67,
    OP_ENDIF = 0x68,
}

impl Control {
    pub(crate) fn decode(b: u8) -> Option<Self> {
        match b {
            0x63 => Some(Self::OP_IF),
            0x64 => Some(Self::OP_NOTIF),
            0x67 => Some(Self::OP_ELSE),
            0x68 => Some(Self::OP_ENDIF),
            _ => None,
        }
    }

    /// Returns the byte encoding of this opcode.
    pub fn encode(self) -> u8 {
        // This is how you get the discriminant, but using `as` everywhere is too much code smell
        self as u8
    }

    /// <expression> if [statements] [else [statements]] endif
    pub(crate) fn eval(&self, program: &mut Program) -> Result<(), interpreter::Error> {
        match self {
            Self::OP_IF | Self::OP_NOTIF => {
                // The condition is only consumed on an executing branch. Without one, the scope
                // can't be opened.
                let taken = program.is_succeess() && {
                    let value = cast_to_bool(
                        &program
                            .pop()
                            .map_err(|_| interpreter::Error::UnbalancedConditional)?,
                    );
                    if self == &Self::OP_NOTIF {
                        !value
                    } else {
                        value
                    }
                };
                program.open(taken);
                Ok(())
            }
            Self::OP_ELSE => program.reopen(),
            Self::OP_ENDIF => program.close(),
        }
    }
}

/// Normal operations are only executed when they are on an active branch.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[allow(missing_docs)]
#[repr(u8)]
pub enum Normal {
    // control
    OP_NOP = 0x61,
    OP_VERIFY = 0x69,
    OP_RETURN = 0x6a,

    // stack ops
    OP_TOALTSTACK = 0x6b,
    OP_FROMALTSTACK = 0x6c,
    OP_2DROP = 0x6d,
    OP_2DUP = 0x6e,
    OP_3DUP = 0x6f,
    OP_2OVER = 0x70,
    OP_2ROT = 0x71,
    OP_2SWAP = 0x72,
    OP_IFDUP = 0x73,
    OP_DEPTH = 0x74,
    OP_DROP = 0x75,
    OP_DUP = 0x76,
    OP_NIP = 0x77,
    OP_OVER = 0x78,
    OP_PICK = 0x79,
    OP_ROLL = 0x7a,
    OP_ROT = 0x7b,
    OP_SWAP = 0x7c,
    OP_TUCK = 0x7d,

    // splice ops
    OP_SIZE = 0x82,

    // bit logic
    OP_EQUAL = 0x87,
    OP_EQUALVERIFY = 0x88,

    // numeric
    OP_1ADD = 0x8b,
    OP_1SUB = 0x8c,
    OP_NEGATE = 0x8f,
    OP_ABS = 0x90,
    OP_NOT = 0x91,
    OP_0NOTEQUAL = 0x92,

    OP_ADD = 0x93,
    OP_SUB = 0x94,

    OP_BOOLAND = 0x9a,
    OP_BOOLOR = 0x9b,
    OP_NUMEQUAL = 0x9c,
    OP_NUMEQUALVERIFY = 0x9d,
    OP_NUMNOTEQUAL = 0x9e,
    OP_LESSTHAN = 0x9f,
    OP_GREATERTHAN = 0xa0,
    OP_LESSTHANOREQUAL = 0xa1,
    OP_GREATERTHANOREQUAL = 0xa2,
    OP_MIN = 0xa3,
    OP_MAX = 0xa4,

    OP_WITHIN = 0xa5,

    // crypto
    OP_RIPEMD160 = 0xa6,
    OP_SHA1 = 0xa7,
    OP_SHA256 = 0xa8,
    OP_HASH160 = 0xa9,
    OP_HASH256 = 0xaa,
    OP_CODESEPARATOR = 0xab,
    OP_CHECKSIG = 0xac,
    OP_CHECKSIGVERIFY = 0xad,
    OP_CHECKMULTISIG = 0xae,
    OP_CHECKMULTISIGVERIFY = 0xaf,

    // expansion
    OP_NOP1 = 0xb0,
    OP_CHECKLOCKTIMEVERIFY = 0xb1,
    OP_CHECKSEQUENCEVERIFY = 0xb2,
    OP_NOP4 = 0xb3,
    OP_NOP5 = 0xb4,
    OP_NOP6 = 0xb5,
    OP_NOP7 = 0xb6,
    OP_NOP8 = 0xb7,
    OP_NOP9 = 0xb8,
    OP_NOP10 = 0xb9,
}

impl Normal {
    pub(crate) fn decode(b: u8) -> Option<Self> {
        match b {
            0x61 => Some(Self::OP_NOP),
            0x69 => Some(Self::OP_VERIFY),
            0x6a => Some(Self::OP_RETURN),
            0x6b => Some(Self::OP_TOALTSTACK),
            0x6c => Some(Self::OP_FROMALTSTACK),
            0x6d => Some(Self::OP_2DROP),
            0x6e => Some(Self::OP_2DUP),
            0x6f => Some(Self::OP_3DUP),
            0x70 => Some(Self::OP_2OVER),
            0x71 => Some(Self::OP_2ROT),
            0x72 => Some(Self::OP_2SWAP),
            0x73 => Some(Self::OP_IFDUP),
            0x74 => Some(Self::OP_DEPTH),
            0x75 => Some(Self::OP_DROP),
            0x76 => Some(Self::OP_DUP),
            0x77 => Some(Self::OP_NIP),
            0x78 => Some(Self::OP_OVER),
            0x79 => Some(Self::OP_PICK),
            0x7a => Some(Self::OP_ROLL),
            0x7b => Some(Self::OP_ROT),
            0x7c => Some(Self::OP_SWAP),
            0x7d => Some(Self::OP_TUCK),
            0x82 => Some(Self::OP_SIZE),
            0x87 => Some(Self::OP_EQUAL),
            0x88 => Some(Self::OP_EQUALVERIFY),
            0x8b => Some(Self::OP_1ADD),
            0x8c => Some(Self::OP_1SUB),
            0x8f => Some(Self::OP_NEGATE),
            0x90 => Some(Self::OP_ABS),
            0x91 => Some(Self::OP_NOT),
            0x92 => Some(Self::OP_0NOTEQUAL),
            0x93 => Some(Self::OP_ADD),
            0x94 => Some(Self::OP_SUB),
            0x9a => Some(Self::OP_BOOLAND),
            0x9b => Some(Self::OP_BOOLOR),
            0x9c => Some(Self::OP_NUMEQUAL),
            0x9d => Some(Self::OP_NUMEQUALVERIFY),
            0x9e => Some(Self::OP_NUMNOTEQUAL),
            0x9f => Some(Self::OP_LESSTHAN),
            0xa0 => Some(Self::OP_GREATERTHAN),
            0xa1 => Some(Self::OP_LESSTHANOREQUAL),
            0xa2 => Some(Self::OP_GREATERTHANOREQUAL),
            0xa3 => Some(Self::OP_MIN),
            0xa4 => Some(Self::OP_MAX),
            0xa5 => Some(Self::OP_WITHIN),
            0xa6 => Some(Self::OP_RIPEMD160),
            0xa7 => Some(Self::OP_SHA1),
            0xa8 => Some(Self::OP_SHA256),
            0xa9 => Some(Self::OP_HASH160),
            0xaa => Some(Self::OP_HASH256),
            0xab => Some(Self::OP_CODESEPARATOR),
            0xac => Some(Self::OP_CHECKSIG),
            0xad => Some(Self::OP_CHECKSIGVERIFY),
            0xae => Some(Self::OP_CHECKMULTISIG),
            0xaf => Some(Self::OP_CHECKMULTISIGVERIFY),
            0xb0 => Some(Self::OP_NOP1),
            0xb1 => Some(Self::OP_CHECKLOCKTIMEVERIFY),
            0xb2 => Some(Self::OP_CHECKSEQUENCEVERIFY),
            0xb3 => Some(Self::OP_NOP4),
            0xb4 => Some(Self::OP_NOP5),
            0xb5 => Some(Self::OP_NOP6),
            0xb6 => Some(Self::OP_NOP7),
            0xb7 => Some(Self::OP_NOP8),
            0xb8 => Some(Self::OP_NOP9),
            0xb9 => Some(Self::OP_NOP10),
            _ => None,
        }
    }

    /// Returns the byte encoding of this opcode.
    pub fn encode(self) -> u8 {
        // This is how you get the discriminant, but using `as` everywhere is too much code smell
        self as u8
    }

    /// The NOPs reserved for soft forks succeed, unless the caller discourages them.
    fn upgradable_nop(program: &Program) -> Result<(), interpreter::Error> {
        if program.is_enabled(Flags::DiscourageUpgradableNOPs) {
            Err(interpreter::Error::DiscourageUpgradableNOPs)
        } else {
            Ok(())
        }
    }

    fn verify(success: bool) -> Result<(), interpreter::Error> {
        if success {
            Ok(())
        } else {
            Err(interpreter::Error::Verify)
        }
    }

    /// Pushes the result of a check, or, for the `VERIFY` variant, fails unless it succeeded.
    fn conclude(
        program: &mut Program,
        success: bool,
        verify: bool,
    ) -> Result<(), interpreter::Error> {
        if verify {
            Self::verify(success)
        } else {
            program.push_bool(success);
            Ok(())
        }
    }

    // (lt -- lt)
    fn check_lock_time_verify(program: &mut Program) -> Result<(), interpreter::Error> {
        if !program.is_enabled(Flags::CHECKLOCKTIMEVERIFY) {
            return Self::upgradable_nop(program);
        }

        let lock_time = program.peek_number(0, Number::LOCK_TIME_MAX_SIZE)?;

        // In the rare event that the argument may be < 0 due to some arithmetic being done
        // first, you can always use 0 MAX CHECKLOCKTIMEVERIFY.
        if lock_time.is_negative() {
            return Err(interpreter::Error::NegativeLockTime);
        }

        let lock_time = lock_time.to_i64();
        let tx_lock_time = program.transaction().lock_time();

        // Block heights can’t be compared with timestamps.
        if (lock_time < interpreter::LOCKTIME_THRESHOLD)
            != (i64::from(tx_lock_time) < interpreter::LOCKTIME_THRESHOLD)
        {
            return Err(interpreter::Error::LockTimeTypeMismatch {
                lock_time,
                tx_lock_time,
            });
        }

        if lock_time > i64::from(tx_lock_time) {
            return Err(interpreter::Error::UnsatisfiedLockTime);
        }

        // A final input bypasses the transaction lock time entirely.
        if program.is_final() {
            return Err(interpreter::Error::LockTimeInputFinal);
        }

        Ok(())
    }

    // (seq -- seq)
    fn check_sequence_verify(program: &mut Program) -> Result<(), interpreter::Error> {
        if !program.is_enabled(Flags::CHECKSEQUENCEVERIFY) {
            return Self::upgradable_nop(program);
        }

        let sequence = program.peek_number(0, Number::LOCK_TIME_MAX_SIZE)?;
        if sequence.is_negative() {
            return Err(interpreter::Error::NegativeLockTime);
        }

        let sequence = sequence.to_i64();
        if sequence & i64::from(interpreter::SEQUENCE_LOCKTIME_DISABLE_FLAG) != 0 {
            return Ok(());
        }

        let version = program.transaction().version();
        if version < interpreter::MIN_SEQUENCE_VERSION {
            return Err(interpreter::Error::SequenceTransactionVersion(version));
        }

        let tx_sequence = program.sequence();
        if tx_sequence & interpreter::SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
            return Err(interpreter::Error::SequenceInputDisabled);
        }

        let mask =
            i64::from(interpreter::SEQUENCE_LOCKTIME_TYPE_FLAG | interpreter::SEQUENCE_LOCKTIME_MASK);
        let type_flag = i64::from(interpreter::SEQUENCE_LOCKTIME_TYPE_FLAG);
        let masked = sequence & mask;
        let tx_masked = i64::from(tx_sequence) & mask;

        if (masked < type_flag) != (tx_masked < type_flag) {
            return Err(interpreter::Error::SequenceTypeMismatch);
        }

        if masked > tx_masked {
            return Err(interpreter::Error::UnsatisfiedSequence);
        }

        Ok(())
    }

    // ([sig ...] num_of_signatures [pubkey ...] num_of_pubkeys -- bool)
    fn check_multisig(program: &mut Program, verify: bool) -> Result<(), interpreter::Error> {
        let keys_count = program.pop_number(Number::DEFAULT_MAX_SIZE)?.to_i64();
        let n = u8::try_from(keys_count)
            .ok()
            .filter(|n| *n <= interpreter::MAX_PUBKEY_COUNT)
            .ok_or(interpreter::Error::PubKeyCount(Some(keys_count)))?;
        program.increment_op_count(n)?;

        // Both lists are ordered top of stack first.
        let keys = (0..n)
            .map(|_| program.pop())
            .collect::<Result<Vec<_>, _>>()?;

        let sigs_count = program.pop_number(Number::DEFAULT_MAX_SIZE)?.to_i64();
        let m = u8::try_from(sigs_count)
            .ok()
            .filter(|m| *m <= n)
            .ok_or(interpreter::Error::SigCount(Some(sigs_count)))?;
        let sigs = (0..m)
            .map(|_| program.pop())
            .collect::<Result<Vec<_>, _>>()?;

        // A historical off-by-one consumes one extra element.
        let dummy = program.pop()?;
        if program.is_enabled(Flags::NullDummy) && !dummy.is_empty() {
            return Err(interpreter::Error::SigNullDummy);
        }

        let subscript = program.subscript(&sigs);

        let mut pending = &sigs[..];
        for (checked, key) in keys.iter().enumerate() {
            match pending.split_first() {
                None => break,
                Some((sig, rest)) => {
                    // More signatures left than keys means too many have failed.
                    if pending.len() > keys.len() - checked {
                        break;
                    }
                    if program.check_signature(sig, key, &subscript)? {
                        pending = rest;
                    }
                }
            }
        }

        Self::conclude(program, pending.is_empty(), verify)
    }

    // (in -- out)
    fn unop_num(
        program: &mut Program,
        op: impl FnOnce(Number) -> Result<Number, num::Error>,
    ) -> Result<(), interpreter::Error> {
        let x = program.pop_number(Number::DEFAULT_MAX_SIZE)?;
        op(x).map(|n| program.push_number(n)).map_err(interpreter::Error::from)
    }

    fn unrel(
        program: &mut Program,
        op: impl FnOnce(Number) -> bool,
    ) -> Result<(), interpreter::Error> {
        program
            .pop_number(Number::DEFAULT_MAX_SIZE)
            .map(|x| program.push_bool(op(x)))
    }

    // (x1 x2 -- out)
    fn binop_num(
        program: &mut Program,
        op: impl FnOnce(Number, Number) -> Result<Number, num::Error>,
    ) -> Result<(), interpreter::Error> {
        let (x1, x2) = program.pop_binary()?;
        op(x1, x2)
            .map(|n| program.push_number(n))
            .map_err(interpreter::Error::from)
    }

    fn binrel(
        program: &mut Program,
        op: impl FnOnce(Number, Number) -> bool,
    ) -> Result<(), interpreter::Error> {
        program
            .pop_binary()
            .map(|(x1, x2)| program.push_bool(op(x1, x2)))
    }

    // (in -- hash)
    fn digest<const N: usize>(
        program: &mut Program,
        hasher: fn(&[u8]) -> [u8; N],
    ) -> Result<(), interpreter::Error> {
        program
            .pop()
            .map(|vch| program.push(Element::from(&hasher(&vch)[..])))
    }

    /// Evaluate a single operation. `position` is where it sits in the running script.
    pub(crate) fn eval(
        &self,
        position: usize,
        program: &mut Program,
    ) -> Result<(), interpreter::Error> {
        match self {
            //
            // Control
            //
            Self::OP_NOP => Ok(()),

            Self::OP_CHECKLOCKTIMEVERIFY => Self::check_lock_time_verify(program),

            Self::OP_CHECKSEQUENCEVERIFY => Self::check_sequence_verify(program),

            Self::OP_NOP1
            | Self::OP_NOP4
            | Self::OP_NOP5
            | Self::OP_NOP6
            | Self::OP_NOP7
            | Self::OP_NOP8
            | Self::OP_NOP9
            | Self::OP_NOP10 => Self::upgradable_nop(program),

            // (true -- ) or
            // (false -- false) and return
            Self::OP_VERIFY => program.pop().and_then(|v| Self::verify(cast_to_bool(&v))),

            Self::OP_RETURN => Err(interpreter::Error::OpReturn),

            //
            // Stack ops
            //
            Self::OP_TOALTSTACK => program.pop().map(|v| program.push_alternate(v)),

            Self::OP_FROMALTSTACK => program.pop_alternate().map(|v| program.push(v)),

            // (x1 x2 -- )
            Self::OP_2DROP => program
                .check_size(2)
                .and_then(|()| program.drop())
                .and_then(|()| program.drop()),

            // (x1 x2 -- x1 x2 x1 x2)
            Self::OP_2DUP => program
                .check_size(2)
                .and_then(|()| program.duplicate(1))
                .and_then(|()| program.duplicate(1)),

            // (x1 x2 x3 -- x1 x2 x3 x1 x2 x3)
            Self::OP_3DUP => {
                program.check_size(3)?;
                program.duplicate(2)?;
                program.duplicate(2)?;
                program.duplicate(2)
            }

            // (x1 x2 x3 x4 -- x1 x2 x3 x4 x1 x2)
            Self::OP_2OVER => program
                .check_size(4)
                .and_then(|()| program.duplicate(3))
                .and_then(|()| program.duplicate(3)),

            // (x1 x2 x3 x4 x5 x6 -- x3 x4 x5 x6 x1 x2)
            Self::OP_2ROT => program
                .check_size(6)
                .and_then(|()| program.roll(5))
                .and_then(|()| program.roll(5)),

            // (x1 x2 x3 x4 -- x3 x4 x1 x2)
            Self::OP_2SWAP => program
                .check_size(4)
                .and_then(|()| program.roll(3))
                .and_then(|()| program.roll(3)),

            // (x - 0 | x x)
            Self::OP_IFDUP => program.item(0).cloned().map(|v| {
                if cast_to_bool(&v) {
                    program.push(v)
                }
            }),

            // -- stacksize
            Self::OP_DEPTH => i64::try_from(program.size())
                .map_err(|err| interpreter::Error::StackSize(Some(err)))
                .map(|n| program.push_number(Number::from(n))),

            // (x -- )
            Self::OP_DROP => program.drop(),

            // (x -- x x)
            Self::OP_DUP => program.duplicate(0),

            // (x1 x2 -- x2)
            Self::OP_NIP => program.erase(1).map(|_| ()),

            // (x1 x2 -- x1 x2 x1)
            Self::OP_OVER => program.duplicate(1),

            // (xn ... x2 x1 x0 n - xn ... x2 x1 x0 xn)
            Self::OP_PICK => program.pop_index().and_then(|n| program.duplicate(n)),

            // (xn ... x2 x1 x0 n - ... x2 x1 x0 xn)
            Self::OP_ROLL => program.pop_index().and_then(|n| program.roll(n)),

            // (x1 x2 x3 -- x2 x3 x1)
            Self::OP_ROT => program.roll(2),

            // (x1 x2 -- x2 x1)
            Self::OP_SWAP => program.swap(0, 1),

            // (x1 x2 -- x2 x1 x2)
            Self::OP_TUCK => {
                program.check_size(2)?;
                let top = program.item(0)?.clone();
                program.insert(1, top)
            }

            // (in -- in size)
            Self::OP_SIZE => program
                .item(0)
                .map(|v| v.len())
                .and_then(|len| {
                    i64::try_from(len).map_err(|err| interpreter::Error::StackSize(Some(err)))
                })
                .map(|n| program.push_number(Number::from(n))),

            //
            // Bitwise logic
            //

            // (x1 x2 - bool)
            Self::OP_EQUAL | Self::OP_EQUALVERIFY => {
                program.check_size(2)?;
                let x2 = program.pop()?;
                let x1 = program.pop()?;
                Self::conclude(program, x1 == x2, self == &Self::OP_EQUALVERIFY)
            }

            //
            // Numeric
            //

            // (in -- out)
            Self::OP_1ADD => Self::unop_num(program, |x| x.checked_add(&Number::from(1))),
            Self::OP_1SUB => Self::unop_num(program, |x| x.checked_sub(&Number::from(1))),
            Self::OP_NEGATE => Self::unop_num(program, |x| x.checked_neg()),
            Self::OP_ABS => Self::unop_num(program, |x| {
                if x.is_negative() {
                    x.checked_neg()
                } else {
                    Ok(x)
                }
            }),
            Self::OP_NOT => Self::unrel(program, |x| x.is_zero()),
            Self::OP_0NOTEQUAL => Self::unrel(program, |x| !x.is_zero()),

            // (x1 x2 -- out)
            Self::OP_ADD => Self::binop_num(program, |x1, x2| x1.checked_add(&x2)),
            Self::OP_SUB => Self::binop_num(program, |x1, x2| x1.checked_sub(&x2)),
            Self::OP_BOOLAND => {
                Self::binrel(program, |x1, x2| !x1.is_zero() && !x2.is_zero())
            }
            Self::OP_BOOLOR => {
                Self::binrel(program, |x1, x2| !x1.is_zero() || !x2.is_zero())
            }
            Self::OP_NUMEQUAL => Self::binrel(program, |x1, x2| x1 == x2),
            Self::OP_NUMEQUALVERIFY => program
                .pop_binary()
                .and_then(|(x1, x2)| Self::verify(x1 == x2)),
            Self::OP_NUMNOTEQUAL => Self::binrel(program, |x1, x2| x1 != x2),
            Self::OP_LESSTHAN => Self::binrel(program, |x1, x2| x1 < x2),
            Self::OP_GREATERTHAN => Self::binrel(program, |x1, x2| x1 > x2),
            Self::OP_LESSTHANOREQUAL => Self::binrel(program, |x1, x2| x1 <= x2),
            Self::OP_GREATERTHANOREQUAL => Self::binrel(program, |x1, x2| x1 >= x2),
            Self::OP_MIN => Self::binop_num(program, |x1, x2| Ok(min(x1, x2))),
            Self::OP_MAX => Self::binop_num(program, |x1, x2| Ok(max(x1, x2))),

            // (x min max -- out)
            Self::OP_WITHIN => program
                .pop_ternary()
                .map(|(x, lower, upper)| program.push_bool(lower <= x && x < upper)),

            //
            // Crypto
            //

            Self::OP_RIPEMD160 => Self::digest(program, hash::ripemd160),
            Self::OP_SHA1 => Self::digest(program, hash::sha1),
            Self::OP_SHA256 => Self::digest(program, hash::sha256),
            Self::OP_HASH160 => Self::digest(program, hash::hash160),
            Self::OP_HASH256 => Self::digest(program, hash::hash256),

            Self::OP_CODESEPARATOR => {
                if program.set_subscript(position) {
                    Ok(())
                } else {
                    Err(interpreter::Error::BadOpcode)
                }
            }

            // (sig pubkey -- bool)
            Self::OP_CHECKSIG | Self::OP_CHECKSIGVERIFY => {
                let key = program.pop()?;
                let endorsement = program.pop()?;
                let subscript = program.subscript(core::slice::from_ref(&endorsement));
                let success = program.check_signature(&endorsement, &key, &subscript)?;
                Self::conclude(program, success, self == &Self::OP_CHECKSIGVERIFY)
            }

            Self::OP_CHECKMULTISIG | Self::OP_CHECKMULTISIGVERIFY => {
                Self::check_multisig(program, self == &Self::OP_CHECKMULTISIGVERIFY)
            }
        }
    }
}

/// The splice and bitwise opcodes. They are disabled, unless [`Flags::Splice`] reserves them for
/// a later upgrade.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[allow(missing_docs)]
#[repr(u8)]
pub enum Splice {
    OP_CAT = 0x7e,
    OP_SUBSTR = 0x7f,
    OP_AND = 0x84,
    OP_OR = 0x85,
    OP_XOR = 0x86,
}

impl Splice {
    pub(crate) fn decode(b: u8) -> Option<Self> {
        match b {
            0x7e => Some(Self::OP_CAT),
            0x7f => Some(Self::OP_SUBSTR),
            0x84 => Some(Self::OP_AND),
            0x85 => Some(Self::OP_OR),
            0x86 => Some(Self::OP_XOR),
            _ => None,
        }
    }

    /// Returns the byte encoding of this opcode.
    pub fn encode(self) -> u8 {
        // This is how you get the discriminant, but using `as` everywhere is too much code smell
        self as u8
    }
}

/// Opcodes that fail the script wherever they appear, even on a branch that isn’t executing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[allow(missing_docs)]
#[repr(u8)]
pub enum Disabled {
    // splice ops
    OP_LEFT = 0x80,
    OP_RIGHT = 0x81,
    // bit logic
    OP_INVERT = 0x83,
    // numeric
    OP_2MUL = 0x8d,
    OP_2DIV = 0x8e,
    OP_MUL = 0x95,
    OP_DIV = 0x96,
    OP_MOD = 0x97,
    OP_LSHIFT = 0x98,
    OP_RSHIFT = 0x99,
}

impl Disabled {
    pub(crate) fn decode(b: u8) -> Option<Self> {
        match b {
            0x80 => Some(Self::OP_LEFT),
            0x81 => Some(Self::OP_RIGHT),
            0x83 => Some(Self::OP_INVERT),
            0x8d => Some(Self::OP_2MUL),
            0x8e => Some(Self::OP_2DIV),
            0x95 => Some(Self::OP_MUL),
            0x96 => Some(Self::OP_DIV),
            0x97 => Some(Self::OP_MOD),
            0x98 => Some(Self::OP_LSHIFT),
            0x99 => Some(Self::OP_RSHIFT),
            _ => None,
        }
    }

    /// Returns the byte encoding of this opcode.
    pub fn encode(self) -> u8 {
        // This is how you get the discriminant, but using `as` everywhere is too much code smell
        self as u8
    }
}

/// Opcodes that fail if they’re on an active branch. `OP_VERIF` and `OP_VERNOTIF` sit among the
/// conditionals, so they are always considered active.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[allow(missing_docs)]
pub enum Bad {
    OP_RESERVED,
    OP_VER,
    OP_VERIF,
    OP_VERNOTIF,
    OP_RESERVED1,
    OP_RESERVED2,
    Unknown(u8),
}

impl From<u8> for Bad {
    fn from(value: u8) -> Self {
        match value {
            0x50 => Bad::OP_RESERVED,
            0x62 => Bad::OP_VER,
            0x65 => Bad::OP_VERIF,
            0x66 => Bad::OP_VERNOTIF,
            0x89 => Bad::OP_RESERVED1,
            0x8a => Bad::OP_RESERVED2,
            _ => Bad::Unknown(value),
        }
    }
}

impl From<Bad> for u8 {
    fn from(value: Bad) -> Self {
        match value {
            Bad::OP_RESERVED => 0x50,
            Bad::OP_VER => 0x62,
            Bad::OP_VERIF => 0x65,
            Bad::OP_VERNOTIF => 0x66,
            Bad::OP_RESERVED1 => 0x89,
            Bad::OP_RESERVED2 => 0x8a,
            Bad::Unknown(byte) => byte,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Bad, Control, Disabled, Normal, Splice};

    #[test]
    fn decoding_is_inverse_of_encoding() {
        for b in 0..=u8::MAX {
            if let Some(op) = Control::decode(b) {
                assert_eq!(op.encode(), b);
            }
            if let Some(op) = Normal::decode(b) {
                assert_eq!(op.encode(), b);
            }
            if let Some(op) = Splice::decode(b) {
                assert_eq!(op.encode(), b);
            }
            if let Some(op) = Disabled::decode(b) {
                assert_eq!(op.encode(), b);
            }
            assert_eq!(u8::from(Bad::from(b)), b);
        }
    }

    #[test]
    fn classes_dont_overlap() {
        for b in 0..=u8::MAX {
            let classes = [
                Control::decode(b).is_some(),
                Normal::decode(b).is_some(),
                Splice::decode(b).is_some(),
                Disabled::decode(b).is_some(),
            ];
            assert!(classes.iter().filter(|c| **c).count() <= 1, "0x{b:02x}");
        }
    }
}
