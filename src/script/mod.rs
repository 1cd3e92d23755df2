//! Managing sequences of opcodes.

use alloc::vec::Vec;

use thiserror::Error;

use crate::{
    interpreter::{self, Element, Stack, TransactionContext},
    opcode::{self, Bad, Normal, PushValue},
    Operation,
};

pub(crate) mod iter;

/// Errors that can occur during script verification.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    // Max sizes
    #[error(
        "Script size{} exceeded maxmimum ({} bytes)",
        .0.map_or("".into(), |size| format!(" ({size} bytes)")),
        Code::MAX_SIZE
    )]
    ScriptSize(Option<usize>),

    #[error("during parsing: {0}")]
    Opcode(opcode::Error),

    #[error("non-push opcode encountered in script sig when push-only required")]
    SigPushOnly,

    /// The operation is `None` when the failure doesn’t belong to any one of them.
    #[error("during interpretation{}: {}", .0.as_ref().map_or("".into(), |op| format!(" of {op:?}")), .1)]
    Interpreter(Option<Operation>, interpreter::Error),

    #[error("{}", match .0 { 1 => "1 conditional opcode wasn’t closed before the end of the script".into(), n => format!("{n} conditional opcodes weren’t closed before the end of the script")})]
    UnclosedConditional(usize),

    #[error("clean stack requirement not met")]
    CleanStack,
}

impl From<opcode::Error> for Error {
    fn from(value: opcode::Error) -> Self {
        Error::Opcode(value)
    }
}

/// When an entire [`crate::Script`] is validated, this is used to tag errors with which component
/// they came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComponentType {
    /// The script sig.
    Sig,
    /// The script pubkey.
    PubKey,
    /// The redeem script from a P2SH script.
    Redeem,
}

/// A decoded script: the sequence of operations the run loop consumes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Code(pub Vec<Operation>);

impl Code {
    /// Maximum script length in bytes
    pub const MAX_SIZE: usize = 10_000;

    /// The serialized length.
    pub fn byte_len(&self) -> usize {
        self.0.iter().map(Operation::byte_len).sum()
    }

    /// Convert a sequence of operations to the bytes that would be included in a transaction.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(Vec::from).collect()
    }

    /// Decode serialized script bytes. Unknown opcodes are kept (as [`Bad`]), since they only fail
    /// if they are executed, but a push that runs past the end of the script is an error.
    pub fn parse(raw_script: &[u8]) -> Result<Self, Error> {
        Parser(raw_script)
            .collect::<Result<_, _>>()
            .map(Code)
            .map_err(Error::Opcode)
    }

    /// Run this script against `stack`, returning the stack it leaves behind.
    pub fn eval(
        &self,
        flags: interpreter::Flags,
        transaction: &dyn TransactionContext,
        stack: Stack<Element>,
    ) -> Result<Stack<Element>, Error> {
        iter::eval(self, flags, transaction, stack)
    }

    /// Returns true iff this script is P2SH.
    pub fn is_pay_to_script_hash(&self) -> bool {
        match &self.0[..] {
            [Operation::Normal(Normal::OP_HASH160), Operation::PushValue(PushValue::LargeValue(lv)), Operation::Normal(Normal::OP_EQUAL)] => {
                lv.prefix() == opcode::push_value::Prefix::PushdataBytelength
                    && lv.value().len() == 0x14
            }
            _ => false,
        }
    }

    /// Called by P2SH and `SigPushOnly` verification (which makes it consensus-critical).
    pub fn is_push_only(&self) -> bool {
        self.0.iter().all(|op| {
            matches!(
                op,
                // NB: OP_RESERVED sits among the push opcodes, so it counts as one here.
                Operation::PushValue(_) | Operation::Bad(Bad::OP_RESERVED)
            )
        })
    }
}

impl From<Vec<Operation>> for Code {
    fn from(value: Vec<Operation>) -> Self {
        Code(value)
    }
}

/// An iterator that provides [`Operation`]s from a byte stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Parser<'a>(&'a [u8]);

impl<'a> Iterator for Parser<'a> {
    type Item = Result<Operation, opcode::Error>;
    fn next(&mut self) -> Option<Self::Item> {
        let (res, rem) = Operation::parse(self.0)?;
        self.0 = rem;
        Some(res)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use hex::FromHex;

    use super::{Code, Error};
    use crate::{op, opcode, pv};

    #[test]
    fn parses_what_it_serializes() {
        let code = Code(vec![
            op::_0,
            op::pushdata_bytelength(&[0xaa; 20]).expect("fits"),
            op::pushdata1(&[0xbb; 100]).expect("fits"),
            op::_16,
            op::IF,
            op::HASH160,
            op::ELSE,
            op::CAT,
            op::LSHIFT,
            op::ENDIF,
            op::CHECKLOCKTIMEVERIFY,
            op::CHECKSEQUENCEVERIFY,
            op::RESERVED,
            op::unknown(0xff),
        ]);
        let bytes = code.to_bytes();
        assert_eq!(bytes.len(), code.byte_len());
        assert_eq!(Code::parse(&bytes), Ok(code));
    }

    #[test]
    fn decodes_known_bytes() {
        let bytes = <Vec<u8>>::from_hex("5193935387").expect("valid hex");
        assert_eq!(
            Code::parse(&bytes),
            Ok(Code(vec![op::_1, op::ADD, op::ADD, op::_3, op::EQUAL]))
        );
    }

    #[test]
    fn truncated_pushes_fail_to_decode() {
        assert_eq!(
            Code::parse(&[0x51, 0x4d, 0x10]),
            Err(Error::Opcode(opcode::Error::Read {
                expected_bytes: 2,
                available_bytes: 1
            }))
        );
    }

    #[test]
    fn recognizes_pay_to_script_hash() {
        let p2sh = Code(vec![
            op::HASH160,
            op::pushdata_bytelength(&[0x00; 20]).expect("fits"),
            op::EQUAL,
        ]);
        assert!(p2sh.is_pay_to_script_hash());

        // The hash has to be pushed directly.
        let padded = Code(vec![
            op::HASH160,
            op::pushdata1(&[0x00; 20]).expect("fits"),
            op::EQUAL,
        ]);
        assert!(!padded.is_pay_to_script_hash());

        let short = Code(vec![
            op::HASH160,
            op::pushdata_bytelength(&[0x00; 19]).expect("fits"),
            op::EQUAL,
        ]);
        assert!(!short.is_pay_to_script_hash());
    }

    #[test]
    fn push_only() {
        let data = pv::push_value(&[1, 2, 3]).expect("fits");
        assert!(Code(vec![op::_0, data.into()]).is_push_only());
        assert!(Code(vec![op::RESERVED]).is_push_only());
        assert!(!Code(vec![op::_1, op::NOP]).is_push_only());
    }
}
