//! Whole-spend cases, run through [`crate::Script::eval`].

use alloc::vec::Vec;

use hex::{FromHex, FromHexError};

use crate::{
    interpreter::{self, Flags, TransactionContext},
    op, opcode, pv,
    script::{self, ComponentType},
    Operation, Script,
};

/// A shorthand syntax for writing possibly-incorrect scripts.
#[derive(Debug)]
pub enum Entry {
    /// An operation
    O(Operation),
    /// A byte sequence encoded as a hex string, spliced in as is
    H(&'static str),
    /// The minimal push of an ASCII string
    A(&'static str),
    /// The minimal push of a number
    N(i64),
}

impl Entry {
    /// The bytes this contributes to a script.
    pub fn serialize(&self) -> Result<Vec<u8>, FromHexError> {
        match self {
            Entry::O(op) => Ok(Vec::from(op)),
            Entry::H(bytes) => <Vec<u8>>::from_hex(*bytes),
            Entry::A(string) => Ok(Vec::from(&Operation::from(
                pv::push_value(string.as_bytes()).expect("short strings fit into a push"),
            ))),
            Entry::N(num) => Ok(Vec::from(&Operation::from(
                pv::push_num(*num).expect("numbers fit into a push"),
            ))),
        }
    }
}

/// One case: both components, the flags in force, and the expected outcome.
#[derive(Debug)]
pub struct TestVector {
    /// The unlocking script.
    pub script_sig: Vec<Entry>,
    /// The locking script.
    pub script_pubkey: Vec<Entry>,
    /// The rules in force.
    pub flags: Flags,
    /// What verification should produce.
    pub result: Result<bool, (ComponentType, script::Error)>,
}

fn serialize(entries: &[Entry]) -> Result<Vec<u8>, FromHexError> {
    entries
        .iter()
        .map(Entry::serialize)
        .collect::<Result<Vec<Vec<u8>>, FromHexError>>()
        .map(|vs| vs.concat())
}

impl TestVector {
    /// Decodes and verifies the spend. Decoding failures are reported like evaluation failures,
    /// tagged with the component that failed.
    pub fn run(
        &self,
        transaction: &dyn TransactionContext,
    ) -> Result<bool, (ComponentType, script::Error)> {
        match (serialize(&self.script_sig), serialize(&self.script_pubkey)) {
            (Ok(sig), Ok(pub_key)) => Script::parse(&sig, &pub_key)
                .and_then(|script| script.eval(self.flags, transaction)),
            (s, p) => panic!("{:?} has a bad hex value: {:?}", self, s.and_then(|_| p)),
        }
    }

    /// Panics, with the whole case, if the result isn’t the expected one.
    pub fn assert_passes(&self, transaction: &dyn TransactionContext) {
        let actual = self.run(transaction);
        assert_eq!(actual, self.result, "in {:?}", self);
    }
}

fn interpreter_error(
    component: ComponentType,
    op: Operation,
    error: interpreter::Error,
) -> Result<bool, (ComponentType, script::Error)> {
    Err((component, script::Error::Interpreter(Some(op), error)))
}

/// The table of cases.
pub fn test_vectors() -> Vec<TestVector> {
    use ComponentType::*;
    use Entry::*;

    let tv = |script_sig, script_pubkey, flags, result| TestVector {
        script_sig,
        script_pubkey,
        flags,
        result,
    };

    vec![
        // arithmetic and comparison
        tv(
            vec![N(1), N(2)],
            vec![O(op::ADD), N(3), O(op::EQUAL)],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![],
            vec![O(op::_1), O(op::_2), O(op::ADD), O(op::_3), O(op::EQUAL)],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![N(0), N(0), N(1)],
            vec![O(op::WITHIN)],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![N(1), N(0)],
            vec![O(op::BOOLAND), O(op::NOT)],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![H("050000000001")],
            vec![O(op::_1ADD)],
            Flags::empty(),
            interpreter_error(
                PubKey,
                op::_1ADD,
                interpreter::Error::Num(crate::num::Error::Overflow {
                    max_size: 4,
                    actual: 5,
                }),
            ),
        ),
        // truthiness of the final stack
        tv(vec![N(0)], vec![], Flags::empty(), Ok(false)),
        tv(vec![H("0180")], vec![], Flags::empty(), Ok(false)),
        tv(
            vec![A("a")],
            vec![O(op::DUP), O(op::EQUALVERIFY)],
            Flags::empty(),
            Ok(false),
        ),
        tv(
            vec![],
            vec![O(op::_1), O(op::_2), O(op::EQUALVERIFY)],
            Flags::empty(),
            interpreter_error(PubKey, op::EQUALVERIFY, interpreter::Error::Verify),
        ),
        // stack manipulation
        tv(
            vec![],
            vec![O(op::DEPTH), O(op::_0), O(op::EQUAL)],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![],
            vec![O(op::_1), O(op::TOALTSTACK), O(op::FROMALTSTACK)],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![N(1), N(2), N(3), N(4)],
            vec![
                O(op::_2SWAP),
                N(2),
                O(op::EQUALVERIFY),
                N(1),
                O(op::EQUALVERIFY),
                N(4),
                O(op::EQUALVERIFY),
                N(3),
                O(op::EQUAL),
            ],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![N(0)],
            vec![
                O(op::IFDUP),
                O(op::DEPTH),
                N(1),
                O(op::EQUALVERIFY),
                O(op::NOT),
            ],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![N(1)],
            vec![N(1), O(op::PICK)],
            Flags::empty(),
            interpreter_error(
                PubKey,
                op::PICK,
                interpreter::Error::InvalidStackIndex { index: 1, len: 1 },
            ),
        ),
        tv(
            vec![A("abc")],
            vec![O(op::SIZE), N(3), O(op::EQUALVERIFY), A("abc"), O(op::EQUAL)],
            Flags::empty(),
            Ok(true),
        ),
        // hashes of the empty string
        tv(
            vec![],
            vec![
                O(op::_0),
                O(op::HASH160),
                H("14b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"),
                O(op::EQUAL),
            ],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![],
            vec![
                O(op::_0),
                O(op::SHA256),
                H("20e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"),
                O(op::EQUAL),
            ],
            Flags::empty(),
            Ok(true),
        ),
        // conditionals
        tv(
            vec![],
            vec![O(op::_0), O(op::IF), O(op::VER), O(op::ELSE), O(op::_1), O(op::ENDIF)],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![],
            vec![O(op::_1), O(op::IF), O(op::VER), O(op::ELSE), O(op::_1), O(op::ENDIF)],
            Flags::empty(),
            interpreter_error(PubKey, op::VER, interpreter::Error::BadOpcode),
        ),
        tv(
            vec![],
            vec![O(op::_0), O(op::IF), O(op::VERIF), O(op::ELSE), O(op::_1), O(op::ENDIF)],
            Flags::empty(),
            interpreter_error(PubKey, op::VERIF, interpreter::Error::BadOpcode),
        ),
        tv(
            vec![],
            vec![O(op::_0), O(op::IF), O(op::RETURN), O(op::ENDIF), O(op::_1)],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![],
            vec![O(op::_1), O(op::RETURN)],
            Flags::empty(),
            interpreter_error(PubKey, op::RETURN, interpreter::Error::OpReturn),
        ),
        tv(
            vec![],
            vec![O(op::_1), O(op::ELSE)],
            Flags::empty(),
            interpreter_error(PubKey, op::ELSE, interpreter::Error::UnbalancedConditional),
        ),
        // Scopes don’t carry over from one script to the next.
        tv(
            vec![O(op::_1), O(op::IF)],
            vec![O(op::ENDIF)],
            Flags::empty(),
            Err((Sig, script::Error::UnclosedConditional(1))),
        ),
        // disabled and reserved opcodes
        tv(
            vec![],
            vec![O(op::_0), O(op::IF), O(op::_2MUL), O(op::ENDIF), O(op::_1)],
            Flags::empty(),
            Err((PubKey, script::Error::Opcode(opcode::Error::Disabled(0x8d)))),
        ),
        tv(
            vec![],
            vec![O(op::_0), O(op::IF), O(op::CAT), O(op::ENDIF), O(op::_1)],
            Flags::empty(),
            Err((PubKey, script::Error::Opcode(opcode::Error::Disabled(0x7e)))),
        ),
        tv(
            vec![],
            vec![O(op::_0), O(op::IF), O(op::CAT), O(op::ENDIF), O(op::_1)],
            Flags::Splice,
            Ok(true),
        ),
        tv(
            vec![],
            vec![O(op::NOP5), O(op::_1)],
            Flags::empty(),
            Ok(true),
        ),
        tv(
            vec![],
            vec![O(op::NOP5), O(op::_1)],
            Flags::DiscourageUpgradableNOPs,
            interpreter_error(PubKey, op::NOP5, interpreter::Error::DiscourageUpgradableNOPs),
        ),
        tv(
            vec![],
            vec![O(op::CODESEPARATOR), O(op::_1)],
            Flags::empty(),
            Ok(true),
        ),
        // decoding
        tv(
            vec![],
            vec![O(op::_1), H("4c05")],
            Flags::empty(),
            Err((
                PubKey,
                script::Error::Opcode(opcode::Error::Read {
                    expected_bytes: 5,
                    available_bytes: 0,
                }),
            )),
        ),
        // unlocking scripts
        tv(
            vec![O(op::NOP), O(op::_1)],
            vec![],
            Flags::SigPushOnly,
            Err((Sig, script::Error::SigPushOnly)),
        ),
        // multisig
        tv(
            vec![],
            vec![O(op::_0), O(op::_0), O(op::_0), O(op::CHECKMULTISIG)],
            Flags::NullDummy,
            Ok(true),
        ),
        tv(
            vec![],
            vec![O(op::_1), O(op::_0), O(op::_0), O(op::CHECKMULTISIG)],
            Flags::NullDummy,
            interpreter_error(PubKey, op::CHECKMULTISIG, interpreter::Error::SigNullDummy),
        ),
    ]
}
