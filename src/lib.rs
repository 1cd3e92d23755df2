//! Consensus evaluation of Bitcoin-style transparent scripts.

#![no_std]
#![doc(html_root_url = "https://docs.rs/script_engine/0.1.0")]
#![allow(clippy::unit_arg)]
#![allow(non_snake_case)]
#![deny(missing_docs)]

#[macro_use]
extern crate alloc;

mod external;
pub mod interpreter;
pub mod num;
pub mod op;
pub mod opcode;
pub mod pv;
pub mod script;
pub mod signature;

#[cfg(any(test, feature = "test-dependencies"))]
pub mod test_vectors;

use alloc::vec::Vec;

use tracing::{debug, trace};

use opcode::{Bad, Control, Disabled, LargeValue, Normal, PushValue, SmallValue, Splice};

/// A single decoded opcode, along with any data it pushes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operation {
    /// Opcodes that represent constants to be pushed onto the stack.
    PushValue(PushValue),
    /// - always evaluated
    /// - can be cast to its discriminant
    Control(Control),
    /// - only evaluated on active branch
    /// - can be cast to its discriminant
    Normal(Normal),
    /// - disabled, unless [`interpreter::Flags::Splice`] reserves them
    /// - can be cast to its discriminant
    Splice(Splice),
    /// - fail wherever they appear
    /// - can be cast to its discriminant
    Disabled(Disabled),
    /// - fail when evaluated
    Bad(Bad),
}

impl Operation {
    /// Decodes an opcode that carries no data.
    fn decode(b: u8) -> Self {
        SmallValue::decode(b)
            .map(|sv| Self::PushValue(PushValue::SmallValue(sv)))
            .or_else(|| Control::decode(b).map(Self::Control))
            .or_else(|| Normal::decode(b).map(Self::Normal))
            .or_else(|| Splice::decode(b).map(Self::Splice))
            .or_else(|| Disabled::decode(b).map(Self::Disabled))
            .unwrap_or_else(|| Self::Bad(Bad::from(b)))
    }

    /// This parses a single operation from a byte stream. It returns `None` only when the stream
    /// is empty.
    ///
    /// A push that runs past the end of the stream is an error, and consumes the rest of it.
    pub fn parse(script: &[u8]) -> Option<(Result<Operation, opcode::Error>, &[u8])> {
        LargeValue::parse(script)
            .map(|(res, rem)| {
                (
                    res.map(|lv| Self::PushValue(PushValue::LargeValue(lv))),
                    rem,
                )
            })
            .or_else(|| {
                script
                    .split_first()
                    .map(|(leading_byte, rem)| (Ok(Self::decode(*leading_byte)), rem))
            })
    }

    /// The number of bytes this requires in a script.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::PushValue(pv) => pv.byte_len(),
            _ => 1,
        }
    }

    /// Whether this counts toward [`interpreter::MAX_OP_COUNT`]. Pushes don’t, and neither does
    /// `OP_RESERVED`, which sits among them.
    pub fn is_counted(&self) -> bool {
        !matches!(self, Self::PushValue(_) | Self::Bad(Bad::OP_RESERVED))
    }

    /// Whether this is `OP_CODESEPARATOR`.
    pub fn is_code_separator(&self) -> bool {
        self == &Self::Normal(Normal::OP_CODESEPARATOR)
    }

    /// Whether this is evaluated even on a branch that isn’t executing. That covers the whole
    /// opcode range of the conditionals, which includes `OP_VERIF` and `OP_VERNOTIF`.
    pub fn is_conditional(&self) -> bool {
        matches!(
            self,
            Self::Control(_) | Self::Bad(Bad::OP_VERIF | Bad::OP_VERNOTIF)
        )
    }

    /// The failures that don’t depend on whether the operation executes.
    pub fn check(&self, flags: interpreter::Flags) -> Result<(), opcode::Error> {
        match self {
            Self::PushValue(PushValue::LargeValue(lv)) => {
                let size = lv.value().len();
                if size <= LargeValue::MAX_SIZE {
                    Ok(())
                } else {
                    Err(opcode::Error::PushSize(Some(size)))
                }
            }
            Self::Disabled(op) => Err(opcode::Error::Disabled(op.encode())),
            Self::Splice(op) if !flags.contains(interpreter::Flags::Splice) => {
                Err(opcode::Error::Disabled(op.encode()))
            }
            _ => Ok(()),
        }
    }

    /// Runs the handler for this operation. `position` is where it sits in the running script.
    pub(crate) fn eval(
        &self,
        position: usize,
        program: &mut interpreter::Program,
    ) -> Result<(), interpreter::Error> {
        match self {
            Self::PushValue(pv) => Ok(pv.eval(program)),
            Self::Control(control) => control.eval(program),
            Self::Normal(normal) => normal.eval(position, program),
            Self::Splice(_) => Err(interpreter::Error::NotImplemented),
            Self::Disabled(_) | Self::Bad(_) => Err(interpreter::Error::BadOpcode),
        }
    }
}

impl From<PushValue> for Operation {
    fn from(value: PushValue) -> Self {
        Operation::PushValue(value)
    }
}

impl From<Control> for Operation {
    fn from(value: Control) -> Self {
        Operation::Control(value)
    }
}

impl From<Normal> for Operation {
    fn from(value: Normal) -> Self {
        Operation::Normal(value)
    }
}

impl From<Splice> for Operation {
    fn from(value: Splice) -> Self {
        Operation::Splice(value)
    }
}

impl From<Disabled> for Operation {
    fn from(value: Disabled) -> Self {
        Operation::Disabled(value)
    }
}

impl From<Bad> for Operation {
    fn from(value: Bad) -> Self {
        Operation::Bad(value)
    }
}

impl From<&Operation> for Vec<u8> {
    fn from(value: &Operation) -> Self {
        match value {
            Operation::PushValue(v) => v.into(),
            Operation::Control(v) => vec![(*v).encode()],
            Operation::Normal(v) => vec![(*v).encode()],
            Operation::Splice(v) => vec![(*v).encode()],
            Operation::Disabled(v) => vec![(*v).encode()],
            Operation::Bad(v) => vec![u8::from(*v)],
        }
    }
}

/// A spend: the script sig that unlocks an output, and the script pubkey that locks it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    /// The unlocking script.
    pub sig: script::Code,
    /// The locking script.
    pub pub_key: script::Code,
}

impl Script {
    /// Decodes both components from their serialized form.
    pub fn parse(
        sig: &[u8],
        pub_key: &[u8],
    ) -> Result<Self, (script::ComponentType, script::Error)> {
        Ok(Script {
            sig: script::Code::parse(sig).map_err(|e| (script::ComponentType::Sig, e))?,
            pub_key: script::Code::parse(pub_key)
                .map_err(|e| (script::ComponentType::PubKey, e))?,
        })
    }

    /// Evaluate an entire script.
    ///
    /// `Ok(false)` means the scripts ran to completion, but left a false value on top of the
    /// stack.
    pub fn eval(
        &self,
        flags: interpreter::Flags,
        transaction: &dyn interpreter::TransactionContext,
    ) -> Result<bool, (script::ComponentType, script::Error)> {
        let result = script::iter::eval_script(&self.sig, &self.pub_key, flags, transaction);
        match &result {
            Ok(true) => (),
            Ok(false) => trace!(?flags, "script evaluated to false"),
            Err((component, error)) => {
                debug!(?component, %error, ?flags, "script rejected")
            }
        }
        result
    }
}

/// Utilities useful for tests in other modules and crates.
#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing {
    use alloc::vec::Vec;

    use hex::FromHex;
    use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

    use crate::{
        interpreter::{self, OutPoint, TransactionContext, SIGHASH_SIZE},
        op, pv,
        script::{self, Code},
        signature::HashType,
        Operation, Script,
    };

    /// The digest every endorsement in these fixtures signs.
    pub const SIGHASH: [u8; SIGHASH_SIZE] = [
        0xe8, 0xc7, 0xbd, 0xac, 0x77, 0xf6, 0xbb, 0x1f, 0x3a, 0xba, 0x2e, 0xaa, 0x1f, 0xad, 0xa5,
        0x51, 0xa9, 0xc8, 0xb3, 0xb5, 0xec, 0xd1, 0xef, 0x86, 0xe6, 0xe5, 0x8a, 0x5f, 0x1a, 0xab,
        0x95, 0x2c,
    ];

    /// A `usize` one larger than the longest allowed script, for testing bounds.
    pub const OVERFLOW_SCRIPT_SIZE: usize = script::Code::MAX_SIZE + 1;

    /// A transaction context whose fields are set directly. Every signature hash is
    /// [`TestTransaction::sighash`], regardless of the subscript.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct TestTransaction {
        /// The transaction version.
        pub version: u32,
        /// The transaction lock time.
        pub lock_time: u32,
        /// The position of the input being validated.
        pub input_index: u32,
        /// The sequence number of the input being validated.
        pub sequence: u32,
        /// The output being spent.
        pub previous_output: OutPoint,
        /// What every signature hash returns. `None` fails every signature check.
        pub sighash: Option<[u8; SIGHASH_SIZE]>,
    }

    impl Default for TestTransaction {
        fn default() -> Self {
            TestTransaction {
                version: interpreter::MIN_SEQUENCE_VERSION,
                lock_time: 0,
                input_index: 0,
                sequence: 0,
                previous_output: OutPoint::default(),
                sighash: Some(SIGHASH),
            }
        }
    }

    impl TransactionContext for TestTransaction {
        fn version(&self) -> u32 {
            self.version
        }

        fn lock_time(&self) -> u32 {
            self.lock_time
        }

        fn input_index(&self) -> u32 {
            self.input_index
        }

        fn sequence(&self) -> u32 {
            self.sequence
        }

        fn previous_output(&self) -> &OutPoint {
            &self.previous_output
        }

        fn signature_hash(
            &self,
            _script_code: &Code,
            _hash_type: &HashType,
        ) -> Option<[u8; SIGHASH_SIZE]> {
            self.sighash
        }
    }

    /// The correct sighash for the static test case.
    pub fn sighash(_script_code: &Code, _hash_type: &HashType) -> Option<[u8; SIGHASH_SIZE]> {
        Some(SIGHASH)
    }

    /// An incorrect sighash for the static test case – for checking failure cases.
    pub fn invalid_sighash(
        _script_code: &Code,
        _hash_type: &HashType,
    ) -> Option<[u8; SIGHASH_SIZE]> {
        <[u8; SIGHASH_SIZE]>::from_hex(
            "08c7bdac77f6bb1f3aba2eaa1fada551a9c8b3b5ecd1ef86e6e58a5f1aab952c",
        )
        .ok()
    }

    /// A callback that returns no sighash at all – another failure case.
    pub fn missing_sighash(
        _script_code: &Code,
        _hash_type: &HashType,
    ) -> Option<[u8; SIGHASH_SIZE]> {
        None
    }

    /// Signs [`SIGHASH`] with `key`, producing a strict DER, low-S endorsement with the given hash
    /// type byte.
    pub fn endorse(key: &SecretKey, hash_type: u8) -> Vec<u8> {
        let sig = Secp256k1::signing_only().sign_ecdsa(&Message::from_digest(SIGHASH), key);
        let mut endorsement = sig.serialize_der().to_vec();
        endorsement.push(hash_type);
        endorsement
    }

    /// The minimal push of `data`.
    pub fn push(data: &[u8]) -> Operation {
        Operation::from(pv::push_value(data).expect("fits into a push"))
    }

    /// `<n> <keys...> <keys.len()> CHECKMULTISIG`
    pub fn check_multisig(n: i64, keys: &[&[u8]]) -> Code {
        let count = i64::try_from(keys.len()).expect("few keys");
        let mut code = vec![Operation::from(pv::push_num(n).expect("small"))];
        code.extend(keys.iter().map(|key| push(key)));
        code.push(Operation::from(pv::push_num(count).expect("small")));
        code.push(op::CHECKMULTISIG);
        Code(code)
    }

    /// `HASH160 <hash160(redeem)> EQUAL`
    pub fn pay_to_script_hash(redeem: &Code) -> Code {
        Code(vec![
            op::HASH160,
            push(&crate::external::hash::hash160(&redeem.to_bytes())),
            op::EQUAL,
        ])
    }

    lazy_static::lazy_static! {
        /// Deterministic signing keys.
        pub static ref SECRET_KEYS: [SecretKey; 3] = [
            SecretKey::from_slice(&[0x11; 32]).expect("valid secret key"),
            SecretKey::from_slice(&[0x22; 32]).expect("valid secret key"),
            SecretKey::from_slice(&[0x33; 32]).expect("valid secret key"),
        ];
        /// The compressed public keys of [`SECRET_KEYS`].
        pub static ref PUBLIC_KEYS: [[u8; 33]; 3] = {
            let secp = Secp256k1::signing_only();
            SECRET_KEYS.each_ref().map(|sk| PublicKey::from_secret_key(&secp, sk).serialize())
        };
        /// SIGHASH_ALL endorsements of [`SIGHASH`] by [`SECRET_KEYS`].
        pub static ref ENDORSEMENTS: [Vec<u8>; 3] =
            SECRET_KEYS.each_ref().map(|sk| endorse(sk, HashType::ALL));
        /// The 2-of-3 multisig redeem script used for the static test case.
        pub static ref REDEEM_SCRIPT: Code = check_multisig(
            2,
            &[&PUBLIC_KEYS[0], &PUBLIC_KEYS[1], &PUBLIC_KEYS[2]],
        );
        /// The scriptPubkey used for the static test case.
        pub static ref SCRIPT_PUBKEY: Code = pay_to_script_hash(&REDEEM_SCRIPT);
        /// The scriptSig used for the static test case. Signatures are in key order, as
        /// CHECKMULTISIG requires.
        pub static ref SCRIPT_SIG: Code = Code(vec![
            op::_0,
            push(&ENDORSEMENTS[0]),
            push(&ENDORSEMENTS[2]),
            push(&REDEEM_SCRIPT.to_bytes()),
        ]);
        /// The combined script used for the static test case.
        pub static ref SCRIPT: Script = Script {
            sig: SCRIPT_SIG.clone(),
            pub_key: SCRIPT_PUBKEY.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use proptest::prelude::{prop, prop_assert_eq, proptest, ProptestConfig};

    use super::{
        interpreter::{self, CallbackTransaction, Flags, OutPoint},
        op, opcode, pv,
        script::{self, Code, ComponentType},
        test_vectors::test_vectors,
        testing::{
            invalid_sighash, missing_sighash, push, sighash, TestTransaction, ENDORSEMENTS,
            OVERFLOW_SCRIPT_SIZE, PUBLIC_KEYS, REDEEM_SCRIPT, SCRIPT, SCRIPT_PUBKEY,
        },
        Operation, Script,
    };

    fn callback_transaction<'a>(
        sighash: interpreter::SighashCalculator<'a>,
    ) -> CallbackTransaction<'a> {
        CallbackTransaction {
            sighash,
            version: 2,
            lock_time: 2410374,
            input_index: 0,
            sequence: 0,
            previous_output: OutPoint::default(),
        }
    }

    #[test]
    fn it_works() {
        let flags = Flags::P2SH | Flags::CHECKLOCKTIMEVERIFY;
        let ret = SCRIPT.eval(flags, &callback_transaction(&sighash));
        assert_eq!(ret, Ok(true));
    }

    #[test]
    fn it_works_with_every_flag() {
        let ret = SCRIPT.eval(Flags::all(), &callback_transaction(&sighash));
        assert_eq!(ret, Ok(true));
    }

    #[test]
    fn it_fails_on_invalid_sighash() {
        let flags = Flags::P2SH | Flags::CHECKLOCKTIMEVERIFY;
        let ret = SCRIPT.eval(flags, &callback_transaction(&invalid_sighash));
        assert_eq!(ret, Ok(false));
    }

    #[test]
    fn it_fails_on_missing_sighash() {
        let flags = Flags::P2SH | Flags::CHECKLOCKTIMEVERIFY;
        let ret = SCRIPT.eval(flags, &callback_transaction(&missing_sighash));
        assert_eq!(ret, Ok(false));
    }

    #[test]
    fn p2sh_is_only_a_hash_check_without_the_flag() {
        // The redeem script is never run, so even a missing sighash succeeds.
        let ret = SCRIPT.eval(Flags::empty(), &callback_transaction(&missing_sighash));
        assert_eq!(ret, Ok(true));
    }

    #[test]
    fn survives_serialization() {
        let parsed = Script::parse(&SCRIPT.sig.to_bytes(), &SCRIPT.pub_key.to_bytes());
        assert_eq!(parsed.as_ref(), Ok(&*SCRIPT));
    }

    #[test]
    fn multisig_signatures_must_be_in_key_order() {
        let tx = TestTransaction::default();
        let in_order = Script {
            sig: Code(vec![op::_0, push(&ENDORSEMENTS[0]), push(&ENDORSEMENTS[1])]),
            pub_key: REDEEM_SCRIPT.clone(),
        };
        assert_eq!(in_order.eval(Flags::empty(), &tx), Ok(true));

        let reversed = Script {
            sig: Code(vec![op::_0, push(&ENDORSEMENTS[1]), push(&ENDORSEMENTS[0])]),
            pub_key: REDEEM_SCRIPT.clone(),
        };
        assert_eq!(reversed.eval(Flags::empty(), &tx), Ok(false));
    }

    #[test]
    fn multisig_dummy() {
        let tx = TestTransaction::default();
        let script = Script {
            sig: Code(vec![op::_1, push(&ENDORSEMENTS[1]), push(&ENDORSEMENTS[2])]),
            pub_key: REDEEM_SCRIPT.clone(),
        };
        assert_eq!(script.eval(Flags::empty(), &tx), Ok(true));
        assert_eq!(
            script.eval(Flags::NullDummy, &tx),
            Err((
                ComponentType::PubKey,
                script::Error::Interpreter(
                    Some(op::CHECKMULTISIG),
                    interpreter::Error::SigNullDummy
                )
            ))
        );
    }

    #[test]
    fn multisig_counts() {
        let tx = TestTransaction::default();
        let run = |pub_key: Vec<Operation>| {
            Script {
                sig: Code(vec![op::_0]),
                pub_key: Code(pub_key),
            }
            .eval(Flags::empty(), &tx)
        };
        // 0-of-0 trivially succeeds.
        assert_eq!(run(vec![op::_0, op::_0, op::CHECKMULTISIG]), Ok(true));
        assert_eq!(
            run(vec![op::_0, push(&[21]), op::CHECKMULTISIG]),
            Err((
                ComponentType::PubKey,
                script::Error::Interpreter(
                    Some(op::CHECKMULTISIG),
                    interpreter::Error::PubKeyCount(Some(21))
                )
            ))
        );
        assert_eq!(
            run(vec![op::_2, push(&PUBLIC_KEYS[0]), op::_1, op::CHECKMULTISIG]),
            Err((
                ComponentType::PubKey,
                script::Error::Interpreter(
                    Some(op::CHECKMULTISIG),
                    interpreter::Error::SigCount(Some(2))
                )
            ))
        );
    }

    #[test]
    fn multisig_keys_count_as_operations() {
        let tx = TestTransaction::default();
        // 180 NOPs, plus CHECKMULTISIG and its 20 keys, is 201.
        let mut pub_key = vec![op::NOP; 180];
        pub_key.push(op::_0);
        pub_key.extend(vec![op::_0; 20]);
        pub_key.extend([push(&[20]), op::CHECKMULTISIG]);
        let mut script = Script {
            sig: Code(vec![op::_0]),
            pub_key: Code(pub_key),
        };
        assert_eq!(script.eval(Flags::empty(), &tx), Ok(true));

        script.pub_key.0.insert(0, op::NOP);
        assert_eq!(
            script.eval(Flags::empty(), &tx),
            Err((
                ComponentType::PubKey,
                script::Error::Interpreter(Some(op::CHECKMULTISIG), interpreter::Error::OpCount)
            ))
        );
    }

    #[test]
    fn checksig_with_strictness() {
        let tx = TestTransaction::default();
        let checksig = |endorsement: &[u8]| Script {
            sig: Code(vec![pv::push_value(endorsement).expect("fits").into()]),
            pub_key: Code(vec![push(&PUBLIC_KEYS[0]), op::CHECKSIG]),
        };
        assert_eq!(checksig(&ENDORSEMENTS[0]).eval(Flags::StrictDer, &tx), Ok(true));
        assert_eq!(checksig(&ENDORSEMENTS[1]).eval(Flags::StrictDer, &tx), Ok(false));
        assert_eq!(checksig(&[]).eval(Flags::StrictDer, &tx), Ok(false));

        let malformed = checksig(&[0x30, 0x01, 0x01]);
        assert_eq!(malformed.eval(Flags::empty(), &tx), Ok(false));
        assert!(matches!(
            malformed.eval(Flags::StrictDer, &tx),
            Err((
                ComponentType::PubKey,
                script::Error::Interpreter(
                    Some(Operation::Normal(opcode::Normal::OP_CHECKSIG)),
                    interpreter::Error::SignatureEncoding(_)
                )
            ))
        ));
    }

    #[test]
    fn code_separator_splits_the_subscript() {
        let tx = TestTransaction::default();
        let script = Script {
            sig: Code(vec![push(&ENDORSEMENTS[0])]),
            pub_key: Code(vec![
                op::NOP,
                op::CODESEPARATOR,
                push(&PUBLIC_KEYS[0]),
                op::CHECKSIG,
            ]),
        };
        // The fixed sighash doesn’t depend on the subscript, so this only exercises the plumbing.
        assert_eq!(script.eval(Flags::empty(), &tx), Ok(true));
    }

    #[test]
    fn sig_push_only() {
        let tx = TestTransaction::default();
        let script = Script {
            sig: Code(vec![op::_1, op::NOP]),
            pub_key: Code(vec![]),
        };
        assert_eq!(script.eval(Flags::empty(), &tx), Ok(true));
        assert_eq!(
            script.eval(Flags::SigPushOnly, &tx),
            Err((ComponentType::Sig, script::Error::SigPushOnly))
        );

        // P2SH demands it even without the flag.
        let p2sh = Script {
            sig: Code(vec![op::NOP, push(&REDEEM_SCRIPT.to_bytes())]),
            pub_key: SCRIPT_PUBKEY.clone(),
        };
        assert_eq!(
            p2sh.eval(Flags::P2SH, &tx),
            Err((ComponentType::Sig, script::Error::SigPushOnly))
        );
    }

    #[test]
    fn clean_stack() {
        let tx = TestTransaction::default();
        let mut sig = SCRIPT.sig.clone();
        sig.0.insert(0, op::_1);
        let script = Script {
            sig,
            pub_key: SCRIPT.pub_key.clone(),
        };
        assert_eq!(script.eval(Flags::P2SH, &tx), Ok(true));
        assert_eq!(
            script.eval(Flags::P2SH | Flags::CleanStack, &tx),
            Err((ComponentType::Redeem, script::Error::CleanStack))
        );
        // Without P2SH, the flag has no effect.
        assert_eq!(script.eval(Flags::CleanStack, &tx), Ok(true));

        // Leftovers from a script that isn’t P2SH belong to the pubkey.
        let bare = Script {
            sig: Code(vec![op::_1, op::_1]),
            pub_key: Code(vec![op::NOP]),
        };
        assert_eq!(
            bare.eval(Flags::P2SH | Flags::CleanStack, &tx),
            Err((ComponentType::PubKey, script::Error::CleanStack))
        );
    }

    #[test]
    fn redeem_script_failures_are_tagged() {
        let tx = TestTransaction::default();
        let redeem = Code(vec![op::RETURN]);
        let script = Script {
            sig: Code(vec![push(&redeem.to_bytes())]),
            pub_key: super::testing::pay_to_script_hash(&redeem),
        };
        assert_eq!(
            script.eval(Flags::P2SH, &tx),
            Err((
                ComponentType::Redeem,
                script::Error::Interpreter(Some(op::RETURN), interpreter::Error::OpReturn)
            ))
        );
        assert_eq!(script.eval(Flags::empty(), &tx), Ok(true));
    }

    #[test]
    fn lock_time() {
        let cltv = |n: i64| Script {
            sig: Code(vec![]),
            pub_key: Code(vec![
                pv::push_num(n).expect("small").into(),
                op::CHECKLOCKTIMEVERIFY,
            ]),
        };
        let tx = TestTransaction {
            lock_time: 100,
            ..TestTransaction::default()
        };
        let err = |e| -> Result<bool, (ComponentType, script::Error)> {
            Err((
                ComponentType::PubKey,
                script::Error::Interpreter(Some(op::CHECKLOCKTIMEVERIFY), e),
            ))
        };

        // Without the flag, it’s a NOP.
        assert_eq!(cltv(500).eval(Flags::empty(), &tx), Ok(true));

        let flags = Flags::CHECKLOCKTIMEVERIFY;
        assert_eq!(cltv(100).eval(flags, &tx), Ok(true));
        assert_eq!(
            cltv(101).eval(flags, &tx),
            err(interpreter::Error::UnsatisfiedLockTime)
        );
        assert_eq!(
            cltv(-1).eval(flags, &tx),
            err(interpreter::Error::NegativeLockTime)
        );
        assert_eq!(
            cltv(500_000_000).eval(flags, &tx),
            err(interpreter::Error::LockTimeTypeMismatch {
                lock_time: 500_000_000,
                tx_lock_time: 100
            })
        );
        let final_tx = TestTransaction {
            sequence: interpreter::SEQUENCE_FINAL,
            ..tx
        };
        assert_eq!(
            cltv(100).eval(flags, &final_tx),
            err(interpreter::Error::LockTimeInputFinal)
        );
        // Five-byte operands are accepted.
        let far = TestTransaction {
            lock_time: u32::MAX,
            ..tx
        };
        assert_eq!(cltv(0xffff_fffe).eval(flags, &far), Ok(true));
    }

    #[test]
    fn sequence() {
        let csv = |n: i64| Script {
            sig: Code(vec![]),
            pub_key: Code(vec![
                pv::push_num(n).expect("small").into(),
                op::CHECKSEQUENCEVERIFY,
            ]),
        };
        let tx = TestTransaction {
            sequence: 10,
            ..TestTransaction::default()
        };
        let err = |e| -> Result<bool, (ComponentType, script::Error)> {
            Err((
                ComponentType::PubKey,
                script::Error::Interpreter(Some(op::CHECKSEQUENCEVERIFY), e),
            ))
        };
        let flags = Flags::CHECKSEQUENCEVERIFY;

        assert_eq!(csv(20).eval(Flags::empty(), &tx), Ok(true));
        assert_eq!(csv(10).eval(flags, &tx), Ok(true));
        assert_eq!(
            csv(11).eval(flags, &tx),
            err(interpreter::Error::UnsatisfiedSequence)
        );
        assert_eq!(
            csv(-1).eval(flags, &tx),
            err(interpreter::Error::NegativeLockTime)
        );
        // A disabled operand always passes.
        assert_eq!(csv(1 << 31).eval(flags, &tx), Ok(true));
        assert_eq!(
            csv(10).eval(
                flags,
                &TestTransaction {
                    version: 1,
                    ..tx
                }
            ),
            err(interpreter::Error::SequenceTransactionVersion(1))
        );
        assert_eq!(
            csv(10).eval(
                flags,
                &TestTransaction {
                    sequence: 1 << 31,
                    ..tx
                }
            ),
            err(interpreter::Error::SequenceInputDisabled)
        );
        assert_eq!(
            csv(10 | 1 << 22).eval(flags, &tx),
            err(interpreter::Error::SequenceTypeMismatch)
        );
    }

    #[test]
    fn operation_classification() {
        assert!(!op::_1.is_counted());
        assert!(!op::RESERVED.is_counted());
        assert!(op::VER.is_counted());
        assert!(op::NOP.is_counted());
        assert!(op::VERIF.is_conditional());
        assert!(op::ENDIF.is_conditional());
        assert!(!op::VER.is_conditional());
        assert!(op::CODESEPARATOR.is_code_separator());
        assert_eq!(
            op::CAT.check(Flags::empty()),
            Err(opcode::Error::Disabled(0x7e))
        );
        assert_eq!(op::CAT.check(Flags::Splice), Ok(()));
        assert_eq!(
            op::RSHIFT.check(Flags::Splice),
            Err(opcode::Error::Disabled(0x99))
        );
    }

    #[test]
    fn every_byte_parses() {
        for b in 0..=u8::MAX {
            let bytes = [b];
            let (res, _) = Operation::parse(&bytes).expect("non-empty");
            match res {
                Ok(op) => assert_eq!(Vec::from(&op), bytes.to_vec()),
                // Only the pushes need more bytes.
                Err(e) => assert!(
                    matches!(e, opcode::Error::Read { .. }) && (0x01..=0x4e).contains(&b),
                    "0x{b:02x}"
                ),
            }
        }
        assert!(Operation::parse(&[]).is_none());
    }

    #[test]
    fn test_vectors_pass() {
        for tv in test_vectors() {
            tv.assert_passes(&TestTransaction::default());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 2_000, .. ProptestConfig::default()
        })]

        #[test]
        fn arbitrary_scripts_are_deterministic(
            lock_time in prop::num::u32::ANY,
            sequence in prop::num::u32::ANY,
            pub_key in prop::collection::vec(0..=0xffu8, 0..=OVERFLOW_SCRIPT_SIZE),
            sig in prop::collection::vec(0..=0xffu8, 1..=OVERFLOW_SCRIPT_SIZE),
            flag_bits in prop::bits::u32::masked(Flags::all().bits()),
        ) {
            let flags = Flags::from_bits_truncate(flag_bits);
            let tx = TestTransaction {
                lock_time,
                sequence,
                ..TestTransaction::default()
            };
            let first = Script::parse(&sig, &pub_key).and_then(|script| script.eval(flags, &tx));
            let second = Script::parse(&sig, &pub_key).and_then(|script| script.eval(flags, &tx));
            prop_assert_eq!(first, second);
        }

        /// Pushes are all the same to `SigPushOnly`, however they’re encoded.
        #[test]
        fn push_only_sigs_pass_the_push_check(
            sig in prop::collection::vec(prop::collection::vec(0..=0xffu8, 0..=80), 0..=10),
        ) {
            let code = Code(
                sig.iter()
                    .map(|data| Operation::from(pv::push_value(data).expect("small")))
                    .collect(),
            );
            let res = Script {
                sig: code,
                pub_key: Code(vec![op::_1]),
            }
            .eval(Flags::SigPushOnly, &TestTransaction::default());
            prop_assert_eq!(res, Ok(true));
        }
    }
}
