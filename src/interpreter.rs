//! Execution of opcodes

use alloc::{sync::Arc, vec::Vec};
use core::num::TryFromIntError;
use core::slice::Iter;

use thiserror::Error;

use crate::{
    external::pubkey::PubKey,
    num::{self, Number},
    opcode::PushValue,
    script, signature, Operation,
};

/// Any error that can happen during interpretation of a single opcode.
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("OP_RETURN encountered")]
    OpReturn,

    /// __NB__: This doesn’t take an “actual count” argument, because `OpCount` depends on
    ///         conditional execution and thus can only be checked incrementally.
    #[error("operation count exceeded maximum of {}", MAX_OP_COUNT)]
    OpCount,

    #[error("stack depth exceeded maximum of {} entries", MAX_STACK_DEPTH)]
    StackSize(Option<TryFromIntError>),

    #[error("signature count wasn’t in the range 0..=<public key count>")]
    SigCount(Option<i64>),

    #[error("public key count wasn’t in the range 0..={}", MAX_PUBKEY_COUNT)]
    PubKeyCount(Option<i64>),

    // Failed verify operations
    #[error("verify operation failed")]
    Verify,

    // Logical/Format/Canonical errors
    #[error("bad opcode encountered")]
    BadOpcode,

    /// A splice or bitwise opcode was executed while [`Flags::Splice`] reserves it.
    #[error("opcode is reserved but not implemented")]
    NotImplemented,

    #[error("{}", .0.map_or("invalid stack operation encountered".into(), |(elem, max)| format!("tried to retrieve element {elem} from a stack with {max} elements")))]
    InvalidStackOperation(Option<(usize, usize)>),

    #[error("invalid altstack operation encountered")]
    InvalidAltstackOperation,

    #[error("stack index {index} is outside a stack of {len} elements")]
    InvalidStackIndex { index: i32, len: usize },

    #[error("unbalanced conditional encountered")]
    UnbalancedConditional,

    // OP_CHECKLOCKTIMEVERIFY & OP_CHECKSEQUENCEVERIFY
    #[error("negative lock time encountered")]
    NegativeLockTime,

    #[error("the input is final, so its lock time isn’t enforced")]
    LockTimeInputFinal,

    #[error("lock time {lock_time} and transaction lock time {tx_lock_time} measure different things")]
    LockTimeTypeMismatch { lock_time: i64, tx_lock_time: u32 },

    #[error("unsatisfied locktime condition")]
    UnsatisfiedLockTime,

    #[error("transaction version {0} doesn’t support relative lock times")]
    SequenceTransactionVersion(u32),

    #[error("the input sequence has relative lock times disabled")]
    SequenceInputDisabled,

    #[error("relative lock time and input sequence measure different things")]
    SequenceTypeMismatch,

    #[error("unsatisfied relative locktime condition")]
    UnsatisfiedSequence,

    #[error("signature encoding error: {0}")]
    SignatureEncoding(signature::Error),

    #[error("signature null dummy error")]
    SigNullDummy,

    // softfork safeness
    #[error("discouraged upgradable NOP encountered")]
    DiscourageUpgradableNOPs,

    #[error("script number error: {0}")]
    Num(num::Error),
}

impl From<num::Error> for Error {
    fn from(value: num::Error) -> Self {
        Error::Num(value)
    }
}

impl From<signature::Error> for Error {
    fn from(value: signature::Error) -> Self {
        Error::SignatureEncoding(value)
    }
}

/// Threshold for lock_time: below this value it is interpreted as block number,
/// otherwise as UNIX timestamp.
pub const LOCKTIME_THRESHOLD: i64 = 500_000_000; // Tue Nov  5 00:53:20 1985 UTC

/// An input with this sequence number opts out of lock time enforcement.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// If this bit is set, the sequence number isn’t interpreted as a relative lock time.
pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;

/// If this bit is set, the relative lock time counts units of 512 seconds, otherwise blocks.
pub const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;

/// The bits of a sequence number that hold the relative lock time.
pub const SEQUENCE_LOCKTIME_MASK: u32 = 0x0000_ffff;

/// Relative lock times only apply to transactions at or above this version.
pub const MIN_SEQUENCE_VERSION: u32 = 2;

/// The maximum number of operations allowed in a script component.
pub const MAX_OP_COUNT: u8 = 201;

/// The maximum number of pubkeys (and signatures, by implication) allowed in CHECKMULTISIG.
pub const MAX_PUBKEY_COUNT: u8 = 20;

/// The maximum number of elements allowed in the _combined_ stack and altstack.
pub const MAX_STACK_DEPTH: usize = 1000;

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    /// Script verification flags. Each one is a consensus rule change, supplied by the caller
    /// according to where the spend sits in chain history.
    pub struct Flags: u32 {
        /// Evaluate P2SH subscripts (softfork safe,
        /// [BIP16](https://github.com/bitcoin/bips/blob/master/bip-0016.mediawiki)).
        const P2SH = 1 << 0;

        /// Passing a non-strict-DER signature to a checksig operation causes script failure,
        /// rather than a failed verification
        /// ([BIP66](https://github.com/bitcoin/bips/blob/master/bip-0066.mediawiki)).
        const StrictDer = 1 << 1;

        /// Passing a signature with S > order/2 to a checksig operation causes script failure
        /// (softfork safe, [BIP62](https://github.com/bitcoin/bips/blob/master/bip-0062.mediawiki) rule 5).
        const LowS = 1 << 3;

        /// Verify dummy stack item consumed by CHECKMULTISIG is of zero-length
        /// ([BIP147](https://github.com/bitcoin/bips/blob/master/bip-0147.mediawiki)).
        const NullDummy = 1 << 4;

        /// Using a non-push operator in the scriptSig causes script failure (softfork safe,
        /// [BIP62](https://github.com/bitcoin/bips/blob/master/bip-0062.mediawiki) rule 2).
        const SigPushOnly = 1 << 5;

        /// Discourage use of NOPs reserved for upgrades (NOP1-10)
        ///
        /// Provided so that nodes can avoid accepting or mining transactions
        /// containing executed NOP's whose meaning may change after a soft-fork,
        /// thus rendering the script invalid; with this flag set executing
        /// discouraged NOPs fails the script. NOPs that are not executed, e.g.
        /// within an unexecuted IF ENDIF block, are *not* rejected.
        const DiscourageUpgradableNOPs = 1 << 7;

        /// Require that only a single stack element remains after evaluation. This changes the
        /// success criterion from "At least one stack element must remain, and when interpreted
        /// as a boolean, it must be true" to "Exactly one stack element must remain, and when
        /// interpreted as a boolean, it must be true".
        /// Note: CLEANSTACK has no effect without P2SH.
        const CleanStack = 1 << 8;

        /// Verify CHECKLOCKTIMEVERIFY
        ///
        /// See [BIP65](https://github.com/bitcoin/bips/blob/master/bip-0065.mediawiki) for details.
        const CHECKLOCKTIMEVERIFY = 1 << 9;

        /// Verify CHECKSEQUENCEVERIFY
        ///
        /// See [BIP112](https://github.com/bitcoin/bips/blob/master/bip-0112.mediawiki) for details.
        const CHECKSEQUENCEVERIFY = 1 << 10;

        /// Reserve the splice and bitwise opcodes (CAT, SUBSTR, AND, OR, XOR) instead of treating
        /// them as disabled. Reserved opcodes only fail when executed.
        const Splice = 1 << 11;
    }
}

/// All signature hashes are 32 bytes.
pub const SIGHASH_SIZE: usize = 32;

/// A function which is called to obtain the sighash.
///    - script_code: the subscript being validated. Note that this not always
///      matches script_sig, i.e. for P2SH.
///    - hash_type: the hash type being used.
///
/// Returning `None` indicates _some_ failure to produce the desired hash, which fails the
/// signature check.
pub type SighashCalculator<'a> =
    &'a dyn Fn(&script::Code, &signature::HashType) -> Option<[u8; SIGHASH_SIZE]>;

/// Identifies the output an input spends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct OutPoint {
    /// The hash of the transaction holding the output.
    pub hash: [u8; 32],
    /// The index of the output within that transaction.
    pub index: u32,
}

/// Read-only access to the transaction, and the one input of it, being validated.
pub trait TransactionContext {
    /// The transaction version.
    fn version(&self) -> u32;

    /// The transaction lock time.
    fn lock_time(&self) -> u32;

    /// The position of the input being validated.
    fn input_index(&self) -> u32;

    /// The sequence number of the input being validated.
    fn sequence(&self) -> u32;

    /// The output the input being validated spends.
    fn previous_output(&self) -> &OutPoint;

    /// The digest an endorsement signs, given the subscript and hash type.
    fn signature_hash(
        &self,
        script_code: &script::Code,
        hash_type: &signature::HashType,
    ) -> Option<[u8; SIGHASH_SIZE]>;
}

/// A transaction context that uses a callback to get the sighash.
#[derive(Copy, Clone)]
pub struct CallbackTransaction<'a> {
    /// The callback to be used to calculate the sighash.
    pub sighash: SighashCalculator<'a>,
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
}

impl TransactionContext for CallbackTransaction<'_> {
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
        script_code: &script::Code,
        hash_type: &signature::HashType,
    ) -> Option<[u8; SIGHASH_SIZE]> {
        (self.sighash)(script_code, hash_type)
    }
}

/// A stack entry. Entries are never modified in place, so one buffer may back several slots.
pub type Element = Arc<[u8]>;

/// Treat a stack entry as a generalized boolean. Anything other than 0 and -0 (minimal encoding not
/// required) is treated as `true`.
pub fn cast_to_bool(vch: &[u8]) -> bool {
    match vch.split_last() {
        None => false,
        Some((last, init)) => init.iter().any(|b| *b != 0) || (last & 0x7f) != 0,
    }
}

/// Script is a stack machine (like Forth) that evaluates a predicate returning a bool indicating
/// valid or not.  There are no loops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stack<T>(Vec<T>);

/// Wraps a Vec in a way that provides indexing from the top and some decent chaining.
impl<T> Stack<T> {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Stack(vec![])
    }

    /// Fail if the Stack doesn’t contain at least `min` elements.
    pub(crate) fn check_len(&self, min: usize) -> Result<(), Error> {
        let len = self.0.len();
        if min <= len {
            Ok(())
        } else {
            Err(Error::InvalidStackOperation(Some((min - 1, len))))
        }
    }

    fn rindex(&self, i: usize) -> Result<usize, Error> {
        let len = self.0.len();
        if i < len {
            Ok(len - i - 1)
        } else {
            Err(Error::InvalidStackOperation(Some((i, len))))
        }
    }

    /// Gets an element from the stack without removing it, counting from the right. I.e.,
    /// `rget(0)` returns the top element.
    pub(crate) fn rget(&self, i: usize) -> Result<&T, Error> {
        let idx = self.rindex(i)?;
        self.0.get(idx).ok_or(Error::InvalidStackOperation(None))
    }

    /// Removes and returns the top element from the stack.
    pub(crate) fn pop(&mut self) -> Result<T, Error> {
        self.0
            .pop()
            .ok_or(Error::InvalidStackOperation(Some((0, self.0.len()))))
    }

    /// Adds a new element to the top of the stack.
    pub fn push(&mut self, value: T) {
        self.0.push(value)
    }

    /// Returns the number of elements in the stack.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the stack has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the stack, bottom first.
    pub fn iter(&self) -> Iter<'_, T> {
        self.0.iter()
    }

    /// Returns a mutable reference to the last element of the stack.
    pub(crate) fn last_mut(&mut self) -> Result<&mut T, Error> {
        let len = self.0.len();
        self.0
            .last_mut()
            .ok_or(Error::InvalidStackOperation(Some((0, len))))
    }

    /// Returns a reference to the last element of the stack.
    pub fn last(&self) -> Result<&T, Error> {
        self.0
            .last()
            .ok_or(Error::InvalidStackOperation(Some((0, self.0.len()))))
    }

    /// Removes an element from the stack, counting from the right.
    pub(crate) fn rremove(&mut self, start: usize) -> Result<T, Error> {
        self.rindex(start).map(|rstart| self.0.remove(rstart))
    }

    /// Inserts an element at the given index, counting from the right.
    pub(crate) fn rinsert(&mut self, i: usize, element: T) -> Result<(), Error> {
        let ri = self.rindex(i)?;
        self.0.insert(ri, element);
        Ok(())
    }

    /// Exchanges two elements, both counting from the right.
    pub(crate) fn rswap(&mut self, i: usize, j: usize) -> Result<(), Error> {
        let ri = self.rindex(i)?;
        let rj = self.rindex(j)?;
        self.0.swap(ri, rj);
        Ok(())
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for Stack<T> {
    fn from(value: Vec<T>) -> Self {
        Stack(value)
    }
}

impl<T: Clone> Stack<T> {
    /// Returns the last element of the stack as well as the remainder of the stack.
    pub(crate) fn split_last(&self) -> Result<(&T, Stack<T>), Error> {
        self.0
            .split_last()
            .ok_or(Error::InvalidStackOperation(Some((0, self.0.len()))))
            .map(|(last, rem)| (last, Stack(rem.to_vec())))
    }

    /// Copies the element at `i` (from the right) onto the top of the stack.
    pub(crate) fn repush(&mut self, i: usize) -> Result<(), Error> {
        self.rget(i).cloned().map(|v| self.push(v))
    }

    /// Moves the element at `i` (from the right) onto the top of the stack.
    pub(crate) fn move_to_top(&mut self, i: usize) -> Result<(), Error> {
        self.rremove(i).map(|v| self.push(v))
    }
}

/// The state of one open `IF`/`NOTIF` scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// The current branch executes.
    Taken,
    /// The current branch is skipped, but its sibling would execute.
    NotTaken,
    /// The scope was opened inside a skipped branch, so neither branch executes.
    Suppressed,
}

impl Condition {
    /// The state after an `ELSE`.
    fn flip(self) -> Self {
        match self {
            Self::Taken => Self::NotTaken,
            Self::NotTaken => Self::Taken,
            Self::Suppressed => Self::Suppressed,
        }
    }
}

/// The execution context of a single script run.
///
/// It is created per (script, transaction, input) validation, mutated only while that script is
/// evaluated, and holds nothing across runs.
///
/// **NB**: This intentionally doesn’t provide a `Clone` impl, to prevent reuse of old state.
pub struct Program<'a> {
    script: &'a script::Code,
    transaction: &'a dyn TransactionContext,
    flags: Flags,
    /// The primary evaluation stack.
    primary: Stack<Element>,
    /// A secondary stack that elements can be moved to temporarily.
    alternate: Stack<Element>,
    /// One entry per open conditional. Empty at top level.
    condition: Stack<Condition>,
    /// We keep track of how many operations have executed so far to prevent expensive-to-verify
    /// scripts
    op_count: u8,
    /// The position in `script` where the signed subscript starts.
    jump: usize,
}

impl<'a> Program<'a> {
    /// Creates a context with an empty stack.
    pub fn new(
        script: &'a script::Code,
        transaction: &'a dyn TransactionContext,
        flags: Flags,
    ) -> Self {
        Self::with_stack(script, transaction, flags, Stack::new())
    }

    /// Creates a context whose primary stack is the result of an earlier run. Everything else
    /// starts out empty.
    pub fn with_stack(
        script: &'a script::Code,
        transaction: &'a dyn TransactionContext,
        flags: Flags,
        primary: Stack<Element>,
    ) -> Self {
        Program {
            script,
            transaction,
            flags,
            primary,
            alternate: Stack::new(),
            condition: Stack::new(),
            op_count: 0,
            jump: 0,
        }
    }

    /// Hands back the primary stack once evaluation is over.
    pub fn into_stack(self) -> Stack<Element> {
        self.primary
    }

    // Primary stack.

    /// Adds an element to the top of the primary stack.
    pub fn push(&mut self, value: Element) {
        self.primary.push(value)
    }

    /// Pushes the canonical encoding of a boolean.
    pub fn push_bool(&mut self, value: bool) {
        static VCH_FALSE: [u8; 0] = [];
        static VCH_TRUE: [u8; 1] = [1];
        self.push(Element::from(if value { &VCH_TRUE[..] } else { &VCH_FALSE[..] }))
    }

    /// Pushes the minimal encoding of a number.
    pub fn push_number(&mut self, value: Number) {
        self.push(Element::from(value.to_bytes()))
    }

    /// Removes and returns the top element.
    pub fn pop(&mut self) -> Result<Element, Error> {
        self.primary.pop()
    }

    /// Reads the element `n` places below the top without removing it.
    pub fn item(&self, n: usize) -> Result<&Element, Error> {
        self.primary.rget(n)
    }

    /// Removes the element `n` places below the top.
    pub fn erase(&mut self, n: usize) -> Result<Element, Error> {
        self.primary.rremove(n)
    }

    /// Exchanges the elements `i` and `j` places below the top.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<(), Error> {
        self.primary.rswap(i, j)
    }

    /// Discards the top element.
    pub fn drop(&mut self) -> Result<(), Error> {
        self.primary.pop().map(|_| ())
    }

    /// Copies the element `n` places below the top onto the top.
    pub fn duplicate(&mut self, n: usize) -> Result<(), Error> {
        self.primary.repush(n)
    }

    /// Moves the element `n` places below the top onto the top.
    pub fn roll(&mut self, n: usize) -> Result<(), Error> {
        self.primary.move_to_top(n)
    }

    /// Inserts an element `n` places below the top.
    pub fn insert(&mut self, n: usize, value: Element) -> Result<(), Error> {
        self.primary.rinsert(n, value)
    }

    /// The number of elements on the primary stack.
    pub fn size(&self) -> usize {
        self.primary.len()
    }

    /// Whether the primary stack is empty.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// Fails unless the primary stack holds at least `min` elements.
    pub fn check_size(&self, min: usize) -> Result<(), Error> {
        self.primary.check_len(min)
    }

    /// Whether the top element is true. An empty stack is false.
    pub fn is_stack_true(&self) -> bool {
        self.primary.last().is_ok_and(|v| cast_to_bool(v))
    }

    // Alternate stack.

    /// Moves an element onto the alternate stack.
    pub fn push_alternate(&mut self, value: Element) {
        self.alternate.push(value)
    }

    /// Removes and returns the top of the alternate stack.
    pub fn pop_alternate(&mut self) -> Result<Element, Error> {
        self.alternate
            .pop()
            .map_err(|_| Error::InvalidAltstackOperation)
    }

    /// The number of elements on the alternate stack.
    pub fn alternate_size(&self) -> usize {
        self.alternate.len()
    }

    // Numeric access.

    /// Reads the element `n` places below the top as a number of at most `max_size` bytes.
    pub fn peek_number(&self, n: usize, max_size: usize) -> Result<Number, Error> {
        self.item(n)
            .and_then(|v| Number::from_bytes(v, max_size).map_err(Error::Num))
    }

    /// Pops the top element as a number of at most `max_size` bytes.
    pub fn pop_number(&mut self, max_size: usize) -> Result<Number, Error> {
        let number = self.peek_number(0, max_size)?;
        self.drop()?;
        Ok(number)
    }

    /// Pops two numbers, returning them in the order they were pushed.
    pub fn pop_binary(&mut self) -> Result<(Number, Number), Error> {
        self.check_size(2)?;
        let x1 = self.peek_number(1, Number::DEFAULT_MAX_SIZE)?;
        let x2 = self.peek_number(0, Number::DEFAULT_MAX_SIZE)?;
        self.drop()?;
        self.drop()?;
        Ok((x1, x2))
    }

    /// Pops three numbers, returning them in the order they were pushed.
    pub fn pop_ternary(&mut self) -> Result<(Number, Number, Number), Error> {
        self.check_size(3)?;
        let x1 = self.peek_number(2, Number::DEFAULT_MAX_SIZE)?;
        let x2 = self.peek_number(1, Number::DEFAULT_MAX_SIZE)?;
        let x3 = self.peek_number(0, Number::DEFAULT_MAX_SIZE)?;
        self.drop()?;
        self.drop()?;
        self.drop()?;
        Ok((x1, x2, x3))
    }

    /// Pops a number and checks that it indexes an element of the remaining stack, as PICK and
    /// ROLL require.
    pub fn pop_index(&mut self) -> Result<usize, Error> {
        self.check_size(2)?;
        let index = self.pop_number(Number::DEFAULT_MAX_SIZE)?.to_i32();
        let len = self.size();
        usize::try_from(index)
            .ok()
            .filter(|i| *i < len)
            .ok_or(Error::InvalidStackIndex { index, len })
    }

    // Conditional stack.

    /// Opens a conditional scope. `taken` is ignored if the enclosing branch isn’t executing.
    pub fn open(&mut self, taken: bool) {
        self.condition.push(if !self.is_succeess() {
            Condition::Suppressed
        } else if taken {
            Condition::Taken
        } else {
            Condition::NotTaken
        })
    }

    /// Switches the innermost scope to its other branch.
    pub fn reopen(&mut self) -> Result<(), Error> {
        self.condition
            .last_mut()
            .map_err(|_| Error::UnbalancedConditional)
            .map(|last| *last = last.flip())
    }

    /// Closes the innermost scope.
    pub fn close(&mut self) -> Result<(), Error> {
        self.condition
            .pop()
            .map(|_| ())
            .map_err(|_| Error::UnbalancedConditional)
    }

    /// Are we in an executing branch of the script?
    pub fn is_succeess(&self) -> bool {
        self.condition
            .last()
            .map_or(true, |c| *c == Condition::Taken)
    }

    /// Whether every conditional scope has been closed.
    pub fn is_closed(&self) -> bool {
        self.condition.is_empty()
    }

    /// The number of open conditional scopes.
    pub fn open_scopes(&self) -> usize {
        self.condition.len()
    }

    // Limits.

    /// Counts `op` toward [`MAX_OP_COUNT`], if it is counted at all.
    pub fn ops_increment(&mut self, op: &Operation) -> Result<(), Error> {
        if op.is_counted() {
            self.increment_op_count(1)
        } else {
            Ok(())
        }
    }

    /// Bumps the current `op_count` and errors if it exceeds `MAX_OP_COUNT`.
    pub(crate) fn increment_op_count(&mut self, by: u8) -> Result<(), Error> {
        self.op_count = self.op_count.saturating_add(by);
        if self.op_count <= MAX_OP_COUNT {
            Ok(())
        } else {
            Err(Error::OpCount)
        }
    }

    /// Whether the two stacks together hold more than [`MAX_STACK_DEPTH`] elements.
    pub fn is_stack_overflow(&self) -> bool {
        self.size() + self.alternate_size() > MAX_STACK_DEPTH
    }

    // Signatures.

    /// Marks the operation at `position` as the latest code separator. Later signature checks
    /// only sign the operations after it.
    pub fn set_subscript(&mut self, position: usize) -> bool {
        if position < self.script.0.len() {
            self.jump = position + 1;
            true
        } else {
            false
        }
    }

    /// The operations an endorsement signs: everything after the last code separator, less any
    /// code separators and any pushes of the endorsements themselves.
    pub fn subscript(&self, endorsements: &[Element]) -> script::Code {
        // An endorsement only matches a push encoded the way a data literal is serialized.
        let literals: Vec<Operation> = endorsements
            .iter()
            .filter_map(|e| PushValue::literal(e))
            .map(Operation::from)
            .collect();
        script::Code(
            self.script.0[self.jump..]
                .iter()
                .filter(|op| !op.is_code_separator() && !literals.contains(op))
                .cloned()
                .collect(),
        )
    }

    /// Parses an endorsement and computes the digest it should sign.
    ///
    /// - `Err` aborts the script (only possible when a strictness flag is set),
    /// - `Ok(None)` means the signature check fails without aborting,
    /// - `Ok(Some(_))` is ready for verification.
    pub fn prepare(
        &self,
        endorsement: &[u8],
        subscript: &script::Code,
    ) -> Result<Option<(signature::Decoded, [u8; SIGHASH_SIZE])>, Error> {
        match signature::Decoded::from_bytes(
            endorsement,
            self.is_enabled(Flags::LowS),
            self.is_enabled(Flags::StrictDer),
        ) {
            signature::Validity::InvalidAbort(e) => Err(Error::from(e)),
            signature::Validity::InvalidContinue => Ok(None),
            signature::Validity::Valid(sig) => Ok(self
                .transaction
                .signature_hash(subscript, sig.sighash_type())
                .map(|hash| (sig, hash))),
        }
    }

    /// Checks an endorsement against a public key.
    pub fn check_signature(
        &self,
        endorsement: &[u8],
        key: &[u8],
        subscript: &script::Code,
    ) -> Result<bool, Error> {
        Ok(self
            .prepare(endorsement, subscript)?
            .is_some_and(|(sig, hash)| PubKey(key).verify(&hash, sig.sig())))
    }

    // Context.

    /// Is the given rule in force for this run?
    pub fn is_enabled(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    /// The flags for this run.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Whether the input being validated opted out of lock times.
    pub fn is_final(&self) -> bool {
        self.sequence() == SEQUENCE_FINAL
    }

    /// The sequence number of the input being validated.
    pub fn sequence(&self) -> u32 {
        self.transaction.sequence()
    }

    /// The transaction being validated.
    pub fn transaction(&self) -> &dyn TransactionContext {
        self.transaction
    }
}
