//! Signature handling.
//!
//! This is in a separate module so we can minimize the code that has access to the internals,
//! making it easier to ensure that we check the encoding correctly.

use alloc::vec::Vec;

use secp256k1::ecdsa;
use thiserror::Error;

use crate::external::pubkey::PubKey;

/// Any error that can happen during signature decoding.
#[allow(missing_docs)]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
pub enum InvalidDerInteger {
    #[error("missing the 0x02 integer encoding byte")]
    NotAnInteger,
    #[error("the integer was expected to be {expected} bytes, but it was {actual} bytes")]
    IncorrectLength { actual: usize, expected: u8 },
    #[error("integers can’t be zero-length")]
    ZeroLength,
    #[error("leading 0x00 bytes are disallowed, unless it would otherwise be interpreted as a negative number.")]
    LeadingNullByte,
    #[error("integers can’t be negative")]
    Negative,
}

/// Errors that occur during decoding of a DER signature.
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum InvalidDerEncoding {
    #[error("didn’t start with 0x30, or was missing the length")]
    WrongType,
    #[error("the signature can’t be longer than 70 bytes")]
    TooLong,
    #[error("the signature was expected to be {expected} bytes, but it was {actual} bytes")]
    IncorrectLength { actual: usize, expected: u8 },
    #[error(
        "the {name} component {}failed: {error}",
        .value.as_ref().map_or("".into(), |vec| format!("({vec:?}) "))
    )]
    InvalidComponent {
        name: &'static str,
        value: Option<Vec<u8>>,
        error: InvalidDerInteger,
    },
}

/// Errors that occur when parsing signatures. These only abort a script when a strictness flag
/// asks for them.
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Error {
    // BIP66
    #[error("signature DER encoding error: {0}")]
    SigDER(InvalidDerEncoding),

    // BIP62
    #[error("signature s value is too high")]
    SigHighS,
}

/// The ways in which an input may commit to the outputs of its transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignedOutputs {
    /// The input signature commits to all outputs in the transaction.
    All,
    /// The input signature commits to the output at the same index as the input.
    Single,
    /// The input signature does not commit to any outputs.
    None,
}

/// The trailing byte of an endorsement, saying what the signature commits to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HashType {
    raw: u8,
    signed_outputs: SignedOutputs,
    anyone_can_pay: bool,
}

impl HashType {
    /// Commit to every input and output.
    pub const ALL: u8 = 0x01;
    /// Commit to no outputs.
    pub const NONE: u8 = 0x02;
    /// Commit to the output with the same index.
    pub const SINGLE: u8 = 0x03;
    /// Only commit to this input.
    pub const ANYONE_CAN_PAY: u8 = 0x80;

    /// Interprets a hash type byte. Any value for the lower five bits other than 2 & 3 is treated
    /// as [`SignedOutputs::All`], and every byte is accepted.
    pub fn from_byte(raw: u8) -> Self {
        HashType {
            raw,
            signed_outputs: match raw & 0x1f {
                Self::NONE => SignedOutputs::None,
                Self::SINGLE => SignedOutputs::Single,
                _ => SignedOutputs::All,
            },
            anyone_can_pay: raw & Self::ANYONE_CAN_PAY != 0,
        }
    }

    /// The byte as it appeared in the endorsement. Signature hashes commit to all of it.
    pub fn raw(&self) -> u8 {
        self.raw
    }

    /// See [SignedOutputs].
    pub fn signed_outputs(&self) -> SignedOutputs {
        self.signed_outputs
    }

    /// Allows anyone to add inputs to this transaction.
    pub fn anyone_can_pay(&self) -> bool {
        self.anyone_can_pay
    }
}

/// Different signature encoding failures may result in either aborting execution or continuing
/// execution with an invalid signature.
#[derive(Clone, Debug)]
pub enum Validity {
    /// Fail execution with the given error.
    InvalidAbort(Error),
    /// Continue execution, without a valid signature.
    InvalidContinue,
    /// Continue execution with a valid signature.
    Valid(Decoded),
}

/// This contains a parsed ECDSA signature and its hash type. It’s an opaque value, so we can
/// ensure all values are valid (e.g., signature is “low-S” if required).
#[derive(Clone, Debug)]
pub struct Decoded {
    sig: ecdsa::Signature,
    hash_type: HashType,
}

impl Decoded {
    /// Checks the properties of individual integers in a DER signature.
    fn is_valid_integer(int_bytes: &[u8]) -> Result<(), InvalidDerInteger> {
        match int_bytes {
            [] => Err(InvalidDerInteger::ZeroLength),
            // Null bytes at the start are not allowed, unless it would otherwise be interpreted as
            // a negative number.
            [0x00, next, ..] if next & 0x80 == 0 => Err(InvalidDerInteger::LeadingNullByte),
            [0x00, ..] => Ok(()),
            // Negative numbers are not allowed.
            [first, ..] if first & 0x80 != 0 => Err(InvalidDerInteger::Negative),
            [..] => Ok(()),
        }
    }

    /// Splits one `0x02 <len> <bytes>` integer off the front of `input`.
    fn split_integer<'a>(
        name: &'static str,
        input: &'a [u8],
    ) -> Result<(&'a [u8], &'a [u8]), InvalidDerEncoding> {
        let component = |error| InvalidDerEncoding::InvalidComponent {
            name,
            value: None,
            error,
        };
        match input {
            [0x02, len, rest @ ..] => {
                if usize::from(*len) <= rest.len() {
                    Ok(rest.split_at(usize::from(*len)))
                } else {
                    Err(component(InvalidDerInteger::IncorrectLength {
                        actual: rest.len(),
                        expected: *len,
                    }))
                }
            }
            _ => Err(component(InvalidDerInteger::NotAnInteger)),
        }
    }

    /// A canonical signature consists of: <30> <total len> <02> <len R> <R> <02> <len S> <S>
    ///
    /// Where R and S are not negative (their first byte has its highest bit not set), and not
    /// excessively padded (do not start with a 0 byte, unless an otherwise negative number follows,
    /// in which case a single 0 byte is necessary and even required).
    ///
    /// This function is consensus-critical since BIP66.
    ///
    /// __NB__: This doesn’t rely on [ecdsa::Signature::from_der] because it is consensus critical,
    ///         so we need to ensure that these exact checks happen.
    fn is_valid_encoding(sig: &[u8]) -> Result<(), InvalidDerEncoding> {
        let (total_len, content) = match sig {
            // A signature is of type 0x30 (compound).
            [0x30, total_len, content @ ..] => (*total_len, content),
            _ => return Err(InvalidDerEncoding::WrongType),
        };

        // Maximum size constraint.
        if total_len > 70 {
            return Err(InvalidDerEncoding::TooLong);
        }

        // Make sure the length covers the entire signature.
        if usize::from(total_len) != content.len() {
            return Err(InvalidDerEncoding::IncorrectLength {
                actual: content.len(),
                expected: total_len,
            });
        }

        let (r, rest) = Self::split_integer("r", content)?;
        let (s, rest) = Self::split_integer("s", rest)?;

        // Make sure the S element ends the signature.
        if !rest.is_empty() {
            return Err(InvalidDerEncoding::InvalidComponent {
                name: "s",
                value: Some(s.to_vec()),
                error: InvalidDerInteger::IncorrectLength {
                    actual: s.len() + rest.len(),
                    expected: u8::try_from(s.len()).unwrap_or(u8::MAX),
                },
            });
        }

        for (name, int) in [("r", r), ("s", s)] {
            Self::is_valid_integer(int).map_err(|error| InvalidDerEncoding::InvalidComponent {
                name,
                value: Some(int.to_vec()),
                error,
            })?;
        }

        Ok(())
    }

    /// This decodes an ECDSA signature and hash type from an endorsement.
    ///
    /// With `is_strict` (or `require_low_s`, which implies it), the encoding must be strict DER and
    /// a violation aborts. Otherwise the signature is parsed leniently and a failure only makes
    /// the check fail.
    ///
    /// __NB__: An empty signature is not strictly DER encoded, but will result in
    ///         `InvalidContinue` as a compact way to provide an invalid signature for use with
    ///         CHECK(MULTI)SIG.
    pub fn from_bytes(vch_sig_in: &[u8], require_low_s: bool, is_strict: bool) -> Validity {
        let Some((hash_type, vch_sig)) = vch_sig_in.split_last() else {
            return Validity::InvalidContinue;
        };

        let parsed = if is_strict || require_low_s {
            if let Err(e) = Self::is_valid_encoding(vch_sig) {
                return Validity::InvalidAbort(Error::SigDER(e));
            }
            // Failures of `from_der` that aren’t covered by `is_valid_encoding` (e.g., R or S
            // beyond the curve order) shouldn’t abort execution.
            ecdsa::Signature::from_der(vch_sig)
        } else {
            ecdsa::Signature::from_der_lax(vch_sig)
        };

        match parsed {
            Err(_) => Validity::InvalidContinue,
            Ok(sig) => {
                if require_low_s && !PubKey::check_low_s(&sig) {
                    Validity::InvalidAbort(Error::SigHighS)
                } else {
                    Validity::Valid(Decoded {
                        sig,
                        hash_type: HashType::from_byte(*hash_type),
                    })
                }
            }
        }
    }

    /// The ECDSA signature.
    pub fn sig(&self) -> &ecdsa::Signature {
        &self.sig
    }

    /// The hash type used to inform signature validation.
    pub fn sighash_type(&self) -> &HashType {
        &self.hash_type
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use secp256k1::{Message, Secp256k1, SecretKey};

    use super::{
        Decoded, Error, HashType, InvalidDerEncoding, InvalidDerInteger, SignedOutputs, Validity,
    };

    /// A strict DER endorsement over an arbitrary digest.
    fn endorsement() -> Vec<u8> {
        let secp = Secp256k1::signing_only();
        let sk = SecretKey::from_slice(&[0x42; 32]).expect("valid secret key");
        let mut vch = secp
            .sign_ecdsa(&Message::from_digest([0x17; 32]), &sk)
            .serialize_der()
            .to_vec();
        vch.push(HashType::ALL);
        vch
    }

    /// The same endorsement, with a superfluous zero byte in front of R.
    fn padded() -> Vec<u8> {
        let mut vch = endorsement();
        vch.insert(4, 0x00);
        vch[1] += 1;
        vch[3] += 1;
        vch
    }

    #[test]
    fn empty_endorsements_just_fail() {
        assert!(matches!(
            Decoded::from_bytes(&[], true, true),
            Validity::InvalidContinue
        ));
    }

    #[test]
    fn strict_signatures_are_accepted() {
        match Decoded::from_bytes(&endorsement(), true, true) {
            Validity::Valid(sig) => {
                assert_eq!(sig.sighash_type().raw(), HashType::ALL);
                assert_eq!(sig.sighash_type().signed_outputs(), SignedOutputs::All);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn padding_aborts_only_when_strict() {
        assert!(matches!(
            Decoded::from_bytes(&padded(), false, false),
            Validity::Valid(_)
        ));
        match Decoded::from_bytes(&padded(), false, true) {
            Validity::InvalidAbort(Error::SigDER(InvalidDerEncoding::InvalidComponent {
                name,
                error,
                ..
            })) => {
                assert_eq!(name, "r");
                assert_eq!(error, InvalidDerInteger::LeadingNullByte);
            }
            other => panic!("unexpected {other:?}"),
        }
        // Low S implies strict encoding.
        assert!(matches!(
            Decoded::from_bytes(&padded(), true, false),
            Validity::InvalidAbort(Error::SigDER(_))
        ));
    }

    #[test]
    fn garbage_is_rejected_by_both_parsers() {
        assert!(matches!(
            Decoded::from_bytes(&[0x30, 0x01, 0x01], false, false),
            Validity::InvalidContinue
        ));
        assert!(matches!(
            Decoded::from_bytes(&[0x31, 0x00, 0x01], false, true),
            Validity::InvalidAbort(Error::SigDER(InvalidDerEncoding::WrongType))
        ));
        // A component length that runs past the end mustn’t panic.
        assert!(matches!(
            Decoded::from_bytes(&[0x30, 0x03, 0x02, 0x7f, 0x01, 0x01], false, true),
            Validity::InvalidAbort(Error::SigDER(InvalidDerEncoding::InvalidComponent {
                name: "r",
                ..
            }))
        ));
    }

    #[test]
    fn high_s_aborts_when_required() {
        let vch = endorsement();
        let mut sig = secp256k1::ecdsa::Signature::from_der(&vch[..vch.len() - 1])
            .expect("valid DER")
            .serialize_compact();
        // Replace S with n - S.
        let order = secp256k1::constants::CURVE_ORDER;
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let diff = i16::from(order[i]) - i16::from(sig[32 + i]) - borrow;
            sig[32 + i] = diff.rem_euclid(256) as u8;
            borrow = if diff < 0 { 1 } else { 0 };
        }
        let mut vch = secp256k1::ecdsa::Signature::from_compact(&sig)
            .expect("valid compact signature")
            .serialize_der()
            .to_vec();
        vch.push(HashType::ALL);

        assert!(matches!(
            Decoded::from_bytes(&vch, true, true),
            Validity::InvalidAbort(Error::SigHighS)
        ));
        assert!(matches!(
            Decoded::from_bytes(&vch, false, true),
            Validity::Valid(_)
        ));
    }

    #[test]
    fn hash_types() {
        let single_acp = HashType::from_byte(HashType::SINGLE | HashType::ANYONE_CAN_PAY);
        assert_eq!(single_acp.signed_outputs(), SignedOutputs::Single);
        assert!(single_acp.anyone_can_pay());
        assert_eq!(HashType::from_byte(0).signed_outputs(), SignedOutputs::All);
        assert_eq!(HashType::from_byte(0x42).raw(), 0x42);
    }
}
