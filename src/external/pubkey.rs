use secp256k1::{ecdsa, Message, PublicKey, Secp256k1};

/// A public key, as it appears on the stack. Nothing about the encoding is checked until it is
/// used to verify.
pub struct PubKey<'a>(pub &'a [u8]);

impl PubKey<'_> {
    /// Check syntactic correctness.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// Verify a signature over a 32 byte digest. A key that doesn’t parse fails verification
    /// rather than the script.
    pub fn verify(&self, hash: &[u8; 32], sig: &ecdsa::Signature) -> bool {
        if !self.is_valid() {
            return false;
        };

        // libsecp256k1 only accepts low S, so a lax signature is normalized first.
        let mut sig = *sig;
        sig.normalize_s();

        PublicKey::from_slice(self.0).is_ok_and(|pubkey| {
            Secp256k1::verification_only()
                .verify_ecdsa(&Message::from_digest(*hash), &sig, &pubkey)
                .is_ok()
        })
    }

    /// Whether S is already in the lower half of the curve order.
    pub fn check_low_s(sig: &ecdsa::Signature) -> bool {
        let mut check = *sig;
        check.normalize_s();
        *sig == check
    }
}
