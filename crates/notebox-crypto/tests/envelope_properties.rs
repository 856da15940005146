//! Property tests for envelope encryption.

use notebox_crypto::{EncryptionEnvelope, KeyWrapCipher, MasterKey};
use proptest::prelude::*;

fn cipher(seed: u8) -> KeyWrapCipher {
    KeyWrapCipher::new(MasterKey::from_bytes([seed; 32]))
}

proptest! {
    #[test]
    fn decrypt_inverts_encrypt(plaintext in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let c = cipher(7);
        let envelope = c.encrypt(&plaintext).unwrap();
        prop_assert_eq!(c.decrypt(&envelope).unwrap(), plaintext);
    }

    #[test]
    fn stored_form_reparses(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
        let envelope = cipher(9).encrypt(&plaintext).unwrap();
        let stored = envelope.to_bytes();
        prop_assert!(stored.iter().all(|b| b.is_ascii_hexdigit() || *b == b':'));
        prop_assert_eq!(EncryptionEnvelope::parse(&stored).unwrap(), envelope);
    }

    #[test]
    fn any_single_bit_flip_is_rejected(
        plaintext in proptest::collection::vec(any::<u8>(), 1..256),
        flip in any::<prop::sample::Index>(),
    ) {
        let c = cipher(11);
        let envelope = c.encrypt(&plaintext).unwrap();
        let mut ct = envelope.ciphertext().to_vec();
        let i = flip.index(ct.len());
        ct[i] ^= 0x80;
        let tampered = EncryptionEnvelope::new(*envelope.iv(), envelope.wrapped_key().to_vec(), ct).unwrap();
        prop_assert!(c.decrypt(&tampered).is_err());
    }
}

#[test]
fn envelope_from_other_master_key_is_rejected() {
    let stored = cipher(1).encrypt(b"%PDF-1.5 notes").unwrap().to_bytes();
    assert!(cipher(2).decrypt_bytes(&stored).is_err());
    assert_eq!(cipher(1).decrypt_bytes(&stored).unwrap(), b"%PDF-1.5 notes");
}
