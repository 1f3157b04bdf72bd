use derive_more::Display;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Why a request failed the signature gate. Every variant maps to the
/// same 401 so callers cannot probe which check tripped.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum SignatureError {
    #[display(fmt = "missing X-Signature-Ed25519 header")]
    MissingSignature,
    #[display(fmt = "missing X-Signature-Timestamp header")]
    MissingTimestamp,
    #[display(fmt = "verification key is not configured")]
    UnconfiguredKey,
    #[display(fmt = "malformed hex in key or signature")]
    BadHex,
    #[display(fmt = "key or signature has wrong length")]
    BadLength,
    #[display(fmt = "signature does not match request body")]
    Mismatch,
}

/// Checks the detached ed25519 signature Discord sends with every
/// interaction. The signed message is the timestamp concatenated with
/// the raw body bytes. An empty key fails closed.
pub fn verify(
    public_key_hex: &str,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<(), SignatureError> {
    if public_key_hex.is_empty() {
        return Err(SignatureError::UnconfiguredKey);
    }
    if signature_hex.is_empty() {
        return Err(SignatureError::MissingSignature);
    }
    if timestamp.is_empty() {
        return Err(SignatureError::MissingTimestamp);
    }

    let key_bytes = hex::decode(public_key_hex).map_err(|_| SignatureError::BadHex)?;
    let key_bytes: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| SignatureError::BadLength)?;
    let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| SignatureError::BadLength)?;

    let sig_bytes = hex::decode(signature_hex).map_err(|_| SignatureError::BadHex)?;
    let sig_bytes: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| SignatureError::BadLength)?;
    let signature = Signature::from_bytes(&sig_bytes);

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify(&message, &signature)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, String) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let public_hex = hex::encode(signing.verifying_key().to_bytes());
        (signing, public_hex)
    }

    fn sign(signing: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(signing.sign(&message).to_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let (signing, public_hex) = keypair();
        let body = br#"{"type":1}"#;
        let ts = "1700000000";
        let sig = sign(&signing, ts, body);
        assert_eq!(verify(&public_hex, &sig, ts, body), Ok(()));
    }

    #[test]
    fn flipped_body_byte_fails() {
        let (signing, public_hex) = keypair();
        let ts = "1700000000";
        let sig = sign(&signing, ts, br#"{"type":1}"#);
        assert_eq!(
            verify(&public_hex, &sig, ts, br#"{"type":2}"#),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn changed_timestamp_fails() {
        let (signing, public_hex) = keypair();
        let body = br#"{"type":1}"#;
        let sig = sign(&signing, "1700000000", body);
        assert_eq!(
            verify(&public_hex, &sig, "1700000001", body),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn absent_headers_are_named() {
        let (_, public_hex) = keypair();
        assert_eq!(
            verify(&public_hex, "", "ts", b"body"),
            Err(SignatureError::MissingSignature)
        );
        assert_eq!(
            verify(&public_hex, "00", "", b"body"),
            Err(SignatureError::MissingTimestamp)
        );
    }

    #[test]
    fn empty_key_fails_closed() {
        assert_eq!(
            verify("", "00", "ts", b"body"),
            Err(SignatureError::UnconfiguredKey)
        );
    }

    #[test]
    fn malformed_hex_is_rejected() {
        let (_, public_hex) = keypair();
        assert_eq!(
            verify(&public_hex, "zz-not-hex", "ts", b"body"),
            Err(SignatureError::BadHex)
        );
        assert_eq!(
            verify("zz-not-hex", "00", "ts", b"body"),
            Err(SignatureError::BadHex)
        );
    }

    #[test]
    fn wrong_length_is_rejected() {
        let (signing, public_hex) = keypair();
        let short_sig = "0011";
        assert_eq!(
            verify(&public_hex, short_sig, "ts", b"body"),
            Err(SignatureError::BadLength)
        );
        let sig = sign(&signing, "ts", b"body");
        assert_eq!(
            verify("0011", &sig, "ts", b"body"),
            Err(SignatureError::BadLength)
        );
    }
}
