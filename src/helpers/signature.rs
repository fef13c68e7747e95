use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};

/// SHA-1 fingerprint of a signing certificate in the `AB:CD:...` form expected
/// by the `X-Android-Cert` header of app-restricted API keys.
pub fn signature_digest(certificate: &[u8]) -> String {
    digest(&SHA1_FOR_LEGACY_USE_ONLY, certificate)
        .as_ref()
        .iter()
        .map(|byte| format!("{:02X}", byte))
        .collect::<Vec<_>>()
        .join(":")
}
