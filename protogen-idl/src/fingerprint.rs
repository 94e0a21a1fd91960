//! Protocol fingerprint utilities

use crate::normalize::NormalizedModel;
use sha2::{Digest, Sha256};

/// First 8 bytes of SHA-256 over `preimage`, lowercase hex.
pub fn short_digest(preimage: &[u8]) -> String {
    let hash = Sha256::digest(preimage);
    hash[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

impl NormalizedModel {
    /// Stable identifier of the wire contract.
    ///
    /// Computed over the serialized model, so any change to ordinals, field
    /// order, types or routing metadata changes it. Diagnostics are not part
    /// of the model's serialized form and do not affect it.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let canonical = serde_json::to_vec(self)?;
        Ok(short_digest(&canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, NormalizeOptions};
    use crate::parse::parse_protocol_content;

    const PROTOCOL: &str = r#"{
        "servers": ["Global"],
        "categories": [
            {
                "name": "Misc",
                "properties": [ { "key": "server", "value": "Global" } ],
                "methods": [ { "name": "Ping", "in": [ { "name": "seq", "type": "u32" } ] } ]
            }
        ]
    }"#;

    fn model(json: &str) -> NormalizedModel {
        normalize(
            parse_protocol_content(json).unwrap(),
            &NormalizeOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_short_digest() {
        // sha256("") = e3b0c44298fc1c14...
        assert_eq!(short_digest(b""), "e3b0c44298fc1c14");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = model(PROTOCOL).fingerprint().unwrap();
        let b = model(PROTOCOL).fingerprint().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_fingerprint_tracks_field_types() {
        let a = model(PROTOCOL).fingerprint().unwrap();
        let b = model(&PROTOCOL.replace("u32", "u64")).fingerprint().unwrap();
        assert_ne!(a, b);
    }
}
