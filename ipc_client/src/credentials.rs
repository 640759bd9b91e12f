use std::fmt;

use k256::{elliptic_curve::sec1::ToEncodedPoint, SecretKey};
use sha3::{Digest, Keccak256};

use crate::error::{IpcError, Result};

/// Node address and signing key handed to every CLI invocation.
///
/// Immutable once built: reconnecting to another wallet means building a new
/// value, never mutating this one.
#[derive(Clone)]
pub struct Credentials {
    node_address: String,
    private_key: String,
    address: String,
}

impl Credentials {
    pub fn new(node_address: &str, private_key: &str) -> Result<Self> {
        let private_key = private_key
            .strip_prefix("0x")
            .unwrap_or(private_key)
            .to_string();
        let address = derive_address(&private_key)?;
        Ok(Self {
            node_address: node_address.to_string(),
            private_key,
            address,
        })
    }

    pub fn node_address(&self) -> &str {
        &self.node_address
    }

    /// Private key as bare hex, without a `0x` prefix.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Checksummed account address derived from the private key.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Address shortened to `0x1234...abcd` for display.
    pub fn masked_address(&self) -> String {
        mask_address(&self.address)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("node_address", &self.node_address)
            .field("private_key_len", &self.private_key.len())
            .field("address", &self.address)
            .finish()
    }
}

pub fn mask_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

fn derive_address(private_key: &str) -> Result<String> {
    let bytes = hex::decode(private_key).map_err(|e| IpcError::InvalidPrivateKey(e.to_string()))?;
    let secret =
        SecretKey::from_slice(&bytes).map_err(|e| IpcError::InvalidPrivateKey(e.to_string()))?;
    let point = secret.public_key().to_encoded_point(false);
    // skip the 0x04 uncompressed marker
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    Ok(to_checksum_address(&hash[12..]))
}

fn to_checksum_address(raw: &[u8]) -> String {
    let lower = hex::encode(raw);
    let hash = Keccak256::digest(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_strips_hex_prefix() {
        let creds = Credentials::new("connect.akave.ai:5500", &format!("0x{}", KEY)).unwrap();
        assert_eq!(creds.private_key(), KEY);
        assert_eq!(creds.node_address(), "connect.akave.ai:5500");
    }

    #[test]
    fn test_derives_checksummed_address() {
        let with_prefix = Credentials::new("node", &format!("0x{}", KEY)).unwrap();
        let bare = Credentials::new("node", KEY).unwrap();
        assert_eq!(with_prefix.address(), ADDRESS);
        assert_eq!(bare.address(), ADDRESS);
    }

    #[test]
    fn test_masked_address() {
        let creds = Credentials::new("node", KEY).unwrap();
        assert_eq!(creds.masked_address(), "0xf39F...2266");
    }

    #[test]
    fn test_rejects_invalid_key() {
        assert!(matches!(
            Credentials::new("node", "not-hex"),
            Err(IpcError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            Credentials::new("node", "0xabcd"),
            Err(IpcError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let creds = Credentials::new("node", KEY).unwrap();
        assert!(!format!("{:?}", creds).contains(KEY));
    }
}
