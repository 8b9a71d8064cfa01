use crate::asset::Asset;
use crate::error::{Result, VigilError};
use sha2::{Digest as _, Sha256};
use vigil_api::Digest;

/// SHA-256 of `bytes`, lowercase hex.
pub fn digest_bytes(bytes: &[u8]) -> Digest {
    Digest::from_bytes(&Sha256::digest(bytes))
}

/// SHA-256 of the full content of `asset`.
pub async fn digest_asset(asset: &Asset) -> Result<Digest> {
    let data = asset.content().await?;
    tokio::task::spawn_blocking(move || digest_bytes(&data))
        .await
        .map_err(|e| VigilError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_known_vector() {
        assert_eq!(
            digest_bytes(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic_and_bit_sensitive() {
        let content = b"grype binary payload".to_vec();
        assert_eq!(digest_bytes(&content), digest_bytes(&content));

        let mut flipped = content.clone();
        flipped[3] ^= 0x01;
        assert_ne!(digest_bytes(&content), digest_bytes(&flipped));
    }

    #[tokio::test]
    async fn test_digest_asset_matches_bytes() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("grype"), b"payload").unwrap();
        let asset = Asset::new("grype", temp.path());

        let digest = digest_asset(&asset).await.unwrap();
        assert_eq!(digest, digest_bytes(b"payload"));
        assert_eq!(digest.as_str().len(), 64);
    }
}
