//! Integration tests for hash crate

#[cfg(test)]
mod tests {
    use kiln_hash::*;
    use tempfile::tempdir;
    use tokio::fs;

    #[test]
    fn test_hash_from_hex_errors() {
        // Too short
        assert!(Hash::from_hex("1234").is_err());

        // Too long
        assert!(Hash::from_hex(&"a".repeat(66)).is_err());

        // Invalid hex
        assert!(Hash::from_hex("xyz123").is_err());
    }

    #[test]
    fn test_hex_round_trip_is_lowercase() {
        let hash = Hash::from_data(b"kiln");
        let hex = hash.to_hex();
        assert_eq!(hex, hex.to_lowercase());
        assert_eq!(Hash::from_hex(&hex).unwrap(), hash);
        assert!(hex.starts_with(&hash.short()));
    }

    #[tokio::test]
    async fn test_directory_hash_depends_on_layout() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        fs::write(a.path().join("one.txt"), b"same").await.unwrap();
        fs::create_dir_all(b.path().join("nested")).await.unwrap();
        fs::write(b.path().join("nested/one.txt"), b"same")
            .await
            .unwrap();

        let ha = hash_directory(a.path(), &[]).await.unwrap();
        let hb = hash_directory(b.path(), &[]).await.unwrap();
        assert_ne!(ha, hb);
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(hash_directory(&dir.path().join("absent"), &[]).await.is_err());
    }
}
