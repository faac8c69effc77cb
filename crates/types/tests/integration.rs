//! Integration tests for types

#[cfg(test)]
mod tests {
    use kiln_types::*;

    #[test]
    fn test_reference_json_shape() {
        let json = r#"{
            "name": "left-pad",
            "version": "1.3.0",
            "remote": { "type": "tarball", "source": "https://example.invalid/left-pad.tgz" }
        }"#;
        let reference: PackageReference = serde_json::from_str(json).unwrap();

        assert_eq!(reference.remote.transport, Transport::tarball());
        assert!(!reference.optional);
        assert!(reference.remote.hash.is_none());

        let value = serde_json::to_value(&reference).unwrap();
        assert_eq!(value["remote"]["type"], "tarball");
        assert!(value["remote"].get("resolved").is_none());
    }

    #[test]
    fn test_unknown_transport_still_parses() {
        let json = r#"{"name":"c","version":"1","remote":{"type":"svn","source":"svn://x"}}"#;
        let reference: PackageReference = serde_json::from_str(json).unwrap();
        assert_eq!(reference.remote.transport.as_str(), "svn");
    }

    #[test]
    fn test_manifest_rejects_bad_version() {
        let err = Manifest::from_toml("[package]\nname = \"a\"\nversion = \"one\"\n");
        assert!(err.is_err());

        let err = Manifest::from_toml("[package]\nname = \" \"\nversion = \"1.0.0\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_manifest_toml_round_trip() {
        let manifest = Manifest::new("a", &Version::new(1, 2, 3)).depends_on("b", "^2");
        let parsed = Manifest::from_toml(&manifest.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, manifest);
        assert_eq!(parsed.version().unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn test_cached_metadata_has_no_resolved() {
        let manifest = Manifest::new("a", &Version::new(1, 0, 0));
        let cached = FetchedMetadata::cached(manifest.clone(), "abc", "/cache/a");
        assert!(cached.from_cache);
        assert!(cached.resolved.is_none());

        let fetched = FetchedMetadata::fetched(manifest, Some("x#1".into()), "abc", "/cache/a");
        assert!(!fetched.from_cache);
        assert_eq!(fetched.resolved.as_deref(), Some("x#1"));
    }
}
