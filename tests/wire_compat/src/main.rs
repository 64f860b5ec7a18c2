fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use filechat_protocol::{
        ChunkEvent, CompletionEvent, FileProgress, OutboundEvent, UploadStatus,
        decode_chunk_content,
    };

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture, re-serializes it and compares the JSON values
    /// (key order is irrelevant). Returns the parsed value.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_chunk_event() {
        let ev: ChunkEvent = roundtrip_test("chunk_event.json");
        assert_eq!(ev.chunk_index, 0);
        assert!(!ev.is_last_chunk);
        assert!(ev.file_id.is_none());
        assert_eq!(
            decode_chunk_content(&ev.chunk_content).unwrap(),
            b"\x89PNG\r\n\x1a\n"
        );
    }

    #[test]
    fn fixture_chunk_event_tagged() {
        let ev: ChunkEvent = roundtrip_test("chunk_event_tagged.json");
        assert!(ev.is_last_chunk);
        assert_eq!(
            ev.file_id.unwrap().to_string(),
            "6f1c2a3e-8b4d-4c7a-9e21-0d5f3b7a9c10"
        );
        assert_eq!(decode_chunk_content(&ev.chunk_content).unwrap(), b"Hello, world!");
    }

    #[test]
    fn fixture_completion_event() {
        let ev: CompletionEvent = roundtrip_test("completion_event.json");
        assert_eq!(ev.message, "Here are the files you asked for");
    }

    #[test]
    fn fixture_outbound_events() {
        let chunk: OutboundEvent = roundtrip_test("chunk_event.json");
        assert!(chunk.as_chunk().is_some());
        let tagged: OutboundEvent = roundtrip_test("chunk_event_tagged.json");
        assert!(tagged.as_chunk().is_some());
        let done: OutboundEvent = roundtrip_test("completion_event.json");
        assert!(done.is_completion());
    }

    #[test]
    fn fixture_file_progress() {
        let p: FileProgress = roundtrip_test("file_progress.json");
        assert_eq!(p.status, UploadStatus::Uploading);
        assert!(p.in_progress());
        assert!(p.error.is_empty());
    }

    #[test]
    fn fixture_file_progress_failed() {
        let p: FileProgress = roundtrip_test("file_progress_failed.json");
        assert_eq!(p.status, UploadStatus::Failed);
        assert!(!p.in_progress());
        assert!(p.error.contains("vanished"));
    }

    #[test]
    fn chunk_event_field_names() {
        let fixture = load_fixture("chunk_event.json");
        let obj = fixture.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["chunkContent", "chunkIndex", "fileName", "isLastChunk"]);
    }
}
