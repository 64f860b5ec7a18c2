/// MIME type used in data URLs when the source type is unknown.
///
/// Matches what a browser `FileReader` reports for an untyped blob slice.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Scheme prefix of a data URL.
pub const DATA_URL_SCHEME: &str = "data:";

/// Separator between the media type and a base64 payload in a data URL.
pub const DATA_URL_BASE64_MARKER: &str = ";base64,";
