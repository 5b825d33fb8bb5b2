//! Inline content hashing.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256, Sha384, Sha512};

use header_policy::{HashAlgorithm, Source};

/// Compute the base64 digest of inline content.
///
/// Line endings are normalized to LF first: browsers compute policy hashes
/// against Unix-style content regardless of the source document's encoding.
/// The normalized text is hashed over its UTF-8 bytes.
pub fn content_digest(content: &str, algorithm: HashAlgorithm) -> String {
    let unix_content = content.replace("\r\n", "\n");
    let bytes = unix_content.as_bytes();
    let hashed = match algorithm {
        HashAlgorithm::Sha256 => Sha256::digest(bytes).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(bytes).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(bytes).to_vec(),
    };
    BASE64.encode(hashed)
}

/// Hash inline content into a hash source value.
///
/// The input must be the literal text the browser will see, not its escaped
/// markup form; callers resolve entities and stringify values before calling.
pub fn hash_inline(content: &str, algorithm: HashAlgorithm) -> Source {
    Source::Hash {
        algorithm,
        digest: content_digest(content, algorithm),
    }
}
