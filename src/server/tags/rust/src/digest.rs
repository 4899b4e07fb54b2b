/* src/server/tags/rust/src/digest.rs */

// CSP nonce generation and manifest content hashing.

use md5::{Digest, Md5};

const NONCE_BYTES: usize = 30;

/// 60 hex chars from 30 random bytes.
pub fn generate_nonce() -> String {
  let bytes: [u8; NONCE_BYTES] = rand::random();
  hex::encode(bytes)
}

/// MD5 content digest as hex (32 chars), matching `md5sum` of the file.
pub fn content_hash(content: &[u8]) -> String {
  hex::encode(Md5::digest(content))
}
