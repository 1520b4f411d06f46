//! Service name hashing.
//!
//! Server hashes are derived from a service's fully qualified name with a
//! 32-bit FNV-1a style hash:
//!
//! ```text
//! h = 0x811C9DC5
//! for each byte b:  h = 0x01000193 * (b XOR h)   (wrapping u32)
//! ```
//!
//! The name is hashed as ASCII. Every non-ASCII character contributes a
//! single `?` byte, so a name containing `é` hashes the same as one
//! containing `?` in that position. The result is a wire compatibility
//! constant: peers compare it during service binding.
//!
//! # Example
//!
//! ```
//! use servicewire::hash::service_hash;
//!
//! assert_eq!(service_hash(""), 0x811C_9DC5);
//! assert_eq!(service_hash("a"), 0xE40C_292C);
//! ```

/// Initial hash state.
pub const HASH_OFFSET_BASIS: u32 = 0x811C_9DC5;

/// Multiplier applied after every byte.
pub const HASH_PRIME: u32 = 0x0100_0193;

/// Byte substituted for each non-ASCII character.
const ASCII_REPLACEMENT: u8 = b'?';

/// Fold a single byte into the hash state.
#[inline]
const fn step(hash: u32, byte: u8) -> u32 {
    HASH_PRIME.wrapping_mul(byte as u32 ^ hash)
}

/// Hash raw bytes without any character substitution.
pub const fn hash_bytes(bytes: &[u8]) -> u32 {
    let mut hash = HASH_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash = step(hash, bytes[i]);
        i += 1;
    }
    hash
}

/// Hash a service name.
///
/// Usable in `const` context, which lets service descriptors be declared
/// by name without a runtime initialisation step.
pub const fn service_hash(name: &str) -> u32 {
    let bytes = name.as_bytes();
    let mut hash = HASH_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            hash = step(hash, b);
        } else if b & 0xC0 != 0x80 {
            // Leading byte of a multi-byte sequence; continuation bytes are skipped.
            hash = step(hash, ASCII_REPLACEMENT);
        }
        i += 1;
    }
    hash
}
