/// Fingerprint a sequence of `(key, value)` pairs.
///
/// Each key and value is length-prefixed before hashing so that
/// `("ab", "c")` and `("a", "bc")` produce different digests.
/// Callers must supply pairs in a stable order.
pub fn fingerprint_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut hasher = blake3::Hasher::new();
    for (key, value) in pairs {
        hasher.update(&(key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value);
    }
    hasher.finalize().to_hex().to_string()
}
