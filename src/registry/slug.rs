use std::iter;

pub const SLUG_LEN: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Random slug of [`SLUG_LEN`] alphanumeric characters
pub fn generate_slug() -> String {
    iter::repeat_with(|| ALPHABET[rand::random_range(0..ALPHABET.len())] as char)
        .take(SLUG_LEN)
        .collect()
}

/// Cheap shape check used by the redirect path before touching storage
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= 64 && slug.bytes().all(|b| b.is_ascii_alphanumeric())
}
