//! Request key derivation.
//!
//! A cached image is addressed by the triple `(image_class, chapter_id,
//! image_name)`. The cache itself is keyed by a single string: the lowercase
//! hex SHA-512 digest of those three fields concatenated in order.

use sha2::{Digest, Sha512};

/// Accepted `image_class` values.
pub const IMAGE_CLASSES: [&str; 2] = ["data", "data-saver"];

/// Computes the content-addressing fingerprint for a request key.
///
/// Pure function: the same triple always yields the same digest, and the
/// fields are never reordered or transformed before hashing.
pub fn fingerprint(image_class: &str, chapter_id: &str, image_name: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(image_class.as_bytes());
    hasher.update(chapter_id.as_bytes());
    hasher.update(image_name.as_bytes());
    hex::encode(hasher.finalize())
}

/// A validated request key, ready for fingerprinting and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestKey {
    pub image_class: String,
    pub chapter_id: String,
    pub image_name: String,
}

impl RequestKey {
    /// Validates raw path segments against the accepted shapes. Only
    /// `image_name` is case-folded; `chapter_id` must already be exactly
    /// 32 lowercase hex digits, uppercase is rejected rather than folded.
    pub fn parse(image_class: &str, chapter_id: &str, image_name: &str) -> Option<Self> {
        if !IMAGE_CLASSES.contains(&image_class) {
            return None;
        }

        if chapter_id.len() != 32
            || !chapter_id
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return None;
        }

        let image_name = image_name.to_ascii_lowercase();
        if !is_valid_image_name(&image_name) {
            return None;
        }

        Some(Self {
            image_class: image_class.to_string(),
            chapter_id: chapter_id.to_string(),
            image_name,
        })
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.image_class, &self.chapter_id, &self.image_name)
    }

    /// The canonical `/{image_class}/{chapter_id}/{image_name}` path, used
    /// both for logging and for building the upstream request URL.
    pub fn sanitized_url(&self) -> String {
        format!("/{}/{}/{}", self.image_class, self.chapter_id, self.image_name)
    }
}

/// `[a-z0-9]{1,4}.(jpg|jpeg|png|gif)`, already case-folded by the caller.
fn is_valid_image_name(name: &str) -> bool {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };

    if stem.is_empty() || stem.len() > 4 || !stem.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return false;
    }

    matches!(ext, "jpg" | "jpeg" | "png" | "gif")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_pure() {
        let a = fingerprint("data", "00112233445566778899aabbccddeeff", "x1.jpg");
        let b = fingerprint("data", "00112233445566778899aabbccddeeff", "x1.jpg");
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
    }

    #[test]
    fn fingerprint_distinguishes_fields() {
        let a = fingerprint("data", "00112233445566778899aabbccddeeff", "x1.jpg");
        let b = fingerprint("data-saver", "00112233445566778899aabbccddeeff", "x1.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn accepts_valid_key_and_lowercases_image_name_only() {
        let key = RequestKey::parse("data", "00112233445566778899aabbccddeeff", "X1.JPG").unwrap();
        assert_eq!(key.chapter_id, "00112233445566778899aabbccddeeff");
        assert_eq!(key.image_name, "x1.jpg");
    }

    #[test]
    fn rejects_uppercase_chapter_id() {
        assert!(
            RequestKey::parse("data", "00112233445566778899AABBCCDDEEFF", "x1.jpg").is_none()
        );
    }

    #[test]
    fn rejects_unknown_class() {
        assert!(RequestKey::parse("thumb", "00112233445566778899aabbccddeeff", "x1.jpg").is_none());
    }

    #[test]
    fn rejects_short_chapter_id() {
        assert!(RequestKey::parse("data", "deadbeef", "x1.jpg").is_none());
    }

    #[test]
    fn rejects_bad_image_name() {
        assert!(RequestKey::parse("data", "00112233445566778899aabbccddeeff", "x1.bmp").is_none());
        assert!(
            RequestKey::parse("data", "00112233445566778899aabbccddeeff", "toolong1.jpg")
                .is_none()
        );
    }
}
