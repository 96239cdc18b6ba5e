//! Field and collection name sanitization for MongoDB compatibility.
//!
//! MongoDB restricts field names and collection names from containing certain
//! characters that carry meaning in its query syntax. Names are escaped on the
//! way in and restored on the way out; field values are never touched.

use bson::{Bson, Document};

/// Escapes and restores names that MongoDB would reject or misinterpret.
///
/// Escaped characters are written as `%` followed by two hex digits:
/// - Percent signs (`%`) - the escape marker itself, so restoring is exact
/// - Dots (`.`) - used for nested field access in queries
/// - Dollar signs (`$`) - used for operators in queries
/// - Null bytes (`\0`) - field name terminators
///
/// Restoring decodes any `%XX` ASCII escape, which also covers names escaped
/// by [`escape_char`](Self::escape_char) outside this table.
pub(crate) struct NameSanitizer;

impl NameSanitizer {
    const ESCAPE: char = '%';

    /// Characters replaced during sanitization
    const ESCAPED: [char; 4] = ['%', '.', '$', '\0'];

    /// Recursively escapes every field name in a document, including those of
    /// documents nested in arrays.
    pub(crate) fn sanitize_document(document: &Document) -> Document {
        document
            .iter()
            .map(|(k, v)| (Self::sanitize_string(k), Self::sanitize_value(v)))
            .collect()
    }

    fn sanitize_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(Self::sanitize_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(Self::sanitize_document(doc)),
            _ => value.clone(),
        }
    }

    /// Sanitizes a name by replacing problematic characters with safe escaped versions.
    pub(crate) fn sanitize_string(input: &str) -> String {
        let mut sanitized = String::with_capacity(input.len());
        for c in input.chars() {
            if Self::ESCAPED.contains(&c) {
                sanitized.push_str(&Self::escape_char(c));
            } else {
                sanitized.push(c);
            }
        }
        sanitized
    }

    /// Escape sequence for a single ASCII character.
    pub(crate) fn escape_char(c: char) -> String {
        format!("{}{:02X}", Self::ESCAPE, u32::from(c))
    }

    /// Inverse of [`sanitize_document`](Self::sanitize_document).
    pub(crate) fn restore_document(document: &Document) -> Document {
        document
            .iter()
            .map(|(k, v)| (Self::restore_string(k), Self::restore_value(v)))
            .collect()
    }

    fn restore_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(Self::restore_value)
                    .collect(),
            ),
            Bson::Document(doc) => Bson::Document(Self::restore_document(doc)),
            _ => value.clone(),
        }
    }

    /// Restores a name by reverting sanitization escapes.
    ///
    /// A `%` that does not start a valid escape is kept as is.
    pub(crate) fn restore_string(input: &str) -> String {
        let mut restored = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(at) = rest.find(Self::ESCAPE) {
            restored.push_str(&rest[..at]);
            let escape = &rest[at + 1..];

            match escape
                .get(..2)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .filter(u8::is_ascii)
            {
                Some(byte) => {
                    restored.push(char::from(byte));
                    rest = &escape[2..];
                }
                None => {
                    restored.push(Self::ESCAPE);
                    rest = escape;
                }
            }
        }

        restored.push_str(rest);
        restored
    }
}
