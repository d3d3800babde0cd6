//! Key computation from field paths.
//!
//! Field names are expected in PascalCase (`HTMLParser`, `PoolSize`); words
//! are split on case boundaries, so acronyms survive as one word:
//!
//! ```
//! use copre::{FieldPath, naming};
//!
//! let path = FieldPath::from(["Document", "HTMLParser"]);
//! assert_eq!(naming::upper_snake_case(&path), "DOCUMENT_HTML_PARSER");
//! assert_eq!(naming::kebab_case(&path), "document-html-parser");
//! assert_eq!(naming::camel_case(&path), "documentHTMLParser");
//! ```

use heck::{ToKebabCase, ToShoutySnakeCase, ToSnakeCase};

use crate::record::FieldPath;

fn joined(path: &FieldPath, separator: &str) -> String {
    path.segments().join(separator)
}

pub fn upper_snake_case(path: &FieldPath) -> String {
    joined(path, "_").to_shouty_snake_case()
}

pub fn lower_snake_case(path: &FieldPath) -> String {
    joined(path, "_").to_snake_case()
}

pub fn kebab_case(path: &FieldPath) -> String {
    joined(path, "-").to_kebab_case()
}

/// Segments joined as-is.
pub fn pascal_case(path: &FieldPath) -> String {
    joined(path, "")
}

/// [`pascal_case`] with the first character lowered.
pub fn camel_case(path: &FieldPath) -> String {
    let pascal = pascal_case(path);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&'static str]) -> FieldPath {
        FieldPath::from(segments)
    }

    #[test]
    fn acronyms_stay_together() {
        let p = path(&["Document", "HTMLParser"]);
        assert_eq!(upper_snake_case(&p), "DOCUMENT_HTML_PARSER");
        assert_eq!(lower_snake_case(&p), "document_html_parser");
        assert_eq!(kebab_case(&p), "document-html-parser");
        assert_eq!(pascal_case(&p), "DocumentHTMLParser");
        assert_eq!(camel_case(&p), "documentHTMLParser");
    }

    #[test]
    fn single_segment() {
        let p = path(&["PoolSize"]);
        assert_eq!(upper_snake_case(&p), "POOL_SIZE");
        assert_eq!(camel_case(&p), "poolSize");
    }

    #[test]
    fn empty_path() {
        let p = FieldPath::new();
        assert_eq!(upper_snake_case(&p), "");
        assert_eq!(camel_case(&p), "");
    }

    #[test]
    fn digits_do_not_split_words() {
        let p = path(&["Server", "Ipv4"]);
        assert_eq!(upper_snake_case(&p), "SERVER_IPV4");
    }
}
