// Dweve Neomap - Object-Graph Mapping for Property Graphs
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Escaping of identifiers, labels, relationship types and string literals.
//!
//! Labels, relationship types and property keys come from type descriptors
//! and map keys, so they are never interpolated raw: every name is
//! NFC-normalized, stripped of invisible and bidirectional control
//! characters, and backtick-quoted unless it is a plain, non-reserved
//! identifier.

use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

const RESERVED: &[&str] = &[
    "ALL", "AND", "ANY", "AS", "ASC", "ASCENDING", "BY", "CALL", "CASE", "CONTAINS", "COUNT",
    "CREATE", "DELETE", "DESC", "DESCENDING", "DETACH", "DISTINCT", "DROP", "ELSE", "END",
    "ENDS", "EXISTS", "FALSE", "FOREACH", "IN", "IS", "LIMIT", "MATCH", "MERGE", "NODE", "NONE",
    "NOT", "NULL", "ON", "OPTIONAL", "OR", "ORDER", "REDUCE", "RELATIONSHIP", "REMOVE",
    "RETURN", "SET", "SINGLE", "SKIP", "STARTS", "THEN", "TRUE", "UNION", "UNIQUE", "UNWIND",
    "WHEN", "WHERE", "WITH", "XOR", "YIELD",
];

/// Whether a name is a Cypher keyword, ignoring case.
pub fn is_reserved(s: &str) -> bool {
    let upper = s.to_ascii_uppercase();
    RESERVED.contains(&upper.as_str())
}

/// Normalize to Unicode NFC so that visually identical names compare equal.
pub fn normalize_unicode(s: &str) -> String {
    s.nfc().collect()
}

fn is_invisible(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '\u{00AD}'
                | '\u{061C}'
                | '\u{180E}'
                | '\u{200B}'..='\u{200D}'
                | '\u{202A}'..='\u{202E}'
                | '\u{2066}'..='\u{2069}'
                | '\u{FEFF}'
        )
}

fn sanitize(s: &str) -> String {
    normalize_unicode(s)
        .chars()
        .filter(|c| !is_invisible(*c))
        .collect()
}

/// Whether `s` can be used unquoted: an ASCII letter or underscore followed
/// by ASCII letters, digits or underscores.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Escape a variable or property name, quoting it with backticks if needed.
///
/// ```
/// # use neomap_cypher::cypher::escape_identifier;
/// assert_eq!(escape_identifier("name"), "name");
/// assert_eq!(escape_identifier("first name"), "`first name`");
/// assert_eq!(escape_identifier("order"), "`order`");
/// ```
pub fn escape_identifier(s: &str) -> String {
    let clean = sanitize(s);
    if is_valid_identifier(&clean) && !is_reserved(&clean) {
        clean
    } else {
        format!("`{}`", clean.replace('`', "``"))
    }
}

/// Escape a label, including the leading colon.
///
/// ```
/// # use neomap_cypher::cypher::escape_label;
/// assert_eq!(escape_label("SKU"), ":SKU");
/// assert_eq!(escape_label("Mr-X"), ":`Mr-X`");
/// ```
pub fn escape_label(s: &str) -> String {
    format!(":{}", escape_identifier(s))
}

/// Escape a label set, primary label first: `:Dog:Animal`.
pub fn escape_labels<S: AsRef<str>>(labels: &[S]) -> String {
    labels.iter().map(|l| escape_label(l.as_ref())).collect()
}

/// Escape a relationship type, including the leading colon.
pub fn escape_relationship_type(s: &str) -> String {
    escape_label(s)
}

/// Escape the content of a single-quoted string literal.
///
/// Returns the input unchanged when nothing needs escaping.
pub fn escape_string(s: &str) -> Cow<'_, str> {
    if !s
        .chars()
        .any(|c| matches!(c, '\\' | '\'' | '"' | '\n' | '\r' | '\t' | '\0'))
    {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\u0000"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Quote a string literal with single quotes.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", escape_string(s))
}
