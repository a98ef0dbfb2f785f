//! Application identifier synthesis
//!
//! Turns a free-form host string ("https://www.example.com/app?x=1") into a
//! reverse-domain identifier ("com.example") that the Android build accepts
//! both as `applicationId` and as the `namespace` of the generated `R` class.

use serde::{Serialize, Serializer};
use std::fmt;

/// Identifier used whenever a host collapses to fewer than two valid segments
pub const FALLBACK_IDENTIFIER: &str = "com.webapp.generated";

/// Java keywords and literals; a namespace segment equal to one of these
/// would make the generated `R` class uncompilable.
const JAVA_RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "null", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while",
];

/// A validated reverse-domain application identifier.
///
/// Always holds at least two segments, each matching `[a-z][a-z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentifier {
    segments: Vec<String>,
}

impl PackageIdentifier {
    /// Derive an identifier from a host name. Never fails.
    pub fn derive(host_name: &str) -> Self {
        let host = clean_host(host_name);
        tracing::debug!("Cleaned hostname: {}", host);

        let fragments: Vec<&str> = host.split('.').filter(|f| !f.is_empty()).collect();
        let candidate: Vec<String> = match fragments.len() {
            0 => return Self::fallback(),
            1 => vec!["com".to_string(), fragments[0].to_string()],
            _ => fragments.iter().rev().map(|f| f.to_string()).collect(),
        };

        let segments: Vec<String> = candidate.iter().filter_map(|s| clean_segment(s)).collect();
        if segments.len() < 2 {
            return Self::fallback();
        }

        let id = Self { segments };
        tracing::debug!("Generated package name: {}", id);
        id
    }

    /// The fixed default identifier
    pub fn fallback() -> Self {
        Self {
            segments: FALLBACK_IDENTIFIER.split('.').map(str::to_string).collect(),
        }
    }

    pub fn as_string(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl Serialize for PackageIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

/// Reduce a host string to the bare host: no scheme, no leading `www.`,
/// nothing from the first `/`, `?`, `#` or `:` onwards, lowercased.
pub fn clean_host(host_name: &str) -> String {
    let mut host = host_name.trim();
    for scheme in ["https://", "http://"] {
        if let Some(prefix) = host.get(..scheme.len()) {
            if prefix.eq_ignore_ascii_case(scheme) {
                host = &host[scheme.len()..];
                break;
            }
        }
    }
    if host.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("www.")) {
        host = &host[4..];
    }
    let end = host.find(['/', '?', '#', ':']).unwrap_or(host.len());
    host[..end].trim().to_ascii_lowercase()
}

fn clean_segment(segment: &str) -> Option<String> {
    let mut cleaned: String = segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_ascii_lowercase();

    if cleaned.is_empty() {
        return None;
    }
    if cleaned.starts_with(|c: char| c.is_ascii_digit() || c == '_') {
        cleaned.insert(0, 'a');
    }
    if JAVA_RESERVED.contains(&cleaned.as_str()) {
        cleaned.push('_');
    }
    Some(cleaned)
}
