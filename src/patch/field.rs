//! Tagged-field table and the locate-or-insert transformer
//!
//! Each target file is described as a list of `FieldRule`s. A rule names a
//! field by its syntactic shape (XML resource entry, build property, map
//! entry, attribute), the value it should hold, and what to do when the
//! field is missing. Matching tolerates both quote styles and both
//! `key value` / `key = value` forms; everything outside the matched value
//! is left byte-for-byte intact.

use regex_lite::Regex;
use std::fmt;
use std::ops::Range;

/// Syntactic shape of a patchable field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// `<string name="NAME">value</string>`; aliases are alternative names
    /// for the same logical entry, tried in order after `name`
    XmlString {
        name: &'static str,
        aliases: &'static [&'static str],
    },
    /// `<color name="NAME">value</color>`
    XmlColor(&'static str),
    /// `KEY "value"`, `KEY 'value'`, `KEY = "value"` at the start of a line
    Property(&'static str),
    /// `KEY: 'value'` inside the `BLOCK = [ ... ]` map
    MapEntry {
        block: &'static str,
        key: &'static str,
    },
    /// `NAME="value"`, optionally restricted to the opening tag of `element`
    Attribute {
        element: Option<&'static str>,
        name: &'static str,
    },
    /// Every double-quoted source literal exactly equal to the placeholder
    Literal(&'static str),
}

impl Field {
    pub fn string(name: &'static str) -> Self {
        Field::XmlString { name, aliases: &[] }
    }

    pub fn name(&self) -> String {
        match self {
            Field::XmlString { name, .. } => format!("string/{}", name),
            Field::XmlColor(name) => format!("color/{}", name),
            Field::Property(key) => key.to_string(),
            Field::MapEntry { block, key } => format!("{}.{}", block, key),
            Field::Attribute { name, .. } => name.to_string(),
            Field::Literal(placeholder) => format!("\"{}\"", placeholder),
        }
    }
}

/// Where a missing field gets inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Just before the closing tag of the named XML element
    BeforeClose(&'static str),
    /// First line inside the named `{ ... }` block
    IntoBlock(&'static str),
}

/// What to do with a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Replace if present, otherwise insert at the anchor
    Required(Anchor),
    /// Replace if present, otherwise leave the file alone
    IfPresent,
    /// Delete the field if present
    Remove,
}

/// Syntax family of the file, used when inserting build properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Xml,
    Groovy,
    Kotlin,
    Java,
}

/// One entry of the tagged-field table
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pub value: String,
    pub policy: Policy,
}

impl FieldRule {
    pub fn required(field: Field, value: impl Into<String>, anchor: Anchor) -> Self {
        Self {
            field,
            value: value.into(),
            policy: Policy::Required(anchor),
        }
    }

    pub fn if_present(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            policy: Policy::IfPresent,
        }
    }

    pub fn remove(field: Field) -> Self {
        Self {
            field,
            value: String::new(),
            policy: Policy::Remove,
        }
    }
}

/// What happened to a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAction {
    Unchanged,
    Replaced,
    Inserted,
    Removed,
    /// Not present and not required
    Absent,
    /// Required but no anchor to insert at
    NoAnchor,
    /// Present, but holds an expression instead of a quoted literal
    NonLiteral,
}

impl fmt::Display for FieldAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldAction::Unchanged => "unchanged",
            FieldAction::Replaced => "replaced",
            FieldAction::Inserted => "inserted",
            FieldAction::Removed => "removed",
            FieldAction::Absent => "absent",
            FieldAction::NoAnchor => "no insertion point",
            FieldAction::NonLiteral => "not a literal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldResult {
    pub field: String,
    pub action: FieldAction,
}

/// Result of patching one file's content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchResult {
    pub changed: bool,
    pub fields: Vec<FieldResult>,
}

impl PatchResult {
    pub fn action(&self, field: &str) -> Option<FieldAction> {
        self.fields.iter().find(|f| f.field == field).map(|f| f.action)
    }
}

/// A located value
#[derive(Debug, Clone)]
struct Hit {
    /// Raw value text, without quotes
    value: Range<usize>,
    /// Whole field, including its leading whitespace for attributes
    whole: Range<usize>,
    quote: Option<char>,
}

enum Located {
    Hits(Vec<Hit>),
    NonLiteral,
    Absent,
}

/// Apply every rule in order. Returns the new content and a per-field report.
pub fn patch(content: &str, rules: &[FieldRule], dialect: Dialect) -> (String, PatchResult) {
    let mut text = content.to_string();
    let mut result = PatchResult::default();

    for rule in rules {
        let action = apply_rule(&mut text, rule, dialect);
        tracing::debug!("{}: {}", rule.field.name(), action);
        result.fields.push(FieldResult {
            field: rule.field.name(),
            action,
        });
    }

    result.changed = text != content;
    (text, result)
}

/// Read back the decoded value of a field, if present
pub fn read_field(content: &str, field: &Field) -> Option<String> {
    match locate(content, field) {
        Located::Hits(hits) => hits
            .first()
            .map(|hit| decode(field, &content[hit.value.clone()])),
        _ => None,
    }
}

fn apply_rule(text: &mut String, rule: &FieldRule, dialect: Dialect) -> FieldAction {
    match (locate(text, &rule.field), rule.policy) {
        (Located::NonLiteral, _) => FieldAction::NonLiteral,
        (Located::Hits(hits), Policy::Remove) => {
            for hit in hits.iter().rev() {
                text.replace_range(hit.whole.clone(), "");
            }
            FieldAction::Removed
        }
        (Located::Hits(hits), _) => {
            let mut replaced = false;
            for hit in hits.iter().rev() {
                let encoded = encode(&rule.field, &rule.value, hit.quote);
                if text[hit.value.clone()] != encoded {
                    text.replace_range(hit.value.clone(), &encoded);
                    replaced = true;
                }
            }
            if replaced {
                FieldAction::Replaced
            } else {
                FieldAction::Unchanged
            }
        }
        (Located::Absent, Policy::Required(anchor)) => {
            if insert(text, &rule.field, &rule.value, anchor, dialect) {
                FieldAction::Inserted
            } else {
                FieldAction::NoAnchor
            }
        }
        (Located::Absent, _) => FieldAction::Absent,
    }
}

fn regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("Invalid field pattern {}: {}", pattern, e);
            None
        }
    }
}

/// Quoted literal, either style; value lands in group `n` or `n + 1`
const QUOTED: &str = r#"(?:"((?:[^"\\\n]|\\.)*)"|'((?:[^'\\\n]|\\.)*)')"#;

fn quoted_hit(caps: &regex_lite::Captures<'_>, first: usize, offset: usize) -> Option<Hit> {
    let whole = caps.get(0)?;
    let (value, quote) = match caps.get(first) {
        Some(m) => (m, '"'),
        None => (caps.get(first + 1)?, '\''),
    };
    Some(Hit {
        value: offset + value.start()..offset + value.end(),
        whole: offset + whole.start()..offset + whole.end(),
        quote: Some(quote),
    })
}

fn locate(text: &str, field: &Field) -> Located {
    match field {
        Field::XmlString { name, aliases } => std::iter::once(name)
            .chain(aliases.iter())
            .map(|n| locate_element(text, "string", n))
            .find(|l| matches!(l, Located::Hits(_)))
            .unwrap_or(Located::Absent),
        Field::XmlColor(name) => locate_element(text, "color", name),
        Field::Property(key) => {
            let (scope, offset) = property_scope(text, key);
            let key = regex_lite::escape(key);
            let Some(re) = regex(&format!(r"(?m)^[ \t]*{}(?:[ \t]*=[ \t]*|[ \t]+){}", key, QUOTED)) else {
                return Located::Absent;
            };
            if let Some(hit) = re.captures(scope).and_then(|c| quoted_hit(&c, 1, offset)) {
                return Located::Hits(vec![hit]);
            }
            let present = regex(&format!(r"(?m)^[ \t]*{}\b(?:[ \t]*=[ \t]*|[ \t]+)\S", key))
                .is_some_and(|re| re.is_match(scope));
            if present {
                Located::NonLiteral
            } else {
                Located::Absent
            }
        }
        Field::MapEntry { block, key } => {
            let Some(range) = find_block(text, block) else {
                return Located::Absent;
            };
            let scope = &text[range.clone()];
            let key = regex_lite::escape(key);
            let Some(re) = regex(&format!(r"\b{}[ \t]*:[ \t]*{}", key, QUOTED)) else {
                return Located::Absent;
            };
            if let Some(hit) = re.captures(scope).and_then(|c| quoted_hit(&c, 1, range.start)) {
                return Located::Hits(vec![hit]);
            }
            let present = regex(&format!(r"\b{}[ \t]*:", key)).is_some_and(|re| re.is_match(scope));
            if present {
                Located::NonLiteral
            } else {
                Located::Absent
            }
        }
        Field::Attribute { element, name } => {
            let (scope, offset) = match element {
                Some(el) => match find_open_tag(text, el) {
                    Some(range) => (&text[range.clone()], range.start),
                    None => return Located::Absent,
                },
                None => (text, 0),
            };
            let Some(re) = regex(&format!(
                r#"\s+{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
                regex_lite::escape(name)
            )) else {
                return Located::Absent;
            };
            let hits: Vec<Hit> = re
                .captures_iter(scope)
                .filter_map(|c| quoted_hit(&c, 1, offset))
                .collect();
            if hits.is_empty() {
                Located::Absent
            } else {
                Located::Hits(hits)
            }
        }
        Field::Literal(placeholder) => {
            let quoted = format!("\"{}\"", placeholder);
            let hits: Vec<Hit> = text
                .match_indices(quoted.as_str())
                .map(|(start, m)| Hit {
                    value: start + 1..start + m.len() - 1,
                    whole: start..start + m.len(),
                    quote: Some('"'),
                })
                .collect();
            if hits.is_empty() {
                Located::Absent
            } else {
                Located::Hits(hits)
            }
        }
    }
}

fn locate_element(text: &str, tag: &str, name: &str) -> Located {
    let pattern = format!(
        r#"(?s)<{tag}\s+name\s*=\s*["']{name}["']([^>/]*)>(.*?)</{tag}\s*>"#,
        tag = tag,
        name = regex_lite::escape(name)
    );
    let Some(re) = regex(&pattern) else {
        return Located::Absent;
    };
    match re.captures(text) {
        Some(caps) => match (caps.get(0), caps.get(2)) {
            (Some(whole), Some(value)) => Located::Hits(vec![Hit {
                value: value.range(),
                whole: whole.range(),
                quote: None,
            }]),
            _ => Located::Absent,
        },
        None => Located::Absent,
    }
}

/// Build properties are looked up inside their anchor block when one exists
fn property_scope<'a>(text: &'a str, key: &str) -> (&'a str, usize) {
    let block = match key {
        "applicationId" => Some("defaultConfig"),
        "namespace" => Some("android"),
        _ => None,
    };
    match block.and_then(|b| find_block(text, b)) {
        Some(range) => (&text[range.clone()], range.start),
        None => (text, 0),
    }
}

/// Inner range of the first `name { ... }`, `name [ ... ]` or
/// `name = [ ... ]` block. Quoted text and `//` comments are skipped while
/// matching brackets.
pub fn find_block(text: &str, name: &str) -> Option<Range<usize>> {
    let re = regex(&format!(
        r"(?m)(?:^|[^\w.]){}[ \t]*(?:=[ \t]*)?([\[{{])",
        regex_lite::escape(name)
    ))?;
    let open = re.captures(text)?.get(1)?;
    let (open_ch, close_ch) = if open.as_str() == "{" { (b'{', b'}') } else { (b'[', b']') };

    let bytes = text.as_bytes();
    let start = open.end();
    let mut depth = 1usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() && bytes[i] != quote && bytes[i] != b'\n' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            c if c == open_ch => depth += 1,
            c if c == close_ch => {
                depth -= 1;
                if depth == 0 {
                    return Some(start..i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Range of the opening tag `<element ...>`
fn find_open_tag(text: &str, element: &str) -> Option<Range<usize>> {
    let re = regex(&format!(r"<{}\b[^>]*>", regex_lite::escape(element)))?;
    re.find(text).map(|m| m.range())
}

fn insert(text: &mut String, field: &Field, value: &str, anchor: Anchor, dialect: Dialect) -> bool {
    match anchor {
        Anchor::BeforeClose(element) => {
            let entry = match field {
                Field::XmlString { name, .. } => {
                    format!("<string name=\"{}\">{}</string>", name, encode(field, value, None))
                }
                Field::XmlColor(name) => {
                    format!("<color name=\"{}\">{}</color>", name, encode(field, value, None))
                }
                _ => return false,
            };
            let closing = format!("</{}>", element);
            let Some(pos) = text.rfind(&closing) else {
                return false;
            };
            let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
            if text[line_start..pos].trim().is_empty() {
                text.insert_str(line_start, &format!("    {}\n", entry));
            } else {
                text.insert_str(pos, &format!("\n    {}\n", entry));
            }
            true
        }
        Anchor::IntoBlock(block) => {
            let Field::Property(key) = field else {
                return false;
            };
            let Some(range) = find_block(text, block) else {
                return false;
            };
            let line_start = text[..range.start].rfind('\n').map(|i| i + 1).unwrap_or(0);
            let indent: String = text[line_start..]
                .chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect();
            let encoded = encode(field, value, Some('"'));
            let line = match dialect {
                Dialect::Kotlin => format!("{}    {} = \"{}\"", indent, key, encoded),
                _ => format!("{}    {} \"{}\"", indent, key, encoded),
            };
            match text[range.start..].find('\n') {
                Some(nl) if range.start + nl < range.end => {
                    text.insert_str(range.start + nl + 1, &format!("{}\n", line));
                }
                _ => text.insert_str(range.start, &format!("\n{}\n{}", line, indent)),
            }
            true
        }
    }
}

/// Encode a value for the field's syntax and quote style
fn encode(field: &Field, value: &str, quote: Option<char>) -> String {
    match field {
        Field::XmlString { .. } => escape_string_resource(value),
        Field::XmlColor(_) => value.to_string(),
        Field::Literal(_) => value.replace('\\', "\\\\").replace('"', "\\\""),
        Field::Attribute { .. } => value
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
        Field::Property(_) | Field::MapEntry { .. } => {
            let escaped = value.replace('\\', "\\\\");
            match quote {
                Some('\'') => escaped.replace('\'', "\\'"),
                _ => escaped.replace('"', "\\\"").replace('$', "\\$"),
            }
        }
    }
}

fn decode(field: &Field, raw: &str) -> String {
    match field {
        Field::XmlString { .. } => unescape_string_resource(raw),
        Field::XmlColor(_) => raw.trim().to_string(),
        Field::Attribute { .. } => raw
            .replace("&apos;", "'")
            .replace("&quot;", "\"")
            .replace("&lt;", "<")
            .replace("&amp;", "&"),
        Field::Property(_) | Field::MapEntry { .. } | Field::Literal(_) => {
            let mut out = String::with_capacity(raw.len());
            let mut chars = raw.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else {
                    out.push(c);
                }
            }
            out
        }
    }
}

/// Escape text for an Android `<string>` resource
pub fn escape_string_resource(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '@' | '?' if i == 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

pub fn unescape_string_resource(raw: &str) -> String {
    let entities = raw
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'");
    let entities = entities.replace("&amp;", "&");
    let mut out = String::with_capacity(entities.len());
    let mut chars = entities.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(next) => out.push(next),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}
