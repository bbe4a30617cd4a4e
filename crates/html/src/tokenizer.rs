//! Fragment tokenizer for editor content.
//!
//! Pasted and programmatic content is routinely malformed, so this tokenizer never fails: it
//! emits whatever tags it can recognise and treats the rest as text. Tag and attribute names
//! use the ASCII character class `[A-Za-z0-9:_-]` and are interned lowercase.
//!
//! Known limitations:
//! - Not an HTML5 state machine; there is no implied-end-tag or foster-parenting logic. The
//!   tree builder keeps nesting exactly as written (`<p><p>x</p></p>` stays nested), which is
//!   what the structure fixer expects to repair.
//! - Rawtext close-tag scanning (`script`, `style`) accepts only ASCII whitespace before `>`.
use crate::entities::decode_entities;
use crate::types::{AtomId, AtomTable, Token, TokenStream};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const SCRIPT_CLOSE_TAG: &[u8] = b"</script";
const STYLE_CLOSE_TAG: &[u8] = b"</style";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_name_byte(bytes[end]) {
        end += 1;
    }
    end
}

/// Elements that never have children or an end tag.
pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

// `<` cannot appear inside a UTF-8 continuation byte, so byte scanning is boundary-safe.
fn find_rawtext_close_tag(haystack: &str, close_tag: &[u8]) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let n = close_tag.len();
    let mut i = 0;
    while i + n <= bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        if i + n > bytes.len() {
            return None;
        }
        if starts_with_ignore_ascii_case_at(bytes, i, close_tag) {
            let mut k = i + n;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < bytes.len() && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

struct StartTag {
    name: AtomId,
    attributes: Vec<(AtomId, Option<String>)>,
    self_closing: bool,
    end: usize,
}

fn scan_start_tag(input: &str, name_start: usize, atoms: &mut AtomTable) -> StartTag {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let name_end = scan_name(bytes, name_start);
    let name = atoms.intern_ascii_lowercase(&input[name_start..name_end]);
    let mut attributes = Vec::new();
    let mut self_closing = false;
    let mut k = name_end;

    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        match bytes[k] {
            b'>' => {
                k += 1;
                break;
            }
            b'/' => {
                if k + 1 < len && bytes[k + 1] == b'>' {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            _ => {}
        }
        let attr_start = k;
        k = scan_name(bytes, k);
        if attr_start == k {
            // Not a name byte: skip it so malformed markup still makes progress.
            k += input[k..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        let attr_name = atoms.intern_ascii_lowercase(&input[attr_start..k]);
        skip_whitespace(&mut k);
        let value = if k < len && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let value_start = k;
                k += memchr(quote, &bytes[k..]).unwrap_or(len - k);
                let raw = &input[value_start..k];
                if k < len {
                    k += 1;
                }
                Some(decode_entities(raw))
            } else {
                let value_start = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    if bytes[k] == b'/' && k + 1 < len && bytes[k + 1] == b'>' {
                        break;
                    }
                    k += 1;
                }
                Some(decode_entities(&input[value_start..k]))
            }
        } else {
            None
        };
        attributes.push((attr_name, value));
    }

    if is_void_element(atoms.resolve(name)) {
        self_closing = true;
    }

    StartTag {
        name,
        attributes,
        self_closing,
        end: k,
    }
}

/// Tokenize an HTML fragment. Never fails; unrecognised markup degrades to text.
pub fn tokenize(input: &str) -> TokenStream {
    let mut out = Vec::new();
    let mut atoms = AtomTable::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            i += memchr(b'<', &bytes[i..]).unwrap_or(bytes.len() - i);
            push_text(&mut out, &input[start..i]);
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + COMMENT_END.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 2..];
            let Some(end) = rest.find('>') else {
                break;
            };
            out.push(Token::Doctype(rest[..end].trim().to_string()));
            i += 2 + end + 1;
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            let name_start = i + 2;
            let name_end = scan_name(bytes, name_start);
            if name_end == name_start {
                // `</>` or `</ 3`: not a tag, keep the `<` as text.
                push_text(&mut out, "<");
                i += 1;
                continue;
            }
            let name = atoms.intern_ascii_lowercase(&input[name_start..name_end]);
            let close = memchr(b'>', &bytes[name_end..]).map_or(bytes.len(), |rel| name_end + rel + 1);
            out.push(Token::EndTag(name));
            i = close;
            continue;
        }

        let name_start = i + 1;
        if name_start >= bytes.len() || !bytes[name_start].is_ascii_alphabetic() {
            push_text(&mut out, "<");
            i += 1;
            continue;
        }

        let tag = scan_start_tag(input, name_start, &mut atoms);
        let name = tag.name;
        let self_closing = tag.self_closing;
        out.push(Token::StartTag {
            name,
            attributes: tag.attributes,
            self_closing,
        });
        i = tag.end;

        let close_tag = match atoms.resolve(name) {
            "script" => SCRIPT_CLOSE_TAG,
            "style" => STYLE_CLOSE_TAG,
            _ => continue,
        };
        if self_closing {
            continue;
        }
        match find_rawtext_close_tag(&input[i..], close_tag) {
            Some((rel_start, rel_end)) => {
                let raw = &input[i..i + rel_start];
                if !raw.is_empty() {
                    out.push(Token::Text(raw.to_string()));
                }
                out.push(Token::EndTag(name));
                i += rel_end;
            }
            None => {
                let raw = &input[i..];
                if !raw.is_empty() {
                    out.push(Token::Text(raw.to_string()));
                }
                out.push(Token::EndTag(name));
                break;
            }
        }
    }

    TokenStream::new(out, atoms)
}

fn push_text(out: &mut Vec<Token>, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let decoded = decode_entities(raw);
    // Adjacent text runs (e.g. around a stray `<`) become one token.
    if let Some(Token::Text(prev)) = out.last_mut() {
        prev.push_str(&decoded);
        return;
    }
    out.push(Token::Text(decoded));
}
