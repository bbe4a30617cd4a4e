use memchr::memchr;

/// Named references the editor round-trips. Anything else passes through untouched.
const NAMED: &[(&[u8], char)] = &[
    (b"amp;", '&'),
    (b"lt;", '<'),
    (b"gt;", '>'),
    (b"quot;", '"'),
    (b"apos;", '\''),
    (b"nbsp;", '\u{00A0}'),
    (b"ZeroWidthSpace;", '\u{200B}'),
];

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Decode a small, fixed subset of character references.
///
/// Named references come from `NAMED`; numeric references (`&#215;`, `&#xD7;`) must be
/// semicolon-terminated and name a valid scalar value. Malformed or unknown references are
/// copied verbatim, so decoding is idempotent on its own output for plain text.
pub(crate) fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return s.to_string();
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;

    while i < bytes.len() {
        let Some(rel) = memchr(b'&', &bytes[i..]) else {
            out.push_str(&s[i..]);
            break;
        };
        out.push_str(&s[i..i + rel]);
        i += rel;

        match decode_reference(s, i + 1) {
            Reference::Char(ch, next) => {
                out.push(ch);
                i = next;
            }
            Reference::Verbatim(next) => {
                out.push_str(&s[i..next]);
                i = next;
            }
        }
    }

    out
}

enum Reference {
    Char(char, usize),
    Verbatim(usize),
}

/// `start` points just past the `&`.
fn decode_reference(s: &str, start: usize) -> Reference {
    let bytes = s.as_bytes();
    let rest = &bytes[start..];

    if let Some(&(name, ch)) = NAMED.iter().find(|(name, _)| rest.starts_with(name)) {
        return Reference::Char(ch, start + name.len());
    }

    if rest.first() != Some(&b'#') {
        return Reference::Verbatim(start);
    }

    let (digits_start, radix, max_digits) = match rest.get(1) {
        Some(b'x' | b'X') => (start + 2, 16, MAX_HEX_DIGITS),
        _ => (start + 1, 10, MAX_DEC_DIGITS),
    };

    let Some(end) = scan_digits(bytes, digits_start, radix, max_digits) else {
        return Reference::Verbatim(skip_malformed(bytes, start));
    };

    match u32::from_str_radix(&s[digits_start..end], radix)
        .ok()
        .and_then(char::from_u32)
    {
        Some(ch) => Reference::Char(ch, end + 1),
        None => Reference::Verbatim(end + 1),
    }
}

// Bounded so adversarial digit runs stay linear.
fn scan_digits(bytes: &[u8], start: usize, radix: u32, max_digits: usize) -> Option<usize> {
    let mut j = start;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b';' {
            return (j > start).then_some(j);
        }
        if j - start == max_digits || !(b as char).is_digit(radix) {
            return None;
        }
        j += 1;
    }
    None
}

// Consume up to and including `;`, stopping early at whitespace or another `&`.
fn skip_malformed(bytes: &[u8], start: usize) -> usize {
    let mut j = start;
    while j < bytes.len() {
        match bytes[j] {
            b';' => return j + 1,
            b'&' => return j,
            b if b.is_ascii_whitespace() => return j,
            _ => j += 1,
        }
    }
    bytes.len()
}
