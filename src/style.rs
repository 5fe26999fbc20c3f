//! Inline style declarations.
//!
//! The `style` attribute stays the single source of truth: reads parse
//! it, writes re-serialize it. Splitting respects quotes and
//! parentheses so values like `rgba(10, 10, 10, 0.98)` and
//! `url("a;b.png")` survive round trips. Property names are
//! case-insensitive; the last write per property wins in place.

/// Split `input` on `sep`, ignoring separators inside quotes or parens.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0usize;
    for (idx, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) => match ch {
                '\\' => escaped = true,
                _ if ch == q => quote = None,
                _ => {}
            },
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ if ch == sep && depth == 0 => {
                    out.push(&input[start..idx]);
                    start = idx + ch.len_utf8();
                }
                _ => {}
            },
        }
    }
    out.push(&input[start..]);
    out
}

pub(crate) fn parse_declarations(style_attr: Option<&str>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Some(style_attr) = style_attr else {
        return out;
    };
    for decl in split_top_level(style_attr, ';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        let pieces = split_top_level(decl, ':');
        if pieces.len() < 2 {
            continue;
        }
        let name = pieces[0].trim().to_ascii_lowercase();
        let value = decl[pieces[0].len() + 1..].trim().to_string();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        set_declaration(&mut out, &name, &value);
    }
    out
}

pub(crate) fn get_declaration<'a>(decls: &'a [(String, String)], name: &str) -> Option<&'a str> {
    let name = name.to_ascii_lowercase();
    decls
        .iter()
        .find(|(existing, _)| existing == &name)
        .map(|(_, value)| value.as_str())
}

pub(crate) fn set_declaration(decls: &mut Vec<(String, String)>, name: &str, value: &str) {
    let name = name.to_ascii_lowercase();
    let value = value.trim().to_string();
    if let Some(slot) = decls.iter_mut().find(|(existing, _)| existing == &name) {
        slot.1 = value;
    } else {
        decls.push((name, value));
    }
}

pub(crate) fn serialize_declarations(decls: &[(String, String)]) -> String {
    let mut out = String::new();
    for (idx, (name, value)) in decls.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push(';');
    }
    out
}

/// Parse a `<number>px` length. Bare `0` also counts.
pub(crate) fn px_length(value: &str) -> Option<f64> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    let number = value.strip_suffix("px")?.trim_end();
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_serializes_declarations() {
        let decls = parse_declarations(Some(
            "background-color: rgba(10, 10, 10, 0.98); transform: translateY(-3px)",
        ));
        assert_eq!(
            get_declaration(&decls, "background-color"),
            Some("rgba(10, 10, 10, 0.98)")
        );
        assert_eq!(
            serialize_declarations(&decls),
            "background-color: rgba(10, 10, 10, 0.98); transform: translateY(-3px);"
        );
    }

    #[test]
    fn semicolons_inside_parens_and_quotes_do_not_split() {
        let decls = parse_declarations(Some("background: url(\"a;b.png\"); color: red"));
        assert_eq!(get_declaration(&decls, "background"), Some("url(\"a;b.png\")"));
        assert_eq!(get_declaration(&decls, "color"), Some("red"));
    }

    #[test]
    fn last_write_per_property_wins() {
        let mut decls = parse_declarations(Some("color: red; color: blue"));
        assert_eq!(get_declaration(&decls, "color"), Some("blue"));
        set_declaration(&mut decls, "Color", "green");
        assert_eq!(decls.len(), 1);
        assert_eq!(get_declaration(&decls, "color"), Some("green"));
    }

    #[test]
    fn empty_and_malformed_declarations_are_skipped() {
        let decls = parse_declarations(Some("; ;no-colon; : naked ; height: 10px"));
        assert_eq!(decls.len(), 1);
        assert_eq!(get_declaration(&decls, "height"), Some("10px"));
    }

    #[test]
    fn px_lengths_parse() {
        assert_eq!(px_length("120px"), Some(120.0));
        assert_eq!(px_length(" 42.5px "), Some(42.5));
        assert_eq!(px_length("0"), Some(0.0));
        assert_eq!(px_length("12em"), None);
        assert_eq!(px_length("px"), None);
    }
}
