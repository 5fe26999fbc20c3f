//! Minimal HTML parser.
//!
//! Enough to build fixture documents: elements with attributes, text,
//! comments, a doctype, void and self-closing elements, raw-text
//! `<script>`/`<style>` bodies, and a small character-reference set.
//! Unclosed or mismatched markup is an error, not a recovery exercise —
//! fixtures are under the caller's control.

use std::collections::HashMap;

use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(crate) fn parse_document(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let root = dom.root();
    parse_into(&mut dom, root, html)?;
    Ok(dom)
}

/// Parse a fragment and append its nodes under `parent`.
pub(crate) fn parse_into(dom: &mut Dom, parent: NodeId, html: &str) -> Result<()> {
    let chars = html.chars().collect::<Vec<_>>();
    let mut open_stack = vec![parent];
    let mut i = 0usize;

    while i < chars.len() {
        let current = *open_stack.last().unwrap_or(&parent);
        if chars[i] == '<' {
            if rest_starts_with(&chars, i, "<!--") {
                let end = find_sub(&chars, i + 4, "-->")
                    .ok_or_else(|| Error::HtmlParse("unterminated comment".to_string()))?;
                i = end + 3;
            } else if rest_starts_with(&chars, i, "<!") {
                let end = chars[i..]
                    .iter()
                    .position(|c| *c == '>')
                    .ok_or_else(|| Error::HtmlParse("unterminated declaration".to_string()))?;
                i += end + 1;
            } else if rest_starts_with(&chars, i, "</") {
                let end = chars[i..]
                    .iter()
                    .position(|c| *c == '>')
                    .ok_or_else(|| Error::HtmlParse("unterminated closing tag".to_string()))?
                    + i;
                let name = chars[i + 2..end]
                    .iter()
                    .collect::<String>()
                    .trim()
                    .to_ascii_lowercase();
                let Some(depth) = open_stack
                    .iter()
                    .skip(1)
                    .rposition(|node| dom.tag_name(*node) == Some(name.as_str()))
                else {
                    return Err(Error::HtmlParse(format!("unexpected closing tag: {name}")));
                };
                open_stack.truncate(depth + 1);
                i = end + 1;
            } else {
                let (node, tag, consumed) = parse_open_tag(dom, current, &chars, i)?;
                i = consumed;
                if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                    if let Some(node) = node {
                        let close = format!("</{tag}");
                        let body_end = find_sub(&chars, i, &close).ok_or_else(|| {
                            Error::HtmlParse(format!("unterminated raw text element: {tag}"))
                        })?;
                        let body = chars[i..body_end].iter().collect::<String>();
                        if !body.is_empty() {
                            dom.create_text(node, body);
                        }
                        let end = chars[body_end..]
                            .iter()
                            .position(|c| *c == '>')
                            .ok_or_else(|| {
                                Error::HtmlParse("unterminated closing tag".to_string())
                            })?
                            + body_end;
                        i = end + 1;
                    }
                } else if let Some(node) = node {
                    open_stack.push(node);
                }
            }
        } else {
            let start = i;
            while i < chars.len() && chars[i] != '<' {
                i += 1;
            }
            let text = chars[start..i].iter().collect::<String>();
            if !text.trim().is_empty() {
                dom.create_text(current, decode_entities(&text));
            }
        }
    }

    if open_stack.len() > 1 {
        let open = open_stack
            .iter()
            .skip(1)
            .filter_map(|node| dom.tag_name(*node))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(Error::HtmlParse(format!("unclosed elements: {open}")));
    }
    Ok(())
}

/// Returns the element id for container tags (None when the tag closed
/// itself), the lowercased tag name, and the index just past `>`.
fn parse_open_tag(
    dom: &mut Dom,
    parent: NodeId,
    chars: &[char],
    start: usize,
) -> Result<(Option<NodeId>, String, usize)> {
    let mut i = start + 1;
    let name_start = i;
    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '-') {
        i += 1;
    }
    if i == name_start {
        return Err(Error::HtmlParse("malformed tag".to_string()));
    }
    let tag = chars[name_start..i]
        .iter()
        .collect::<String>()
        .to_ascii_lowercase();

    let mut attrs = HashMap::new();
    let mut self_closing = false;
    loop {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        match chars.get(i) {
            None => return Err(Error::HtmlParse(format!("unterminated tag: {tag}"))),
            Some('>') => {
                i += 1;
                break;
            }
            Some('/') => {
                self_closing = true;
                i += 1;
            }
            Some(_) => {
                let attr_start = i;
                while i < chars.len() && !chars[i].is_whitespace() && !"=/>".contains(chars[i]) {
                    i += 1;
                }
                if i == attr_start {
                    return Err(Error::HtmlParse(format!("malformed attribute in <{tag}>")));
                }
                let name = chars[attr_start..i]
                    .iter()
                    .collect::<String>()
                    .to_ascii_lowercase();
                while i < chars.len() && chars[i].is_whitespace() {
                    i += 1;
                }
                let value = if chars.get(i) == Some(&'=') {
                    i += 1;
                    while i < chars.len() && chars[i].is_whitespace() {
                        i += 1;
                    }
                    match chars.get(i) {
                        Some(&q) if q == '"' || q == '\'' => {
                            i += 1;
                            let value_start = i;
                            while i < chars.len() && chars[i] != q {
                                i += 1;
                            }
                            if i >= chars.len() {
                                return Err(Error::HtmlParse(format!(
                                    "unterminated attribute value in <{tag}>"
                                )));
                            }
                            let value = chars[value_start..i].iter().collect::<String>();
                            i += 1;
                            value
                        }
                        _ => {
                            let value_start = i;
                            while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '>' {
                                i += 1;
                            }
                            chars[value_start..i].iter().collect::<String>()
                        }
                    }
                } else {
                    String::new()
                };
                attrs.entry(name).or_insert_with(|| decode_entities(&value));
            }
        }
    }

    let node = dom.create_element(parent, tag.clone(), attrs);
    if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
        Ok((None, tag, i))
    } else {
        Ok((Some(node), tag, i))
    }
}

fn rest_starts_with(chars: &[char], at: usize, needle: &str) -> bool {
    let mut idx = at;
    for expected in needle.chars() {
        if chars.get(idx) != Some(&expected) {
            return false;
        }
        idx += 1;
    }
    true
}

fn find_sub(chars: &[char], from: usize, needle: &str) -> Option<usize> {
    let needle_chars = needle.chars().collect::<Vec<_>>();
    if needle_chars.is_empty() {
        return Some(from);
    }
    let mut i = from;
    while i + needle_chars.len() <= chars.len() {
        if chars[i..i + needle_chars.len()]
            .iter()
            .zip(&needle_chars)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn decode_entities(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }
    let mut out = String::with_capacity(src.len());
    let chars = src.chars().collect::<Vec<_>>();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] == '&' {
            if let Some(semi) = chars[i..].iter().take(10).position(|c| *c == ';') {
                let entity = chars[i + 1..i + semi].iter().collect::<String>();
                if let Some(decoded) = decode_entity(&entity) {
                    out.push(decoded);
                    i += semi + 1;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let body = entity.strip_prefix('#')?;
            let code = if let Some(hex) = body.strip_prefix('x').or_else(|| body.strip_prefix('X'))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                body.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
