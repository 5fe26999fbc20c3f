//! Reduced selector engine.
//!
//! Supports what a static page's bindings actually select with: tag,
//! `#id`, `.class`, `[attr]` / `[attr=value]`, compound steps, and
//! descendant / child combinators. Anything else is rejected as
//! `UnsupportedSelector` rather than silently matching nothing.

use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrCondition>,
}

impl SelectorStep {
    fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to the previous (left) part; None on the first part.
    pub(crate) combinator: Option<Combinator>,
}

pub(crate) fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }

    let mut parts: Vec<SelectorPart> = Vec::new();
    let mut pending: Option<Combinator> = None;
    for token in tokenize(trimmed) {
        if token == ">" {
            if pending.is_some() || parts.is_empty() {
                return Err(Error::UnsupportedSelector(selector.to_string()));
            }
            pending = Some(Combinator::Child);
            continue;
        }
        let step = parse_step(&token)
            .ok_or_else(|| Error::UnsupportedSelector(selector.to_string()))?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(SelectorPart { step, combinator });
    }
    if pending.is_some() || parts.is_empty() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(parts)
}

fn tokenize(selector: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    for ch in selector.chars() {
        match ch {
            '[' => {
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                in_brackets = false;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_brackets => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '>' if !in_brackets => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".to_string());
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn parse_step(token: &str) -> Option<SelectorStep> {
    let mut step = SelectorStep::default();
    let chars = token.chars().collect::<Vec<_>>();
    let mut i = 0usize;

    if i < chars.len() && chars[i] == '*' {
        step.universal = true;
        i += 1;
    } else if i < chars.len() && chars[i].is_ascii_alphabetic() {
        let start = i;
        while i < chars.len() && is_name_char(chars[i]) {
            i += 1;
        }
        step.tag = Some(
            chars[start..i]
                .iter()
                .collect::<String>()
                .to_ascii_lowercase(),
        );
    }

    while i < chars.len() {
        match chars[i] {
            '#' | '.' => {
                let marker = chars[i];
                i += 1;
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                if i == start {
                    return None;
                }
                let name = chars[start..i].iter().collect::<String>();
                if marker == '#' {
                    if step.id.is_some() {
                        return None;
                    }
                    step.id = Some(name);
                } else {
                    step.classes.push(name);
                }
            }
            '[' => {
                let close = chars[i..].iter().position(|c| *c == ']')? + i;
                let body = chars[i + 1..close].iter().collect::<String>();
                step.attrs.push(parse_attr_condition(body.trim())?);
                i = close + 1;
            }
            _ => return None,
        }
    }

    if !step.universal
        && step.tag.is_none()
        && step.id.is_none()
        && step.classes.is_empty()
        && step.attrs.is_empty()
    {
        return None;
    }
    Some(step)
}

fn parse_attr_condition(body: &str) -> Option<AttrCondition> {
    if body.is_empty() {
        return None;
    }
    let Some(eq) = body.find('=') else {
        if !body.chars().all(is_name_char) {
            return None;
        }
        return Some(AttrCondition::Exists {
            key: body.to_ascii_lowercase(),
        });
    };
    let key = body[..eq].trim();
    if key.is_empty() || !key.chars().all(is_name_char) {
        return None;
    }
    let mut value = body[eq + 1..].trim();
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }
    Some(AttrCondition::Eq {
        key: key.to_ascii_lowercase(),
        value: value.to_string(),
    })
}

pub(crate) fn matches_step(dom: &Dom, node: NodeId, step: &SelectorStep) -> bool {
    let Some(tag) = dom.tag_name(node) else {
        return false;
    };
    if let Some(expected) = &step.tag {
        if !tag.eq_ignore_ascii_case(expected) {
            return false;
        }
    }
    if let Some(id) = &step.id {
        if dom.attr(node, "id") != Some(id.as_str()) {
            return false;
        }
    }
    if !step.classes.iter().all(|class| dom.has_class(node, class)) {
        return false;
    }
    step.attrs.iter().all(|condition| match condition {
        AttrCondition::Exists { key } => dom.attr(node, key).is_some(),
        AttrCondition::Eq { key, value } => dom.attr(node, key) == Some(value.as_str()),
    })
}

fn matches_chain(dom: &Dom, node: NodeId, parts: &[SelectorPart]) -> bool {
    let Some((last, prefix)) = parts.split_last() else {
        return false;
    };
    if !matches_step(dom, node, &last.step) {
        return false;
    }
    if prefix.is_empty() {
        return true;
    }
    match last.combinator {
        Some(Combinator::Child) => dom
            .parent(node)
            .map(|parent| matches_chain(dom, parent, prefix))
            .unwrap_or(false),
        Some(Combinator::Descendant) | None => {
            let mut cursor = dom.parent(node);
            while let Some(ancestor) = cursor {
                if matches_chain(dom, ancestor, prefix) {
                    return true;
                }
                cursor = dom.parent(ancestor);
            }
            false
        }
    }
}

pub(crate) fn select_all(dom: &Dom, selector: &str) -> Result<Vec<NodeId>> {
    let parts = parse_selector_chain(selector)?;
    if parts.len() == 1 {
        if let Some(id) = parts[0].step.id_only() {
            return Ok(dom.element_by_id(id).into_iter().collect());
        }
    }
    Ok(dom
        .elements()
        .into_iter()
        .filter(|node| matches_chain(dom, *node, &parts))
        .collect())
}

pub(crate) fn select_one(dom: &Dom, selector: &str) -> Result<NodeId> {
    select_all(dom, selector)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
}
