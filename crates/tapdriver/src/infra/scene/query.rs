//! Locator evaluation over a scene tree.
//!
//! XPath and CSS are limited to the forms test suites use against mobile
//! views: `//tag`, `//*`, `//tag[@attr='value']`, `#id`, `.class`, `tag`.

use crate::domain::{Locator, Strategy};
use crate::usecases::ports::DriverError;

use super::model::SceneNode;

/// Child indexes from the root down to a node.
pub type NodePath = Vec<usize>;

pub fn node_at<'a>(root: &'a SceneNode, path: &[usize]) -> Option<&'a SceneNode> {
    path.iter()
        .try_fold(root, |node, index| node.children.get(*index))
}

pub fn node_at_mut<'a>(root: &'a mut SceneNode, path: &[usize]) -> Option<&'a mut SceneNode> {
    path.iter()
        .try_fold(root, |node, index| node.children.get_mut(*index))
}

enum Predicate {
    Any,
    Tag(String),
    TagWithAttr {
        tag: Option<String>,
        attr: String,
        value: String,
    },
    Id(String),
    Class(String),
    Field(Strategy, String),
    ViewTag(String),
}

fn parse_xpath(expr: &str) -> Result<Predicate, DriverError> {
    let invalid = || DriverError::InvalidSelector(format!("Unsupported xpath expression: {expr}"));
    let body = expr.trim().strip_prefix("//").ok_or_else(invalid)?;
    let (tag, filter) = match body.split_once('[') {
        Some((tag, rest)) => (tag, Some(rest.strip_suffix(']').ok_or_else(invalid)?)),
        None => (body, None),
    };
    if tag.is_empty() || tag.contains('/') {
        return Err(invalid());
    }
    let tag = (tag != "*").then(|| tag.to_string());
    let Some(filter) = filter else {
        return Ok(tag.map_or(Predicate::Any, Predicate::Tag));
    };
    let (attr, value) = filter
        .strip_prefix('@')
        .and_then(|f| f.split_once('='))
        .ok_or_else(invalid)?;
    let value = value.trim();
    let value = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
        .ok_or_else(invalid)?;
    Ok(Predicate::TagWithAttr {
        tag,
        attr: attr.trim().to_string(),
        value: value.to_string(),
    })
}

fn parse_css(expr: &str) -> Result<Predicate, DriverError> {
    let expr = expr.trim();
    if let Some(id) = expr.strip_prefix('#') {
        return Ok(Predicate::Id(id.to_string()));
    }
    if let Some(class) = expr.strip_prefix('.') {
        return Ok(Predicate::Class(class.to_string()));
    }
    if !expr.is_empty() && expr.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Ok(Predicate::Tag(expr.to_string()));
    }
    Err(DriverError::InvalidSelector(format!(
        "Unsupported css selector: {expr}"
    )))
}

fn predicate(locator: &Locator) -> Result<Predicate, DriverError> {
    match locator.strategy {
        Strategy::XPath => parse_xpath(&locator.value),
        Strategy::CssSelector => parse_css(&locator.value),
        Strategy::TagName => Ok(Predicate::Tag(locator.value.clone())),
        Strategy::Id => Ok(Predicate::Id(locator.value.clone())),
        Strategy::ClassName => Ok(Predicate::Class(locator.value.clone())),
        other => Ok(Predicate::Field(other, locator.value.clone())),
    }
}

fn matches(node: &SceneNode, predicate: &Predicate) -> bool {
    let text = node.text.as_deref().unwrap_or_default();
    match predicate {
        Predicate::Any => true,
        Predicate::Tag(tag) => node.tag_name().eq_ignore_ascii_case(tag),
        Predicate::TagWithAttr { tag, attr, value } => {
            tag.as_ref()
                .is_none_or(|tag| node.tag_name().eq_ignore_ascii_case(tag))
                && node.attribute(attr).as_deref() == Some(value.as_str())
        }
        Predicate::Id(id) => node.id.as_deref() == Some(id.as_str()),
        Predicate::ViewTag(tag) => node
            .view_tag
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(tag)),
        Predicate::Class(class) => node.class.as_deref().is_some_and(|c| {
            c == class || c.rsplit('.').next() == Some(class.as_str())
        }),
        Predicate::Field(strategy, value) => match strategy {
            Strategy::Name => node.name.as_deref() == Some(value.as_str()),
            Strategy::LinkText => node.href.is_some() && text == value,
            Strategy::PartialLinkText => node.href.is_some() && text.contains(value.as_str()),
            Strategy::Text => text == value,
            Strategy::PartialText => text.contains(value.as_str()),
            Strategy::AccessibilityId => node.accessibility_id.as_deref() == Some(value.as_str()),
            _ => false,
        },
    }
}

fn walk(node: &SceneNode, path: &mut NodePath, predicate: &Predicate, out: &mut Vec<NodePath>) {
    for (index, child) in node.children.iter().enumerate() {
        path.push(index);
        if matches(child, predicate) {
            out.push(path.clone());
        }
        walk(child, path, predicate, out);
        path.pop();
    }
}

/// Paths of every descendant of `scope` (not `scope` itself) matching
/// `locator`, in document order. The tree root is searched too when
/// `scope` is empty.
pub fn find_all(root: &SceneNode, scope: &[usize], locator: &Locator) -> Result<Vec<NodePath>, DriverError> {
    Ok(collect(root, scope, &predicate(locator)?))
}

/// Paths of every node whose view tag equals `tag`, ignoring case.
pub fn find_by_view_tag(root: &SceneNode, tag: &str) -> Vec<NodePath> {
    collect(root, &[], &Predicate::ViewTag(tag.to_string()))
}

fn collect(root: &SceneNode, scope: &[usize], predicate: &Predicate) -> Vec<NodePath> {
    let Some(start) = node_at(root, scope) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if scope.is_empty() && matches(root, predicate) {
        out.push(Vec::new());
    }
    let mut path = scope.to_vec();
    walk(start, &mut path, predicate, &mut out);
    out
}

/// Deepest displayed node whose rect contains `point`.
pub fn hit_test(root: &SceneNode, point: crate::domain::Point) -> Option<NodePath> {
    fn descend(node: &SceneNode, point: crate::domain::Point, path: &mut NodePath) -> Option<NodePath> {
        for (index, child) in node.children.iter().enumerate().rev() {
            if child.displayed && child.rect.contains(point) {
                path.push(index);
                let found = descend(child, point, path).or_else(|| Some(path.clone()));
                path.pop();
                return found;
            }
        }
        None
    }
    let mut path = Vec::new();
    descend(root, point, &mut path).or_else(|| root.rect.contains(point).then(Vec::new))
}
