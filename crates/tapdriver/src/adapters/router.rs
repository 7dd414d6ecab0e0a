//! Method + URI-template routing.
//!
//! Registration order is the priority order: the first template that matches
//! wins. The table is built once at startup and only read afterwards.

use std::collections::HashMap;
use std::fmt;

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Every command lives below this prefix.
pub const URL_PREFIX: &str = "/wd/hub";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// `/session/:sessionId/element/:id/click` style template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Self {
        let segments = template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        Self {
            raw: template.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn match_segments(&self, path: &[String], exact: bool) -> Option<PathParams> {
        if path.len() < self.segments.len() || (exact && path.len() != self.segments.len()) {
            return None;
        }
        let mut params = PathParams::default();
        for (segment, value) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.0.insert(name.clone(), value.clone());
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Named segments extracted from a matched URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("path is outside {URL_PREFIX}")]
    OutsidePrefix,
    #[error("malformed path: {0}")]
    Malformed(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("no command matches {method} {path}")]
    NoRoute { method: String, path: String },
}

#[derive(Debug, Clone)]
pub struct Route<H> {
    pub method: HttpMethod,
    pub template: UriTemplate,
    pub handler: H,
}

#[derive(Debug)]
pub struct Resolved<'a, H> {
    pub method: HttpMethod,
    pub handler: &'a H,
    pub params: PathParams,
}

#[derive(Debug, Clone)]
pub struct CommandRouter<H> {
    routes: Vec<Route<H>>,
    fallback: Option<(UriTemplate, H)>,
}

impl<H> Default for CommandRouter<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            fallback: None,
        }
    }
}

impl<H> CommandRouter<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: HttpMethod, template: &str, handler: H) -> &mut Self {
        self.routes.push(Route {
            method,
            template: UriTemplate::parse(template),
            handler,
        });
        self
    }

    /// Handler for paths that start with `prefix` but match nothing else.
    pub fn fallback(&mut self, prefix: &str, handler: H) -> &mut Self {
        self.fallback = Some((UriTemplate::parse(prefix), handler));
        self
    }

    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }

    pub fn resolve(&self, method: &str, uri: &str) -> Result<Resolved<'_, H>, NotFound> {
        let method =
            HttpMethod::parse(method).ok_or_else(|| NotFound::UnsupportedMethod(method.to_string()))?;
        let path = split_path(uri)?;

        for route in &self.routes {
            if route.method != method {
                continue;
            }
            if let Some(params) = route.template.match_segments(&path, true) {
                return Ok(Resolved {
                    method,
                    handler: &route.handler,
                    params,
                });
            }
        }

        if let Some((prefix, handler)) = &self.fallback {
            if path.len() > prefix.segments.len() {
                if let Some(params) = prefix.match_segments(&path, false) {
                    return Ok(Resolved {
                        method,
                        handler,
                        params,
                    });
                }
            }
        }

        Err(NotFound::NoRoute {
            method: method.to_string(),
            path: uri.to_string(),
        })
    }
}

/// Strips prefix, query and fragment, then percent-decodes each segment.
fn split_path(uri: &str) -> Result<Vec<String>, NotFound> {
    let path = uri.split(['?', '#']).next().unwrap_or_default();
    let rest = path.strip_prefix(URL_PREFIX).ok_or(NotFound::OutsidePrefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return Err(NotFound::OutsidePrefix);
    }
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    rest.split('/')
        .map(|segment| {
            if segment.is_empty() {
                return Err(NotFound::Malformed(uri.to_string()));
            }
            percent_decode(segment).ok_or_else(|| NotFound::Malformed(uri.to_string()))
        })
        .collect()
}

fn percent_decode(segment: &str) -> Option<String> {
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    (!decoded.is_empty()).then(|| decoded.into_owned())
}
