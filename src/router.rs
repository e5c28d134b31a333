//! Path routing: raw request path to resource, id and parent id.
//!
//! Any context prefix in front of the meaningful path is skipped: the api pack,
//! an optional version after it, a bare leading version, or an arbitrary run of
//! segments ending in one of those.

use crate::config::{ResolvedModel, RESERVED_SEGMENTS};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const OPENAPI_SEGMENT: &str = "openapi.json";
pub const DOC_SEGMENT: &str = "doc";

/// Resolved target of one request. Consumed once by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteContext {
    /// Index into the model's resources.
    pub resource: usize,
    pub resource_path: String,
    pub id: Option<String>,
    pub parent_id: Option<String>,
    pub parent_id_param: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    OpenApi,
    Doc,
    Resource(RouteContext),
}

fn version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[vV]\d+(?:\.\d+)*|\d+|\d+\.\d+.*)$").expect("static pattern"))
}

pub fn is_version(segment: &str) -> bool {
    version_pattern().is_match(segment)
}

/// Static routing table built once from the resolved model.
#[derive(Clone, Debug)]
pub struct PathRouter {
    api_pack: String,
    case_sensitive: bool,
    index: HashMap<String, usize>,
    paths: Vec<String>,
    parent_of: Vec<Option<usize>>,
    parent_params: Vec<Option<String>>,
}

impl PathRouter {
    pub fn new(model: &ResolvedModel) -> Self {
        let paths: Vec<String> = model.resources.iter().map(|r| r.resource_path.clone()).collect();
        let parent_of = model
            .resources
            .iter()
            .map(|r| {
                r.parent
                    .as_ref()
                    .and_then(|p| model.resource_by_path.get(&model.path_key(&p.resource)).copied())
            })
            .collect();
        let parent_params = model
            .resources
            .iter()
            .map(|r| r.parent.as_ref().map(|p| p.parent_id_param.clone()))
            .collect();
        PathRouter {
            api_pack: model.api_pack.clone(),
            case_sensitive: model.case_sensitive,
            index: model.resource_by_path.clone(),
            paths,
            parent_of,
            parent_params,
        }
    }

    fn lookup(&self, segment: &str) -> Option<usize> {
        if self.case_sensitive {
            self.index.get(segment).copied()
        } else {
            self.index.get(&segment.to_lowercase()).copied()
        }
    }

    fn reserved(&self, segment: &str) -> Option<Route> {
        let eq = |a: &str, b: &str| {
            if self.case_sensitive {
                a == b
            } else {
                a.eq_ignore_ascii_case(b)
            }
        };
        if eq(segment, OPENAPI_SEGMENT) {
            Some(Route::OpenApi)
        } else if eq(segment, DOC_SEGMENT) {
            Some(Route::Doc)
        } else {
            None
        }
    }

    fn is_known(&self, segment: &str) -> bool {
        self.lookup(segment).is_some() || RESERVED_SEGMENTS.iter().any(|r| r.eq_ignore_ascii_case(segment))
    }

    fn is_pack(&self, segment: &str) -> bool {
        segment.eq_ignore_ascii_case(&self.api_pack)
    }

    /// Index of the first meaningful segment.
    fn start_offset(&self, segs: &[&str]) -> usize {
        let after_pack = |i: usize| match segs.get(i + 1) {
            Some(next) if is_version(next) && !self.is_known(next) => i + 2,
            _ => i + 1,
        };
        match segs.first() {
            None => 0,
            Some(first) if self.is_known(first) => 0,
            Some(first) if self.is_pack(first) => after_pack(0),
            Some(first) if is_version(first) => 1,
            Some(_) => {
                for i in 1..segs.len() {
                    let s = segs[i];
                    if self.is_known(s) {
                        return i;
                    }
                    if self.is_pack(s) {
                        return after_pack(i);
                    }
                    if is_version(s) && i + 1 < segs.len() {
                        return i + 1;
                    }
                }
                0
            }
        }
    }

    pub fn resolve(&self, path: &str) -> Option<Route> {
        let segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let offset = self.start_offset(&segs);
        let s = segs.get(offset..)?;
        let first = *s.first()?;

        if let Some(marker) = self.reserved(first) {
            return (s.len() == 1).then_some(marker);
        }
        let resource = self.lookup(first)?;
        let route = match s {
            [_] => self.context(resource, None, None),
            [_, second] => match self.reserved(second) {
                Some(marker) => return Some(marker),
                None => self.context(resource, Some(*second), None),
            },
            [_, parent_id, child, rest @ ..] if rest.len() <= 1 => {
                if rest.is_empty() {
                    if let Some(marker) = self.reserved(child) {
                        return Some(marker);
                    }
                }
                let child = self.lookup(child)?;
                if self.parent_of[child] != Some(resource) {
                    return None;
                }
                self.context(child, rest.first().copied(), Some(*parent_id))
            }
            _ => return None,
        };
        tracing::debug!(
            path = %path,
            resource = %route.resource_path,
            id = ?route.id,
            parent_id = ?route.parent_id,
            "route resolved"
        );
        Some(Route::Resource(route))
    }

    fn context(&self, resource: usize, id: Option<&str>, parent_id: Option<&str>) -> RouteContext {
        RouteContext {
            resource,
            resource_path: self.paths[resource].clone(),
            id: id.filter(|s| !s.is_empty()).map(str::to_string),
            parent_id: parent_id.map(str::to_string),
            parent_id_param: parent_id.and(self.parent_params[resource].clone()),
        }
    }
}
