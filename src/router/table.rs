//! Static route table and path resolution. Records are compiled once into
//! anchored patterns; `:name` segments capture a parameter and a trailing
//! `*name` segment captures the rest of the path. Redirect records are applied
//! during resolution, before any guard runs.

use super::NavigationError;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::collections::BTreeMap;
use url::Url;

const RESOLVE_BASE: &str = "http://folio.local";
const MAX_RESOLVE_REDIRECTS: usize = 8;

/// One entry of the route table as declared at startup.
#[derive(Clone, Debug, Default)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub view: Option<String>,
    pub title: Option<String>,
    pub requires_auth: bool,
    pub guest_only: bool,
    pub redirect: Option<String>,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    #[must_use]
    pub fn new(path: &str, name: &str, view: &str) -> Self {
        Self {
            path: path.to_string(),
            name: Some(name.to_string()),
            view: Some(view.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn redirect(path: &str, to: &str) -> Self {
        Self {
            path: path.to_string(),
            redirect: Some(to.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    #[must_use]
    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    #[must_use]
    pub fn guest_only(mut self) -> Self {
        self.guest_only = true;
        self
    }

    #[must_use]
    pub fn children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// Metadata of one segment of a matched route chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMeta {
    pub path: String,
    pub name: Option<String>,
    pub view: Option<String>,
    pub title: Option<String>,
    pub requires_auth: bool,
    pub guest_only: bool,
}

impl RouteMeta {
    fn from_record(record: &RouteRecord, full_path: &str) -> Self {
        Self {
            path: full_path.to_string(),
            name: record.name.clone(),
            view: record.view.clone(),
            title: record.title.clone(),
            requires_auth: record.requires_auth,
            guest_only: record.guest_only,
        }
    }
}

/// A navigation target: a path plus ordered query pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
            query: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Parses `path[?query][#hash]`; the hash is dropped.
    ///
    /// # Errors
    /// Returns `NavigationError::InvalidLocation` if the target cannot be parsed
    /// as a path relative to the client root.
    pub fn parse(target: &str) -> Result<Self, NavigationError> {
        let invalid = || NavigationError::InvalidLocation(target.to_string());
        let base = Url::parse(RESOLVE_BASE).map_err(|_| invalid())?;
        let url = base.join(target.trim()).map_err(|_| invalid())?;
        if url.origin() != base.origin() {
            return Err(invalid());
        }

        Ok(Self {
            path: normalize_path(url.path()),
            query: url
                .query_pairs()
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect(),
        })
    }

    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    /// `path` followed by the encoded query, if any.
    #[must_use]
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(key, value)| {
                if value.is_empty() {
                    encode_query_component(key)
                } else {
                    format!(
                        "{}={}",
                        encode_query_component(key),
                        encode_query_component(value)
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.path)
    }
}

/// The outcome of matching a location against the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub path: String,
    pub full_path: String,
    pub query: Vec<(String, String)>,
    pub params: BTreeMap<String, String>,
    /// Matched chain, outermost record first.
    pub matched: Vec<RouteMeta>,
    pub redirected_from: Option<String>,
}

impl ResolvedRoute {
    /// The location the router starts from before the first navigation.
    #[must_use]
    pub fn start() -> Self {
        Self {
            path: crate::paths::HOME.to_string(),
            full_path: crate::paths::HOME.to_string(),
            query: Vec::new(),
            params: BTreeMap::new(),
            matched: Vec::new(),
            redirected_from: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.matched.last().and_then(|meta| meta.name.as_deref())
    }

    #[must_use]
    pub fn view(&self) -> Option<&str> {
        self.matched.last().and_then(|meta| meta.view.as_deref())
    }

    /// Title of the innermost segment that declares one.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.matched
            .iter()
            .rev()
            .find_map(|meta| meta.title.as_deref())
    }

    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.matched.iter().any(|meta| meta.requires_auth)
    }

    #[must_use]
    pub fn guest_only(&self) -> bool {
        self.matched.iter().any(|meta| meta.guest_only)
    }
}

#[derive(Debug)]
struct CompiledRoute {
    pattern: Regex,
    param_names: Vec<String>,
    static_segments: usize,
    segments: usize,
    catch_all: bool,
    redirect: Option<String>,
    chain: Vec<RouteMeta>,
}

#[derive(Debug)]
pub struct RouteTable {
    records: Vec<RouteRecord>,
    compiled: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compiles the records, nested children included.
    ///
    /// # Errors
    /// Returns `NavigationError::InvalidRoute` if a record path does not compile.
    pub fn new(records: Vec<RouteRecord>) -> Result<Self, NavigationError> {
        let mut compiled = Vec::new();
        for record in &records {
            compile_record(record, "", &[], &mut compiled)?;
        }

        // Most specific first; declaration order breaks ties.
        compiled.sort_by(|a, b| {
            a.catch_all
                .cmp(&b.catch_all)
                .then(b.static_segments.cmp(&a.static_segments))
                .then(b.segments.cmp(&a.segments))
        });

        Ok(Self { records, compiled })
    }

    #[must_use]
    pub fn records(&self) -> &[RouteRecord] {
        &self.records
    }

    /// Matches a location, following redirect records.
    ///
    /// # Errors
    /// Returns `NavigationError::NotFound` when nothing matches, or
    /// `NavigationError::RedirectLoop` when redirect records do not settle.
    pub fn resolve(&self, location: &Location) -> Result<ResolvedRoute, NavigationError> {
        let mut current = location.clone();
        let mut redirected_from = None;

        for _ in 0..=MAX_RESOLVE_REDIRECTS {
            let (route, params) = self
                .find(&current.path)
                .ok_or_else(|| NavigationError::NotFound(current.full_path()))?;

            if let Some(target) = &route.redirect {
                let mut next = Location::parse(target)?;
                if next.query.is_empty() {
                    next.query.clone_from(&current.query);
                }
                if redirected_from.is_none() {
                    redirected_from = Some(current.full_path());
                }
                current = next;
                continue;
            }

            return Ok(ResolvedRoute {
                path: current.path.clone(),
                full_path: current.full_path(),
                query: current.query.clone(),
                params,
                matched: route.chain.clone(),
                redirected_from,
            });
        }

        Err(NavigationError::RedirectLoop(location.full_path()))
    }

    fn find(&self, path: &str) -> Option<(&CompiledRoute, BTreeMap<String, String>)> {
        self.compiled.iter().find_map(|route| {
            let captures = route.pattern.captures(path)?;
            let params = route
                .param_names
                .iter()
                .enumerate()
                .filter_map(|(index, name)| {
                    captures
                        .get(index + 1)
                        .map(|value| (name.clone(), value.as_str().to_string()))
                })
                .collect();
            Some((route, params))
        })
    }
}

fn compile_record(
    record: &RouteRecord,
    parent_path: &str,
    parent_chain: &[RouteMeta],
    out: &mut Vec<CompiledRoute>,
) -> Result<(), NavigationError> {
    let full_path = join_paths(parent_path, &record.path);
    let mut chain = parent_chain.to_vec();
    chain.push(RouteMeta::from_record(record, &full_path));

    let mut pattern = String::from("^");
    let mut param_names = Vec::new();
    let mut static_segments = 0;
    let mut catch_all = false;
    let segments: Vec<&str> = full_path.split('/').filter(|s| !s.is_empty()).collect();

    for (index, segment) in segments.iter().enumerate() {
        if let Some(name) = segment.strip_prefix('*') {
            if index + 1 != segments.len() {
                return Err(NavigationError::InvalidRoute(full_path.clone()));
            }
            // Swallows the slash so `/*any` also matches `/`.
            pattern.push_str("(?:/(.*))?");
            let name = if name.is_empty() { "any" } else { name };
            param_names.push(name.to_string());
            catch_all = true;
        } else if let Some(name) = segment.strip_prefix(':') {
            if name.is_empty() {
                return Err(NavigationError::InvalidRoute(full_path.clone()));
            }
            pattern.push_str("/([^/]+)");
            param_names.push(name.to_string());
        } else {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
            static_segments += 1;
        }
    }
    if segments.is_empty() {
        pattern.push('/');
    }
    pattern.push('$');

    let compiled = Regex::new(&pattern)
        .map_err(|_| NavigationError::InvalidRoute(full_path.clone()))?;

    for child in &record.children {
        compile_record(child, &full_path, &chain, out)?;
    }

    out.push(CompiledRoute {
        pattern: compiled,
        param_names,
        static_segments,
        segments: segments.len(),
        catch_all,
        redirect: record.redirect.clone(),
        chain,
    });

    Ok(())
}

/// Absolute child paths replace the parent; relative ones are appended.
fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') || parent.is_empty() {
        normalize_path(child)
    } else {
        normalize_path(&format!("{}/{child}", parent.trim_end_matches('/')))
    }
}

/// Leading slash, no trailing slash (except for the root).
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Query bytes left readable: unreserved characters plus the path-like
/// sub-delimiters, so `redirect=/blog/new` stays as written.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/')
    .remove(b':')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b',')
    .remove(b';')
    .remove(b'?');

fn encode_query_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}
