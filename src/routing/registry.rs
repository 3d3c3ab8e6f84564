//! Route registry and the route table that builds it.
//!
//! # Responsibilities
//! - Record every registered (pattern, methods) pair while handlers are added
//! - Produce the axum router and the frozen registry from the same table
//! - Resolve a concrete path to its registered pattern
//!
//! # Design Decisions
//! - Immutable after `RouteTable::finish` (shared via Arc, no locks)
//! - `GET` implies `HEAD`; every route answers `OPTIONS` with an `Allow` header
//! - Most specific pattern wins when several match

use axum::{
    handler::Handler,
    http::{header, Method, StatusCode},
    routing::{self, MethodRouter},
    Router,
};

use crate::error::join_methods;
use crate::routing::matcher::PathPattern;

/// A registered route and its allowed methods. The method set is never empty.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pattern: PathPattern,
    methods: Vec<Method>,
}

impl RouteEntry {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }
}

/// Frozen mapping from path pattern to allowed methods.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    entries: Vec<RouteEntry>,
}

impl RouteRegistry {
    /// Exact lookup by normalized pattern.
    pub fn get(&self, pattern: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.pattern() == pattern)
    }

    /// Resolve a concrete request path to the most specific matching route.
    pub fn resolve(&self, path: &str) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .filter_map(|entry| entry.pattern.match_path(path).map(|rank| (rank, entry)))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, entry)| entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct PendingRoute<S> {
    path: String,
    router: MethodRouter<S>,
    methods: Vec<Method>,
}

/// Collects handlers and their methods, then yields router + registry.
pub struct RouteTable<S> {
    routes: Vec<PendingRoute<S>>,
}

impl<S> Default for RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(path, Method::GET, routing::get(handler))
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(path, Method::POST, routing::post(handler))
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(path, Method::PUT, routing::put(handler))
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(path, Method::DELETE, routing::delete(handler))
    }

    fn add(mut self, path: &str, method: Method, router: MethodRouter<S>) -> Self {
        match self.routes.iter_mut().find(|r| r.path == path) {
            Some(existing) => {
                let merged = std::mem::take(&mut existing.router).merge(router);
                existing.router = merged;
                push_unique(&mut existing.methods, method);
            }
            None => self.routes.push(PendingRoute {
                path: path.to_string(),
                router,
                methods: vec![method],
            }),
        }
        self
    }

    /// Freeze the table.
    pub fn finish(self) -> (Router<S>, RouteRegistry) {
        let mut router = Router::new();
        let mut entries = Vec::with_capacity(self.routes.len());

        for route in self.routes {
            let mut methods = route.methods;
            if methods.contains(&Method::GET) {
                push_unique(&mut methods, Method::HEAD);
            }
            push_unique(&mut methods, Method::OPTIONS);

            let allow = join_methods(&methods);
            let method_router = route.router.options(move || {
                let allow = allow.clone();
                async move { (StatusCode::OK, [(header::ALLOW, allow)]) }
            });
            router = router.route(&route.path, method_router);

            entries.push(RouteEntry {
                pattern: PathPattern::parse(route.path),
                methods,
            });
        }

        tracing::debug!(
            routes = ?entries.iter().map(|e| (e.pattern(), join_methods(e.methods()))).collect::<Vec<_>>(),
            "Route registry built"
        );
        (router, RouteRegistry { entries })
    }
}

fn push_unique(methods: &mut Vec<Method>, method: Method) {
    if !methods.contains(&method) {
        methods.push(method);
    }
}
