//! Request routing
//!
//! A router is an ordered list of rules `(method, pattern, endpoint)`
//! evaluated in insertion order. An endpoint is either a callback or a
//! nested sub-router; callbacks return `true` to continue the chain and
//! `false` to short-circuit it. A sub-router selected through a wildcard
//! rule re-dispatches against the captured remainder.

use crate::error::Result;
use crate::matcher::{PathMatch, PathPattern};
use crate::request::{Method, Request};
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by handlers: `true` continues the chain
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

/// A routing callback
///
/// Middleware types implement this directly; plain functions go through
/// [`handler_fn`].
pub trait Handler: Send + Sync {
    fn call<'a>(
        &'a self,
        matched: &'a PathMatch,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> HandlerFuture<'a>;
}

/// Adapter turning a function into a [`Handler`]
pub struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a PathMatch, &'a mut Request, &'a mut Response) -> HandlerFuture<'a>
        + Send
        + Sync,
{
    fn call<'a>(
        &'a self,
        matched: &'a PathMatch,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> HandlerFuture<'a> {
        (self.0)(matched, req, res)
    }
}

/// Wrap a function with the handler signature.
///
/// ```ignore
/// fn hello<'a>(m: &'a PathMatch, req: &'a mut Request, res: &'a mut Response) -> HandlerFuture<'a> {
///     Box::pin(async move { res.text("hi").await?; Ok(true) })
/// }
/// router.get("/hello", handler_fn(hello))?;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a PathMatch, &'a mut Request, &'a mut Response) -> HandlerFuture<'a>
        + Send
        + Sync,
{
    HandlerFn(f)
}

/// What a rule dispatches to
pub enum Endpoint {
    Handler(Box<dyn Handler>),
    Router(Router),
}

struct Rule {
    method: Option<Method>,
    pattern: PathPattern,
    endpoint: Endpoint,
}

/// Tree of ordered routing rules
#[derive(Default)]
pub struct Router {
    rules: Vec<Rule>,
}

/// Collapse `/` runs and strip a trailing slash (the root keeps its `/`)
pub fn normalize_dispatch_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len().max(1));
    out.push('/');
    let mut prev_slash = true;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

impl Router {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule. `None` as the method matches every method.
    pub fn register(
        &mut self,
        method: Option<Method>,
        pattern: &str,
        endpoint: Endpoint,
    ) -> Result<()> {
        let pattern = PathPattern::compile(pattern)?;
        self.rules.push(Rule {
            method,
            pattern,
            endpoint,
        });
        Ok(())
    }

    /// Register a callback for one method
    pub fn route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler + 'static,
    ) -> Result<()> {
        self.register(Some(method), pattern, Endpoint::Handler(Box::new(handler)))
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.route(Method::Get, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.route(Method::Put, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.route(Method::Post, pattern, handler)
    }

    pub fn head(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.route(Method::Head, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.route(Method::Delete, pattern, handler)
    }

    pub fn connect(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.route(Method::Connect, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.route(Method::Options, pattern, handler)
    }

    pub fn trace(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.route(Method::Trace, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.route(Method::Patch, pattern, handler)
    }

    /// Register a callback for any method
    pub fn any(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<()> {
        self.register(None, pattern, Endpoint::Handler(Box::new(handler)))
    }

    /// Register a middleware callback: any method, every path
    pub fn middleware(&mut self, handler: impl Handler + 'static) -> Result<()> {
        self.any("*", handler)
    }

    /// Mount a sub-router under a pattern (any method).
    ///
    /// With a trailing wildcard the sub-router dispatches against the
    /// captured remainder; otherwise it sees the original path.
    pub fn mount(&mut self, pattern: &str, router: Router) -> Result<()> {
        self.register(None, pattern, Endpoint::Router(router))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Dispatch a request through the rule list.
    pub async fn handle(&self, req: &mut Request, res: &mut Response) -> Result<()> {
        let path = normalize_dispatch_path(req.path());
        self.dispatch(&path, req, res).await?;
        Ok(())
    }

    /// Dispatch with an explicit path overriding the request URI, for
    /// virtual-host style middleware.
    pub async fn handle_with_path(
        &self,
        path: &str,
        req: &mut Request,
        res: &mut Response,
    ) -> Result<()> {
        let path = normalize_dispatch_path(path);
        self.dispatch(&path, req, res).await?;
        Ok(())
    }

    /// Walk rules in order; `Ok(false)` means a callback short-circuited.
    fn dispatch<'a>(
        &'a self,
        path: &'a str,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            for rule in &self.rules {
                if !method_matches(rule.method, req.method) {
                    continue;
                }
                let Some(matched) = rule.pattern.matches(path) else {
                    continue;
                };
                match &rule.endpoint {
                    Endpoint::Handler(handler) => {
                        if !handler.call(&matched, &mut *req, &mut *res).await? {
                            return Ok(false);
                        }
                    }
                    Endpoint::Router(sub) => {
                        let sub_path = match &matched.remainder {
                            Some(rest) => format!("/{rest}"),
                            None => path.to_string(),
                        };
                        if !sub.dispatch(&sub_path, &mut *req, &mut *res).await? {
                            return Ok(false);
                        }
                    }
                }
            }
            Ok(true)
        })
    }
}

/// Wildcard, exact match, or the HEAD→GET alias
fn method_matches(rule: Option<Method>, request: Method) -> bool {
    match rule {
        None => true,
        Some(m) if m == request => true,
        Some(Method::Get) => request == Method::Head,
        Some(_) => false,
    }
}
