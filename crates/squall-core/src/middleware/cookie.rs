//! Cookie helpers
//!
//! Serialize Set-Cookie headers and parse the request Cookie header. The
//! [`Cookies`] middleware publishes the parsed jar into the request bag
//! under `"cookies"`.

use crate::matcher::PathMatch;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Handler, HandlerFuture};
use crate::uri::{percent_decode, percent_encode};
use std::collections::HashMap;
use std::time::SystemTime;

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// HTTP cookie
///
/// The value is percent-encoded on serialization and decoded on parse.
#[derive(Debug, Clone)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<SystemTime>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn expires(mut self, at: SystemTime) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Serialize to a Set-Cookie header value
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, percent_encode(&self.value))];

        if let Some(ref domain) = self.domain {
            parts.push(format!("Domain={domain}"));
        }
        if let Some(ref path) = self.path {
            parts.push(format!("Path={path}"));
        }
        if let Some(expires) = self.expires {
            parts.push(format!("Expires={}", httpdate::fmt_http_date(expires)));
        }
        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={max_age}"));
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if let Some(same_site) = self.same_site {
            parts.push(format!("SameSite={}", same_site.as_str()));
        }

        parts.join("; ")
    }

    /// A deletion cookie (Max-Age=0)
    pub fn delete(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age(0)
    }
}

/// Parsed request cookies
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    /// Parse a Cookie header value
    pub fn parse(header: &str) -> Self {
        let mut jar = Self::default();
        for part in header.split(';') {
            if let Some((name, value)) = part.trim().split_once('=') {
                jar.cookies
                    .insert(name.trim().to_string(), percent_decode(value.trim()));
            }
        }
        jar
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Middleware publishing the parsed jar into the request bag
pub struct Cookies;

impl Handler for Cookies {
    fn call<'a>(
        &'a self,
        _matched: &'a PathMatch,
        req: &'a mut Request,
        _res: &'a mut Response,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let jar = req
                .header("cookie")
                .map(CookieJar::parse)
                .unwrap_or_default();
            req.bag.insert("cookies", jar);
            Ok(true)
        })
    }
}
