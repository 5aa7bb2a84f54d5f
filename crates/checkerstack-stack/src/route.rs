//! HTTP API route keys, parsed with `nom`.
//!
//! A route key is `<METHOD> <path>`. Path segments are literals,
//! `{param}` placeholders, or a greedy `{param+}` that must come last.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use checkerstack_common::error::{Result, StackError};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{alpha1, char},
    combinator::{all_consuming, map, opt},
    multi::many1,
    sequence::{delimited, preceded, separated_pair},
};

/// HTTP method of a route. `Any` matches every method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Any method.
    Any,
    /// `GET`.
    Get,
    /// `POST`.
    Post,
    /// `PUT`.
    Put,
    /// `PATCH`.
    Patch,
    /// `DELETE`.
    Delete,
    /// `HEAD`.
    Head,
    /// `OPTIONS`.
    Options,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Any => "ANY",
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        };
        f.write_str(s)
    }
}

impl FromStr for HttpMethod {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ANY" => Ok(Self::Any),
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(route_err(format!("unknown HTTP method: {other:?}"))),
        }
    }
}

/// One segment of a route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Fixed text.
    Literal(String),
    /// `{name}`: matches exactly one segment.
    Param(String),
    /// `{name+}`: matches the rest of the path.
    Greedy(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{s}"),
            Self::Param(name) => write!(f, "{{{name}}}"),
            Self::Greedy(name) => write!(f, "{{{name}+}}"),
        }
    }
}

/// A parsed route path. The root path `/` has no segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath {
    segments: Vec<Segment>,
}

impl RoutePath {
    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true if the path ends in a greedy parameter and has no
    /// fixed text, so it matches every request path.
    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::Greedy(_)])
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for RoutePath {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        parse_path(s)
    }
}

/// Method and path of a route, e.g. `ANY /{proxy+}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteKey {
    /// HTTP method.
    pub method: HttpMethod,
    /// Route path.
    pub path: RoutePath,
}

impl RouteKey {
    /// Returns true if the key matches every method and every path.
    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        self.method == HttpMethod::Any && self.path.is_catch_all()
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

impl FromStr for RouteKey {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        parse_route_key(s)
    }
}

const fn route_err(message: String) -> StackError {
    StackError::Config { message }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_literal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

fn param(input: &str) -> IResult<&str, Segment> {
    let (input, (name, greedy)) =
        delimited(char('{'), (take_while1(is_name_char), opt(char('+'))), char('}'))
            .parse(input)?;
    let segment = if greedy.is_some() {
        Segment::Greedy(name.to_string())
    } else {
        Segment::Param(name.to_string())
    };
    Ok((input, segment))
}

fn literal(input: &str) -> IResult<&str, Segment> {
    map(take_while1(is_literal_char), |s: &str| {
        Segment::Literal(s.to_string())
    })
    .parse(input)
}

fn segments(input: &str) -> IResult<&str, Vec<Segment>> {
    many1(preceded(char('/'), alt((param, literal)))).parse(input)
}

fn path(input: &str) -> IResult<&str, Vec<Segment>> {
    alt((segments, map(char('/'), |_| Vec::new()))).parse(input)
}

fn check_segments(segments: Vec<Segment>, raw: &str) -> Result<RoutePath> {
    let mut names = HashSet::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Literal(_) => {}
            Segment::Param(name) | Segment::Greedy(name) => {
                if !names.insert(name.as_str()) {
                    return Err(route_err(format!(
                        "duplicate path parameter {name:?} in {raw:?}"
                    )));
                }
            }
        }
        if matches!(segment, Segment::Greedy(_)) && i + 1 != segments.len() {
            return Err(route_err(format!(
                "greedy parameter must be the last segment in {raw:?}"
            )));
        }
    }
    Ok(RoutePath { segments })
}

/// Parses a route path such as `/{proxy+}` or `/essays/{id}`.
///
/// # Errors
///
/// Returns an error on malformed syntax, a greedy parameter that is not
/// last, or a repeated parameter name.
pub fn parse_path(input: &str) -> Result<RoutePath> {
    let (_, segments) = all_consuming(path)
        .parse(input)
        .map_err(|e| route_err(format!("invalid route path {input:?}: {e}")))?;
    check_segments(segments, input)
}

/// Parses a route key such as `ANY /{proxy+}`.
///
/// # Errors
///
/// Returns an error on an unknown method or an invalid path.
pub fn parse_route_key(input: &str) -> Result<RouteKey> {
    tracing::debug!(route_key = input, "parsing route key");
    let (_, (method, segments)) = all_consuming(separated_pair(alpha1, char(' '), path))
        .parse(input)
        .map_err(|e| route_err(format!("invalid route key {input:?}: {e}")))?;
    Ok(RouteKey {
        method: method.parse()?,
        path: check_segments(segments, input)?,
    })
}
