//! Field paths
//!
//! A path addresses a node inside a parameter tree. Segments are separated by
//! dots; vector elements are addressed by zero-based index either as a dotted
//! segment or in brackets, so `layers.0.thickness` and `layers[0].thickness`
//! are the same path. The empty string addresses the root.

use crate::error::{Result, SimParamsError};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1},
    combinator::{map, map_res, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named field of a container
    Field(String),
    /// An element of a container vector
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A parsed address into a parameter tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The path of the tree root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path.
    ///
    /// # Examples
    ///
    /// ```
    /// use simparams_rs::parameters::path::{FieldPath, Segment};
    ///
    /// let path = FieldPath::parse("layers[1].thickness").unwrap();
    /// assert_eq!(
    ///     path.segments(),
    ///     &[
    ///         Segment::Field("layers".to_string()),
    ///         Segment::Index(1),
    ///         Segment::Field("thickness".to_string()),
    ///     ]
    /// );
    /// assert_eq!(path, FieldPath::parse("layers.1.thickness").unwrap());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        match path_parser(trimmed) {
            Ok(("", segments)) => Ok(Self { segments }),
            Ok((rest, _)) => Err(SimParamsError::InvalidPath {
                path: input.to_string(),
                message: format!("unexpected trailing characters '{rest}'"),
            }),
            Err(e) => Err(SimParamsError::InvalidPath {
                path: input.to_string(),
                message: format!("{e:?}"),
            }),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new path one field below this one.
    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.to_string()));
        Self { segments }
    }

    /// A new path addressing element `index` below this one.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: &Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.clone());
        Self { segments }
    }
}

/// Paths render with dots between fields and brackets around indices,
/// e.g. `layers[0].thickness`.
impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = SimParamsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        FieldPath::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Whether `name` is acceptable as a field name.
pub fn is_valid_field_name(name: &str) -> bool {
    matches!(field_name(name), Ok(("", _)))
}

// Parser functions using nom

fn field_name(input: &str) -> IResult<&str, Segment> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |name: &str| Segment::Field(name.to_string()),
    )
    .parse(input)
}

fn index(input: &str) -> IResult<&str, Segment> {
    map(map_res(digit1, |digits: &str| digits.parse::<usize>()), Segment::Index).parse(input)
}

fn bracket_index(input: &str) -> IResult<&str, Segment> {
    delimited(char('['), index, char(']')).parse(input)
}

fn following_segment(input: &str) -> IResult<&str, Segment> {
    alt((preceded(char('.'), alt((field_name, index))), bracket_index)).parse(input)
}

fn path_parser(input: &str) -> IResult<&str, Vec<Segment>> {
    let (input, first) = alt((field_name, index, bracket_index)).parse(input)?;
    let (input, rest) = many0(following_segment).parse(input)?;

    let mut segments = Vec::with_capacity(rest.len() + 1);
    segments.push(first);
    segments.extend(rest);
    Ok((input, segments))
}
