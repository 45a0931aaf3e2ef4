//! PVL label parsing.
//!
//! ISIS cubes open with a Parameter Value Language label:
//!
//! ```text
//! Object = IsisCube
//!   Object = Core
//!     StartByte = 65537
//!     Group = Dimensions
//!       Samples = 800
//!     End_Group
//!   End_Object
//! End_Object
//! End
//! ```
//!
//! Values are integers, reals, quoted or bare strings, lists `( ... )`,
//! sets `{ ... }` and any of those followed by a `<unit>`. Keys may repeat
//! (one `Table` object per table), so blocks keep their entries in order.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while1},
    character::complete::{char, multispace1, not_line_ending},
    combinator::{map, opt, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use isis_common::{IsisError, IsisResult};

/// Kind of a nested block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Object,
    Group,
}

/// A parsed PVL value.
#[derive(Debug, Clone, PartialEq)]
pub enum PvlValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Quantity { value: Box<PvlValue>, unit: String },
    List(Vec<PvlValue>),
    Block(PvlBlock),
}

impl PvlValue {
    /// Integer value, accepting reals with no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PvlValue::Integer(v) => Some(*v),
            PvlValue::Real(v) if v.fract() == 0.0 => Some(*v as i64),
            PvlValue::Quantity { value, .. } => value.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PvlValue::Integer(v) => Some(*v as f64),
            PvlValue::Real(v) => Some(*v),
            PvlValue::Quantity { value, .. } => value.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PvlValue::Text(s) => Some(s),
            PvlValue::Quantity { value, .. } => value.as_str(),
            _ => None,
        }
    }

    /// List items; a scalar is seen as a one-item list.
    pub fn items(&self) -> Vec<&PvlValue> {
        match self {
            PvlValue::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    pub fn as_block(&self) -> Option<&PvlBlock> {
        match self {
            PvlValue::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            PvlValue::Quantity { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// Render the value as label text would show it (strings unquoted).
    pub fn to_text(&self) -> String {
        match self {
            PvlValue::Integer(v) => v.to_string(),
            PvlValue::Real(v) => v.to_string(),
            PvlValue::Text(s) => s.clone(),
            PvlValue::Quantity { value, unit } => format!("{} <{}>", value.to_text(), unit),
            PvlValue::List(items) => format!(
                "({})",
                items
                    .iter()
                    .map(PvlValue::to_text)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            PvlValue::Block(block) => block.name.clone(),
        }
    }
}

/// An `Object` or `Group` block (or the label root).
#[derive(Debug, Clone, PartialEq)]
pub struct PvlBlock {
    pub kind: BlockKind,
    pub name: String,
    pub entries: Vec<(String, PvlValue)>,
}

impl PvlBlock {
    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&PvlValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// All values stored under `key`, in label order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a PvlValue> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// First nested block named `key`.
    pub fn block(&self, key: &str) -> Option<&PvlBlock> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .find_map(|(_, v)| v.as_block())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PvlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn require(&self, key: &str) -> IsisResult<&PvlValue> {
        self.get(key)
            .ok_or_else(|| IsisError::key_not_found(format!("{}.{}", self.name, key)))
    }

    pub fn require_i64(&self, key: &str) -> IsisResult<i64> {
        self.require(key)?.as_i64().ok_or_else(|| {
            IsisError::invalid_format(format!("`{}.{}` is not an integer", self.name, key))
        })
    }

    pub fn require_f64(&self, key: &str) -> IsisResult<f64> {
        self.require(key)?.as_f64().ok_or_else(|| {
            IsisError::invalid_format(format!("`{}.{}` is not a number", self.name, key))
        })
    }

    pub fn require_str(&self, key: &str) -> IsisResult<&str> {
        self.require(key)?.as_str().ok_or_else(|| {
            IsisError::invalid_format(format!("`{}.{}` is not a string", self.name, key))
        })
    }
}

/// Parse a complete label (up to and including the final `End`).
pub fn parse_label(text: &str) -> IsisResult<PvlBlock> {
    match statements(text, None) {
        Ok((_, entries)) => Ok(PvlBlock {
            kind: BlockKind::Object,
            name: "ROOT".to_string(),
            entries,
        }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let consumed = text.len() - e.input.len();
            let line = text[..consumed].matches('\n').count() + 1;
            Err(IsisError::invalid_format(format!(
                "PVL syntax error on line {} ({:?})",
                line, e.code
            )))
        }
        Err(nom::Err::Incomplete(_)) => Err(IsisError::invalid_format("truncated PVL label")),
    }
}

// ===== Grammar =====

fn comment(i: &str) -> IResult<&str, ()> {
    value((), tuple((tag("/*"), take_until("*/"), tag("*/"))))(i)
}

fn hash_comment(i: &str) -> IResult<&str, ()> {
    value((), pair(char('#'), not_line_ending))(i)
}

/// Whitespace, newlines and comments.
fn sp(i: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((value((), multispace1), comment, hash_comment))),
    )(i)
}

fn keyword(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || "_:^-.".contains(c))(i)
}

fn equals(i: &str) -> IResult<&str, ()> {
    value((), tuple((sp, char('='), sp)))(i)
}

fn units(i: &str) -> IResult<&str, &str> {
    delimited(char('<'), is_not(">"), char('>'))(i)
}

fn quoted(i: &str) -> IResult<&str, PvlValue> {
    map(
        alt((
            delimited(char('"'), take_until("\""), char('"')),
            delimited(char('\''), take_until("'"), char('\'')),
        )),
        |s: &str| PvlValue::Text(unwrap_text(s)),
    )(i)
}

fn bare(i: &str) -> IResult<&str, PvlValue> {
    map(
        take_while1(|c: char| !c.is_whitespace() && !",(){}\"'<>=;".contains(c)),
        scalar,
    )(i)
}

fn list(i: &str) -> IResult<&str, PvlValue> {
    map(
        alt((
            delimited(
                pair(char('('), sp),
                separated_list0(tuple((sp, char(','), sp)), pvl_value),
                pair(sp, char(')')),
            ),
            delimited(
                pair(char('{'), sp),
                separated_list0(tuple((sp, char(','), sp)), pvl_value),
                pair(sp, char('}')),
            ),
        )),
        PvlValue::List,
    )(i)
}

fn pvl_value(i: &str) -> IResult<&str, PvlValue> {
    let (i, value) = alt((list, quoted, bare))(i)?;
    let (i, unit) = opt(preceded(sp, units))(i)?;
    Ok((
        i,
        match unit {
            Some(unit) => PvlValue::Quantity {
                value: Box::new(value),
                unit: unit.trim().to_string(),
            },
            None => value,
        },
    ))
}

/// Statements up to the end marker of `kind` (or the top-level `End`).
fn statements(mut i: &str, kind: Option<BlockKind>) -> IResult<&str, Vec<(String, PvlValue)>> {
    let mut entries = Vec::new();

    loop {
        let (rest, _) = sp(i)?;
        i = rest;

        if i.is_empty() {
            return match kind {
                None => Ok((i, entries)),
                Some(_) => Err(nom::Err::Failure(Error::new(i, ErrorKind::Eof))),
            };
        }

        let (rest, key) = keyword(i)?;
        match (key.to_ascii_lowercase().as_str(), kind) {
            ("end", None) => return Ok((rest, entries)),
            ("end_object" | "endobject", Some(BlockKind::Object))
            | ("end_group" | "endgroup", Some(BlockKind::Group)) => {
                return Ok((rest, entries));
            }
            ("end" | "end_object" | "endobject" | "end_group" | "endgroup", _) => {
                return Err(nom::Err::Failure(Error::new(i, ErrorKind::Tag)));
            }
            (opener @ ("object" | "group" | "begin_object" | "begin_group"), _) => {
                let block_kind = if opener.ends_with("object") {
                    BlockKind::Object
                } else {
                    BlockKind::Group
                };
                let (rest, name) = preceded(equals, alt((quoted, bare)))(rest)?;
                let name = name.to_text();
                let (rest, inner) = statements(rest, Some(block_kind))?;
                entries.push((
                    name.clone(),
                    PvlValue::Block(PvlBlock {
                        kind: block_kind,
                        name,
                        entries: inner,
                    }),
                ));
                i = rest;
            }
            _ => {
                let (rest, value) = preceded(equals, pvl_value)(rest)?;
                entries.push((key.to_string(), value));
                i = rest;
            }
        }
    }
}

/// Bare token to integer, real or text.
fn scalar(token: &str) -> PvlValue {
    let numeric_start = token
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
        .unwrap_or(false);

    if numeric_start {
        if let Ok(v) = token.parse::<i64>() {
            return PvlValue::Integer(v);
        }
        if let Ok(v) = token.parse::<f64>() {
            return PvlValue::Real(v);
        }
    }

    PvlValue::Text(token.to_string())
}

/// Join a quoted string wrapped over several label lines.
fn unwrap_text(s: &str) -> String {
    if !s.contains('\n') {
        return s.to_string();
    }
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
