//! Mark types and values for the inline formatting engine.

use crate::error::{Error, Result};

/// The four supported kinds of inline mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkType {
    Strong,
    Em,
    Link,
    Comment,
}

impl MarkType {
    /// Parse a wire mark type string, rejecting anything outside the
    /// fixed set.
    pub fn parse(s: &str) -> Result<MarkType> {
        return match s {
            "strong" => Ok(MarkType::Strong),
            "em" => Ok(MarkType::Em),
            "link" => Ok(MarkType::Link),
            "comment" => Ok(MarkType::Comment),
            other => Err(Error::UnknownMark(other.to_string())),
        };
    }

    pub fn as_str(&self) -> &'static str {
        return match self {
            MarkType::Strong => "strong",
            MarkType::Em => "em",
            MarkType::Link => "link",
            MarkType::Comment => "comment",
        };
    }
}

/// Extra parameters for parameterized marks. `url` is required for
/// `link`, `id` is required for `comment`; absent otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A mark type together with its parameters, where applicable. This is
/// what actually lives in a `FormatSpan`'s mark set: `link` and `comment`
/// carry their parameter so that `link@url` / `comment@id` are distinct
/// values, per the glossary.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum MarkValue {
    Strong,
    Em,
    Link(String),
    Comment(String),
}

impl MarkValue {
    /// The underlying mark type, discarding parameters.
    pub fn mark_type(&self) -> MarkType {
        return match self {
            MarkValue::Strong => MarkType::Strong,
            MarkValue::Em => MarkType::Em,
            MarkValue::Link(_) => MarkType::Link,
            MarkValue::Comment(_) => MarkType::Comment,
        };
    }
}

/// Validate and resolve a `(markType, attrs)` pair from a wire op into a
/// `MarkValue`. Used for both `addMark` and `removeMark`: a `removeMark`
/// on `link` still needs a `MarkValue::Link` to route through (the url is
/// ignored by removal, since any `link@*` is removed), and `removeMark` on
/// `comment` needs the specific id to target.
pub fn resolve(mark_type: MarkType, attrs: Option<&Attrs>) -> Result<MarkValue> {
    return match mark_type {
        MarkType::Strong => Ok(MarkValue::Strong),
        MarkType::Em => Ok(MarkValue::Em),
        MarkType::Link => {
            let url = attrs.and_then(|a| a.url.clone()).ok_or(Error::MalformedOp { mark_type })?;
            Ok(MarkValue::Link(url))
        }
        MarkType::Comment => {
            let id = attrs.and_then(|a| a.id.clone()).ok_or(Error::MalformedOp { mark_type })?;
            Ok(MarkValue::Comment(id))
        }
    };
}
