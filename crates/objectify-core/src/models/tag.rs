//! Typed event tags.
//!
//! On the wire a tag is an array of strings whose first element names it.
//! Known names are parsed into dedicated variants; anything else, or any
//! known tag whose shape we would not re-serialize byte-for-byte, is kept
//! as [`Tag::Unknown`] so that event ids of foreign events still verify.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::blob::ContentHash;

/// Listing price (`["price", amount, currency, frequency?]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// `t`: hashtag, or the action of an authorization event
    Topic(String),
    /// `x`: SHA-256 of a blob
    Hash(ContentHash),
    /// `expiration`: unix seconds after which the event is stale
    Expiration(i64),
    /// `d`: identifier of a replaceable event
    Identifier(String),
    Title(String),
    Summary(String),
    PublishedAt(i64),
    Location(String),
    Price(Price),
    Image {
        url: String,
        dimensions: Option<String>,
    },
    Nickname(String),
    Unknown(Vec<String>),
}

impl Tag {
    /// Parse wire values. Never fails: unrecognized input becomes `Unknown`.
    pub fn parse(values: Vec<String>) -> Tag {
        match Self::parse_known(&values) {
            Some(tag) if tag.to_vec() == values => tag,
            _ => Tag::Unknown(values),
        }
    }

    fn parse_known(values: &[String]) -> Option<Tag> {
        let (name, rest) = values.split_first()?;
        let value = rest.first()?.clone();

        let tag = match name.as_str() {
            "t" => Tag::Topic(value),
            "x" => Tag::Hash(value.parse().ok()?),
            "expiration" => Tag::Expiration(value.parse().ok()?),
            "d" => Tag::Identifier(value),
            "title" => Tag::Title(value),
            "summary" => Tag::Summary(value),
            "published_at" => Tag::PublishedAt(value.parse().ok()?),
            "location" => Tag::Location(value),
            "nickname" => Tag::Nickname(value),
            "price" => Tag::Price(Price {
                amount: value,
                currency: rest.get(1)?.clone(),
                frequency: rest.get(2).cloned(),
            }),
            "image" => Tag::Image {
                url: value,
                dimensions: rest.get(1).cloned(),
            },
            _ => return None,
        };

        Some(tag)
    }

    pub fn name(&self) -> &str {
        match self {
            Tag::Topic(_) => "t",
            Tag::Hash(_) => "x",
            Tag::Expiration(_) => "expiration",
            Tag::Identifier(_) => "d",
            Tag::Title(_) => "title",
            Tag::Summary(_) => "summary",
            Tag::PublishedAt(_) => "published_at",
            Tag::Location(_) => "location",
            Tag::Price(_) => "price",
            Tag::Image { .. } => "image",
            Tag::Nickname(_) => "nickname",
            Tag::Unknown(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Everything after the name.
    pub fn values(&self) -> Vec<String> {
        let mut all = self.to_vec();
        if all.is_empty() {
            return all;
        }
        all.remove(0);
        all
    }

    /// Wire representation.
    pub fn to_vec(&self) -> Vec<String> {
        let mut out = vec![self.name().to_string()];
        match self {
            Tag::Topic(v)
            | Tag::Identifier(v)
            | Tag::Title(v)
            | Tag::Summary(v)
            | Tag::Location(v)
            | Tag::Nickname(v) => out.push(v.clone()),
            Tag::Hash(hash) => out.push(hash.to_hex()),
            Tag::Expiration(at) | Tag::PublishedAt(at) => out.push(at.to_string()),
            Tag::Price(price) => {
                out.push(price.amount.clone());
                out.push(price.currency.clone());
                if let Some(frequency) = &price.frequency {
                    out.push(frequency.clone());
                }
            }
            Tag::Image { url, dimensions } => {
                out.push(url.clone());
                if let Some(dimensions) = dimensions {
                    out.push(dimensions.clone());
                }
            }
            Tag::Unknown(values) => return values.clone(),
        }
        out
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_vec().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(Tag::parse)
    }
}
