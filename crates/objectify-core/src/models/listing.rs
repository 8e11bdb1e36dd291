//! Classified listings (NIP-99, kind 30402).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::CLASSIFIED_LISTING_KIND;
use crate::error::AppError;
use crate::models::event::{Event, EventId, PublicKey, UnsignedEvent};
use crate::models::tag::{Price, Tag};

/// Fields of a listing being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDraft {
    /// Stable `d` identifier; a random one is assigned when absent.
    pub identifier: Option<String>,
    pub title: String,
    /// Markdown body.
    pub content: String,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub price: Option<Price>,
    /// Image URLs, typically returned by a blob upload.
    pub images: Vec<String>,
    pub hashtags: Vec<String>,
}

impl ListingDraft {
    pub fn into_unsigned(self, pubkey: PublicKey, created_at: i64) -> Result<UnsignedEvent, AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::MalformedInput(
                "listing title must not be empty".to_string(),
            ));
        }

        let identifier = self
            .identifier
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut tags = vec![Tag::Identifier(identifier), Tag::Title(self.title)];
        if let Some(summary) = self.summary {
            tags.push(Tag::Summary(summary));
        }
        tags.push(Tag::PublishedAt(created_at));
        if let Some(location) = self.location {
            tags.push(Tag::Location(location));
        }
        if let Some(price) = self.price {
            tags.push(Tag::Price(price));
        }
        tags.extend(self.images.into_iter().map(|url| Tag::Image {
            url,
            dimensions: None,
        }));
        tags.extend(
            self.hashtags
                .into_iter()
                .map(|t| Tag::Topic(t.trim_start_matches('#').to_lowercase())),
        );

        Ok(UnsignedEvent {
            kind: CLASSIFIED_LISTING_KIND,
            content: self.content,
            created_at,
            tags,
            pubkey,
        })
    }
}

/// Read model of a published listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub id: EventId,
    pub pubkey: PublicKey,
    pub created_at: i64,
    pub content: String,
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub price: Option<Price>,
    pub nickname: Option<String>,
    pub images: Vec<String>,
    pub hashtags: Vec<String>,
    /// Tags without a dedicated field above.
    pub extra: Vec<Tag>,
}

impl Listing {
    pub fn from_event(event: &Event) -> Result<Self, AppError> {
        if event.kind() != CLASSIFIED_LISTING_KIND {
            return Err(AppError::InvalidEvent(format!(
                "expected kind {}, got {}",
                CLASSIFIED_LISTING_KIND,
                event.kind()
            )));
        }

        let mut listing = Listing {
            id: *event.id(),
            pubkey: *event.pubkey(),
            created_at: event.created_at(),
            content: event.content().to_string(),
            identifier: None,
            title: None,
            summary: None,
            location: None,
            price: None,
            nickname: None,
            images: Vec::new(),
            hashtags: Vec::new(),
            extra: Vec::new(),
        };

        for tag in event.tags() {
            match tag {
                Tag::Identifier(d) if listing.identifier.is_none() => {
                    listing.identifier = Some(d.clone())
                }
                Tag::Title(t) if listing.title.is_none() => listing.title = Some(t.clone()),
                Tag::Summary(s) if listing.summary.is_none() => listing.summary = Some(s.clone()),
                Tag::Location(l) if listing.location.is_none() => {
                    listing.location = Some(l.clone())
                }
                Tag::Price(p) if listing.price.is_none() => listing.price = Some(p.clone()),
                Tag::Nickname(n) if listing.nickname.is_none() => {
                    listing.nickname = Some(n.clone())
                }
                Tag::Image { url, .. } => listing.images.push(url.clone()),
                Tag::Topic(t) => listing.hashtags.push(t.clone()),
                other => listing.extra.push(other.clone()),
            }
        }

        Ok(listing)
    }

    /// Plain-text card. The collapsed form shows content, images and the
    /// seller nickname; `expanded` adds creation time, id, pubkey and the
    /// remaining tags.
    pub fn summary_lines(&self, expanded: bool) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(title) = &self.title {
            lines.push(format!("# {}", title));
        }
        if !self.content.is_empty() {
            lines.push(self.content.clone());
        }
        for image in &self.images {
            lines.push(format!("image: {}", image));
        }
        if let Some(price) = &self.price {
            let mut line = format!("price: {} {}", price.amount, price.currency);
            if let Some(frequency) = &price.frequency {
                line.push_str(&format!(" / {}", frequency));
            }
            lines.push(line);
        }
        if let Some(nickname) = &self.nickname {
            lines.push(format!("nickname: {}", nickname));
        }

        if expanded {
            let created = DateTime::<Utc>::from_timestamp(self.created_at, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| self.created_at.to_string());
            lines.push(format!("Created: {}", created));
            lines.push(format!("ID: {}", self.id));
            lines.push(format!("Pubkey: {}", self.pubkey));
            if let Some(summary) = &self.summary {
                lines.push(format!("summary: {}", summary));
            }
            if let Some(location) = &self.location {
                lines.push(format!("location: {}", location));
            }
            if !self.hashtags.is_empty() {
                lines.push(format!("t: {}", self.hashtags.join(", ")));
            }
            for tag in &self.extra {
                lines.push(format!("{}: {}", tag.name(), tag.values().join(", ")));
            }
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keys;

    fn draft() -> ListingDraft {
        ListingDraft {
            identifier: Some("bike-1".to_string()),
            title: "Road bike".to_string(),
            content: "Barely used, **56cm** frame.".to_string(),
            summary: Some("Road bike for sale".to_string()),
            location: Some("Berlin".to_string()),
            price: Some(Price {
                amount: "350".to_string(),
                currency: "EUR".to_string(),
                frequency: None,
            }),
            images: vec!["https://blossom.example/abc.jpg".to_string()],
            hashtags: vec!["#Bikes".to_string()],
        }
    }

    #[test]
    fn draft_builds_tags_in_order() {
        let keys = Keys::generate();
        let unsigned = draft().into_unsigned(keys.public_key(), 1_700_000_000).unwrap();

        assert_eq!(unsigned.kind, CLASSIFIED_LISTING_KIND);
        let names: Vec<&str> = unsigned.tags.iter().map(Tag::name).collect();
        assert_eq!(
            names,
            ["d", "title", "summary", "published_at", "location", "price", "image", "t"]
        );
        assert_eq!(unsigned.tags[7], Tag::Topic("bikes".to_string()));
    }

    #[test]
    fn draft_requires_title() {
        let keys = Keys::generate();
        let mut draft = draft();
        draft.title = "  ".to_string();
        assert!(draft.into_unsigned(keys.public_key(), 0).is_err());
    }

    #[test]
    fn missing_identifier_is_generated() {
        let keys = Keys::generate();
        let mut draft = draft();
        draft.identifier = None;
        let unsigned = draft.into_unsigned(keys.public_key(), 0).unwrap();
        match &unsigned.tags[0] {
            Tag::Identifier(d) => assert!(Uuid::parse_str(d).is_ok()),
            other => panic!("unexpected first tag {other:?}"),
        }
    }

    #[test]
    fn listing_reads_back_signed_event() {
        let keys = Keys::generate();
        let mut unsigned = draft().into_unsigned(keys.public_key(), 1_700_000_000).unwrap();
        unsigned.tags.push(Tag::Nickname("cyclist".to_string()));
        unsigned
            .tags
            .push(Tag::Unknown(vec!["g".to_string(), "u33d".to_string()]));
        let event = keys.sign_event(unsigned).unwrap();

        let listing = Listing::from_event(&event).unwrap();
        assert_eq!(listing.title.as_deref(), Some("Road bike"));
        assert_eq!(listing.identifier.as_deref(), Some("bike-1"));
        assert_eq!(listing.images.len(), 1);
        assert_eq!(listing.hashtags, vec!["bikes".to_string()]);
        assert_eq!(listing.nickname.as_deref(), Some("cyclist"));
        // published_at and g are not mapped to fields
        assert_eq!(listing.extra.len(), 2);

        let collapsed = listing.summary_lines(false);
        assert!(collapsed.contains(&"image: https://blossom.example/abc.jpg".to_string()));
        assert!(collapsed.contains(&"nickname: cyclist".to_string()));
        assert!(!collapsed.iter().any(|l| l.starts_with("ID:")));

        let expanded = listing.summary_lines(true);
        assert!(expanded.contains(&format!("ID: {}", event.id())));
        assert!(expanded.contains(&"g: u33d".to_string()));
        assert!(expanded.contains(&"Created: 2023-11-14T22:13:20+00:00".to_string()));
    }

    #[test]
    fn listing_rejects_other_kinds() {
        let keys = Keys::generate();
        let event = keys
            .sign_event(UnsignedEvent::new(keys.public_key(), 1, "note"))
            .unwrap();
        assert!(matches!(
            Listing::from_event(&event),
            Err(AppError::InvalidEvent(_))
        ));
    }
}
