#![allow(clippy::match_wildcard_for_single_variants)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Blocks = Vec<BlockNode>;
pub type RichText = Vec<RichTextRun>;

/// Inline styling flags of a rich text run
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

/// A styled run of text, optionally linking somewhere
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RichTextRun {
    pub text: String,
    pub href: Option<String>,
    pub annotations: Annotations,
}

impl RichTextRun {
    /// Create an unstyled run
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn from_wire(value: &Value) -> Self {
        let annotations = &value["annotations"];
        Self {
            text: value["plain_text"].as_str().unwrap_or_default().to_string(),
            href: value["href"].as_str().map(ToString::to_string),
            annotations: Annotations {
                bold: annotations["bold"].as_bool().unwrap_or_default(),
                italic: annotations["italic"].as_bool().unwrap_or_default(),
                strikethrough: annotations["strikethrough"].as_bool().unwrap_or_default(),
                underline: annotations["underline"].as_bool().unwrap_or_default(),
                code: annotations["code"].as_bool().unwrap_or_default(),
            },
        }
    }
}

/// Heading depth, capped at three levels by the store
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    #[must_use]
    pub const fn depth(self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
        }
    }
}

/// The closed set of block kinds the portal renders
///
/// Anything the store sends outside this set is dropped during the fetch,
/// so downstream consumers never branch on an unknown kind.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph { rich_text: RichText },
    Heading { level: HeadingLevel, rich_text: RichText },
    BulletedListItem { rich_text: RichText },
    NumberedListItem { rich_text: RichText },
    Todo { checked: bool, rich_text: RichText },
    Toggle { rich_text: RichText },
    Quote { rich_text: RichText },
    Callout { rich_text: RichText },
    Code { text: String, language: String },
    Image { url: String, caption: String },
    Video { url: String, caption: String },
    File { name: String, url: String, caption: String },
    Bookmark { url: String, caption: String },
    Embed { url: String, caption: String },
    Table { header_row: bool, header_column: bool },
    TableRow { cells: Vec<RichText> },
    Divider,
    TableOfContents,
}

impl BlockKind {
    /// Map a raw block record onto a typed kind
    ///
    /// `tag` is the record's `type` discriminant and `payload` the object
    /// stored under that key. Returns `None` for kinds the portal does not
    /// render; callers drop those records.
    #[must_use]
    pub fn from_raw(tag: &str, payload: &Value) -> Option<Self> {
        let kind = match tag {
            "paragraph" => Self::Paragraph {
                rich_text: runs(payload),
            },
            "heading_1" => Self::Heading {
                level: HeadingLevel::H1,
                rich_text: runs(payload),
            },
            "heading_2" => Self::Heading {
                level: HeadingLevel::H2,
                rich_text: runs(payload),
            },
            "heading_3" => Self::Heading {
                level: HeadingLevel::H3,
                rich_text: runs(payload),
            },
            "bulleted_list_item" => Self::BulletedListItem {
                rich_text: runs(payload),
            },
            "numbered_list_item" => Self::NumberedListItem {
                rich_text: runs(payload),
            },
            "to_do" => Self::Todo {
                checked: payload["checked"].as_bool().unwrap_or_default(),
                rich_text: runs(payload),
            },
            "toggle" => Self::Toggle {
                rich_text: runs(payload),
            },
            "quote" => Self::Quote {
                rich_text: runs(payload),
            },
            "callout" => Self::Callout {
                rich_text: runs(payload),
            },
            "code" => Self::Code {
                text: plain_of(&runs(payload)),
                language: payload["language"].as_str().unwrap_or_default().to_string(),
            },
            "image" => Self::Image {
                url: media_url_of(payload),
                caption: caption_of(payload),
            },
            "video" => Self::Video {
                url: media_url_of(payload),
                caption: caption_of(payload),
            },
            "file" => Self::File {
                name: payload["name"]
                    .as_str()
                    .filter(|name| !name.is_empty())
                    .unwrap_or("Fichier")
                    .to_string(),
                url: media_url_of(payload),
                caption: caption_of(payload),
            },
            "bookmark" => Self::Bookmark {
                url: payload["url"].as_str().unwrap_or_default().to_string(),
                caption: caption_of(payload),
            },
            "embed" => Self::Embed {
                url: payload["url"].as_str().unwrap_or_default().to_string(),
                caption: caption_of(payload),
            },
            "table" => Self::Table {
                header_row: payload["has_column_header"].as_bool().unwrap_or_default(),
                header_column: payload["has_row_header"].as_bool().unwrap_or_default(),
            },
            "table_row" => Self::TableRow {
                cells: payload["cells"]
                    .as_array()
                    .map(|rows| {
                        rows.iter()
                            .map(|cell| {
                                cell.as_array()
                                    .map(|cell_runs| {
                                        cell_runs.iter().map(RichTextRun::from_wire).collect()
                                    })
                                    .unwrap_or_default()
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            "divider" => Self::Divider,
            "table_of_contents" => Self::TableOfContents,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the kind is a bulleted or numbered list item
    #[must_use]
    pub const fn is_list_item(&self) -> bool {
        matches!(
            self,
            Self::BulletedListItem { .. } | Self::NumberedListItem { .. }
        )
    }
}

/// One block of page content with its resolved children
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BlockNode {
    pub id: String,
    pub kind: BlockKind,
    pub children: Blocks,
}

impl BlockNode {
    /// Create a childless node
    #[must_use]
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// Create a node with resolved children
    #[must_use]
    pub fn with_children(id: impl Into<String>, kind: BlockKind, children: Blocks) -> Self {
        Self {
            id: id.into(),
            kind,
            children,
        }
    }

    /// Rich text runs of the block, empty for non-textual kinds
    #[must_use]
    pub fn rich_text(&self) -> &[RichTextRun] {
        match &self.kind {
            BlockKind::Paragraph { rich_text }
            | BlockKind::Heading { rich_text, .. }
            | BlockKind::BulletedListItem { rich_text }
            | BlockKind::NumberedListItem { rich_text }
            | BlockKind::Todo { rich_text, .. }
            | BlockKind::Toggle { rich_text }
            | BlockKind::Quote { rich_text }
            | BlockKind::Callout { rich_text } => rich_text,
            _ => &[],
        }
    }

    /// Unstyled text of the block
    #[must_use]
    pub fn plain_text(&self) -> String {
        match &self.kind {
            BlockKind::Code { text, .. } => text.clone(),
            _ => plain_of(self.rich_text()),
        }
    }

    /// URL of the block's media, for media-bearing kinds
    #[must_use]
    pub fn media_url(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Image { url, .. }
            | BlockKind::Video { url, .. }
            | BlockKind::File { url, .. }
            | BlockKind::Bookmark { url, .. }
            | BlockKind::Embed { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Caption of the block; code blocks expose their language here
    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Image { caption, .. }
            | BlockKind::Video { caption, .. }
            | BlockKind::File { caption, .. }
            | BlockKind::Bookmark { caption, .. }
            | BlockKind::Embed { caption, .. } => Some(caption),
            BlockKind::Code { language, .. } => Some(language),
            _ => None,
        }
    }
}

macro_rules! impl_kind_helpers {
    ($($variant:ident $( { $($field:ident),* } )?),* $(,)?) => {
        $(
            impl BlockKind {
                paste::paste! {
                    #[must_use]
                    pub fn [<as_ $variant:snake>](&self) -> Option<Self> {
                        if let Self::$variant $( { $($field),* } )? = self {
                            Some(Self::$variant $( {
                                $(
                                    $field: $field.clone(),
                                )*
                            } )?)
                        } else {
                            None
                        }
                    }

                    #[must_use]
                    pub fn [<is_ $variant:snake>](&self) -> bool {
                        self.[<as_ $variant:snake>]().is_some()
                    }
                }
            }
        )*
    };
}

impl_kind_helpers!(
    Paragraph { rich_text },
    Heading { level, rich_text },
    BulletedListItem { rich_text },
    NumberedListItem { rich_text },
    Todo { checked, rich_text },
    Toggle { rich_text },
    Quote { rich_text },
    Callout { rich_text },
    Code { text, language },
    Image { url, caption },
    Video { url, caption },
    File { name, url, caption },
    Bookmark { url, caption },
    Embed { url, caption },
    Table {
        header_row,
        header_column
    },
    TableRow { cells },
    Divider,
    TableOfContents,
);

fn runs(payload: &Value) -> RichText {
    payload["rich_text"]
        .as_array()
        .map(|items| items.iter().map(RichTextRun::from_wire).collect())
        .unwrap_or_default()
}

fn plain_of(runs: &[RichTextRun]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

fn caption_of(payload: &Value) -> String {
    payload["caption"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["plain_text"].as_str())
                .collect()
        })
        .unwrap_or_default()
}

fn media_url_of(payload: &Value) -> String {
    payload["file"]["url"]
        .as_str()
        .or_else(|| payload["external"]["url"].as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_paragraph_keeps_annotations_and_links() {
        let payload = json!({
            "rich_text": [
                { "plain_text": "Voir le ", "annotations": { "bold": false } },
                {
                    "plain_text": "cahier des charges",
                    "href": "https://exemple.fr/cdc",
                    "annotations": { "bold": true, "code": false }
                }
            ]
        });
        let kind = BlockKind::from_raw("paragraph", &payload).unwrap();
        let BlockKind::Paragraph { rich_text } = &kind else {
            panic!("expected paragraph");
        };
        assert_eq!(rich_text.len(), 2);
        assert_eq!(rich_text[1].text, "cahier des charges");
        assert_eq!(rich_text[1].href.as_deref(), Some("https://exemple.fr/cdc"));
        assert!(rich_text[1].annotations.bold);
        assert!(!rich_text[1].annotations.code);
    }

    #[test]
    fn test_heading_levels() {
        let payload = json!({ "rich_text": [{ "plain_text": "Cadrage" }] });
        for (tag, expected) in [
            ("heading_1", HeadingLevel::H1),
            ("heading_2", HeadingLevel::H2),
            ("heading_3", HeadingLevel::H3),
        ] {
            let kind = BlockKind::from_raw(tag, &payload).unwrap();
            let BlockKind::Heading { level, .. } = kind else {
                panic!("expected heading");
            };
            assert_eq!(level, expected);
        }
        assert_eq!(HeadingLevel::H2.depth(), 2);
    }

    #[test]
    fn test_todo_checked_flag() {
        let payload = json!({
            "rich_text": [{ "plain_text": "Relire la maquette" }],
            "checked": true
        });
        let kind = BlockKind::from_raw("to_do", &payload).unwrap();
        assert_eq!(
            kind,
            BlockKind::Todo {
                checked: true,
                rich_text: vec![RichTextRun::plain("Relire la maquette")],
            }
        );
    }

    #[test]
    fn test_code_concatenates_runs_and_keeps_language() {
        let payload = json!({
            "rich_text": [{ "plain_text": "let x = " }, { "plain_text": "1;" }],
            "language": "rust"
        });
        let kind = BlockKind::from_raw("code", &payload).unwrap();
        assert_eq!(
            kind,
            BlockKind::Code {
                text: "let x = 1;".to_string(),
                language: "rust".to_string(),
            }
        );
        let node = BlockNode::new("b1", kind);
        assert_eq!(node.plain_text(), "let x = 1;");
        assert_eq!(node.caption(), Some("rust"));
    }

    #[test]
    fn test_image_prefers_uploaded_url() {
        let payload = json!({
            "file": { "url": "https://files/visuel.png" },
            "external": { "url": "https://cdn/visuel.png" },
            "caption": [{ "plain_text": "Visuel " }, { "plain_text": "final" }]
        });
        let kind = BlockKind::from_raw("image", &payload).unwrap();
        assert_eq!(
            kind,
            BlockKind::Image {
                url: "https://files/visuel.png".to_string(),
                caption: "Visuel final".to_string(),
            }
        );

        let external_only = json!({ "external": { "url": "https://cdn/visuel.png" } });
        let kind = BlockKind::from_raw("image", &external_only).unwrap();
        let node = BlockNode::new("b2", kind);
        assert_eq!(node.media_url(), Some("https://cdn/visuel.png"));
    }

    #[test]
    fn test_file_name_defaults() {
        let payload = json!({ "file": { "url": "https://files/devis.pdf" }, "name": "" });
        let kind = BlockKind::from_raw("file", &payload).unwrap();
        let BlockKind::File { name, url, .. } = kind else {
            panic!("expected file");
        };
        assert_eq!(name, "Fichier");
        assert_eq!(url, "https://files/devis.pdf");
    }

    #[test]
    fn test_table_header_flags() {
        let payload = json!({ "has_column_header": true, "has_row_header": false });
        let kind = BlockKind::from_raw("table", &payload).unwrap();
        assert_eq!(
            kind,
            BlockKind::Table {
                header_row: true,
                header_column: false,
            }
        );
    }

    #[test]
    fn test_table_row_cells() {
        let payload = json!({
            "cells": [
                [{ "plain_text": "Poste" }],
                [{ "plain_text": "Montant" }, { "plain_text": " HT" }]
            ]
        });
        let kind = BlockKind::from_raw("table_row", &payload).unwrap();
        let BlockKind::TableRow { cells } = kind else {
            panic!("expected table row");
        };
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1][1].text, " HT");
    }

    #[test]
    fn test_unit_kinds() {
        assert_eq!(
            BlockKind::from_raw("divider", &json!({})),
            Some(BlockKind::Divider)
        );
        assert_eq!(
            BlockKind::from_raw("table_of_contents", &json!({})),
            Some(BlockKind::TableOfContents)
        );
    }

    #[test]
    fn test_unknown_tags_are_dropped() {
        assert_eq!(BlockKind::from_raw("synced_block", &json!({})), None);
        assert_eq!(BlockKind::from_raw("child_database", &json!({})), None);
    }

    #[test]
    fn test_kind_helpers() {
        let payload = json!({ "rich_text": [{ "plain_text": "Un point" }] });
        let kind = BlockKind::from_raw("bulleted_list_item", &payload).unwrap();
        assert!(kind.is_bulleted_list_item());
        assert!(!kind.is_numbered_list_item());
        assert!(kind.is_list_item());
        assert!(kind.as_bulleted_list_item().is_some());
        assert!(BlockKind::Divider.is_divider());
        assert!(!BlockKind::Divider.is_list_item());
    }

    #[test]
    fn test_plain_text_concatenates_runs() {
        let payload = json!({
            "rich_text": [{ "plain_text": "Bonjour " }, { "plain_text": "le monde" }]
        });
        let node = BlockNode::new(
            "b3",
            BlockKind::from_raw("paragraph", &payload).unwrap(),
        );
        assert_eq!(node.plain_text(), "Bonjour le monde");
        assert!(node.media_url().is_none());
        assert!(node.caption().is_none());
    }
}
