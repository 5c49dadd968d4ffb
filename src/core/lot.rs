//! Lot records as served by the temple backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Minimum time the stick bucket shakes before a drawn lot is revealed.
pub const DRAW_ANIMATION: Duration = Duration::from_millis(1500);

/// Placeholder rendered for a lot field the backend did not supply.
pub const MISSING_FIELD: &str = "—";

/// A numbered fortune stick with its poem and interpretation.
///
/// Lots are immutable once received. The backend's lot files key records by
/// `id`, newer payloads by `number`; either is accepted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LotRecord")]
pub struct Lot {
    pub number: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub poem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    pub meaning: String,
    pub explanation: String,
}

#[derive(Deserialize)]
struct LotRecord {
    number: Option<u32>,
    id: Option<u32>,
    #[serde(default)]
    title: String,
    level: Option<String>,
    #[serde(default)]
    poem: String,
    story: Option<String>,
    #[serde(default)]
    meaning: String,
    #[serde(default)]
    explanation: String,
}

impl TryFrom<LotRecord> for Lot {
    type Error = String;

    fn try_from(record: LotRecord) -> Result<Self, Self::Error> {
        let number = record
            .number
            .or(record.id)
            .ok_or_else(|| "lot record has neither `number` nor `id`".to_string())?;

        Ok(Lot {
            number,
            title: record.title,
            level: non_blank(record.level),
            poem: record.poem,
            story: non_blank(record.story),
            meaning: record.meaning,
            explanation: record.explanation,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

impl Lot {
    pub fn level_display(&self) -> &str {
        self.level.as_deref().unwrap_or(MISSING_FIELD)
    }

    pub fn story_display(&self) -> &str {
        self.story.as_deref().unwrap_or("")
    }

    /// Heading shown above the poem, e.g. `第 23 籤 · 上籤 · 薛仁貴回家`.
    pub fn heading(&self) -> String {
        format!("第 {} 籤 · {} · {}", self.number, self.level_display(), self.title)
    }

    /// Labelled sections in display order. Empty sections are omitted.
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("籤詩", self.poem.as_str()),
            ("典故", self.story_display()),
            ("詩意", self.meaning.as_str()),
            ("解曰", self.explanation.as_str()),
        ]
        .into_iter()
        .filter(|(_, body)| !body.trim().is_empty())
        .collect()
    }

    /// Display width of the widest line of the card, in terminal columns.
    pub fn card_width(&self) -> usize {
        let heading = self.heading();
        std::iter::once(heading.as_str())
            .chain(self.sections().into_iter().flat_map(|(_, body)| body.lines()))
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0)
    }

    /// Plain-text card used by the TUI-less subcommands.
    pub fn render_plain(&self) -> String {
        let mut out = self.heading();
        out.push('\n');
        for (label, body) in self.sections() {
            out.push_str(&format!("\n【{label}】\n{}\n", body.trim_end()));
        }
        out
    }
}
