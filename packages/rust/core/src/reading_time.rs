//! Reading-time estimation from article word counts.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use spacetraveling_shared::{DEFAULT_WORDS_PER_MINUTE, Section};

/// Estimated reading duration in whole minutes, never less than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingTime(u32);

impl ReadingTime {
    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ReadingTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} min", self.0)
    }
}

/// Derives a [`ReadingTime`] from the words of an article body.
#[derive(Debug, Clone, Copy)]
pub struct ReadingTimeEstimator {
    words_per_minute: NonZeroU32,
}

impl Default for ReadingTimeEstimator {
    fn default() -> Self {
        Self {
            words_per_minute: NonZeroU32::new(DEFAULT_WORDS_PER_MINUTE)
                .unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl ReadingTimeEstimator {
    pub fn new(words_per_minute: NonZeroU32) -> Self {
        Self { words_per_minute }
    }

    pub fn words_per_minute(&self) -> NonZeroU32 {
        self.words_per_minute
    }

    /// `max(1, ceil(words / words_per_minute))`.
    pub fn estimate(&self, sections: &[Section]) -> ReadingTime {
        self.estimate_words(word_count(sections))
    }

    pub fn estimate_words(&self, words: u64) -> ReadingTime {
        let minutes = words.div_ceil(u64::from(self.words_per_minute.get())).max(1);
        ReadingTime(u32::try_from(minutes).unwrap_or(u32::MAX))
    }
}

/// Whitespace-separated words across the text of every body block.
///
/// Headings are not counted. Each block is counted on its own, so the last
/// word of one block never fuses with the first word of the next.
pub fn word_count(sections: &[Section]) -> u64 {
    sections
        .iter()
        .flat_map(|s| s.body.iter())
        .map(|block| block.plain_text().split_whitespace().count() as u64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacetraveling_shared::RichTextBlock;

    fn words(n: usize) -> String {
        vec!["lorem"; n].join(" ")
    }

    fn section(blocks: &[usize]) -> Section {
        Section {
            heading: "Heading words are ignored".into(),
            body: blocks.iter().map(|&n| RichTextBlock::paragraph(words(n))).collect(),
        }
    }

    #[test]
    fn two_sections_totalling_250_words_take_two_minutes() {
        let sections = vec![section(&[100, 50]), section(&[100])];
        assert_eq!(word_count(&sections), 250);
        assert_eq!(ReadingTimeEstimator::default().estimate(&sections).minutes(), 2);
    }

    #[test]
    fn empty_article_still_takes_a_minute() {
        let estimator = ReadingTimeEstimator::default();
        assert_eq!(estimator.estimate(&[]).minutes(), 1);
        assert_eq!(estimator.estimate(&[section(&[])]).minutes(), 1);
    }

    #[test]
    fn matches_ceiling_division_for_many_counts() {
        let estimator = ReadingTimeEstimator::default();
        for w in [0u64, 1, 199, 200, 201, 399, 400, 401, 1234, 10_000] {
            let expected = w.div_ceil(200).max(1) as u32;
            assert_eq!(estimator.estimate_words(w).minutes(), expected, "W = {w}");
        }
    }

    #[test]
    fn custom_reading_speed() {
        let estimator = ReadingTimeEstimator::new(NonZeroU32::new(100).unwrap());
        assert_eq!(estimator.estimate_words(250).minutes(), 3);
    }

    #[test]
    fn irregular_whitespace_and_block_boundaries() {
        let sections = vec![Section {
            heading: String::new(),
            body: vec![
                RichTextBlock::paragraph("  one\ttwo\n three  "),
                RichTextBlock::paragraph("four"),
            ],
        }];
        assert_eq!(word_count(&sections), 4);
    }

    #[test]
    fn displays_as_minutes() {
        assert_eq!(ReadingTimeEstimator::default().estimate_words(450).to_string(), "3 min");
    }
}
