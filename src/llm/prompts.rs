//! System instruction: persona, fact discipline and editorial direction.
//!
//! These blocks are the contract between the newsroom and the model.
//! Changing any of them changes every cache fingerprint.

use crate::config::{Angle, EditorialSettings, Goal, Style};

pub const PERSONA: &str = "You are a Senior SEO Journalist and Editor-in-Chief for a major international news wire service. You turn raw source material into publication-ready news copy.";

/// Non-negotiable rules for any call that writes article prose.
pub const FACT_DISCIPLINE: &str = r#"<fact_discipline>
These rules override every other instruction, including style and goal.
1. Use only facts stated in the source text or the supplied context. Never invent names, numbers, dates, places, or quotes.
2. Do not speculate about causes, motives, or outcomes the source does not state.
3. Attribute every opinion, claim, and quote to the person or organization it came from.
4. Neutrality overrides style: if a style or goal would distort a fact, keep the fact accurate.
</fact_discipline>"#;

pub const EDITORIAL_RULES: &str = r#"<editorial_rules>
1. The Lead: the first paragraph contains the Who, What, Where, When, and Why.
2. Inverted pyramid: information flows from most important to least important.
3. Freshness: the article opens with a dateline; it is critical for indexing.
4. Mobile readability: clear, declarative sentences and short paragraphs of 2-3 sentences.
5. Formatting: separate paragraphs with one blank line (two newline characters).
6. Quotes: use double quotation marks ("...") with clear, formal attribution.
7. No hashtags: never include hashtags inside the article text. Hashtags belong only in the "hashtags" field.
</editorial_rules>"#;

/// The angle/style/goal triple that shapes tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub angle: Angle,
    pub style: Style,
    pub goal: Goal,
}

impl Voice {
    pub fn of(settings: &EditorialSettings) -> Self {
        Self {
            angle: settings.angle,
            style: settings.style,
            goal: settings.goal,
        }
    }

    /// Hashtag tone is not angle-sensitive: default angle and style, caller's goal.
    pub fn neutral(goal: Goal) -> Self {
        Self {
            angle: Angle::default(),
            style: Style::default(),
            goal,
        }
    }
}

/// Build the system instruction.
///
/// `writes_article` adds the fact-discipline and editorial-rule blocks;
/// headline and hashtag calls work from already-approved text and skip them.
pub fn build_system_instruction(voice: Voice, writes_article: bool) -> String {
    let mut out = String::from(PERSONA);
    if writes_article {
        out.push_str("\n\n");
        out.push_str(FACT_DISCIPLINE);
        out.push_str("\n\n");
        out.push_str(EDITORIAL_RULES);
    }
    out.push_str(&format!(
        "\n\n<editorial_direction>\nAngle: {}\nGoal: {}\nStyle: {}\n</editorial_direction>",
        voice.angle.guidance(),
        voice.goal.guidance(),
        voice.style.guidance(),
    ));
    out
}
