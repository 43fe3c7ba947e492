//! Task prompts: one template per operation kind.
//!
//! The system instruction (prompts.rs) sets persona and voice; these build
//! the concrete request that embeds the source material. Templates are
//! `format!` strings so user text is inserted once and never re-scanned
//! for placeholders.

use crate::config::EditorialSettings;

/// Article excerpts sent with headline/hashtag requests are capped to
/// bound prompt size.
pub const EXCERPT_MAX_CHARS: usize = 4000;

const TRUNCATION_MARKER: &str = " [...]";

/// Headline rules shared by full generation and title regeneration.
const HEADLINE_RULES: &str = "No clickbait. Include the primary entities. Keep each under 70 characters. Every headline must be distinct from the others.";

/// Shorten `article` to at most `max_chars` characters, cutting back to the
/// last whitespace when one is close by.
pub fn excerpt(article: &str, max_chars: usize) -> String {
    let article = article.trim();
    if article.chars().count() <= max_chars {
        return article.to_string();
    }
    let cut: String = article.chars().take(max_chars).collect();
    let boundary = cut
        .rfind(char::is_whitespace)
        .filter(|&i| i > cut.len() * 3 / 4)
        .unwrap_or(cut.len());
    format!("{}{}", cut[..boundary].trim_end(), TRUNCATION_MARKER)
}

/// Context block, or nothing at all when there is no usable context.
fn context_block(context: Option<&str>) -> String {
    match context {
        Some(ctx) => format!(
            "\n<context>\nAdditional context (keywords and entities to prioritize):\n{ctx}\n</context>\n"
        ),
        None => String::new(),
    }
}

/// Structural requirements shared by calls that write article prose.
fn article_requirements(settings: &EditorialSettings) -> String {
    format!(
        r#"- Language: {language}
- Dateline: start the article with a professional dateline. {date}
- The Lede: the first paragraph is a hard-news summary (Who, What, Where, When, Why).
- Structure: follow the inverted pyramid with 4-6 paragraphs of 2-3 sentences each.
- Length: at least {min_words} words.
- Formatting: separate paragraphs with one blank line (two newline characters).
- Entities: name the people, organizations, and places the source names.
- Quotes: format quotes with "..." and clear formal attribution.
- Constraint: DO NOT include any hashtags inside the article text."#,
        language = settings.language.guidance(),
        date = settings.date_format.guidance(),
        min_words = settings.min_word_count,
    )
}

/// FULL: source → titles + article + hashtags.
pub fn build_full_task(
    source_text: &str,
    context: Option<&str>,
    settings: &EditorialSettings,
) -> String {
    format!(
        r#"Task: full_article

Transform the source below into a high-authority news article optimized for {goal}.

<source_text>
{source}
</source_text>
{context}
<requirements>
{requirements}
</requirements>

<output>
Return a JSON object containing:
1. "titles": exactly 3 headline options. {headline_rules}
2. "article": the full article text.
3. "hashtags": 5-8 hashtags relevant to the story and to {goal}, each starting with #.
All content must be in {language_label}.
</output>"#,
        goal = settings.goal.label(),
        source = source_text.trim(),
        context = context_block(context),
        requirements = article_requirements(settings),
        headline_rules = HEADLINE_RULES,
        language_label = settings.language.label(),
    )
}

/// TITLES: approved article → `count` fresh headlines.
pub fn build_titles_task(article: &str, count: usize, settings: &EditorialSettings) -> String {
    format!(
        r#"Task: regenerate_titles

Based on the article below, write exactly {count} NEW headline(s) in {language_label}, optimized for {goal}.

<headline_rules>
- Each headline must accurately reflect the article content. Add nothing the article does not state.
- {headline_rules}
</headline_rules>

<article_excerpt>
{excerpt}
</article_excerpt>

Return a JSON object with "titles": an array of exactly {count} strings."#,
        language_label = settings.language.label(),
        goal = settings.goal.label(),
        headline_rules = HEADLINE_RULES,
        excerpt = excerpt(article, EXCERPT_MAX_CHARS),
    )
}

/// HASHTAGS: approved article → fresh tag set.
pub fn build_hashtags_task(article: &str, settings: &EditorialSettings) -> String {
    format!(
        r#"Task: regenerate_hashtags

Based on the article below, generate 5-8 NEW hashtags in {language_label} optimized for {goal}.
Focus on trending keywords and the entities at the center of the story.
Each hashtag starts with # and contains no spaces.

<article_excerpt>
{excerpt}
</article_excerpt>

Return a JSON object with "hashtags": an array of strings."#,
        language_label = settings.language.label(),
        goal = settings.goal.label(),
        excerpt = excerpt(article, EXCERPT_MAX_CHARS),
    )
}

/// ARTICLE: prior draft + source → rewritten article with facts frozen.
pub fn build_article_task(
    source_text: &str,
    context: Option<&str>,
    prior_article: &str,
    settings: &EditorialSettings,
) -> String {
    format!(
        r#"Task: rewrite_article

Rewrite the draft below for clarity, grammar, and flow, optimized for {goal}.
Strengthen the lead paragraph and entity placement without changing what the draft says.

<source_text>
{source}
</source_text>
{context}
<draft_article>
{draft}
</draft_article>

<constraints>
- Do not change the factual meaning of any sentence.
- Keep every number, name, date, place, and quote exactly as it appears in the draft.
- Only clarity, grammar, sentence flow, and paragraphing may change.
{requirements}
</constraints>

Return a JSON object with "article": the rewritten article text in {language_label}."#,
        goal = settings.goal.label(),
        source = source_text.trim(),
        context = context_block(context),
        draft = prior_article.trim(),
        requirements = article_requirements(settings),
        language_label = settings.language.label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_article_is_not_truncated() {
        assert_eq!(excerpt("  A short article.  ", 100), "A short article.");
    }

    #[test]
    fn long_article_is_cut_at_whitespace() {
        let article = "word ".repeat(50);
        let cut = excerpt(&article, 23);
        assert!(cut.ends_with(" [...]"));
        assert!(cut.chars().count() <= 23 + TRUNCATION_MARKER.len());
        assert!(cut.starts_with("word word word word"));
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let article = "日本語".repeat(10);
        let cut = excerpt(&article, 5);
        assert_eq!(cut, format!("日本語日本{}", TRUNCATION_MARKER));
    }

    #[test]
    fn context_block_absent_without_context() {
        let settings = EditorialSettings::default();
        let prompt = build_full_task("Source.", None, &settings);
        assert!(!prompt.contains("<context>"));
        let with_ctx = build_full_task("Source.", Some("park, budget"), &settings);
        assert!(with_ctx.contains("<context>\nAdditional context"));
        assert!(with_ctx.contains("park, budget"));
    }

    #[test]
    fn source_braces_are_not_placeholders() {
        let settings = EditorialSettings::default();
        let prompt = build_full_task("Template {goal} {source}", None, &settings);
        assert!(prompt.contains("Template {goal} {source}"));
    }

    #[test]
    fn titles_task_states_count_twice() {
        let settings = EditorialSettings::default();
        let prompt = build_titles_task("Article body.", 2, &settings);
        assert!(prompt.contains("exactly 2 NEW headline(s)"));
        assert!(prompt.contains("an array of exactly 2 strings"));
        assert!(prompt.contains("Article body."));
    }

    #[test]
    fn article_task_freezes_facts() {
        let settings = EditorialSettings::default();
        let prompt = build_article_task("Source.", None, "Old draft.", &settings);
        assert!(prompt.contains("<draft_article>\nOld draft.\n</draft_article>"));
        assert!(prompt.contains("Keep every number, name, date, place, and quote"));
        assert!(prompt.contains("at least 300 words"));
    }
}
