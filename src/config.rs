//! Editorial configuration registry.
//!
//! Static tables of every language, angle, style, goal and date format the
//! generator understands, together with the guidance text the prompt
//! compiler splices into the system instruction.
//!
//! Lookups never fail. Settings reach us from stale history records and
//! hand-edited query strings, so an unknown key degrades to the documented
//! default for that parameter (and logs a warning) instead of erroring.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Upper bound for the requested minimum article length.
pub const MAX_WORD_COUNT: u32 = 2000;
pub const DEFAULT_MIN_WORD_COUNT: u32 = 300;

macro_rules! registry_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($what:literal), default = $default:ident,
        aliases = [ $($alias:literal => $target:ident),* $(,)? ],
        { $( $variant:ident => ($key:literal, $label:literal, $guidance:literal) ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable key used in persisted settings and prompts.
            pub fn key(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            /// Human-readable label for pickers.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Instruction text spliced into the system prompt.
            pub fn guidance(self) -> &'static str {
                match self {
                    $($name::$variant => $guidance),+
                }
            }

            /// Strict lookup: case-insensitive, trimmed, aliases honoured.
            pub fn parse(key: &str) -> Option<Self> {
                let wanted = key.trim();
                if let Some(found) = Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.key().eq_ignore_ascii_case(wanted))
                {
                    return Some(found);
                }
                $(
                    if wanted.eq_ignore_ascii_case($alias) {
                        return Some($name::$target);
                    }
                )*
                None
            }

            /// Lenient lookup: unknown keys fall back to the default.
            pub fn from_key(key: &str) -> Self {
                Self::parse(key).unwrap_or_else(|| {
                    log::warn!(
                        "[CONFIG] Unknown {} '{}', falling back to '{}'",
                        $what,
                        key,
                        Self::default().key()
                    );
                    Self::default()
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.key())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = serde_json::Value::deserialize(deserializer)?;
                Ok(raw.as_str().map(Self::from_key).unwrap_or_default())
            }
        }
    };
}

registry_enum! {
    /// Output language of every generated field.
    Language ("language"), default = Indonesian,
    aliases = ["indonesian" => Indonesian, "english" => English],
    {
        Indonesian => ("id", "Bahasa Indonesia",
            "Write in Bahasa Indonesia. Follow KBBI spelling and PUEBI punctuation standards strictly."),
        English => ("en", "English",
            "Write in English. Use standard news-wire spelling and punctuation."),
        Spanish => ("es", "Español",
            "Write in Spanish (Español). Use standard news-wire spelling and punctuation."),
        French => ("fr", "Français",
            "Write in French (Français). Use standard news-wire spelling and punctuation."),
        German => ("de", "Deutsch",
            "Write in German (Deutsch). Use standard news-wire spelling and punctuation."),
        Japanese => ("ja", "日本語",
            "Write in Japanese (日本語). Use standard news-wire orthography and punctuation."),
        Chinese => ("zh", "中文",
            "Write in Simplified Chinese (中文). Use standard news-wire orthography and punctuation."),
    }
}

registry_enum! {
    /// Editorial framing: which facts lead and how they are emphasised.
    Angle ("angle"), default = Straight,
    aliases = [
        "neutral" => Straight,
        "positive" => Impact,
        "negative" => Accountability,
        "human-interest" => HumanInterest,
    ],
    {
        Straight => ("straight", "Straight news",
            "Straight news angle: present the facts plainly in order of news value. Stay objective and balanced; add no framing the source does not support."),
        Impact => ("impact", "Impact",
            "Impact angle: lead with the consequences for the people, places and institutions affected. Explain what changes, for whom and when, without overstating."),
        Accountability => ("accountability", "Accountability",
            "Accountability angle: frame the story around decisions and responsibility. Make clear who decided, on what authority and at what cost, and note open questions the source raises. Attribute every claim."),
        HumanInterest => ("human_interest", "Human interest",
            "Human-interest angle: center the people involved and their experiences using concrete details from the source, while keeping every fact precise."),
    }
}

registry_enum! {
    /// Prose register.
    Style ("style"), default = Professional,
    aliases = [],
    {
        Formal => ("formal", "Formal",
            "Adhere to a strict Formal style. Use sophisticated vocabulary and professional terminology. Maintain professional distance."),
        Professional => ("professional", "Professional",
            "Use a standard Professional journalistic style. Clear, concise, and authoritative without unnecessary jargon."),
        Casual => ("casual", "Casual",
            "Adopt a Casual and accessible style. Use conversational language and simplified sentence structures for a general audience."),
        Friendly => ("friendly", "Friendly",
            "Use a Friendly and approachable style. Make the content feel inviting and easy to relate to."),
        Authoritative => ("authoritative", "Authoritative",
            "Maintain an Authoritative stance. Position the narrative as a definitive expert source with decisive language."),
        Conversational => ("conversational", "Conversational",
            "Write in a Conversational manner. Speak directly to the reader to build engagement and connection."),
    }
}

registry_enum! {
    /// Distribution target the content is optimised for.
    Goal ("goal"), default = GoogleNews,
    aliases = [],
    {
        GoogleNews => ("google_news", "Google News Optimization",
            "Prioritize Google News indexing standards, high-authority indexing, and E-E-A-T (Experience, Expertise, Authoritativeness, Trustworthiness) signals. Use names of people, organizations, and precise locations (entities)."),
        SeoRanking => ("seo_ranking", "General SEO Ranking",
            "Optimize for general SEO ranking and long-tail keywords. Focus on search intent and relevant semantic entities to improve organic visibility."),
        ViralSocial => ("viral_social", "Social Media Virality",
            "Focus on social media virality. Create high-engagement content with strong hooks, punchy sentences, and shareable insights."),
        Informational => ("informational", "Informational/Educational",
            "Prioritize informational and educational value. Deliver deep, clear, and comprehensive explanations with an emphasis on accuracy and clarity."),
    }
}

registry_enum! {
    /// Dateline date format.
    DateFormat ("date format"), default = DayMonthYear,
    aliases = [],
    {
        DayMonthYear => ("DD/MM/YYYY", "DD/MM/YYYY (21/01/2026)",
            "Format the dateline date as DD/MM/YYYY, e.g. 21/01/2026."),
        MonthDayYear => ("MM/DD/YYYY", "MM/DD/YYYY (01/21/2026)",
            "Format the dateline date as MM/DD/YYYY, e.g. 01/21/2026."),
        Iso => ("YYYY-MM-DD", "YYYY-MM-DD (2026-01-21)",
            "Format the dateline date as YYYY-MM-DD, e.g. 2026-01-21."),
        DayLongMonthYear => ("DD MMMM YYYY", "DD MMMM YYYY (21 January 2026)",
            "Format the dateline date as DD MMMM YYYY, e.g. 21 January 2026, with the month name in the output language."),
        LongMonthDayYear => ("MMMM DD, YYYY", "MMMM DD, YYYY (January 21, 2026)",
            "Format the dateline date as MMMM DD, YYYY, e.g. January 21, 2026, with the month name in the output language."),
    }
}

/// Validated editorial parameters for one generation call.
///
/// Serializes as plain keys. Deserialization is lenient: missing or unknown
/// values become defaults so old history records always load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredSettings")]
pub struct EditorialSettings {
    pub language: Language,
    pub angle: Angle,
    pub style: Style,
    pub goal: Goal,
    pub date_format: DateFormat,
    pub min_word_count: u32,
}

/// Persisted settings shape. Older records name the angle `tone`; a record
/// carrying both keeps `angle`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    #[serde(default)]
    language: Language,
    #[serde(default)]
    angle: Option<Angle>,
    #[serde(default)]
    tone: Option<Angle>,
    #[serde(default)]
    style: Style,
    #[serde(default)]
    goal: Goal,
    #[serde(default)]
    date_format: DateFormat,
    #[serde(default = "default_min_word_count", deserialize_with = "lenient_word_count")]
    min_word_count: u32,
}

impl From<StoredSettings> for EditorialSettings {
    fn from(stored: StoredSettings) -> Self {
        Self {
            language: stored.language,
            angle: stored.angle.or(stored.tone).unwrap_or_default(),
            style: stored.style,
            goal: stored.goal,
            date_format: stored.date_format,
            min_word_count: stored.min_word_count,
        }
    }
}

impl Default for EditorialSettings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            angle: Angle::default(),
            style: Style::default(),
            goal: Goal::default(),
            date_format: DateFormat::default(),
            min_word_count: DEFAULT_MIN_WORD_COUNT,
        }
    }
}

/// Unvalidated settings as they arrive from a form, query string or file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawSettingsInput")]
pub struct RawSettings {
    pub language: Option<String>,
    pub angle: Option<String>,
    pub style: Option<String>,
    pub goal: Option<String>,
    pub date_format: Option<String>,
    pub min_word_count: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettingsInput {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    angle: Option<String>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    goal: Option<String>,
    #[serde(default)]
    date_format: Option<String>,
    #[serde(default)]
    min_word_count: Option<i64>,
}

impl From<RawSettingsInput> for RawSettings {
    fn from(input: RawSettingsInput) -> Self {
        Self {
            language: input.language,
            angle: input.angle.or(input.tone),
            style: input.style,
            goal: input.goal,
            date_format: input.date_format,
            min_word_count: input.min_word_count,
        }
    }
}

impl EditorialSettings {
    /// Build settings from untrusted input. Never fails; every missing or
    /// unrecognised field takes its default.
    pub fn from_raw(raw: RawSettings) -> Self {
        Self {
            language: raw.language.as_deref().map(Language::from_key).unwrap_or_default(),
            angle: raw.angle.as_deref().map(Angle::from_key).unwrap_or_default(),
            style: raw.style.as_deref().map(Style::from_key).unwrap_or_default(),
            goal: raw.goal.as_deref().map(Goal::from_key).unwrap_or_default(),
            date_format: raw
                .date_format
                .as_deref()
                .map(DateFormat::from_key)
                .unwrap_or_default(),
            min_word_count: raw
                .min_word_count
                .map(clamp_word_count)
                .unwrap_or(DEFAULT_MIN_WORD_COUNT),
        }
    }
}

fn default_min_word_count() -> u32 {
    DEFAULT_MIN_WORD_COUNT
}

fn clamp_word_count(n: i64) -> u32 {
    n.clamp(0, i64::from(MAX_WORD_COUNT)) as u32
}

fn lenient_word_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &raw {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(parsed.map(clamp_word_count).unwrap_or(DEFAULT_MIN_WORD_COUNT))
}
