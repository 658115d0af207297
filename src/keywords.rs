use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

use crate::tally::Tally;

/// Tokens must be longer than this many characters to count.
pub const MIN_TOKEN_CHARS: usize = 4;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static token pattern"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // english
        "the", "of", "and", "in", "to", "for", "a", "an", "on", "with", "by", "from", "as", "is",
        "are", "was", "were", "be", "been", "have", "has",
        // french
        "le", "la", "les", "de", "des", "du", "et", "en", "dans", "pour", "sur", "par", "avec",
        "sans", "sous", "entre", "à",
        // document-kind words
        "report", "summary", "study", "note", "part", "rapport", "étude",
        // regions / organizations
        "sahel", "africa", "african", "afrique", "ouest", "oecd", "swac", "club",
        // months en
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
        // months fr
        "janvier", "février", "fevrier", "mars", "avril", "mai", "juin", "juillet", "août", "aout",
        "septembre", "octobre", "novembre", "décembre", "decembre",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KeywordStat {
    pub word: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct KeywordStats {
    pub ranked: Vec<KeywordStat>,
    pub min: u32,
    pub max: u32,
}

impl KeywordStats {
    pub fn top(&self) -> Option<&KeywordStat> {
        self.ranked.first()
    }

    pub fn top_words(&self, n: usize) -> Vec<&str> {
        self.ranked.iter().take(n).map(|k| k.word.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Title keyword counter. The default stop set covers English/French function
/// words, month names and the dataset's organisation/region names.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    extra: HashSet<String>,
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_stopwords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        STOPWORDS.contains(token) || self.extra.contains(token)
    }

    pub fn extract<I, S>(&self, titles: I) -> KeywordStats
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = titles
            .into_iter()
            .map(|t| t.as_ref().nfc().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let mut bag = Tally::new();
        for m in TOKEN_RE.find_iter(&text) {
            let tok = m.as_str();
            if tok.chars().count() > MIN_TOKEN_CHARS && !self.is_stopword(tok) {
                bag.add(tok);
            }
        }

        let ranked: Vec<KeywordStat> = bag
            .ranked()
            .into_iter()
            .map(|(w, c)| KeywordStat {
                word: capitalize(&w),
                count: c as u32,
            })
            .collect();
        let min = ranked.iter().map(|k| k.count).min().unwrap_or(0);
        let max = ranked.iter().map(|k| k.count).max().unwrap_or(0);
        KeywordStats { ranked, min, max }
    }
}

/// Rank title keywords with the default stop set.
pub fn extract_keywords<I, S>(titles: I) -> KeywordStats
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    KeywordExtractor::default().extract(titles)
}

/// First character upper-cased, the rest left as is.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
