//! Classification rule chain.
//!
//! An ordered list of matcher → outcome pairs, evaluated first-match-wins.
//! Keeping the chain as data means individual rules can be tested in
//! isolation and reordered without touching evaluation logic. The final rule
//! matches everything, so `first_match` always resolves.

use reshelf_core::DestinationKey;

/// How much of an object the sampling outcomes may read.
pub const SAMPLE_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// File extension is one of these (lowercase, without the dot).
    ExtensionIn(&'static [&'static str]),
    /// Always matches; terminal fallback.
    Any,
}

impl Matcher {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Matcher::ExtensionIn(exts) => match extension(key) {
                Some(ext) => exts.iter().any(|e| *e == ext),
                None => false,
            },
            Matcher::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    /// Assign a bucket outright; no content needed.
    Assign(DestinationKey),
    /// Sample the object and look for any keyword, case-insensitively.
    SampleKeywords {
        keywords: &'static [&'static str],
        on_match: DestinationKey,
        otherwise: DestinationKey,
    },
    /// Parse the sample as Python source.
    ParsePython {
        on_error: DestinationKey,
        otherwise: DestinationKey,
    },
}

impl Outcome {
    /// Whether resolving this outcome requires reading object content.
    pub fn needs_sample(&self) -> bool {
        !matches!(self, Outcome::Assign(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub matcher: Matcher,
    pub outcome: Outcome,
}

/// Fixed-priority chain. Order is part of the contract: `.log` sniffing must
/// win over the generic fallback, and the archival extensions beat everything.
pub const RULES: &[Rule] = &[
    Rule {
        matcher: Matcher::ExtensionIn(&["bak", "tmp", "old", "archive"]),
        outcome: Outcome::Assign(DestinationKey::Archive),
    },
    Rule {
        matcher: Matcher::ExtensionIn(&["log"]),
        outcome: Outcome::SampleKeywords {
            keywords: &["error", "fatal"],
            on_match: DestinationKey::Discard,
            otherwise: DestinationKey::Default,
        },
    },
    Rule {
        matcher: Matcher::ExtensionIn(&["csv"]),
        outcome: Outcome::Assign(DestinationKey::Default),
    },
    Rule {
        matcher: Matcher::ExtensionIn(&["pdf", "docx"]),
        outcome: Outcome::Assign(DestinationKey::Get),
    },
    Rule {
        matcher: Matcher::ExtensionIn(&["py"]),
        outcome: Outcome::ParsePython {
            on_error: DestinationKey::LabsDump,
            otherwise: DestinationKey::Default,
        },
    },
    Rule {
        matcher: Matcher::ExtensionIn(&["ipynb"]),
        outcome: Outcome::Assign(DestinationKey::LabsDump),
    },
    Rule {
        matcher: Matcher::Any,
        outcome: Outcome::SampleKeywords {
            keywords: &["confidential"],
            on_match: DestinationKey::Discard,
            otherwise: DestinationKey::Default,
        },
    },
];

/// First rule in the chain matching this key.
pub fn first_match(key: &str) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| rule.matcher.matches(key))
        .expect("terminal Any rule always matches")
}

/// Lowercased extension of an object key, without the dot.
pub fn extension(key: &str) -> Option<String> {
    let name = reshelf_core::record::file_name(key);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Case-insensitive keyword search over a content sample.
pub fn sample_contains(sample: &[u8], keywords: &[&str]) -> bool {
    let haystack = String::from_utf8_lossy(sample).to_ascii_lowercase();
    keywords
        .iter()
        .any(|kw| haystack.contains(&kw.to_ascii_lowercase()))
}

/// Whether the sample parses as Python source. Non-UTF-8 content never does.
pub fn python_parses(sample: &[u8]) -> bool {
    let Ok(source) = std::str::from_utf8(sample) else {
        return false;
    };
    rustpython_parser::parse(source, rustpython_parser::Mode::Module, "<sample>").is_ok()
}
