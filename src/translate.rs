use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static ZH_CN: Lazy<Dictionary> = Lazy::new(|| {
    Dictionary::from_json_str(include_str!("../locales/zh-cn.json"))
        .expect("embedded zh-cn dictionary is valid JSON")
});

static EN: Lazy<Dictionary> = Lazy::new(|| {
    Dictionary::from_json_str(include_str!("../locales/en.json"))
        .expect("embedded en dictionary is valid JSON")
});

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(\d+)").expect("placeholder pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Locale {
    #[default]
    #[value(name = "zh-cn")]
    ZhCn,
    #[value(name = "en")]
    En,
}

/// Opcode (and menu value) to phrase table. Phrases may carry `%1`, `%2`, ...
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: HashMap<String, String>,
}

impl Dictionary {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Process-wide dictionary for an embedded locale, parsed on first use.
    pub fn embedded(locale: Locale) -> &'static Dictionary {
        match locale {
            Locale::ZhCn => &*ZH_CN,
            Locale::En => &*EN,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Text for the nodes and edges the builder invents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticLabel {
    End,
    Continue,
    ConditionEnd,
    LoopEnd,
    Yes,
    No,
    True,
    False,
    Runaway,
    CircularReference,
    IfFallback,
    UntitledProject,
}

impl SyntheticLabel {
    pub fn key(self) -> &'static str {
        match self {
            Self::End => "FLOWCHART_END",
            Self::Continue => "FLOWCHART_CONTINUE",
            Self::ConditionEnd => "FLOWCHART_CONDITION_END",
            Self::LoopEnd => "FLOWCHART_LOOP_END",
            Self::Yes => "FLOWCHART_YES",
            Self::No => "FLOWCHART_NO",
            Self::True => "FLOWCHART_TRUE",
            Self::False => "FLOWCHART_FALSE",
            Self::Runaway => "FLOWCHART_RUNAWAY",
            Self::CircularReference => "FLOWCHART_CIRCULAR_REFERENCE",
            Self::IfFallback => "FLOWCHART_IF_FALLBACK",
            Self::UntitledProject => "FLOWCHART_UNTITLED_PROJECT",
        }
    }

    pub fn default_text(self) -> &'static str {
        match self {
            Self::End => "end",
            Self::Continue => "repeat",
            Self::ConditionEnd => "end if",
            Self::LoopEnd => "end repeat",
            Self::Yes => "yes",
            Self::No => "no",
            Self::True => "true",
            Self::False => "false",
            Self::Runaway => "runaway loop...",
            Self::CircularReference => "circular reference",
            Self::IfFallback => "if %1",
            Self::UntitledProject => "untitled project",
        }
    }
}

/// Read-only view over a dictionary, handed to the builder by the caller.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    dictionary: &'a Dictionary,
}

impl<'a> Translator<'a> {
    pub fn new(dictionary: &'a Dictionary) -> Self {
        Self { dictionary }
    }

    pub fn for_locale(locale: Locale) -> Translator<'static> {
        Translator::new(Dictionary::embedded(locale))
    }

    /// Phrase template for `opcode`, or `None` when the caller should fall
    /// back to [`strip_category`].
    pub fn translate(&self, opcode: &str) -> Option<&'a str> {
        self.dictionary.get(&normalize_key(opcode))
    }

    /// Translates a menu value. Underscore-wrapped tokens such as `_mouse_`
    /// are looked up on their own; other values only under the opcode that
    /// owns the menu (`LOOKS_GOTOFRONTBACK_FRONT`).
    pub fn menu_value(&self, opcode: &str, value: &str) -> Option<&'a str> {
        if value.len() > 2 && value.starts_with('_') && value.ends_with('_') {
            return self.dictionary.get(&normalize_key(value));
        }
        if value.is_empty() {
            return None;
        }
        self.dictionary
            .get(&normalize_key(&format!("{}_{}", opcode, value)))
    }

    pub fn synthetic(&self, label: SyntheticLabel) -> &'a str {
        self.dictionary
            .get(label.key())
            .unwrap_or_else(|| label.default_text())
    }

    /// Translated phrase with `params` substituted, if a translation exists.
    pub fn render(&self, opcode: &str, params: &[String]) -> Option<String> {
        self.translate(opcode)
            .map(|template| substitute(template, params))
    }
}

/// `motion.gotoxy` / `motion_gotoxy` -> `MOTION_GOTOXY`.
pub fn normalize_key(opcode: &str) -> String {
    opcode.replace('.', "_").to_uppercase()
}

/// `motion_movesteps` -> `movesteps`; opcodes without a category stay whole.
pub fn strip_category(opcode: &str) -> &str {
    match opcode.split_once('_') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => opcode,
    }
}

/// Replaces `%N` with the N-th parameter. Placeholders without a parameter are
/// left as written; substituted text is never rescanned.
pub fn substitute(template: &str, params: &[String]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| params.get(i))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
