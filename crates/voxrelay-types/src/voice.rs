//! Speech language definitions.
//!
//! The front end addresses languages by the short upper-case codes shown in
//! its language picker. The synthesis upstream expects lower-case ISO 639-1
//! codes, which differ for Japanese (`JP` -> `ja`) and Korean (`KR` -> `ko`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Languages the speech synthesis model can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    Zh,
    Jp,
    Kr,
}

/// Returned when a language code is outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language: {0:?} (expected one of EN, ES, FR, ZH, JP, KR)")]
pub struct LanguageError(pub String);

impl Language {
    /// Every supported language, in picker order.
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::Zh,
        Language::Jp,
        Language::Kr,
    ];

    /// The code used by the front end (`EN`, `JP`, ...).
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "EN",
            Self::Es => "ES",
            Self::Fr => "FR",
            Self::Zh => "ZH",
            Self::Jp => "JP",
            Self::Kr => "KR",
        }
    }

    /// The ISO 639-1 code sent to the synthesis upstream.
    pub fn iso_code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::Zh => "zh",
            Self::Jp => "ja",
            Self::Kr => "ko",
        }
    }

    /// English display name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Spanish",
            Self::Fr => "French",
            Self::Zh => "Chinese",
            Self::Jp => "Japanese",
            Self::Kr => "Korean",
        }
    }

    /// Speaker presets offered by the synthesis model for this language.
    pub fn speakers(self) -> &'static [&'static str] {
        match self {
            Self::En => &["EN-Default", "EN-US", "EN-BR", "EN-INDIA", "EN-AU"],
            Self::Es => &["ES", "ES-MX"],
            Self::Fr => &["FR"],
            Self::Zh => &["ZH"],
            Self::Jp => &["JP"],
            Self::Kr => &["KR"],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = LanguageError;

    /// Parses a front-end code, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| LanguageError(s.to_string()))
    }
}
