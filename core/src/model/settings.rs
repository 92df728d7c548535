use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Raised when a user-supplied setting name does not match a known value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
}

impl ParseSettingError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// RGB triple parsed from the theme tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Rgb,
    pub foreground: Rgb,
    pub accent: Rgb,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ThemeChoice {
    #[default]
    #[serde(rename = "Windows 11")]
    Windows11,
    Dark,
    Light,
    Red,
    Blue,
}

impl ThemeChoice {
    pub const ALL: [ThemeChoice; 5] = [
        ThemeChoice::Windows11,
        ThemeChoice::Dark,
        ThemeChoice::Light,
        ThemeChoice::Red,
        ThemeChoice::Blue,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ThemeChoice::Windows11 => "Windows 11",
            ThemeChoice::Dark => "Dark",
            ThemeChoice::Light => "Light",
            ThemeChoice::Red => "Red",
            ThemeChoice::Blue => "Blue",
        }
    }

    pub fn palette(&self) -> Palette {
        let (background, foreground, accent) = match self {
            ThemeChoice::Windows11 => (
                Rgb(0xFF, 0xFF, 0xFF),
                Rgb(0x00, 0x00, 0x00),
                Rgb(0x00, 0x78, 0xD4),
            ),
            ThemeChoice::Dark => (
                Rgb(0x2D, 0x2D, 0x2D),
                Rgb(0xFF, 0xFF, 0xFF),
                Rgb(0x1E, 0x90, 0xFF),
            ),
            ThemeChoice::Light => (
                Rgb(0xF0, 0xF0, 0xF0),
                Rgb(0x00, 0x00, 0x00),
                Rgb(0x41, 0x69, 0xE1),
            ),
            ThemeChoice::Red => (
                Rgb(0xFF, 0xF0, 0xF0),
                Rgb(0x00, 0x00, 0x00),
                Rgb(0xFF, 0x00, 0x00),
            ),
            ThemeChoice::Blue => (
                Rgb(0xF0, 0xF8, 0xFF),
                Rgb(0x00, 0x00, 0x00),
                Rgb(0x00, 0x00, 0xFF),
            ),
        };
        Palette {
            background,
            foreground,
            accent,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, ThemeChoice::Dark)
    }
}

impl fmt::Display for ThemeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ThemeChoice {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-', '_'], "");
        ThemeChoice::ALL
            .into_iter()
            .find(|theme| theme.label().to_ascii_lowercase().replace(' ', "") == normalized)
            .ok_or_else(|| ParseSettingError::new("theme", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDirection {
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    #[serde(rename = "فارسی")]
    Persian,
    #[serde(rename = "中文")]
    Chinese,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Persian, Language::Chinese];

    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Persian => "فارسی",
            Language::Chinese => "中文",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Persian => "fa",
            Language::Chinese => "zh",
        }
    }

    pub fn direction(&self) -> TextDirection {
        match self {
            Language::Persian => TextDirection::RightToLeft,
            _ => TextDirection::LeftToRight,
        }
    }

    /// Compiled translation catalog looked up next to the executable.
    pub fn translation_file(&self) -> String {
        format!("{}.qm", self.code())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Language::ALL
            .into_iter()
            .find(|lang| {
                lang.label() == trimmed
                    || lang.code().eq_ignore_ascii_case(trimmed)
                    || format!("{:?}", lang).eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ParseSettingError::new("language", value))
    }
}

/// Flat configuration record saved verbatim inside a project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectSettings {
    pub theme: ThemeChoice,
    pub language: Language,
    pub wifi6: bool,
    pub wpa3: bool,
    pub offline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_plan: Option<PathBuf>,
}
