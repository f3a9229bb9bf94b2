/// Text boxes with per-character styling.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use canvas_pad_config::HexColor;
use serde::{Deserialize, Serialize};

/// Font sizes outside this range, in pixels, are clamped into it.
pub const FONT_SIZE_RANGE: (f64, f64) = (8.0, 100.0);

/// A style that can be switched on and off for a character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyleFlag {
    Bold,
    Italic,
    Underline,
}

impl FromStr for TextStyleFlag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bold" => Ok(Self::Bold),
            "italic" => Ok(Self::Italic),
            "underline" => Ok(Self::Underline),
            other => bail!("unknown text style: {other} (expected bold, italic or underline)"),
        }
    }
}

impl fmt::Display for TextStyleFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
        })
    }
}

/// Style overrides for a single character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharStyle {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
}

impl CharStyle {
    pub fn has(&self, flag: TextStyleFlag) -> bool {
        match flag {
            TextStyleFlag::Bold => self.bold,
            TextStyleFlag::Italic => self.italic,
            TextStyleFlag::Underline => self.underline,
        }
    }

    pub fn set(&mut self, flag: TextStyleFlag, on: bool) {
        match flag {
            TextStyleFlag::Bold => self.bold = on,
            TextStyleFlag::Italic => self.italic = on,
            TextStyleFlag::Underline => self.underline = on,
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// Whole-box style changes. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyleUpdate {
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub fill: Option<HexColor>,
}

impl TextStyleUpdate {
    pub fn is_empty(&self) -> bool {
        self.font_size.is_none() && self.font_family.is_none() && self.fill.is_none()
    }
}

/// Editable text with a box-wide base style and per-character overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub fill: HexColor,
    /// Char index → override. Plain characters have no entry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<usize, CharStyle>,
}

impl TextBox {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: 24.0,
            font_family: "Times New Roman".to_string(),
            fill: HexColor::BLACK,
            styles: BTreeMap::new(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Style of the character at `index`.
    pub fn style_at(&self, index: usize) -> CharStyle {
        self.styles.get(&index).copied().unwrap_or_default()
    }

    /// Toggles `flag` over the chars in `start..end`.
    ///
    /// If any char in the range carries the flag it is cleared from the whole
    /// range; otherwise it is set on the whole range. Returns `false` for an
    /// empty or out-of-range selection.
    pub fn toggle_style(&mut self, flag: TextStyleFlag, start: usize, end: usize) -> bool {
        if start >= end || end > self.char_len() {
            return false;
        }
        let on = !(start..end).any(|i| self.style_at(i).has(flag));
        for i in start..end {
            let mut style = self.style_at(i);
            style.set(flag, on);
            if style.is_plain() {
                self.styles.remove(&i);
            } else {
                self.styles.insert(i, style);
            }
        }
        true
    }

    /// Applies box-wide changes. Returns whether anything changed.
    ///
    /// The font size is clamped to [`FONT_SIZE_RANGE`].
    ///
    /// # Errors
    ///
    /// Returns an error for a non-finite font size or a blank font family;
    /// nothing is applied in that case.
    pub fn apply(&mut self, update: &TextStyleUpdate) -> anyhow::Result<bool> {
        if update.font_size.is_some_and(|size| !size.is_finite()) {
            bail!("font size must be a finite number");
        }
        if update.font_family.as_deref().is_some_and(|f| f.trim().is_empty()) {
            bail!("font family must not be blank");
        }

        let before = self.clone();
        if let Some(size) = update.font_size {
            self.font_size = size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
        }
        if let Some(family) = &update.font_family {
            self.font_family = family.trim().to_string();
        }
        if let Some(fill) = update.fill {
            self.fill = fill;
        }
        Ok(*self != before)
    }
}
