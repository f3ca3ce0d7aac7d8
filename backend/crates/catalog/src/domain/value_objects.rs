//! Domain Value Objects
//!
//! Validated catalog values. Error messages are the ones shown to API
//! clients next to the offending field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("A valid number is required.")]
    InvalidNumber,

    #[error("Ensure this value is greater than or equal to {0}.")]
    BelowMin(i64),

    #[error("Ensure this value is less than or equal to {0}.")]
    AboveMax(i64),

    #[error("Ensure that there are no more than {0} digits before the decimal point.")]
    TooManyDigits(usize),

    #[error("\"{0}\" is not a valid choice.")]
    InvalidChoice(String),

    #[error("Enter a valid URL.")]
    InvalidUrl,

    #[error("Enter a valid relative media path.")]
    InvalidMediaPath,
}

// ============================================================================
// Price
// ============================================================================

/// Non-negative amount with two fractional digits, held as integer cents
///
/// Serializes as the plain decimal string (`"19.99"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Price(i64);

impl Price {
    pub const MAX_INTEGER_DIGITS: usize = 8;
    pub const MAX_CENTS: i64 = 9_999_999_999;

    pub fn from_cents(cents: i64) -> Result<Self, ValueError> {
        if cents < 0 {
            return Err(ValueError::BelowMin(0));
        }
        if cents > Self::MAX_CENTS {
            return Err(ValueError::TooManyDigits(Self::MAX_INTEGER_DIGITS));
        }
        Ok(Self(cents))
    }

    /// Parse a decimal string; digits past the second fractional place
    /// are dropped, so `"19.999"` becomes 19.99
    pub fn parse(input: &str) -> Result<Self, ValueError> {
        let input = input.trim();
        let unsigned = match input.strip_prefix('-') {
            Some(rest) if !rest.is_empty() => {
                return if is_decimal(rest) {
                    Err(ValueError::BelowMin(0))
                } else {
                    Err(ValueError::InvalidNumber)
                };
            }
            _ => input.strip_prefix('+').unwrap_or(input),
        };

        if !is_decimal(unsigned) {
            return Err(ValueError::InvalidNumber);
        }

        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let whole = whole.trim_start_matches('0');
        if whole.len() > Self::MAX_INTEGER_DIGITS {
            return Err(ValueError::TooManyDigits(Self::MAX_INTEGER_DIGITS));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| ValueError::InvalidNumber)?
        };
        let mut cents_digits: String = fraction.chars().take(2).collect();
        while cents_digits.len() < 2 {
            cents_digits.push('0');
        }
        let cents: i64 = cents_digits.parse().map_err(|_| ValueError::InvalidNumber)?;

        Self::from_cents(whole * 100 + cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Currency form, e.g. `$19.99`
    pub fn display(&self) -> String {
        format!("${self}")
    }
}

/// Digits with at most one dot, and at least one digit somewhere
fn is_decimal(s: &str) -> bool {
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    !(whole.is_empty() && fraction.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Rating
// ============================================================================

/// Whole-star rating between 0 and 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, ValueError> {
        if value < 0 {
            return Err(ValueError::BelowMin(0));
        }
        if value > i64::from(Self::MAX) {
            return Err(ValueError::AboveMax(i64::from(Self::MAX)));
        }
        Ok(Self(value as u8))
    }

    /// Stored values outside 0-5 are clamped instead of rejected
    pub fn from_db(value: i32) -> Self {
        Self(value.clamp(0, i32::from(Self::MAX)) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Always five glyphs: `★★★☆☆` for 3
    pub fn stars(&self) -> String {
        let filled = usize::from(self.0);
        let empty = usize::from(Self::MAX) - filled;
        format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
    }
}

// ============================================================================
// Publication year
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PublicationYear(i32);

impl PublicationYear {
    pub const MIN: i32 = 1000;
    pub const MAX: i32 = 2030;

    pub fn new(year: i64) -> Result<Self, ValueError> {
        if year < i64::from(Self::MIN) {
            return Err(ValueError::BelowMin(i64::from(Self::MIN)));
        }
        if year > i64::from(Self::MAX) {
            return Err(ValueError::AboveMax(i64::from(Self::MAX)));
        }
        Ok(Self(year as i32))
    }

    /// Trust the database check constraint
    pub fn from_db(year: i32) -> Self {
        Self(year)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

// ============================================================================
// Source URL
// ============================================================================

/// Absolute http(s) URL of the page a book was scraped from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceUrl(String);

impl SourceUrl {
    pub const MAX_LENGTH: usize = 200;

    pub fn new(url: &str) -> Result<Self, ValueError> {
        let url = url.trim();
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or(ValueError::InvalidUrl)?;

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty()
            || url.chars().count() > Self::MAX_LENGTH
            || url.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(ValueError::InvalidUrl);
        }
        Ok(Self(url.to_string()))
    }

    pub fn from_db(url: String) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Media path
// ============================================================================

/// Image location relative to the media root, e.g. `books/covers/dune.jpg`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MediaPath(String);

impl MediaPath {
    pub const MAX_LENGTH: usize = 255;

    pub fn new(path: &str) -> Result<Self, ValueError> {
        let path = path.trim();
        let valid = !path.is_empty()
            && path.chars().count() <= Self::MAX_LENGTH
            && !path.starts_with('/')
            && !path.contains('\\')
            && !path.chars().any(char::is_control)
            && path
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if !valid {
            return Err(ValueError::InvalidMediaPath);
        }
        Ok(Self(path.to_string()))
    }

    pub fn from_db(path: String) -> Self {
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Lowercased extension without the dot
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                Some(ext.to_ascii_lowercase())
            }
            _ => None,
        }
    }
}

// ============================================================================
// Scraping status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapingStatus {
    Running,
    Completed,
    Failed,
    Interrupted,
}

impl ScrapingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapingStatus::Running => "running",
            ScrapingStatus::Completed => "completed",
            ScrapingStatus::Failed => "failed",
            ScrapingStatus::Interrupted => "interrupted",
        }
    }

    /// No transitions leave a terminal status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScrapingStatus::Running)
    }
}

impl fmt::Display for ScrapingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapingStatus {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(ScrapingStatus::Running),
            "completed" => Ok(ScrapingStatus::Completed),
            "failed" => Ok(ScrapingStatus::Failed),
            "interrupted" => Ok(ScrapingStatus::Interrupted),
            _ => Err(ValueError::InvalidChoice(s.to_string())),
        }
    }
}
