//! # Page Size Table
//!
//! Named page sizes and their dimensions in millimetres.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Width and height of a page in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Standard page sizes, plus a caller-supplied custom pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in millimetres.
    pub fn dimensions(&self) -> Dimensions {
        match self {
            PageSize::A1 => Dimensions::new(594.0, 841.0),
            PageSize::A2 => Dimensions::new(419.9, 594.0),
            PageSize::A3 => Dimensions::new(297.0, 419.9),
            PageSize::A4 => Dimensions::new(210.0, 297.0),
            PageSize::A5 => Dimensions::new(148.4, 210.0),
            PageSize::A6 => Dimensions::new(105.0, 148.5),
            PageSize::Letter => Dimensions::new(215.9, 279.4),
            PageSize::Legal => Dimensions::new(215.9, 355.6),
            PageSize::Tabloid => Dimensions::new(279.4, 431.8),
            PageSize::Custom { width, height } => Dimensions::new(*width, *height),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PageSize::A1 => "A1",
            PageSize::A2 => "A2",
            PageSize::A3 => "A3",
            PageSize::A4 => "A4",
            PageSize::A5 => "A5",
            PageSize::A6 => "A6",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
            PageSize::Tabloid => "Tabloid",
            PageSize::Custom { .. } => "Custom",
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Custom { width, height } => write!(f, "Custom({}x{})", width, height),
            other => f.write_str(other.name()),
        }
    }
}

/// Look up a named page size. `"default"` resolves to A4.
///
/// `"custom"` is not accepted here: custom dimensions live in the
/// configuration, not in the table.
pub fn lookup(name: &str) -> Result<PageSize, GridError> {
    let size = match name.trim().to_ascii_lowercase().as_str() {
        "default" | "a4" => PageSize::A4,
        "a1" => PageSize::A1,
        "a2" => PageSize::A2,
        "a3" => PageSize::A3,
        "a5" => PageSize::A5,
        "a6" => PageSize::A6,
        "letter" => PageSize::Letter,
        "legal" => PageSize::Legal,
        "tabloid" => PageSize::Tabloid,
        _ => return Err(GridError::UnknownPageSize(name.to_string())),
    };
    Ok(size)
}

/// Dimensions for a named page size.
pub fn dimensions(name: &str) -> Result<Dimensions, GridError> {
    lookup(name).map(|size| size.dimensions())
}

impl FromStr for PageSize {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_a4() {
        assert_eq!(dimensions("default").unwrap(), Dimensions::new(210.0, 297.0));
        assert_eq!(PageSize::default(), PageSize::A4);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("letter").unwrap(), PageSize::Letter);
        assert_eq!(lookup(" A1 ").unwrap(), PageSize::A1);
        assert_eq!("tabloid".parse::<PageSize>().unwrap(), PageSize::Tabloid);
    }

    #[test]
    fn test_unknown_name_fails() {
        match dimensions("B7") {
            Err(GridError::UnknownPageSize(name)) => assert_eq!(name, "B7"),
            other => panic!("expected UnknownPageSize, got {:?}", other),
        }
        assert!(lookup("custom").is_err());
    }

    #[test]
    fn test_custom_dimensions_pass_through() {
        let size = PageSize::Custom {
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(size.dimensions(), Dimensions::new(100.0, 50.0));
    }

    #[test]
    fn test_all_named_sizes_are_portrait() {
        for size in [
            PageSize::A1,
            PageSize::A2,
            PageSize::A3,
            PageSize::A4,
            PageSize::A5,
            PageSize::A6,
            PageSize::Letter,
            PageSize::Legal,
            PageSize::Tabloid,
        ] {
            let d = size.dimensions();
            assert!(d.height > d.width, "{} should be portrait", size);
        }
    }
}
