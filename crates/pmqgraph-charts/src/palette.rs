//! Categorical palettes and the issue-to-color mapping
//!
//! The mapping is a pure function of the category list: `palette[i]` goes to
//! `categories[i]` in list order. Every panel of a faceted figure consumes
//! the same mapping, which is what keeps colors consistent across panels.

use pmqgraph_common::{PmqGraphError, Result};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// One entry of a color mapping
pub type IssueColor = (String, RGBColor);

/// Categorical color palettes
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum Palette {
    /// The ten-color categorical palette used by the source figures
    #[default]
    Tab10,
    /// High-saturation alternative
    Vibrant,
    /// Grayscale
    Monochrome,
    /// Caller-supplied hex colors
    Custom(Vec<String>),
}

impl Palette {
    /// The ordered colors of this palette
    pub fn colors(&self) -> Result<Vec<RGBColor>> {
        match self {
            Palette::Tab10 => Ok(vec![
                RGBColor(31, 119, 180),  // Blue
                RGBColor(255, 127, 14),  // Orange
                RGBColor(44, 160, 44),   // Green
                RGBColor(214, 39, 40),   // Red
                RGBColor(148, 103, 189), // Purple
                RGBColor(140, 86, 75),   // Brown
                RGBColor(227, 119, 194), // Pink
                RGBColor(127, 127, 127), // Gray
                RGBColor(188, 189, 34),  // Olive
                RGBColor(23, 190, 207),  // Cyan
            ]),
            Palette::Vibrant => Ok(vec![
                RGBColor(230, 25, 75),  // Red
                RGBColor(60, 180, 75),  // Green
                RGBColor(255, 225, 25), // Yellow
                RGBColor(0, 130, 200),  // Blue
                RGBColor(245, 130, 48), // Orange
                RGBColor(145, 30, 180), // Purple
                RGBColor(70, 240, 240), // Cyan
                RGBColor(240, 50, 230), // Magenta
            ]),
            Palette::Monochrome => Ok(vec![
                RGBColor(0, 0, 0),
                RGBColor(64, 64, 64),
                RGBColor(128, 128, 128),
                RGBColor(192, 192, 192),
                RGBColor(224, 224, 224),
            ]),
            Palette::Custom(colors) => colors.iter().map(|hex| parse_color(hex)).collect(),
        }
    }
}

/// Parse a `#RRGGBB` color string
pub fn parse_color(color_str: &str) -> Result<RGBColor> {
    if let Some(hex) = color_str.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Ok(RGBColor(r, g, b));
            }
        }
    }
    Err(PmqGraphError::validation_field(
        format!("'{}' is not a valid hex color", color_str),
        "color",
    ))
}

/// Build the category-to-color mapping for a render.
///
/// Deterministic and order-sensitive: reordering `categories` changes which
/// color each label gets. Fails when the palette cannot supply one distinct
/// color per category, or when a label repeats (the mapping must stay a
/// bijection).
pub fn color_mapping(categories: &[String], palette: &Palette) -> Result<Vec<IssueColor>> {
    let colors = palette.colors()?;

    if categories.len() > colors.len() {
        return Err(PmqGraphError::validation_field(
            format!(
                "{} categories requested but the palette has only {} colors",
                categories.len(),
                colors.len()
            ),
            "categories",
        ));
    }

    for (i, category) in categories.iter().enumerate() {
        if categories[..i].contains(category) {
            return Err(PmqGraphError::validation_field(
                format!("duplicate category '{}'", category),
                "categories",
            ));
        }
    }

    Ok(categories
        .iter()
        .cloned()
        .zip(colors.into_iter())
        .collect())
}
