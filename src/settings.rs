use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::Color32;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::format::DisplayUnits;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStyle {
    Name,
    Value,
    Percentage,
    #[default]
    NameAndValue,
    NameAndPercentage,
    All,
}

impl LabelStyle {
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Value,
        Self::Percentage,
        Self::NameAndValue,
        Self::NameAndPercentage,
        Self::All,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Value => "Value",
            Self::Percentage => "Percentage",
            Self::NameAndValue => "Name and value",
            Self::NameAndPercentage => "Name and percentage",
            Self::All => "Name, value and percentage",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootLabelSource {
    #[default]
    First,
    Last,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSettings {
    pub show: bool,
    pub style: LabelStyle,
    pub color: String,
    pub font_size: f32,
    pub display_units: DisplayUnits,
    pub decimal_places: Option<u8>,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            show: true,
            style: LabelStyle::default(),
            color: "#e6e6e6".to_owned(),
            font_size: 12.0,
            display_units: DisplayUnits::Auto,
            decimal_places: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootSettings {
    pub text: String,
    pub color: String,
    pub label_source: RootLabelSource,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            text: "Total".to_owned(),
            color: "#8c8c8c".to_owned(),
            label_source: RootLabelSource::First,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendSettings {
    pub show: bool,
}

impl Default for LegendSettings {
    fn default() -> Self {
        Self { show: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub link_distance: f32,
    pub charge: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_link_width: f32,
    pub max_link_width: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            link_distance: 70.0,
            charge: -160.0,
            min_radius: 4.0,
            max_radius: 34.0,
            min_link_width: 1.0,
            max_link_width: 14.0,
        }
    }
}

/// Read-only snapshot consumed by one build.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub labels: LabelSettings,
    pub root: RootSettings,
    pub legend: LegendSettings,
    pub colors: HashMap<String, String>,
    pub layout: LayoutSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("failed to parse settings {}", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid settings JSON")
    }

    pub fn label_color(&self) -> Color32 {
        color_or(&self.labels.color, Color32::from_gray(230))
    }

    pub fn root_color(&self) -> Color32 {
        color_or(&self.root.color, Color32::from_gray(140))
    }

    pub fn color_overrides(&self) -> HashMap<String, Color32> {
        self.colors
            .iter()
            .filter_map(|(category, raw)| match parse_hex_color(raw) {
                Some(color) => Some((category.clone(), color)),
                None => {
                    warn!(category = %category, value = %raw, "ignoring invalid color override");
                    None
                }
            })
            .collect()
    }
}

fn color_or(raw: &str, fallback: Color32) -> Color32 {
    parse_hex_color(raw).unwrap_or_else(|| {
        warn!(value = %raw, "invalid color, using default");
        fallback
    })
}

/// Parses `#rgb`, `#rrggbb` and `#rrggbbaa`.
pub fn parse_hex_color(raw: &str) -> Option<Color32> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |index: usize, width: usize| {
        let digits = hex.get(index * width..(index + 1) * width)?;
        let value = u8::from_str_radix(digits, 16).ok()?;
        Some(if width == 1 { value * 17 } else { value })
    };

    match hex.len() {
        3 => Some(Color32::from_rgb(channel(0, 1)?, channel(1, 1)?, channel(2, 1)?)),
        6 => Some(Color32::from_rgb(channel(0, 2)?, channel(1, 2)?, channel(2, 2)?)),
        8 => Some(Color32::from_rgba_unmultiplied(
            channel(0, 2)?,
            channel(1, 2)?,
            channel(2, 2)?,
            channel(3, 2)?,
        )),
        _ => None,
    }
}
