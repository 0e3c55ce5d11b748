use serde::{Deserialize, Serialize};

use crate::diagram::{Node, NodeKind};
use crate::settings::{LabelStyle, Settings};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayUnits {
    #[default]
    Auto,
    None,
    Thousands,
    Millions,
    Billions,
    Trillions,
}

const UNITS: [&str; 5] = ["", "K", "M", "bn", "T"];
const DEFAULT_DECIMALS: u8 = 2;

impl DisplayUnits {
    pub const ALL: [Self; 6] = [
        Self::Auto,
        Self::None,
        Self::Thousands,
        Self::Millions,
        Self::Billions,
        Self::Trillions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::None => "None",
            Self::Thousands => "Thousands",
            Self::Millions => "Millions",
            Self::Billions => "Billions",
            Self::Trillions => "Trillions",
        }
    }

    fn exponent(self, value: f64) -> usize {
        match self {
            Self::None => 0,
            Self::Thousands => 1,
            Self::Millions => 2,
            Self::Billions => 3,
            Self::Trillions => 4,
            Self::Auto => {
                let mut magnitude = value.abs();
                let mut unit = 0usize;
                while magnitude >= 1000.0 && unit < UNITS.len() - 1 {
                    magnitude /= 1000.0;
                    unit += 1;
                }
                unit
            }
        }
    }
}

pub fn format_value(value: f64, units: DisplayUnits, decimals: Option<u8>) -> String {
    if !value.is_finite() {
        return "-".to_owned();
    }

    let unit = units.exponent(value);
    let scaled = value / 1000f64.powi(unit as i32);
    let decimals = match decimals {
        Some(decimals) => decimals as usize,
        None if unit == 0 && scaled.fract() == 0.0 => 0,
        None => DEFAULT_DECIMALS as usize,
    };

    format!("{scaled:.decimals$}{}", UNITS[unit])
}

pub fn format_percent(ratio: f64, decimals: Option<u8>) -> String {
    if !ratio.is_finite() {
        return "-".to_owned();
    }
    let decimals = decimals.unwrap_or(1) as usize;
    format!("{:.decimals$}%", ratio * 100.0)
}

/// Label for `node`; `root_value` replaces the root aggregate when an override measure exists.
pub fn label_text(node: &Node, root_value: Option<f64>, settings: &Settings) -> String {
    let labels = &settings.labels;
    let value = match node.kind {
        NodeKind::Root => root_value.unwrap_or(node.aggregate_value),
        _ => node.aggregate_value,
    };
    let value_text = format_value(value, labels.display_units, labels.decimal_places);
    let percent_text = format_percent(node.percentage_of_parent, labels.decimal_places);
    let name = node.display_name.as_str();

    if node.kind == NodeKind::Root {
        return match labels.style {
            LabelStyle::Name => name.to_owned(),
            LabelStyle::Percentage | LabelStyle::Value => value_text,
            _ => format!("{name}: {value_text}"),
        };
    }

    match labels.style {
        LabelStyle::Name => name.to_owned(),
        LabelStyle::Value => value_text,
        LabelStyle::Percentage => percent_text,
        LabelStyle::NameAndValue => format!("{name}: {value_text}"),
        LabelStyle::NameAndPercentage => format!("{name}: {percent_text}"),
        LabelStyle::All => format!("{name}: {value_text} ({percent_text})"),
    }
}
