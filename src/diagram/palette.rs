use std::collections::HashMap;

use eframe::egui::Color32;

use crate::table::CategoryValue;
use crate::util::stable_index;

const CATEGORY_COLORS: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

/// Deterministic color per category name, independent of the order names are seen.
pub trait ColorGenerator {
    fn color(&self, name: &str) -> Color32;
}

pub struct HashedPalette {
    colors: Vec<Color32>,
}

impl HashedPalette {
    pub fn new(colors: Vec<Color32>) -> Self {
        Self { colors }
    }
}

impl Default for HashedPalette {
    fn default() -> Self {
        Self::new(CATEGORY_COLORS.to_vec())
    }
}

impl ColorGenerator for HashedPalette {
    fn color(&self, name: &str) -> Color32 {
        self.colors
            .get(stable_index(name, self.colors.len()))
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}

/// Top-level category colors for one build.
#[derive(Clone, Debug, Default)]
pub struct PaletteAssigner {
    entries: Vec<(CategoryValue, Color32)>,
}

impl PaletteAssigner {
    pub fn assign(
        categories: &[CategoryValue],
        overrides: &HashMap<String, Color32>,
        generator: &dyn ColorGenerator,
    ) -> Self {
        let mut entries: Vec<(CategoryValue, Color32)> = Vec::with_capacity(categories.len());
        for category in categories {
            if entries.iter().any(|(existing, _)| existing == category) {
                continue;
            }

            let name = category.to_string();
            let color = overrides
                .get(&name)
                .copied()
                .unwrap_or_else(|| generator.color(&name));
            entries.push((category.clone(), color));
        }
        Self { entries }
    }

    pub fn color_for(&self, category: &CategoryValue) -> Option<Color32> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == category)
            .map(|(_, color)| *color)
    }

    pub fn entries(&self) -> &[(CategoryValue, Color32)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl ColorGenerator for Fixed {
        fn color(&self, name: &str) -> Color32 {
            Color32::from_gray(name.len() as u8)
        }
    }

    #[test]
    fn first_occurrence_wins_and_overrides_apply() {
        let categories = vec![
            CategoryValue::from("US"),
            CategoryValue::from("EU"),
            CategoryValue::from("US"),
        ];
        let mut overrides = HashMap::new();
        overrides.insert("EU".to_owned(), Color32::RED);

        let palette = PaletteAssigner::assign(&categories, &overrides, &Fixed);
        assert_eq!(palette.entries().len(), 2);
        assert_eq!(palette.color_for(&"US".into()), Some(Color32::from_gray(2)));
        assert_eq!(palette.color_for(&"EU".into()), Some(Color32::RED));
        assert_eq!(palette.color_for(&"APAC".into()), None);
    }

    #[test]
    fn hashed_palette_ignores_order() {
        let generator = HashedPalette::default();
        let forward = PaletteAssigner::assign(
            &[CategoryValue::from("a"), CategoryValue::from("b")],
            &HashMap::new(),
            &generator,
        );
        let backward = PaletteAssigner::assign(
            &[CategoryValue::from("b"), CategoryValue::from("a")],
            &HashMap::new(),
            &generator,
        );
        assert_eq!(forward.color_for(&"a".into()), backward.color_for(&"a".into()));
        assert_eq!(forward.color_for(&"b".into()), backward.color_for(&"b".into()));
    }
}
