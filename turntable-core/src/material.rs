/// Per-object surface selection by mesh index
use serde::{Deserialize, Serialize};

/// Linear RGBA color, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b, 1.0])
    }

    pub fn r(&self) -> f32 {
        self.0[0]
    }

    pub fn g(&self) -> f32 {
        self.0[1]
    }

    pub fn b(&self) -> f32 {
        self.0[2]
    }

    pub fn a(&self) -> f32 {
        self.0[3]
    }

    /// Multiply the color channels by a light intensity, alpha untouched
    pub fn scaled(&self, intensity: f32) -> Self {
        Self([
            self.r() * intensity,
            self.g() * intensity,
            self.b() * intensity,
            self.a(),
        ])
    }
}

pub const BODY_RED: Rgba = Rgba::rgb(0.78, 0.1, 0.12);
pub const GLASS_BLUE: Rgba = Rgba::rgb(0.35, 0.6, 0.9);
pub const TRIM_BLACK: Rgba = Rgba::rgb(0.05, 0.05, 0.06);
pub const STRIPE_WHITE: Rgba = Rgba::rgb(0.95, 0.95, 0.95);
pub const HEADLIGHT_YELLOW: Rgba = Rgba::rgb(1.0, 0.88, 0.3);
pub const PLATFORM_GRAY: Rgba = Rgba::rgb(0.5, 0.5, 0.52);
/// `#00aabb`, used when a lone mesh is shown without a palette
pub const SOLO_TEAL: Rgba = Rgba::rgb(0.0, 0xaa as f32 / 255.0, 0xbb as f32 / 255.0);

/// Surface of one renderable: a flat color, optionally replaced by a texture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Rgba,
    /// Backend-specific texture name (an `<img>` id on the web)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

impl Material {
    pub const fn solid(color: Rgba) -> Self {
        Self {
            color,
            texture: None,
        }
    }

    pub fn textured(name: impl Into<String>) -> Self {
        Self {
            color: Rgba::rgb(1.0, 1.0, 1.0),
            texture: Some(name.into()),
        }
    }
}

/// One row of the lookup table: every mesh index listed gets `material`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRule {
    pub indices: Vec<usize>,
    pub material: Material,
}

/// Ordered mesh-index → material lookup with a fallback.
///
/// Rules are checked in order and the first one listing the index wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTable {
    pub rules: Vec<MaterialRule>,
    pub fallback: Material,
}

impl MaterialTable {
    pub fn uniform(material: Material) -> Self {
        Self {
            rules: Vec::new(),
            fallback: material,
        }
    }

    pub fn with_rule(mut self, indices: &[usize], material: Material) -> Self {
        self.rules.push(MaterialRule {
            indices: indices.to_vec(),
            material,
        });
        self
    }

    pub fn lookup(&self, index: usize) -> &Material {
        self.rules
            .iter()
            .find(|rule| rule.indices.contains(&index))
            .map(|rule| &rule.material)
            .unwrap_or(&self.fallback)
    }

    /// Palette for the multi-part car model
    pub fn car() -> Self {
        Self::uniform(Material::solid(BODY_RED))
            .with_rule(&[5], Material::solid(GLASS_BLUE))
            .with_rule(&[1, 2, 9, 10, 12, 13], Material::solid(TRIM_BLACK))
            .with_rule(&[3], Material::solid(STRIPE_WHITE))
            .with_rule(&[6, 7], Material::solid(HEADLIGHT_YELLOW))
            .with_rule(&[14], Material::solid(PLATFORM_GRAY))
    }

    /// Single color for a cube or STL part shown on its own
    pub fn solo() -> Self {
        Self::uniform(Material::solid(SOLO_TEAL))
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::car()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glass_index() {
        let table = MaterialTable::car();
        assert_eq!(table.lookup(5).color, GLASS_BLUE);
    }

    #[test]
    fn test_unmapped_index_falls_back_to_body() {
        let table = MaterialTable::car();
        assert_eq!(table.lookup(99).color, BODY_RED);
        assert_eq!(table.lookup(0).color, BODY_RED);
        assert_eq!(table.lookup(4).color, BODY_RED);
    }

    #[test]
    fn test_car_palette() {
        let table = MaterialTable::car();
        for i in [1, 2, 9, 10, 12, 13] {
            assert_eq!(table.lookup(i).color, TRIM_BLACK, "index {}", i);
        }
        assert_eq!(table.lookup(3).color, STRIPE_WHITE);
        assert_eq!(table.lookup(6).color, HEADLIGHT_YELLOW);
        assert_eq!(table.lookup(7).color, HEADLIGHT_YELLOW);
        assert_eq!(table.lookup(14).color, PLATFORM_GRAY);
    }

    #[test]
    fn test_solo_table_is_teal_everywhere() {
        let table = MaterialTable::solo();
        assert_eq!(table.lookup(0).color, SOLO_TEAL);
        assert_eq!(table.lookup(5).color, SOLO_TEAL);
        assert!((SOLO_TEAL.b() - 0.7333).abs() < 1e-3);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let table = MaterialTable::uniform(Material::solid(BODY_RED))
            .with_rule(&[2], Material::textured("crate-image"))
            .with_rule(&[2, 3], Material::solid(GLASS_BLUE));
        assert_eq!(table.lookup(2).texture.as_deref(), Some("crate-image"));
        assert_eq!(table.lookup(3).color, GLASS_BLUE);
    }

    #[test]
    fn test_table_from_json() {
        let json = r#"{
            "rules": [{ "indices": [0], "material": { "color": [0, 0, 1, 1], "texture": "crate" } }],
            "fallback": { "color": [1, 1, 1, 1] }
        }"#;
        let table: MaterialTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.lookup(0).texture.as_deref(), Some("crate"));
        assert_eq!(table.lookup(1).texture, None);
        assert_eq!(table.lookup(1).color, Rgba::rgb(1.0, 1.0, 1.0));
    }
}
