//! Swaps in the still-life's hand-tuned materials by node name.

use super::material::{rgb8, srgb_to_linear, Material, Rgb, TranslucentParams, WindPatch};
use super::SceneGraph;

/// What happens to a node whose name matches a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Flame: keep the imported material, add wind displacement.
    WindFlame,
    /// Wax bodies: translucent material, casts and receives shadows.
    Wax,
    /// Candle plate: shadows both ways, dimmer reflections.
    Plate,
    /// Table top: receives shadows, tinted to match the background.
    Tabletop,
    /// Foliage only casts.
    CastOnly,
    /// Vase: casts. Environment reflections are already on for every
    /// standard material.
    Reflective,
}

pub const RULES: &[(&str, Rule)] = &[
    ("flame", Rule::WindFlame),
    ("Wax", Rule::Wax),
    ("Wax001", Rule::Wax),
    ("Cube", Rule::Wax),
    ("Circle", Rule::Plate),
    ("Circle001", Rule::Tabletop),
    ("Leaves_Mat1_0001", Rule::CastOnly),
    ("Tall_Vase_with_dry_branch_decoration", Rule::Reflective),
];

const PLATE_ENV_INTENSITY: f32 = 0.4;
const TABLETOP_ENV_INTENSITY: f32 = 0.2;

/// Inputs shared by every rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindContext {
    pub wax: TranslucentParams,
    /// Table top tint in sRGB; converted to linear when applied.
    pub tabletop_color: Rgb,
}

impl Default for BindContext {
    fn default() -> Self {
        Self {
            wax: TranslucentParams::default(),
            tabletop_color: rgb8(0x93, 0x60, 0x45),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindReport {
    /// Node name and the rule applied to it, in traversal order.
    pub applied: Vec<(String, Rule)>,
    /// Rule names that matched no node.
    pub missing: Vec<&'static str>,
}

impl BindReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialBinder {
    context: BindContext,
}

impl MaterialBinder {
    pub fn new(context: BindContext) -> Self {
        Self { context }
    }

    pub fn rule_for(name: &str) -> Option<Rule> {
        RULES
            .iter()
            .find(|(rule_name, _)| *rule_name == name)
            .map(|(_, rule)| *rule)
    }

    /// Applies the rule table to every node. Nodes with unknown names are left
    /// untouched; rules that match nothing are reported and logged, never
    /// treated as fatal.
    pub fn bind(&self, graph: &mut SceneGraph) -> BindReport {
        let mut report = BindReport::default();
        for node in graph.nodes_mut() {
            let Some(rule) = Self::rule_for(&node.name) else {
                continue;
            };
            self.apply(rule, node);
            report.applied.push((node.name.clone(), rule));
        }

        report.missing = RULES
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| !graph.contains(name))
            .collect();
        for name in &report.missing {
            log::warn!("Scene has no node named '{}'; its material rule is skipped", name);
        }
        log::info!(
            "Material binder applied {} rule(s), {} missing",
            report.applied.len(),
            report.missing.len()
        );
        report
    }

    fn apply(&self, rule: Rule, node: &mut super::SceneNode) {
        match rule {
            Rule::WindFlame => {
                if let Material::Standard(base) = node.material {
                    node.material = Material::Flame {
                        base,
                        wind: WindPatch::default(),
                    };
                }
            }
            Rule::Wax => {
                node.material = Material::Translucent(self.context.wax);
                node.cast_shadow = true;
                node.receive_shadow = true;
            }
            Rule::Plate => {
                node.cast_shadow = true;
                node.receive_shadow = true;
                if let Some(base) = node.material.standard_mut() {
                    base.env_intensity = PLATE_ENV_INTENSITY;
                }
            }
            Rule::Tabletop => {
                node.receive_shadow = true;
                if let Some(base) = node.material.standard_mut() {
                    base.env_intensity = TABLETOP_ENV_INTENSITY;
                    let [r, g, b] = srgb_to_linear(self.context.tabletop_color);
                    base.base_color = [r, g, b, base.base_color[3]];
                }
            }
            Rule::CastOnly | Rule::Reflective => {
                node.cast_shadow = true;
            }
        }
    }
}
