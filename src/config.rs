use std::path::Path;

use serde::{Deserialize, Serialize};

/// Geometry and iteration knobs for the layout pipeline. All distances are
/// in the abstract canvas unit the presentation layer scales from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Person card size (3:4 ratio).
    pub card_w: f32,
    pub card_h: f32,
    /// Minimum horizontal gap between unrelated neighbors in a row.
    pub min_h_gap: f32,
    /// Smaller gap between the two members of a couple.
    pub min_couple_gap: f32,
    /// Gap between packed sibling blocks.
    pub min_block_gap: f32,
    /// Gap between children of the same union.
    pub min_child_gap: f32,
    /// Minimum vertical gap between generation rows.
    pub min_v_gap: f32,
    /// Union marker offset below the parent row and its size.
    pub union_dy: f32,
    pub union_w: f32,
    pub union_h: f32,
    /// Margin added around the finished drawing.
    pub margin: f32,
    /// Maximum alternating median-sweep rounds for crossing minimization.
    pub order_sweeps: usize,
    /// Cap on couple-leveling passes during generation assignment.
    pub level_passes: usize,
    /// Cap on residual de-overlap sweeps per row.
    pub overlap_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            card_w: 100.0,
            card_h: 133.33,
            min_h_gap: 56.0,
            min_couple_gap: 16.0,
            min_block_gap: 120.0,
            min_child_gap: 36.0,
            min_v_gap: 160.0,
            union_dy: 24.0,
            union_w: 16.0,
            union_h: 16.0,
            margin: 60.0,
            order_sweeps: 10,
            level_passes: 3,
            overlap_passes: 100,
        }
    }
}

/// Load a config from a JSON file; absent path means defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config: LayoutConfig = serde_json::from_str(&contents)?;
    Ok(config)
}
