//! Arena model: grid-to-pixel mapping, obstacles and base zones
//!
//! Obstacles are static for a round and replaced only on explicit reset.
//! Layouts arrive from JSON map files; anything missing or corrupt falls
//! back to the deterministic built-in layout and is logged, never fatal.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::Config;

use super::geom::Rect;

/// On-disk map format: an ordered list of x/y/width/height quadruples in
/// pixel space relative to the arena's top-left origin.
#[derive(Debug, Serialize, Deserialize)]
struct LayoutFile {
    obstacles: Vec<[f32; 4]>,
}

/// A set of obstacle rectangles for one arena
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleLayout {
    pub rects: Vec<Rect>,
}

impl ObstacleLayout {
    /// The built-in fallback: three vertical bars across the middle columns
    /// plus a horizontal bar dead center.
    pub fn default_for(cfg: &Config) -> Self {
        let mut rects = Vec::new();
        for c in [cfg.cols / 4, cfg.cols / 2, cfg.cols * 3 / 4] {
            let x = cfg.margin + c as f32 * cfg.cell + cfg.cell / 2.0 - 8.0;
            let y = cfg.margin + cfg.cell / 2.0;
            rects.push(Rect::new(x, y, 16.0, cfg.cell * 3.0));
        }
        rects.push(Rect::new(
            cfg.width() / 2.0 - 80.0,
            cfg.height() / 2.0 - 10.0,
            160.0,
            20.0,
        ));
        Self { rects }
    }

    /// Parse the JSON map format
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: LayoutFile = serde_json::from_str(json)?;
        Ok(Self {
            rects: file
                .obstacles
                .iter()
                .map(|&[x, y, w, h]| Rect::new(x, y, w, h))
                .collect(),
        })
    }

    /// Load one map file; any failure falls back to the built-in layout
    pub fn load<P: AsRef<Path>>(path: P, cfg: &Config) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(json) => match Self::from_json(&json) {
                Ok(layout) => {
                    log::info!("Loaded map: {}", path.as_ref().display());
                    layout
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse map {}: {e}, using default layout",
                        path.as_ref().display()
                    );
                    Self::default_for(cfg)
                }
            },
            Err(e) => {
                log::warn!(
                    "Failed to read map {}: {e}, using default layout",
                    path.as_ref().display()
                );
                Self::default_for(cfg)
            }
        }
    }

    /// Pick a random `*.json` map from a folder, falling back when the
    /// folder is missing or holds none.
    pub fn load_random<P: AsRef<Path>, R: Rng>(dir: P, cfg: &Config, rng: &mut R) -> Self {
        let mut maps: Vec<_> = match std::fs::read_dir(dir.as_ref()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect(),
            Err(_) => Vec::new(),
        };
        if maps.is_empty() {
            log::info!("No maps in {}, using default layout", dir.as_ref().display());
            return Self::default_for(cfg);
        }
        // Stable order so the same RNG draw picks the same file everywhere
        maps.sort();
        let chosen = &maps[rng.random_range(0..maps.len())];
        Self::load(chosen, cfg)
    }
}

/// A side's scoring zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub owner: usize,
    pub rect: Rect,
}

/// The playfield: grid metrics, obstacle set and both bases
#[derive(Debug, Clone)]
pub struct Arena {
    pub rows: u32,
    pub cols: u32,
    pub cell: f32,
    pub margin: f32,
    pub width: f32,
    pub height: f32,
    pub obstacles: Vec<Rect>,
    pub bases: [Base; 2],
}

impl Arena {
    pub fn new(cfg: &Config, layout: ObstacleLayout) -> Self {
        let width = cfg.width();
        let height = cfg.height();

        // Bases hug the left/right edges, one column wide, three cells tall
        let base_h = (3.0 * cfg.cell).min(cfg.rows as f32 * cfg.cell);
        let base_y = cfg.margin + (cfg.rows as f32 * cfg.cell - base_h) / 2.0;
        let bases = [
            Base {
                owner: 0,
                rect: Rect::new(cfg.margin, base_y, cfg.cell, base_h),
            },
            Base {
                owner: 1,
                rect: Rect::new(width - cfg.margin - cfg.cell, base_y, cfg.cell, base_h),
            },
        ];

        Self {
            rows: cfg.rows,
            cols: cfg.cols,
            cell: cfg.cell,
            margin: cfg.margin,
            width,
            height,
            obstacles: layout.rects,
            bases,
        }
    }

    /// Pixel center of a grid cell
    pub fn grid_to_px(&self, row: u32, col: u32) -> Vec2 {
        Vec2::new(
            self.margin + col as f32 * self.cell + self.cell / 2.0,
            self.margin + row as f32 * self.cell + self.cell / 2.0,
        )
    }

    /// Is the center of this cell inside any obstacle?
    pub fn cell_center_blocked(&self, row: u32, col: u32) -> bool {
        let p = self.grid_to_px(row, col);
        self.obstacles.iter().any(|r| r.contains(p))
    }

    /// Unblocked cells of the central region treasures may spawn in
    pub fn treasure_cells(&self) -> Vec<(u32, u32)> {
        let col_lo = self.cols / 3;
        let col_hi = self.cols - self.cols / 3;
        (1..self.rows.saturating_sub(1))
            .flat_map(|r| (col_lo..col_hi).map(move |c| (r, c)))
            .filter(|&(r, c)| !self.cell_center_blocked(r, c))
            .collect()
    }

    /// Unblocked cells of the band items may spawn in (keeps two columns
    /// clear in front of each base)
    pub fn item_cells(&self) -> Vec<(u32, u32)> {
        (0..self.rows)
            .flat_map(|r| (2..self.cols.saturating_sub(2)).map(move |c| (r, c)))
            .filter(|&(r, c)| !self.cell_center_blocked(r, c))
            .collect()
    }

    /// Round-start position for a side's coin, just inside its base edge
    pub fn coin_start(&self, side: usize) -> Vec2 {
        let y = self.height / 2.0;
        if side == 0 {
            Vec2::new(self.margin + 20.0, y)
        } else {
            Vec2::new(self.width - self.margin - 20.0, y)
        }
    }
}
