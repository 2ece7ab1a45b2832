//! Candidate site extraction: threshold the WSI grid, label 4-connected
//! regions and rank them.

use crate::config::schema::SiteSelection;
use crate::config::validate_selection;
use crate::error::VentoError;
use crate::model::{GeoTransform, WsiGrid};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

/// Inclusive row/column span of a site's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellBounds {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

/// Bounding box in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// A ranked connected region of high-suitability cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSite {
    /// 1-based position after sorting.
    pub rank: usize,
    pub cell_count: usize,
    /// cell_count * cell_area.
    pub area: f64,
    pub mean_wsi: f64,
    pub max_wsi: f64,
    pub bounds: CellBounds,
    pub extent: MapExtent,
    /// Map coordinate of the mean cell center.
    pub centroid: (f64, f64),
}

/// Sites together with the threshold that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteExtraction {
    /// `None` when nothing could be selected (no valid cells, or a
    /// top percentage of 0).
    pub effective_threshold: Option<f64>,
    pub sites: Vec<CandidateSite>,
}

/// Linear-interpolated percentile (`pct` in [0, 100]) of sorted values.
pub fn percentile(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// The larger of `min_wsi` and the `(100 - top_percentage)`-th percentile of
/// valid WSI values.
pub fn effective_threshold(wsi: &WsiGrid, top_percentage: f64, min_wsi: f64) -> Option<f64> {
    if top_percentage <= 0.0 {
        return None;
    }
    let mut sorted: Vec<f64> = wsi.iter_valid().map(|(_, v)| v).collect();
    sorted.sort_by(f64::total_cmp);
    percentile(&sorted, 100.0 - top_percentage).map(|p| p.max(min_wsi))
}

/// Ranked candidate sites.
pub fn select(
    wsi: &WsiGrid,
    selection: &SiteSelection,
    cell_area: f64,
) -> Result<Vec<CandidateSite>, VentoError> {
    extract(wsi, selection, cell_area).map(|e| e.sites)
}

/// Ranked candidate sites plus the effective threshold used.
pub fn extract(
    wsi: &WsiGrid,
    selection: &SiteSelection,
    cell_area: f64,
) -> Result<SiteExtraction, VentoError> {
    validate_selection(selection)?;
    if !cell_area.is_finite() || cell_area <= 0.0 {
        return Err(VentoError::Config(format!(
            "cell_area must be a positive number, got {}",
            cell_area
        )));
    }

    let Some(threshold) = effective_threshold(wsi, selection.top_percentage, selection.min_wsi)
    else {
        return Ok(SiteExtraction {
            effective_threshold: None,
            sites: Vec::new(),
        });
    };

    let mask = Zip::from(wsi.values())
        .and(wsi.valid_mask())
        .map_collect(|&v, &ok| ok && v >= threshold);

    let mut regions: Vec<Region> = label_regions(wsi, &mask)
        .into_iter()
        .filter(|r| r.cells as f64 * cell_area >= selection.min_area)
        .collect();

    regions.sort_by(|a, b| {
        b.mean()
            .total_cmp(&a.mean())
            .then(b.cells.cmp(&a.cells))
            .then(a.first.cmp(&b.first))
    });

    if let Some(max) = selection.max_sites {
        regions.truncate(max);
    }

    let transform = wsi.transform();
    let sites = regions
        .iter()
        .enumerate()
        .map(|(i, r)| r.to_site(i + 1, cell_area, transform))
        .collect();

    Ok(SiteExtraction {
        effective_threshold: Some(threshold),
        sites,
    })
}

/// Running aggregate of one connected region.
#[derive(Debug, Clone)]
struct Region {
    /// (row, col) of the first cell reached; stable tie-breaker.
    first: (usize, usize),
    cells: usize,
    sum: f64,
    max: f64,
    row_sum: f64,
    col_sum: f64,
    bounds: CellBounds,
}

impl Region {
    fn new(row: usize, col: usize) -> Self {
        Self {
            first: (row, col),
            cells: 0,
            sum: 0.0,
            max: f64::NEG_INFINITY,
            row_sum: 0.0,
            col_sum: 0.0,
            bounds: CellBounds {
                min_row: row,
                min_col: col,
                max_row: row,
                max_col: col,
            },
        }
    }

    fn add(&mut self, row: usize, col: usize, value: f64) {
        self.cells += 1;
        self.sum += value;
        self.max = self.max.max(value);
        self.row_sum += row as f64;
        self.col_sum += col as f64;
        self.bounds.min_row = self.bounds.min_row.min(row);
        self.bounds.min_col = self.bounds.min_col.min(col);
        self.bounds.max_row = self.bounds.max_row.max(row);
        self.bounds.max_col = self.bounds.max_col.max(col);
    }

    fn mean(&self) -> f64 {
        self.sum / self.cells as f64
    }

    fn to_site(&self, rank: usize, cell_area: f64, transform: &GeoTransform) -> CandidateSite {
        let n = self.cells as f64;
        let b = self.bounds;
        let (x0, y0) = transform.cell_corner(b.min_row, b.min_col);
        let (x1, y1) = transform.cell_corner(b.max_row + 1, b.max_col + 1);
        CandidateSite {
            rank,
            cell_count: self.cells,
            area: n * cell_area,
            mean_wsi: self.mean(),
            max_wsi: self.max,
            bounds: b,
            extent: MapExtent {
                min_x: x0.min(x1),
                min_y: y0.min(y1),
                max_x: x0.max(x1),
                max_y: y0.max(y1),
            },
            centroid: transform.cell_center(self.row_sum / n, self.col_sum / n),
        }
    }
}

const NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Label 4-connected regions of `mask` with an explicit worklist.
/// Regions come back ordered by their first cell in row-major order.
fn label_regions(wsi: &WsiGrid, mask: &Array2<bool>) -> Vec<Region> {
    let (rows, cols) = mask.dim();
    let values = wsi.values();
    let mut visited = Array2::from_elem((rows, cols), false);
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut regions = Vec::new();

    for ((row, col), &selected) in mask.indexed_iter() {
        if !selected || visited[[row, col]] {
            continue;
        }
        visited[[row, col]] = true;
        stack.push((row, col));
        let mut region = Region::new(row, col);

        while let Some((r, c)) = stack.pop() {
            region.add(r, c, values[[r, c]]);

            for &(dr, dc) in &NEIGHBOURS {
                let nr = r as isize + dr;
                let nc = c as isize + dc;
                if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                if mask[[nr, nc]] && !visited[[nr, nc]] {
                    visited[[nr, nc]] = true;
                    stack.push((nr, nc));
                }
            }
        }

        regions.push(region);
    }

    regions
}
