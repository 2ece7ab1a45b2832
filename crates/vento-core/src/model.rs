use crate::error::VentoError;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Relative tolerance used when comparing transforms of layers that should
/// share the same grid.
const TRANSFORM_TOLERANCE: f64 = 1e-9;

/// Affine placement of a north-up grid: the map coordinate of the top-left
/// corner plus the pixel size. `pixel_height` is negative for north-up data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            pixel_width: 1.0,
            pixel_height: -1.0,
        }
    }
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Ground area covered by one cell, in squared map units.
    pub fn cell_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height).abs()
    }

    /// Map coordinate of a cell center.
    pub fn cell_center(&self, row: f64, col: f64) -> (f64, f64) {
        (
            self.origin_x + (col + 0.5) * self.pixel_width,
            self.origin_y + (row + 0.5) * self.pixel_height,
        )
    }

    /// Map coordinate of a cell corner (row/col may be one past the last cell).
    pub fn cell_corner(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + col as f64 * self.pixel_width,
            self.origin_y + row as f64 * self.pixel_height,
        )
    }

    pub fn approx_eq(&self, other: &GeoTransform) -> bool {
        close(self.origin_x, other.origin_x)
            && close(self.origin_y, other.origin_y)
            && close(self.pixel_width, other.pixel_width)
            && close(self.pixel_height, other.pixel_height)
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "origin ({}, {}), pixel {} x {}",
            self.origin_x, self.origin_y, self.pixel_width, self.pixel_height
        )
    }
}

fn close(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= TRANSFORM_TOLERANCE * scale
}

/// An immutable raster grid with an explicit validity mask.
///
/// Values and mask are `(rows, cols)` arrays of the same shape. Cells whose
/// mask entry is `false` carry no numeric meaning; accessors return `None`
/// for them. A cell marked valid may still hold a non-finite value if the
/// caller built it that way, which the engine reports as a compute error
/// instead of masking silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridDocument", into = "GridDocument")]
pub struct GridLayer {
    values: Array2<f64>,
    valid: Array2<bool>,
    transform: GeoTransform,
    crs: Option<String>,
}

impl GridLayer {
    /// Build a grid from row-major values where every cell is valid.
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Result<Self, VentoError> {
        let valid = vec![true; values.len()];
        Self::with_mask(width, height, values, valid)
    }

    /// Build a grid from row-major values and an explicit validity mask.
    pub fn with_mask(
        width: usize,
        height: usize,
        values: Vec<f64>,
        valid: Vec<bool>,
    ) -> Result<Self, VentoError> {
        if width == 0 || height == 0 {
            return Err(VentoError::InvalidGrid(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        let cells = width.checked_mul(height).ok_or_else(|| {
            VentoError::InvalidGrid(format!("{width}x{height} overflows the cell count"))
        })?;
        if values.len() != cells {
            return Err(VentoError::InvalidGrid(format!(
                "expected {} values for {}x{}, got {}",
                cells,
                width,
                height,
                values.len()
            )));
        }
        if valid.len() != cells {
            return Err(VentoError::InvalidGrid(format!(
                "expected {} mask entries for {}x{}, got {}",
                cells,
                width,
                height,
                valid.len()
            )));
        }
        let values = Array2::from_shape_vec((height, width), values)
            .map_err(|e| VentoError::InvalidGrid(e.to_string()))?;
        let valid = Array2::from_shape_vec((height, width), valid)
            .map_err(|e| VentoError::InvalidGrid(e.to_string()))?;
        Self::from_arrays(values, valid)
    }

    /// Build a grid from `(rows, cols)` arrays.
    pub fn from_arrays(values: Array2<f64>, valid: Array2<bool>) -> Result<Self, VentoError> {
        if values.is_empty() {
            return Err(VentoError::InvalidGrid(format!(
                "dimensions must be positive, got {}x{}",
                values.ncols(),
                values.nrows()
            )));
        }
        if values.dim() != valid.dim() {
            return Err(VentoError::InvalidGrid(format!(
                "mask shape {:?} differs from value shape {:?}",
                valid.dim(),
                values.dim()
            )));
        }
        Ok(Self {
            values,
            valid,
            transform: GeoTransform::default(),
            crs: None,
        })
    }

    /// Build a grid from nested rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, VentoError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != width) {
            return Err(VentoError::InvalidGrid(format!(
                "row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                width
            )));
        }
        let values: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(width, height, values)
    }

    /// Mark cells equal to `nodata`, and NaN cells, as invalid.
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        Zip::from(&mut self.valid)
            .and(&self.values)
            .for_each(|ok, &v| {
                if v.is_nan() || v == nodata {
                    *ok = false;
                }
            });
        self
    }

    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    /// A grid sharing this one's shape and georeferencing, with new contents.
    pub(crate) fn derive(&self, values: Array2<f64>, valid: Array2<bool>) -> Self {
        debug_assert_eq!(values.dim(), self.values.dim());
        debug_assert_eq!(valid.dim(), self.values.dim());
        Self {
            values,
            valid,
            transform: self.transform,
            crs: self.crs.clone(),
        }
    }

    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Total number of cells, valid or not.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn cell_area(&self) -> f64 {
        self.transform.cell_area()
    }

    /// Raw cell values. Entries for invalid cells are meaningless.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn valid_mask(&self) -> &Array2<bool> {
        &self.valid
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.valid.get((row, col)).copied().unwrap_or(false)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if self.is_valid(row, col) {
            Some(self.values[[row, col]])
        } else {
            None
        }
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }

    /// Fraction of cells that are valid, in [0, 1].
    pub fn coverage(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.valid_count() as f64 / self.len() as f64
    }

    /// `((row, col), value)` for every valid cell, in row-major order.
    pub fn iter_valid(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.values
            .indexed_iter()
            .filter(move |(idx, _)| self.valid[*idx])
            .map(|(idx, v)| (idx, *v))
    }

    /// Describe why `other` cannot be overlaid on this grid, if it cannot.
    pub fn alignment_issue(&self, other: &GridLayer) -> Option<String> {
        if self.shape() != other.shape() {
            return Some(format!(
                "dimensions {}x{} differ from {}x{}",
                other.width(),
                other.height(),
                self.width(),
                self.height()
            ));
        }
        if !self.transform.approx_eq(&other.transform) {
            return Some(format!(
                "transform [{}] differs from [{}]",
                other.transform, self.transform
            ));
        }
        match (&self.crs, &other.crs) {
            (Some(a), Some(b)) if a != b => Some(format!("CRS '{b}' differs from '{a}'")),
            _ => None,
        }
    }
}

/// JSON interchange form of a grid: `null` marks an invalid cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GridDocument {
    width: usize,
    height: usize,
    #[serde(default)]
    transform: GeoTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nodata: Option<f64>,
    values: Vec<Option<f64>>,
}

impl TryFrom<GridDocument> for GridLayer {
    type Error = VentoError;

    fn try_from(doc: GridDocument) -> Result<Self, Self::Error> {
        let mut values = Vec::with_capacity(doc.values.len());
        let mut valid = Vec::with_capacity(doc.values.len());
        for v in &doc.values {
            match v {
                Some(x) if Some(*x) != doc.nodata => {
                    values.push(*x);
                    valid.push(true);
                }
                _ => {
                    values.push(0.0);
                    valid.push(false);
                }
            }
        }
        let mut layer =
            GridLayer::with_mask(doc.width, doc.height, values, valid)?.with_transform(doc.transform);
        layer.crs = doc.crs;
        Ok(layer)
    }
}

impl From<GridLayer> for GridDocument {
    fn from(layer: GridLayer) -> Self {
        let values = layer
            .values
            .iter()
            .zip(layer.valid.iter())
            .map(|(v, ok)| if *ok { Some(*v) } else { None })
            .collect();
        GridDocument {
            width: layer.width(),
            height: layer.height(),
            transform: layer.transform,
            crs: layer.crs,
            nodata: None,
            values,
        }
    }
}

/// The composite suitability grid. Every valid value lies in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WsiGrid(GridLayer);

impl WsiGrid {
    /// Wrap a layer whose valid values are already known to be in [0, 1].
    pub(crate) fn from_layer(layer: GridLayer) -> Self {
        debug_assert!(layer.iter_valid().all(|(_, v)| (0.0..=1.0).contains(&v)));
        WsiGrid(layer)
    }

    pub fn as_layer(&self) -> &GridLayer {
        &self.0
    }
}

impl Deref for WsiGrid {
    type Target = GridLayer;

    fn deref(&self) -> &GridLayer {
        &self.0
    }
}
