//! Density heatmap rendering
//!
//! Renders grid-binned density PNGs of one player's position samples over
//! the map layout, plus a combined scatter PNG layering every time marker.
//! Game coordinates are projected to radar pixels through a per-map
//! calibration (radar origin + scale), with a data-extent fallback for maps
//! not in the built-in table.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};

use crate::analysis::markers::{MapOverride, RoundRange, TimeMarker};
use crate::analysis::positions::PositionSample;

/// Output image edge length in pixels (radar convention).
pub const IMAGE_SIZE: u32 = 1024;
/// Density bin edge length in pixels.
pub const CELL_SIZE: u32 = 16;
/// Bins per image edge.
pub const GRID_DIM: u32 = IMAGE_SIZE / CELL_SIZE;

const BACKGROUND: Rgb<u8> = Rgb([30, 30, 35]);
const MARKER_COLOR: Rgb<u8> = Rgb([235, 235, 235]);
const SCATTER_RADIUS: i32 = 5;

// Combined scatter layering: later markers in the list render more opaque,
// so the first marker (closest to round end) stays the most transparent.
const ALPHA_MAX: f32 = 0.8;
const ALPHA_MIN: f32 = 0.2;

/// Game-to-pixel projection for one map.
#[derive(Debug, Clone, Copy)]
pub struct MapCalibration {
    /// World X of the radar's left edge.
    pub pos_x: f32,
    /// World Y of the radar's top edge.
    pub pos_y: f32,
    /// World units per radar pixel.
    pub scale: f32,
    /// Samples below this Z are excluded from marker overdraw (lower-level
    /// positions would clutter the upper-level radar).
    pub marker_z_floor: Option<f32>,
}

impl MapCalibration {
    /// Built-in calibration for well-known maps.
    pub fn builtin(map_name: &str) -> Option<Self> {
        let (pos_x, pos_y, scale, marker_z_floor) = match map_name {
            "de_ancient" => (-2953.0, 2164.0, 5.0, None),
            "de_anubis" => (-2796.0, 3328.0, 5.22, None),
            "de_dust2" => (-2476.0, 3239.0, 4.4, None),
            "de_inferno" => (-2087.0, 3870.0, 4.9, None),
            "de_mirage" => (-3230.0, 1713.0, 5.0, None),
            "de_nuke" => (-3453.0, 2887.0, 7.0, Some(-300.0)),
            "de_overpass" => (-4831.0, 1781.0, 5.2, None),
            "de_train" => (-2477.0, 2392.0, 4.7, None),
            "de_vertigo" => (-3168.0, 1762.0, 4.0, None),
            _ => return None,
        };
        Some(Self {
            pos_x,
            pos_y,
            scale,
            marker_z_floor,
        })
    }

    /// Calibration derived from the sample extent, padded by 10% per side.
    /// Used when the map is not in the built-in table.
    pub fn from_extent(samples: &[PositionSample]) -> Self {
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for s in samples {
            min_x = min_x.min(s.x);
            max_x = max_x.max(s.x);
            min_y = min_y.min(s.y);
            max_y = max_y.max(s.y);
        }
        if samples.is_empty() {
            min_x = -1000.0;
            max_x = 1000.0;
            min_y = -1000.0;
            max_y = 1000.0;
        }

        let span = (max_x - min_x).max(max_y - min_y).max(1.0);
        let pad = span * 0.1;
        Self {
            pos_x: min_x - pad,
            pos_y: max_y + pad,
            scale: (span + 2.0 * pad) / IMAGE_SIZE as f32,
            marker_z_floor: None,
        }
    }

    /// Pick the calibration for a map: config override, then built-in, then
    /// the sample extent.
    pub fn resolve(
        map_name: &str,
        overrides: &HashMap<String, MapOverride>,
        samples: &[PositionSample],
    ) -> Self {
        if let Some(o) = overrides.get(map_name) {
            return Self {
                pos_x: o.pos_x,
                pos_y: o.pos_y,
                scale: o.scale,
                marker_z_floor: o.marker_z_floor,
            };
        }
        Self::builtin(map_name).unwrap_or_else(|| Self::from_extent(samples))
    }

    /// Project world coordinates to radar pixels. Radar Y grows downward.
    pub fn game_to_pixel(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pos_x) / self.scale, (self.pos_y - y) / self.scale)
    }

    /// Invert the projection for a pixel position.
    pub fn pixel_to_game(&self, px: f32, py: f32) -> (f32, f32) {
        (self.pos_x + px * self.scale, self.pos_y - py * self.scale)
    }

    /// Whether a pixel position lands inside the image.
    pub fn in_bounds(px: f32, py: f32) -> bool {
        px >= 0.0 && px < IMAGE_SIZE as f32 && py >= 0.0 && py < IMAGE_SIZE as f32
    }
}

/// Density bin grid over the radar image.
#[derive(Clone)]
pub struct DensityGrid {
    counts: Vec<u32>,
}

impl DensityGrid {
    pub fn new() -> Self {
        Self {
            counts: vec![0; (GRID_DIM * GRID_DIM) as usize],
        }
    }

    fn index(cx: u32, cy: u32) -> usize {
        (cy * GRID_DIM + cx) as usize
    }

    pub fn get(&self, cx: u32, cy: u32) -> u32 {
        self.counts[Self::index(cx, cy)]
    }

    fn bump(&mut self, cx: u32, cy: u32) {
        self.counts[Self::index(cx, cy)] += 1;
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Bin samples through the calibration; out-of-bounds samples are
    /// dropped. Returns the number binned.
    pub fn bin_samples(&mut self, samples: &[PositionSample], calib: &MapCalibration) -> usize {
        let mut binned = 0;
        for s in samples {
            let (px, py) = calib.game_to_pixel(s.x, s.y);
            if !MapCalibration::in_bounds(px, py) {
                continue;
            }
            self.bump(px as u32 / CELL_SIZE, py as u32 / CELL_SIZE);
            binned += 1;
        }
        binned
    }
}

impl Default for DensityGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalized density (0-1) to a side-colored ramp: light to dark blue for
/// CT, light to dark red otherwise.
fn density_to_color(t: f32, ct_side: bool) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let (from, to) = if ct_side {
        ([222.0, 235.0, 247.0], [8.0, 48.0, 107.0])
    } else {
        ([254.0, 224.0, 210.0], [103.0, 0.0, 13.0])
    };
    Rgb([
        (from[0] + (to[0] - from[0]) * t) as u8,
        (from[1] + (to[1] - from[1]) * t) as u8,
        (from[2] + (to[2] - from[2]) * t) as u8,
    ])
}

/// Solid scatter color per side (combined view).
fn side_scatter_color(side: &str) -> Rgb<u8> {
    if side == "ct" {
        Rgb([68, 114, 196])
    } else {
        Rgb([197, 80, 75])
    }
}

/// Fill one density cell with a solid color.
fn fill_cell(img: &mut RgbImage, cx: u32, cy: u32, color: Rgb<u8>) {
    let x_start = cx * CELL_SIZE;
    let y_start = cy * CELL_SIZE;

    for dy in 0..CELL_SIZE {
        for dx in 0..CELL_SIZE {
            img.put_pixel(x_start + dx, y_start + dy, color);
        }
    }
}

/// Draw a line using Bresenham's algorithm.
fn draw_line(img: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut x = x0;
    let mut y = y0;

    loop {
        if x >= 0 && x < img.width() as i32 && y >= 0 && y < img.height() as i32 {
            img.put_pixel(x as u32, y as u32, color);
        }

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draw a small cross marker centered on a pixel.
fn draw_cross(img: &mut RgbImage, px: i32, py: i32, color: Rgb<u8>) {
    let arm = 3;
    draw_line(img, px - arm, py, px + arm, py, color);
    draw_line(img, px, py - arm, px, py + arm, color);
}

/// Alpha-blend a filled disc onto the image.
fn blend_disc(img: &mut RgbImage, px: i32, py: i32, radius: i32, color: Rgb<u8>, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let x = px + dx;
            let y = py + dy;
            if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
                continue;
            }
            let dst = img.get_pixel(x as u32, y as u32);
            let blended = Rgb([
                (color.0[0] as f32 * alpha + dst.0[0] as f32 * (1.0 - alpha)) as u8,
                (color.0[1] as f32 * alpha + dst.0[1] as f32 * (1.0 - alpha)) as u8,
                (color.0[2] as f32 * alpha + dst.0[2] as f32 * (1.0 - alpha)) as u8,
            ]);
            img.put_pixel(x as u32, y as u32, blended);
        }
    }
}

fn new_canvas() -> RgbImage {
    let mut img = RgbImage::new(IMAGE_SIZE, IMAGE_SIZE);
    for pixel in img.pixels_mut() {
        *pixel = BACKGROUND;
    }
    img
}

/// Render the density heatmap for one marker's samples. Writes the PNG and a
/// `.txt` sidecar listing `x,y,count` per occupied cell in game coordinates.
pub fn render_marker_heatmap(
    samples: &[PositionSample],
    side: &str,
    calib: &MapCalibration,
    image_path: &Path,
) -> Result<(), String> {
    let mut img = new_canvas();

    let mut grid = DensityGrid::new();
    grid.bin_samples(samples, calib);
    let max = grid.max();

    let ct_side = side == "ct";
    let mut data = String::from("x,y,count\n");

    for cy in 0..GRID_DIM {
        for cx in 0..GRID_DIM {
            let count = grid.get(cx, cy);
            if count == 0 {
                continue;
            }
            let t = if max > 1 {
                count as f32 / max as f32
            } else {
                1.0
            };
            fill_cell(&mut img, cx, cy, density_to_color(t, ct_side));

            let center_px = (cx * CELL_SIZE + CELL_SIZE / 2) as f32;
            let center_py = (cy * CELL_SIZE + CELL_SIZE / 2) as f32;
            let (gx, gy) = calib.pixel_to_game(center_px, center_py);
            let _ = writeln!(&mut data, "{:.2},{:.2},{}", gx, gy, count);
        }
    }

    // Exact sample markers on top of the density cells. Samples below the
    // map's Z floor stay out of the overdraw (they are still binned above).
    for s in samples {
        if let Some(floor) = calib.marker_z_floor {
            if s.z < floor {
                continue;
            }
        }
        let (px, py) = calib.game_to_pixel(s.x, s.y);
        if MapCalibration::in_bounds(px, py) {
            draw_cross(&mut img, px as i32, py as i32, MARKER_COLOR);
        }
    }

    img.save(image_path)
        .map_err(|e| format!("failed to save {}: {}", image_path.display(), e))?;

    let data_path = image_path.with_extension("txt");
    fs::write(&data_path, data)
        .map_err(|e| format!("failed to write {}: {}", data_path.display(), e))?;

    Ok(())
}

/// Render the combined scatter for one round range: every marker's samples
/// layered with marker-indexed transparency, opacity growing with the
/// marker's position in the list. Writes the PNG and a `.txt` sidecar
/// listing `x,y,round` per sample, with the round number segment-relative.
pub fn render_combined_heatmap(
    layers: &[(&TimeMarker, &[PositionSample])],
    side: &str,
    calib: &MapCalibration,
    range: &RoundRange,
    image_path: &Path,
) -> Result<(), String> {
    let mut img = new_canvas();
    let color = side_scatter_color(side);
    let mut data = String::from("x,y,round\n");

    let n = layers.len();
    for (i, (_, samples)) in layers.iter().enumerate() {
        let alpha = if n > 1 {
            ALPHA_MIN + (ALPHA_MAX - ALPHA_MIN) * (i as f32 / (n - 1) as f32)
        } else {
            ALPHA_MAX
        };

        for s in *samples {
            let (px, py) = calib.game_to_pixel(s.x, s.y);
            if MapCalibration::in_bounds(px, py) {
                blend_disc(&mut img, px as i32, py as i32, SCATTER_RADIUS, color, alpha);
            }
            let _ = writeln!(
                &mut data,
                "{:.2},{:.2},{}",
                s.x,
                s.y,
                range.display_round(s.round_num)
            );
        }
    }

    img.save(image_path)
        .map_err(|e| format!("failed to save {}: {}", image_path.display(), e))?;

    let data_path = image_path.with_extension("txt");
    fs::write(&data_path, data)
        .map_err(|e| format!("failed to write {}: {}", data_path.display(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::RoundRow;

    fn range(name: &str, first: u32, count: u32) -> RoundRange {
        RoundRange {
            name: name.to_string(),
            label: name.to_string(),
            rounds: (first..first + count)
                .map(|n| RoundRow {
                    round_num: n,
                    freeze_end: Some(n as i64 * 1000),
                    start: None,
                    end: Some(n as i64 * 1000 + 800),
                    end_official: None,
                })
                .collect(),
        }
    }

    fn sample(x: f32, y: f32, z: f32) -> PositionSample {
        PositionSample {
            x,
            y,
            z,
            round_num: 1,
            side: "t".to_string(),
        }
    }

    fn marker() -> TimeMarker {
        TimeMarker {
            label: "1m48s".to_string(),
            seconds_before_end: 7.0,
            display_time: "1:48".to_string(),
        }
    }

    #[test]
    fn test_game_to_pixel_known_map() {
        let calib = MapCalibration::builtin("de_mirage").unwrap();
        // The radar origin projects to (0, 0).
        let (px, py) = calib.game_to_pixel(-3230.0, 1713.0);
        assert_eq!((px, py), (0.0, 0.0));

        // One scale unit right / down per world unit over scale.
        let (px, py) = calib.game_to_pixel(-3230.0 + 500.0, 1713.0 - 500.0);
        assert_eq!((px, py), (100.0, 100.0));
    }

    #[test]
    fn test_pixel_to_game_inverts_projection() {
        let calib = MapCalibration::builtin("de_dust2").unwrap();
        let (px, py) = calib.game_to_pixel(-120.5, 830.0);
        let (gx, gy) = calib.pixel_to_game(px, py);
        assert!((gx - -120.5).abs() < 0.01);
        assert!((gy - 830.0).abs() < 0.01);
    }

    #[test]
    fn test_from_extent_contains_all_samples() {
        let samples = vec![
            sample(-500.0, 200.0, 0.0),
            sample(900.0, -1200.0, 0.0),
            sample(0.0, 0.0, 0.0),
        ];
        let calib = MapCalibration::from_extent(&samples);
        for s in &samples {
            let (px, py) = calib.game_to_pixel(s.x, s.y);
            assert!(
                MapCalibration::in_bounds(px, py),
                "sample ({}, {}) projected out of bounds to ({}, {})",
                s.x,
                s.y,
                px,
                py
            );
        }
    }

    #[test]
    fn test_resolve_prefers_override() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "de_mirage".to_string(),
            MapOverride {
                pos_x: -1.0,
                pos_y: 1.0,
                scale: 2.0,
                marker_z_floor: None,
            },
        );
        let calib = MapCalibration::resolve("de_mirage", &overrides, &[]);
        assert_eq!(calib.scale, 2.0);

        let calib = MapCalibration::resolve("de_nuke", &HashMap::new(), &[]);
        assert_eq!(calib.marker_z_floor, Some(-300.0));
    }

    #[test]
    fn test_density_binning() {
        let calib = MapCalibration {
            pos_x: 0.0,
            pos_y: 1024.0,
            scale: 1.0,
            marker_z_floor: None,
        };
        let samples = vec![
            sample(8.0, 1016.0, 0.0),  // cell (0, 0)
            sample(9.0, 1015.0, 0.0),  // cell (0, 0)
            sample(100.0, 924.0, 0.0), // cell (6, 6)
            sample(-50.0, 0.0, 0.0),   // out of bounds, dropped
        ];
        let mut grid = DensityGrid::new();
        let binned = grid.bin_samples(&samples, &calib);

        assert_eq!(binned, 3);
        assert_eq!(grid.get(0, 0), 2);
        assert_eq!(grid.get(6, 6), 1);
        assert_eq!(grid.max(), 2);
    }

    #[test]
    fn test_density_color_monotonic() {
        for ct in [true, false] {
            let low = density_to_color(0.1, ct);
            let high = density_to_color(0.9, ct);
            // Higher density is darker on both ramps.
            let low_sum: u32 = low.0.iter().map(|&c| c as u32).sum();
            let high_sum: u32 = high.0.iter().map(|&c| c as u32).sum();
            assert!(high_sum < low_sum);
        }
        assert_ne!(density_to_color(0.5, true), density_to_color(0.5, false));
    }

    #[test]
    fn test_render_marker_heatmap_writes_png_and_sidecar() {
        let dir = std::env::temp_dir().join("demoscope_heatmap_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let calib = MapCalibration::builtin("de_mirage").unwrap();
        let samples = vec![
            sample(-1000.0, 500.0, 0.0),
            sample(-1000.0, 500.0, 0.0),
            sample(-800.0, 300.0, 10.0),
        ];
        let path = dir.join("heatmap_test.png");
        render_marker_heatmap(&samples, "t", &calib, &path).unwrap();

        assert!(path.exists());
        let sidecar = fs::read_to_string(path.with_extension("txt")).unwrap();
        assert!(sidecar.starts_with("x,y,count\n"));
        // Two samples share a cell; the sidecar must show a count of 2.
        assert!(sidecar.lines().any(|l| l.ends_with(",2")));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_render_combined_heatmap() {
        let dir = std::env::temp_dir().join("demoscope_combined_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let calib = MapCalibration::builtin("de_mirage").unwrap();
        let m = marker();
        let samples = vec![sample(-1000.0, 500.0, 0.0)];
        let layers: Vec<(&TimeMarker, &[PositionSample])> = vec![(&m, samples.as_slice())];

        let path = dir.join("combined_test.png");
        render_combined_heatmap(&layers, "ct", &calib, &range("first_half", 1, 12), &path)
            .unwrap();
        assert!(path.exists());

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (IMAGE_SIZE, IMAGE_SIZE));
        // The scatter disc must have tinted the pixel at the sample.
        let (px, py) = calib.game_to_pixel(-1000.0, 500.0);
        let pixel = img.get_pixel(px as u32, py as u32);
        assert_ne!(*pixel, BACKGROUND);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_combined_opacity_grows_with_marker_index() {
        let dir = std::env::temp_dir().join("demoscope_alpha_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let calib = MapCalibration::builtin("de_mirage").unwrap();
        let m48 = TimeMarker {
            label: "1m48s".to_string(),
            seconds_before_end: 7.0,
            display_time: "1:48".to_string(),
        };
        let m47 = TimeMarker {
            label: "1m47s".to_string(),
            seconds_before_end: 8.0,
            display_time: "1:47".to_string(),
        };
        let m46 = TimeMarker {
            label: "1m46s".to_string(),
            seconds_before_end: 9.0,
            display_time: "1:46".to_string(),
        };

        // One sample per marker, far enough apart that the discs never touch.
        let s48 = vec![sample(-1000.0, 500.0, 0.0)];
        let s47 = vec![sample(-2000.0, 1000.0, 0.0)];
        let s46 = vec![sample(-3000.0, 1300.0, 0.0)];
        let layers: Vec<(&TimeMarker, &[PositionSample])> = vec![
            (&m48, s48.as_slice()),
            (&m47, s47.as_slice()),
            (&m46, s46.as_slice()),
        ];

        let path = dir.join("combined_alpha.png");
        render_combined_heatmap(&layers, "t", &calib, &range("first_half", 1, 12), &path)
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        let opacity = |x: f32, y: f32| {
            let (px, py) = calib.game_to_pixel(x, y);
            let pixel = img.get_pixel(px as u32, py as u32);
            pixel.0[0] as i32 - BACKGROUND.0[0] as i32
        };

        // 1m48s is first in the list and must be the most transparent; each
        // later marker tints its pixel more strongly.
        let op48 = opacity(-1000.0, 500.0);
        let op47 = opacity(-2000.0, 1000.0);
        let op46 = opacity(-3000.0, 1300.0);
        assert!(
            op48 < op47 && op47 < op46,
            "opacity not increasing: 1m48s={} 1m47s={} 1m46s={}",
            op48,
            op47,
            op46
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_combined_sidecar_rounds_are_segment_relative() {
        let dir = std::env::temp_dir().join("demoscope_combined_sidecar_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let calib = MapCalibration::builtin("de_mirage").unwrap();
        let m = marker();
        let mut early = sample(-1000.0, 500.0, 0.0);
        early.round_num = 13;
        let mut late = sample(-2000.0, 1000.0, 0.0);
        late.round_num = 24;
        let samples = vec![early, late];
        let layers: Vec<(&TimeMarker, &[PositionSample])> = vec![(&m, samples.as_slice())];

        let path = dir.join("combined_second_half.png");
        render_combined_heatmap(&layers, "t", &calib, &range("second_half", 13, 12), &path)
            .unwrap();

        let sidecar = fs::read_to_string(path.with_extension("txt")).unwrap();
        assert!(sidecar.starts_with("x,y,round\n"));
        // Rounds 13 and 24 display as 1 and 12 within the second half.
        assert!(sidecar.contains("-1000.00,500.00,1\n"), "sidecar: {}", sidecar);
        assert!(sidecar.contains("-2000.00,1000.00,12\n"), "sidecar: {}", sidecar);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_marker_z_floor_skips_overdraw_only() {
        let dir = std::env::temp_dir().join("demoscope_zfloor_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let calib = MapCalibration::builtin("de_nuke").unwrap();
        let samples = vec![sample(-1000.0, 500.0, -600.0)];
        let path = dir.join("heatmap_lower.png");
        render_marker_heatmap(&samples, "t", &calib, &path).unwrap();

        // Still binned: the sidecar records the cell.
        let sidecar = fs::read_to_string(path.with_extension("txt")).unwrap();
        assert_eq!(sidecar.lines().count(), 2);

        let _ = fs::remove_dir_all(&dir);
    }
}
