//! Coordinate-to-pixel mapping for the search-radius overlay.
//!
//! Game coordinates grow rightward and *upward*; image pixels grow rightward
//! and downward. The overlay is a fixed-size square around the player's
//! position, clamped edge by edge to the map bounds, then projected onto the
//! scaled map image.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::{
    canvas::{render_overlay, Surface},
    maps::MapDefinition,
};

/// Half the side of the search square, in map units.
pub const SEARCH_HALF_EXTENT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Clamped square in map space. `top_left.y` is the *upper* edge, so it is
/// numerically the larger of the two y values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left: Point,
    pub bottom_right: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

// `f64::max`/`min` swallow NaN; these keep it so a bad coordinate stays bad.
fn max_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn min_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

/// Square of side `2 * SEARCH_HALF_EXTENT` centred on (x, y). Each edge is
/// clamped on its own, so near a border the box shrinks instead of shifting.
pub fn compute_bounding_box(x: f64, y: f64, x_max: f64, y_max: f64) -> BoundingBox {
    BoundingBox {
        top_left: Point {
            x: max_nan(x - SEARCH_HALF_EXTENT, 0.0),
            y: min_nan(y + SEARCH_HALF_EXTENT, y_max),
        },
        bottom_right: Point {
            x: min_nan(x + SEARCH_HALF_EXTENT, x_max),
            y: max_nan(y - SEARCH_HALF_EXTENT, 0.0),
        },
    }
}

/// Projects a map-space box onto an image of `scaled_width × scaled_height`
/// pixels, flipping the y axis.
pub fn to_pixel_rect(
    top_left: Point,
    bottom_right: Point,
    x_max: f64,
    y_max: f64,
    scaled_width: f64,
    scaled_height: f64,
) -> PixelRect {
    PixelRect {
        x: top_left.x / x_max * scaled_width,
        y: (y_max - top_left.y) / y_max * scaled_height,
        width: (bottom_right.x - top_left.x) / x_max * scaled_width,
        height: (top_left.y - bottom_right.y) / y_max * scaled_height,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledSize {
    pub width: f64,
    pub height: f64,
}

impl ScaledSize {
    pub fn of_image(image_width: u32, image_height: u32, scale: f64) -> Self {
        Self {
            width: image_width as f64 * scale,
            height: image_height as f64 * scale,
        }
    }

    /// Whole-pixel surface size; fractional pixels are dropped.
    pub fn surface_dimensions(&self) -> (u32, u32) {
        (self.width.max(0.0) as u32, self.height.max(0.0) as u32)
    }
}

/// Everything needed to draw one overlay frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlan {
    pub map: String,
    pub coordinate: Coordinate,
    pub bounding_box: BoundingBox,
    pub canvas: ScaledSize,
    pub rect: PixelRect,
    pub line_width: u32,
}

impl OverlayPlan {
    pub fn compute(
        map: &MapDefinition,
        coordinate: Coordinate,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let x_max = map.x_max as f64;
        let y_max = map.y_max as f64;
        let canvas = ScaledSize::of_image(image_width, image_height, map.scale);
        let bounding_box = compute_bounding_box(coordinate.x, coordinate.y, x_max, y_max);
        let rect = to_pixel_rect(
            bounding_box.top_left,
            bounding_box.bottom_right,
            x_max,
            y_max,
            canvas.width,
            canvas.height,
        );
        Self {
            map: map.name.to_string(),
            coordinate,
            bounding_box,
            canvas,
            rect,
            line_width: map.line_width(),
        }
    }
}

/// Current overlay inputs and the surface they are drawn on. Every change
/// rebuilds the plan from scratch and redraws the frame; nothing is drawn
/// until the selected map's image has loaded.
#[derive(Debug)]
pub struct OverlayView<S> {
    coordinate: Coordinate,
    map: MapDefinition,
    image: Option<RgbaImage>,
    plan: Option<OverlayPlan>,
    surface: S,
}

impl<S: Surface> OverlayView<S> {
    pub fn new(map: MapDefinition, surface: S) -> Self {
        Self {
            coordinate: Coordinate::default(),
            map,
            image: None,
            plan: None,
            surface,
        }
    }

    pub fn set_x(&mut self, x: f64) {
        self.coordinate.x = x;
        self.refresh();
    }

    pub fn set_y(&mut self, y: f64) {
        self.coordinate.y = y;
        self.refresh();
    }

    /// Switching maps discards the previous image until the new one loads.
    pub fn select_map(&mut self, map: MapDefinition) {
        self.map = map;
        self.image = None;
        self.refresh();
    }

    pub fn image_loaded(&mut self, image: RgbaImage) {
        self.image = Some(image);
        self.refresh();
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn map(&self) -> &MapDefinition {
        &self.map
    }

    pub fn plan(&self) -> Option<&OverlayPlan> {
        self.plan.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn refresh(&mut self) {
        let Some(image) = &self.image else {
            self.plan = None;
            return;
        };
        let plan = OverlayPlan::compute(&self.map, self.coordinate, image.width(), image.height());
        render_overlay(&mut self.surface, image, &plan);
        tracing::debug!(
            map = %plan.map,
            x = plan.coordinate.x,
            y = plan.coordinate.y,
            "overlay redrawn"
        );
        self.plan = Some(plan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::MapCatalog;

    fn point(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    #[test]
    fn box_clamps_low_edges() {
        let bbox = compute_bounding_box(5.0, 5.0, 159.0, 119.0);
        assert_eq!(bbox.top_left, point(0.0, 55.0));
        assert_eq!(bbox.bottom_right, point(55.0, 0.0));
    }

    #[test]
    fn box_interior_is_full_square() {
        let bbox = compute_bounding_box(100.0, 60.0, 159.0, 119.0);
        assert_eq!(bbox.top_left, point(50.0, 110.0));
        assert_eq!(bbox.bottom_right, point(150.0, 10.0));
    }

    #[test]
    fn box_clamps_high_edges() {
        let bbox = compute_bounding_box(150.0, 110.0, 159.0, 119.0);
        assert_eq!(bbox.top_left, point(100.0, 119.0));
        assert_eq!(bbox.bottom_right, point(159.0, 60.0));
    }

    #[test]
    fn out_of_range_input_collapses_without_error() {
        let bbox = compute_bounding_box(-80.0, 0.0, 159.0, 119.0);
        assert_eq!(bbox.top_left.x, 0.0);
        assert_eq!(bbox.bottom_right.x, -30.0);
    }

    #[test]
    fn nan_coordinate_propagates() {
        let bbox = compute_bounding_box(f64::NAN, 10.0, 159.0, 119.0);
        assert!(bbox.top_left.x.is_nan());
        assert!(bbox.bottom_right.x.is_nan());
        assert_eq!(bbox.top_left.y, 60.0);
    }

    #[test]
    fn pixel_rect_flips_y() {
        let rect = to_pixel_rect(point(50.0, 110.0), point(150.0, 10.0), 200.0, 200.0, 400.0, 400.0);
        assert_eq!(rect.x, 100.0);
        assert_eq!(rect.y, 180.0);
        assert_eq!(rect.width, 200.0);
        assert_eq!(rect.height, 200.0);
    }

    #[test]
    fn full_map_box_covers_whole_image() {
        let rect = to_pixel_rect(point(0.0, 100.0), point(100.0, 0.0), 100.0, 100.0, 640.0, 480.0);
        assert_eq!(rect, PixelRect { x: 0.0, y: 0.0, width: 640.0, height: 480.0 });
    }

    #[test]
    fn plan_uses_map_scale_and_line_width() {
        let mut map = MapCatalog::builtin().get("建邺城").unwrap().clone();
        map.scale = 0.5;
        let plan = OverlayPlan::compute(&map, Coordinate::new(100.0, 60.0), 1148, 568);
        assert_eq!(plan.canvas, ScaledSize { width: 574.0, height: 284.0 });
        assert_eq!(plan.line_width, 8);
        assert_eq!(plan.canvas.surface_dimensions(), (574, 284));
    }

    #[derive(Default)]
    struct FrameCounter {
        frames: Vec<(u32, u32)>,
    }

    impl Surface for FrameCounter {
        fn reset(&mut self, width: u32, height: u32) {
            self.frames.push((width, height));
        }

        fn draw_image(&mut self, _image: &RgbaImage) {}

        fn stroke_rect(&mut self, _rect: &PixelRect, _line_width: f64, _color: image::Rgba<u8>) {}
    }

    #[test]
    fn view_redraws_on_every_change() {
        let catalog = MapCatalog::builtin();
        let mut view = OverlayView::new(catalog.default_map().clone(), FrameCounter::default());
        view.set_x(100.0);
        assert!(view.plan().is_none());
        assert!(view.surface().frames.is_empty());

        view.image_loaded(RgbaImage::new(159, 119));
        view.set_y(60.0);
        let plan = view.plan().unwrap();
        assert_eq!(plan.bounding_box.top_left, point(50.0, 110.0));
        assert_eq!(view.surface().frames, vec![(159, 119), (159, 119)]);

        view.select_map(catalog.get("五庄观").unwrap().clone());
        assert!(view.plan().is_none());
        assert_eq!(view.surface().frames.len(), 2);

        view.image_loaded(RgbaImage::new(99, 74));
        let plan = view.plan().unwrap();
        assert_eq!(plan.map, "五庄观");
        assert_eq!(plan.bounding_box.bottom_right, point(99.0, 10.0));
        assert_eq!(view.surface().frames.len(), 3);
    }
}
