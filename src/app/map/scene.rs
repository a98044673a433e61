use std::f64::consts::PI;

use eframe::egui::{Pos2, Rect, Vec2, pos2};

use crate::render::{GeoBounds, GeoPoint, MapBackend, MarkerSpec, PolylineSpec};

const EARTH_CIRCUMFERENCE_METERS: f64 = 40_075_016.686;
const MAX_LATITUDE: f64 = 85.051_128_78;
/// Pixels spanned by the whole world at zoom level 0.
const TILE_SIZE: f64 = 256.0;
const MIN_SCALE: f64 = TILE_SIZE * 2.0;
const MAX_SCALE: f64 = TILE_SIZE * 262_144.0;
const SINGLE_POINT_SCALE: f64 = TILE_SIZE * 8_192.0;
const FIT_PADDING: f32 = 48.0;
/// Below this the canvas is treated as unavailable and the summary is shown.
const MIN_VIEWPORT_SIDE: f32 = 160.0;

/// Web Mercator position in the unit square, `x` east and `y` south.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct WorldPoint {
    pub(in crate::app) x: f64,
    pub(in crate::app) y: f64,
}

pub(in crate::app) fn project(point: GeoPoint) -> WorldPoint {
    let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    WorldPoint {
        x: (point.lon + 180.0) / 360.0,
        y: (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0,
    }
}

pub(in crate::app) fn unproject(world: WorldPoint) -> GeoPoint {
    let n = PI * (1.0 - 2.0 * world.y);
    GeoPoint {
        lat: n.sinh().atan().to_degrees(),
        lon: world.x * 360.0 - 180.0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Camera {
    pub(in crate::app) center: WorldPoint,
    /// Screen pixels per world unit.
    pub(in crate::app) scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: WorldPoint { x: 0.5, y: 0.5 },
            scale: MIN_SCALE,
        }
    }
}

/// The egui map canvas as seen by the renderers: it stores the primitives it
/// is handed and draws them on the next paint.
#[derive(Default)]
pub(in crate::app) struct MapScene {
    pub(in crate::app) camera: Camera,
    viewport: Option<Rect>,
    suppressed: bool,
    pub(in crate::app) markers: Vec<MarkerSpec>,
    pub(in crate::app) polylines: Vec<PolylineSpec>,
    pub(in crate::app) precision: Option<(GeoPoint, f64)>,
}

impl MapScene {
    pub(in crate::app) fn set_viewport(&mut self, viewport: Option<Rect>) {
        self.viewport = viewport;
    }

    /// Forces the textual summary even when the canvas could draw.
    pub(in crate::app) fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    pub(in crate::app) fn to_screen(&self, rect: Rect, point: GeoPoint) -> Pos2 {
        let world = project(point);
        let center = rect.center();
        pos2(
            center.x + ((world.x - self.camera.center.x) * self.camera.scale) as f32,
            center.y + ((world.y - self.camera.center.y) * self.camera.scale) as f32,
        )
    }

    pub(in crate::app) fn to_world(&self, rect: Rect, screen: Pos2) -> WorldPoint {
        let offset = screen - rect.center();
        WorldPoint {
            x: self.camera.center.x + f64::from(offset.x) / self.camera.scale,
            y: self.camera.center.y + f64::from(offset.y) / self.camera.scale,
        }
    }

    pub(in crate::app) fn meters_to_pixels(&self, at: GeoPoint, meters: f64) -> f32 {
        let meters_per_world_unit = EARTH_CIRCUMFERENCE_METERS * at.lat.to_radians().cos();
        if meters_per_world_unit <= f64::EPSILON {
            return 0.0;
        }
        (meters / meters_per_world_unit * self.camera.scale) as f32
    }

    /// Zooms by `factor` keeping the world point under `anchor` in place.
    pub(in crate::app) fn zoom_at(&mut self, rect: Rect, anchor: Pos2, factor: f64) {
        let before = self.to_world(rect, anchor);
        self.camera.scale = (self.camera.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let offset = anchor - rect.center();
        self.camera.center = WorldPoint {
            x: before.x - f64::from(offset.x) / self.camera.scale,
            y: before.y - f64::from(offset.y) / self.camera.scale,
        };
    }

    pub(in crate::app) fn pan_by(&mut self, delta: Vec2) {
        self.camera.center.x -= f64::from(delta.x) / self.camera.scale;
        self.camera.center.y =
            (self.camera.center.y - f64::from(delta.y) / self.camera.scale).clamp(0.0, 1.0);
    }

    /// Screen position of the world origin, used to anchor the background grid.
    pub(in crate::app) fn grid_origin(&self, rect: Rect) -> Pos2 {
        self.to_screen(rect, unproject(WorldPoint { x: 0.0, y: 0.0 }))
    }
}

impl MapBackend for MapScene {
    fn is_available(&self) -> bool {
        !self.suppressed
            && self.viewport.is_some_and(|rect| {
                rect.width() >= MIN_VIEWPORT_SIDE && rect.height() >= MIN_VIEWPORT_SIDE
            })
    }

    fn clear(&mut self) {
        self.markers.clear();
        self.polylines.clear();
        self.precision = None;
    }

    fn add_marker(&mut self, marker: MarkerSpec) {
        self.markers.push(marker);
    }

    fn add_polyline(&mut self, line: PolylineSpec) {
        self.polylines.push(line);
    }

    fn add_precision_circle(&mut self, center: GeoPoint, radius_meters: f64) {
        self.precision = Some((center, radius_meters));
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        let Some(rect) = self.viewport else {
            return;
        };

        let north_west = project(GeoPoint {
            lat: bounds.north,
            lon: bounds.west,
        });
        let south_east = project(GeoPoint {
            lat: bounds.south,
            lon: bounds.east,
        });
        let span_x = (south_east.x - north_west.x).abs();
        let span_y = (south_east.y - north_west.y).abs();

        let usable_width = f64::from((rect.width() - FIT_PADDING * 2.0).max(1.0));
        let usable_height = f64::from((rect.height() - FIT_PADDING * 2.0).max(1.0));
        let scale = if span_x <= f64::EPSILON && span_y <= f64::EPSILON {
            SINGLE_POINT_SCALE
        } else {
            (usable_width / span_x.max(f64::EPSILON)).min(usable_height / span_y.max(f64::EPSILON))
        };

        self.camera = Camera {
            center: WorldPoint {
                x: (north_west.x + south_east.x) / 2.0,
                y: (north_west.y + south_east.y) / 2.0,
            },
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
        };
    }
}
