//! Dual-mode rendering of a [`RenderPlan`].
//!
//! The graphical backend is only reached through [`MapBackend`] primitives.
//! Availability is probed on every call to [`render_plan`]; when the backend
//! is missing or reports itself unavailable the textual fallback is produced
//! instead, from the very same plan.

mod fallback;
mod interactive;
mod style;

use crate::mesh::{LinkType, NodeId};
use crate::topology::RenderPlan;

pub use fallback::{FALLBACK_CAPTION, FallbackRenderer, FallbackSummary};
pub use interactive::{InteractiveRenderer, InteractiveReport};
pub use style::{LinkQuality, LinkStroke, Rgb, role_color};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Bounds around `points`. With more than four points the lowest and
    /// highest 2.5% of latitudes and longitudes are dropped as outliers.
    pub fn fit(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut lats = points.iter().map(|point| point.lat).collect::<Vec<_>>();
        let mut lons = points.iter().map(|point| point.lon).collect::<Vec<_>>();
        lats.sort_by(f64::total_cmp);
        lons.sort_by(f64::total_cmp);

        let count = lats.len();
        let (lower, upper) = if count > 4 {
            let lower = (count as f64 * 0.025).floor() as usize;
            let upper = ((count as f64 * 0.975).ceil() as usize).saturating_sub(1);
            (lower, upper.max(lower))
        } else {
            (0, count - 1)
        };

        Some(Self {
            south: lats[lower],
            west: lons[lower],
            north: lats[upper],
            east: lons[upper],
        })
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.south + self.north) / 2.0,
            lon: (self.west + self.east) / 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerSpec {
    pub node_id: NodeId,
    pub position: GeoPoint,
    pub label: String,
    pub title: String,
    pub color: Rgb,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PolylineSpec {
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub link_type: LinkType,
    pub points: [GeoPoint; 2],
    pub stroke: LinkStroke,
}

/// Drawing primitives of a map surface.
pub trait MapBackend {
    /// Whether the surface can draw right now. Checked before every render.
    fn is_available(&self) -> bool;
    fn clear(&mut self);
    fn add_marker(&mut self, marker: MarkerSpec);
    fn add_polyline(&mut self, line: PolylineSpec);
    fn add_precision_circle(&mut self, center: GeoPoint, radius_meters: f64);
    fn fit_bounds(&mut self, bounds: GeoBounds);
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderOutcome {
    Interactive(InteractiveReport),
    Fallback(FallbackSummary),
}

impl RenderOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// True when this render consumed the one-time viewport fit.
    pub fn fitted_viewport(&self) -> bool {
        matches!(self, Self::Interactive(report) if report.fitted)
    }
}

pub trait Renderer {
    fn render(&mut self, plan: &RenderPlan) -> RenderOutcome;
}

/// Renders `plan` interactively when `backend` is present and available,
/// otherwise as a fallback summary.
pub fn render_plan<B: MapBackend>(plan: &RenderPlan, backend: Option<&mut B>) -> RenderOutcome {
    match backend {
        Some(backend) if backend.is_available() => InteractiveRenderer::new(backend).render(plan),
        _ => FallbackRenderer.render(plan),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Records every primitive call.
    #[derive(Default)]
    pub struct RecordingBackend {
        pub available: bool,
        pub clears: usize,
        pub markers: Vec<MarkerSpec>,
        pub polylines: Vec<PolylineSpec>,
        pub circles: Vec<(GeoPoint, f64)>,
        pub fits: Vec<GeoBounds>,
    }

    impl RecordingBackend {
        pub fn available() -> Self {
            Self {
                available: true,
                ..Self::default()
            }
        }
    }

    impl MapBackend for RecordingBackend {
        fn is_available(&self) -> bool {
            self.available
        }

        fn clear(&mut self) {
            self.clears += 1;
            self.markers.clear();
            self.polylines.clear();
            self.circles.clear();
        }

        fn add_marker(&mut self, marker: MarkerSpec) {
            self.markers.push(marker);
        }

        fn add_polyline(&mut self, line: PolylineSpec) {
            self.polylines.push(line);
        }

        fn add_precision_circle(&mut self, center: GeoPoint, radius_meters: f64) {
            self.circles.push((center, radius_meters));
        }

        fn fit_bounds(&mut self, bounds: GeoBounds) {
            self.fits.push(bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingBackend;
    use super::*;
    use crate::topology::test_support::{link, node, packet_link, store};
    use crate::topology::{Command, FilterCriteria, TopologyView, ViewState};

    const NOW: f64 = 1_700_000_000.0;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    fn sample_view() -> TopologyView {
        let mut nodes = (1..=4).map(node).collect::<Vec<_>>();
        nodes[3].latitude = None;
        let links = vec![link(1, 2), link(2, 3), packet_link(1, 3), link(3, 4)];
        let mut view =
            TopologyView::new(store(nodes, links), FilterCriteria::default(), ViewState::default());
        view.dispatch(Command::SetLinkVisibility(LinkType::Packet, true));
        view
    }

    #[test]
    fn small_point_sets_use_plain_bounds() {
        let bounds = GeoBounds::fit(&[point(1.0, 5.0), point(-2.0, 3.0), point(0.5, 9.0)])
            .expect("bounds");
        assert_eq!(
            bounds,
            GeoBounds {
                south: -2.0,
                west: 3.0,
                north: 1.0,
                east: 9.0
            }
        );
        assert!(GeoBounds::fit(&[]).is_none());
    }

    #[test]
    fn large_point_sets_trim_outliers() {
        let mut points = (0..40)
            .map(|i| point(f64::from(i) * 0.1, f64::from(i) * 0.1))
            .collect::<Vec<_>>();
        points.push(point(89.0, 179.0));
        points.push(point(-89.0, -179.0));

        // 42 points: lower index 1, upper index ceil(40.95) - 1 = 40.
        let bounds = GeoBounds::fit(&points).expect("bounds");
        assert_eq!(bounds.south, 0.0);
        assert_eq!(bounds.north, 3.9000000000000004);
        assert!(bounds.east < 179.0);
        assert!(bounds.west > -179.0);
    }

    #[test]
    fn probe_picks_interactive_only_when_available() {
        let plan = sample_view().plan(NOW);

        let mut down = RecordingBackend::default();
        assert!(render_plan(&plan, Some(&mut down)).is_fallback());
        assert!(down.markers.is_empty());

        assert!(render_plan::<RecordingBackend>(&plan, None).is_fallback());

        let mut up = RecordingBackend::available();
        assert!(!render_plan(&plan, Some(&mut up)).is_fallback());
        assert_eq!(up.clears, 1);
    }

    #[test]
    fn both_modes_carry_the_same_counts() {
        let mut view = sample_view();
        for command in [None, Some(Command::SelectNode(2))] {
            if let Some(command) = command {
                view.dispatch(command);
            }
            let plan = view.plan(NOW);

            let mut backend = RecordingBackend::available();
            let RenderOutcome::Interactive(report) = render_plan(&plan, Some(&mut backend)) else {
                panic!("expected interactive render");
            };
            let RenderOutcome::Fallback(summary) = render_plan::<RecordingBackend>(&plan, None)
            else {
                panic!("expected fallback render");
            };

            assert_eq!(summary.total_nodes, plan.node_count());
            assert_eq!(summary.visible_links, plan.link_count());
            // Node 4 has no latitude, so it gets no marker and its link no line.
            assert_eq!(report.markers + report.skipped_nodes, summary.total_nodes);
            assert_eq!(report.polylines + report.skipped_links, summary.visible_links);
            assert_eq!(
                summary.selected.as_ref().map(|selected| selected.node_id),
                plan.selected_id
            );
        }
    }
}
