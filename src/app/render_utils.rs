use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::render::Rgb;
use crate::util::AgeClass;

pub(super) fn rgb(color: Rgb) -> Color32 {
    Color32::from_rgb(color.0, color.1, color.2)
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (opacity.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn age_color(class: AgeClass) -> Color32 {
    match class {
        AgeClass::Fresh => Color32::from_rgb(40, 167, 69),
        AgeClass::Recent => Color32::from_rgb(255, 193, 7),
        AgeClass::Old => Color32::from_rgb(108, 117, 125),
    }
}

/// Flat backdrop with a grid that moves with the map.
pub(super) fn draw_background(painter: &Painter, rect: Rect, origin: Pos2) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = 64.0;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Bounding-box test; lines crossing the corner region may be drawn needlessly.
pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let start = pos2(0.0, 0.0);
        let end = pos2(10.0, 0.0);
        assert_eq!(distance_to_segment(pos2(5.0, 3.0), start, end), 3.0);
        assert_eq!(distance_to_segment(pos2(-4.0, 3.0), start, end), 5.0);
        assert_eq!(distance_to_segment(pos2(1.0, 1.0), start, start), 2f32.sqrt());
    }

    #[test]
    fn culling_keeps_lines_that_reach_the_viewport() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(segment_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!segment_visible(rect, pos2(120.0, 0.0), pos2(180.0, 90.0), 4.0));
        assert!(circle_visible(rect, pos2(105.0, 50.0), 8.0));
        assert!(!circle_visible(rect, pos2(120.0, 50.0), 8.0));
    }

    #[test]
    fn opacity_sets_alpha() {
        assert_eq!(with_opacity(rgb(Rgb(40, 167, 69)), 0.6).a(), 153);
        assert_eq!(with_opacity(Color32::WHITE, 2.0).a(), 255);
    }
}
