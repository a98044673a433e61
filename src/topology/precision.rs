use crate::mesh::Node;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrecisionSource {
    Gps,
    AgeEstimate,
    Unknown,
}

impl PrecisionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::AgeEstimate => "age_estimate",
            Self::Unknown => "unknown",
        }
    }
}

/// Size class of the precision indicator. Display only; never used to filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrecisionLevel {
    Tight,
    Medium,
    Wide,
    None,
}

impl PrecisionLevel {
    fn for_radius(radius_meters: f64) -> Self {
        if radius_meters <= 20.0 {
            Self::Tight
        } else if radius_meters <= 150.0 {
            Self::Medium
        } else {
            Self::Wide
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tight => "tight",
            Self::Medium => "medium",
            Self::Wide => "wide",
            Self::None => "none",
        }
    }

    pub fn display_size(self) -> f32 {
        match self {
            Self::Tight | Self::None => 120.0,
            Self::Medium => 160.0,
            Self::Wide => 200.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Precision {
    pub radius_meters: f64,
    pub source: PrecisionSource,
    pub level: PrecisionLevel,
    pub label: &'static str,
}

impl Precision {
    pub const UNKNOWN: Self = Self {
        radius_meters: 0.0,
        source: PrecisionSource::Unknown,
        level: PrecisionLevel::None,
        label: "Unknown",
    };

    pub fn description(&self) -> &'static str {
        match self.source {
            PrecisionSource::Gps => "Accuracy provided by the reporting device.",
            PrecisionSource::AgeEstimate => {
                "Estimate based on how recent the last position update is."
            }
            PrecisionSource::Unknown => "Precision data not available.",
        }
    }

    /// `±12 m | GPS reported`
    pub fn summary(&self) -> String {
        format!(
            "±{} m | {}",
            self.radius_meters.round().max(1.0),
            self.label
        )
    }
}

/// Maps a node's reported accuracy (or, failing that, the age of its last
/// position) to a display radius. `None` yields [`Precision::UNKNOWN`].
pub fn estimate(node: Option<&Node>, now: f64) -> Precision {
    let Some(node) = node else {
        return Precision::UNKNOWN;
    };

    let (radius_meters, source) = match node.precision_meters {
        Some(reported) if reported > 0.0 => (reported, PrecisionSource::Gps),
        _ => {
            let age_hours = node
                .reported_at()
                .map(|ts| ((now - ts) / 3600.0).max(0.0))
                .unwrap_or(f64::INFINITY);
            (radius_for_age(age_hours), PrecisionSource::AgeEstimate)
        }
    };

    let label = match source {
        PrecisionSource::Gps => "GPS reported",
        _ => "Age estimated",
    };

    Precision {
        radius_meters,
        source,
        level: PrecisionLevel::for_radius(radius_meters),
        label,
    }
}

fn radius_for_age(age_hours: f64) -> f64 {
    if age_hours > 168.0 {
        500.0
    } else if age_hours > 24.0 {
        100.0
    } else if age_hours > 6.0 {
        30.0
    } else if age_hours > 1.0 {
        15.0
    } else {
        10.0
    }
}
