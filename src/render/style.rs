use crate::mesh::{Link, LinkType, Node, Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

pub fn role_color(role: Option<&Role>) -> Rgb {
    match role {
        Some(Role::Client) => Rgb(13, 110, 253),
        Some(Role::ClientMute) => Rgb(108, 117, 125),
        Some(Role::Router | Role::RouterLate) => Rgb(25, 135, 84),
        Some(Role::Repeater) => Rgb(255, 193, 7),
        Some(Role::RouterClient) => Rgb(13, 202, 240),
        Some(Role::Sensor) => Rgb(214, 51, 132),
        Some(Role::Unknown | Role::Other(_)) | None => Rgb(220, 53, 69),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkQuality {
    Good,
    Fair,
    Poor,
}

impl LinkQuality {
    pub fn of(success_rate: f64) -> Self {
        if success_rate >= 80.0 {
            Self::Good
        } else if success_rate >= 50.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Self::Good => Rgb(40, 167, 69),
            Self::Fair => Rgb(255, 193, 7),
            Self::Poor => Rgb(220, 53, 69),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dash {
    pub dash: f32,
    pub gap: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkStroke {
    pub color: Rgb,
    pub weight: f32,
    pub opacity: f32,
    pub dash: Option<Dash>,
}

pub fn link_stroke(link: &Link, emphasized: bool) -> LinkStroke {
    let quality = LinkQuality::of(link.success_rate);
    let (weight, opacity) = if emphasized { (3.0, 0.9) } else { (2.0, 0.6) };
    let dash = match link.link_type {
        LinkType::Packet => Some(Dash { dash: 3.0, gap: 6.0 }),
        LinkType::Traceroute if quality == LinkQuality::Poor => Some(Dash { dash: 5.0, gap: 5.0 }),
        LinkType::Traceroute => None,
    };

    LinkStroke {
        color: quality.color(),
        weight,
        opacity,
        dash,
    }
}

/// Four-character marker text: short name, else display name, else the last
/// four hex digits of the id when the name is blank or a generated `Node …`.
pub fn marker_label(node: &Node) -> String {
    let name = node
        .short_name
        .as_deref()
        .filter(|short| !short.is_empty())
        .unwrap_or(&node.display_name);

    if name.trim().is_empty() || name.starts_with("Node ") {
        let hex = format!("{:08x}", node.node_id);
        return hex[hex.len() - 4..].to_ascii_uppercase();
    }

    name.chars().take(4).collect()
}
