//! Collision detection and response for a round ball against boxes

use glam::Vec2;

/// Axis-aligned rectangle in board pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn bottom_right(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }
}

/// Reflect velocity off a surface with the given normal
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - normal * ((velocity * 2.0).dot(normal) / normal.dot(normal))
}

/// Check whether a ball overlaps a box.
///
/// On a hit, returns the normal of the box face closest to the ball center
/// (top wins ties, then bottom, left, right).
pub fn ball_hits_rect(center: Vec2, radius: f32, rect: &Aabb) -> Option<Vec2> {
    let tl = rect.top_left();
    let br = rect.bottom_right();

    if center.x + radius < tl.x
        || center.x - radius >= br.x
        || center.y + radius < tl.y
        || center.y - radius >= br.y
    {
        return None;
    }

    let faces = [
        ((tl.y - center.y).abs(), Vec2::new(0.0, -1.0)),
        ((br.y - center.y).abs(), Vec2::new(0.0, 1.0)),
        ((tl.x - center.x).abs(), Vec2::new(-1.0, 0.0)),
        ((br.x - center.x).abs(), Vec2::new(1.0, 0.0)),
    ];
    let normal = faces
        .iter()
        .fold(faces[0], |best, &face| if face.0 < best.0 { face } else { best })
        .1;
    Some(normal)
}
