//! Narrow-phase contact generation
//!
//! Every shape is either a circle or a rounded convex hull (segments are
//! two-vertex hulls). Hull pairs use separating-axis tests with reference
//! edge clipping; circles use closest-point queries.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::shape::WorldGeometry;

const EPSILON: f32 = 1e-6;

/// One contact point between two shapes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    /// Point on the surface of the first shape
    pub point_a: Vec2,
    /// Point on the surface of the second shape
    pub point_b: Vec2,
    /// Penetration depth (positive when overlapping)
    pub depth: f32,
}

impl ContactPoint {
    #[inline]
    pub fn midpoint(&self) -> Vec2 {
        (self.point_a + self.point_b) * 0.5
    }
}

/// Contact manifold; `normal` points from the first shape toward the second
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifold {
    pub normal: Vec2,
    pub points: Vec<ContactPoint>,
}

impl Manifold {
    /// Same contact seen from the other shape
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        for p in &mut self.points {
            std::mem::swap(&mut p.point_a, &mut p.point_b);
        }
        self
    }
}

/// Test two world-space shapes for contact
pub fn collide(a: &WorldGeometry, b: &WorldGeometry) -> Option<Manifold> {
    match (a, b) {
        (
            WorldGeometry::Circle { center: ca, radius: ra },
            WorldGeometry::Circle { center: cb, radius: rb },
        ) => circle_circle(*ca, *ra, *cb, *rb),
        (WorldGeometry::Hull { verts, radius }, WorldGeometry::Circle { center, radius: rc }) => {
            hull_circle(verts, *radius, *center, *rc)
        }
        (WorldGeometry::Circle { center, radius: rc }, WorldGeometry::Hull { verts, radius }) => {
            hull_circle(verts, *radius, *center, *rc).map(Manifold::flipped)
        }
        (
            WorldGeometry::Hull { verts: va, radius: ra },
            WorldGeometry::Hull { verts: vb, radius: rb },
        ) => hull_hull(va, *ra, vb, *rb),
    }
}

fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Manifold> {
    let delta = cb - ca;
    let dist = delta.length();
    let r = ra + rb;
    if dist >= r {
        return None;
    }
    let normal = if dist > EPSILON { delta / dist } else { Vec2::Y };
    Some(Manifold {
        normal,
        points: vec![ContactPoint {
            point_a: ca + normal * ra,
            point_b: cb - normal * rb,
            depth: r - dist,
        }],
    })
}

/// Hull edges as (start, end) pairs; a two-vertex hull yields both directions
fn edges(verts: &[Vec2]) -> Vec<(Vec2, Vec2)> {
    match verts.len() {
        0 | 1 => Vec::new(),
        2 => vec![(verts[0], verts[1]), (verts[1], verts[0])],
        n => (0..n).map(|i| (verts[i], verts[(i + 1) % n])).collect(),
    }
}

/// Outward normal of a counter-clockwise edge
#[inline]
fn outward_normal(start: Vec2, end: Vec2) -> Vec2 {
    let e = end - start;
    Vec2::new(e.y, -e.x).normalize_or_zero()
}

fn closest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Normal points from the hull toward the circle
fn hull_circle(verts: &[Vec2], hull_radius: f32, center: Vec2, radius: f32) -> Option<Manifold> {
    let r = hull_radius + radius;

    // Circle center inside a solid polygon: push out along the shallowest face
    if verts.len() >= 3 {
        let mut best: Option<(f32, Vec2)> = None;
        let mut inside = true;
        for (start, end) in edges(verts) {
            let n = outward_normal(start, end);
            let s = n.dot(center - start);
            if s > 0.0 {
                inside = false;
                break;
            }
            if best.is_none_or(|(bs, _)| s > bs) {
                best = Some((s, n));
            }
        }
        if inside && let Some((s, n)) = best {
            let surface = center - n * s;
            return Some(Manifold {
                normal: n,
                points: vec![ContactPoint {
                    point_a: surface + n * hull_radius,
                    point_b: center - n * radius,
                    depth: r - s,
                }],
            });
        }
    }

    let mut closest: Option<(f32, Vec2, Vec2)> = None;
    let segment_count = if verts.len() == 2 { 1 } else { verts.len() };
    for i in 0..segment_count {
        let (a, b) = (verts[i], verts[(i + 1) % verts.len()]);
        let q = closest_on_segment(center, a, b);
        let dist_sq = (center - q).length_squared();
        if closest.is_none_or(|(d, _, _)| dist_sq < d) {
            closest = Some((dist_sq, q, outward_normal(a, b)));
        }
    }
    let (dist_sq, q, edge_normal) = closest?;
    let dist = dist_sq.sqrt();
    if dist >= r {
        return None;
    }
    let normal = if dist > EPSILON {
        (center - q) / dist
    } else {
        edge_normal
    };
    Some(Manifold {
        normal,
        points: vec![ContactPoint {
            point_a: q + normal * hull_radius,
            point_b: center - normal * radius,
            depth: r - dist,
        }],
    })
}

/// Largest separation of `incident` along the outward normals of `reference`
fn max_separation(reference: &[Vec2], incident: &[Vec2]) -> Option<(f32, Vec2, Vec2)> {
    let mut best: Option<(f32, Vec2, Vec2)> = None;
    for (start, end) in edges(reference) {
        let n = outward_normal(start, end);
        let s = incident
            .iter()
            .map(|&v| n.dot(v - start))
            .fold(f32::INFINITY, f32::min);
        if best.is_none_or(|(bs, _, _)| s > bs) {
            best = Some((s, start, end));
        }
    }
    best
}

/// Clip segment `v1..v2` to the slab `lo..=hi` along unit axis `u`
fn clip_segment(v1: Vec2, v2: Vec2, u: Vec2, lo: f32, hi: f32) -> Option<(Vec2, Vec2)> {
    let (s1, s2) = (u.dot(v1), u.dot(v2));
    let (mut a, mut b) = (v1, v2);
    let (mut sa, mut sb) = (s1, s2);
    if sa > sb {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut sa, &mut sb);
    }
    if sb < lo || sa > hi {
        return None;
    }
    let lerp = |t_s: f32| {
        if (sb - sa).abs() < EPSILON {
            a
        } else {
            a + (b - a) * ((t_s - sa) / (sb - sa))
        }
    };
    let ca = if sa < lo { lerp(lo) } else { a };
    let cb = if sb > hi { lerp(hi) } else { b };
    Some((ca, cb))
}

fn hull_hull(va: &[Vec2], ra: f32, vb: &[Vec2], rb: f32) -> Option<Manifold> {
    let r = ra + rb;
    let (sep_a, pa, qa) = max_separation(va, vb)?;
    if sep_a > r {
        return None;
    }
    let (sep_b, pb, qb) = max_separation(vb, va)?;
    if sep_b > r {
        return None;
    }

    // Prefer the first shape's face unless the second is clearly better
    let flip = sep_b > sep_a + 1e-3;
    let (p, q, incident, r_ref, r_inc) = if flip {
        (pb, qb, va, rb, ra)
    } else {
        (pa, qa, vb, ra, rb)
    };
    let n = outward_normal(p, q);

    // Incident edge: the face most anti-parallel to the reference normal
    let (i1, i2) = edges(incident)
        .into_iter()
        .min_by(|x, y| {
            let dx = outward_normal(x.0, x.1).dot(n);
            let dy = outward_normal(y.0, y.1).dot(n);
            dx.partial_cmp(&dy).unwrap_or(std::cmp::Ordering::Equal)
        })?;

    let u = (q - p).normalize_or_zero();
    let mut candidates = Vec::with_capacity(2);
    if let Some((c1, c2)) = clip_segment(i1, i2, u, u.dot(p), u.dot(q)) {
        candidates.push(c1);
        if (c2 - c1).length_squared() > EPSILON {
            candidates.push(c2);
        }
    }

    let mut points: Vec<ContactPoint> = candidates
        .into_iter()
        .filter_map(|v| contact_on_face(v, p, n, r, r_ref, r_inc))
        .collect();

    if points.is_empty() {
        // Corner touching past the end of the reference face
        let deepest = incident
            .iter()
            .copied()
            .min_by(|x, y| {
                n.dot(*x - p)
                    .partial_cmp(&n.dot(*y - p))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
        points.extend(contact_on_face(deepest, p, n, r, r_ref, r_inc));
    }
    if points.is_empty() {
        return None;
    }

    let manifold = Manifold { normal: n, points };
    Some(if flip { manifold.flipped() } else { manifold })
}

fn contact_on_face(v: Vec2, p: Vec2, n: Vec2, r: f32, r_ref: f32, r_inc: f32) -> Option<ContactPoint> {
    let d = n.dot(v - p);
    (d < r).then(|| ContactPoint {
        point_a: v - n * d + n * r_ref,
        point_b: v - n * r_inc,
        depth: r - d,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(center: Vec2, half: f32) -> WorldGeometry {
        WorldGeometry::Hull {
            verts: vec![
                center + Vec2::new(-half, -half),
                center + Vec2::new(half, -half),
                center + Vec2::new(half, half),
                center + Vec2::new(-half, half),
            ],
            radius: 0.0,
        }
    }

    #[test]
    fn test_circle_circle_normal_points_a_to_b() {
        let a = WorldGeometry::Circle { center: Vec2::ZERO, radius: 2.0 };
        let b = WorldGeometry::Circle { center: Vec2::new(3.0, 0.0), radius: 2.0 };
        let m = collide(&a, &b).expect("overlapping circles");
        assert!((m.normal - Vec2::X).length() < 1e-5);
        assert!((m.points[0].depth - 1.0).abs() < 1e-5);

        let far = WorldGeometry::Circle { center: Vec2::new(5.0, 0.0), radius: 2.0 };
        assert!(collide(&a, &far).is_none());
    }

    #[test]
    fn test_circle_resting_on_segment() {
        let floor = WorldGeometry::Hull {
            verts: vec![Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)],
            radius: 1.0,
        };
        let ball = WorldGeometry::Circle { center: Vec2::new(2.0, 3.5), radius: 3.0 };
        let m = collide(&floor, &ball).expect("ball touching floor");
        assert!((m.normal - Vec2::Y).length() < 1e-5);
        assert!((m.points[0].depth - 0.5).abs() < 1e-4);

        let flipped = collide(&ball, &floor).expect("symmetric");
        assert!((flipped.normal + Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_box_on_box_gives_two_contacts() {
        let ground = square(Vec2::ZERO, 5.0);
        let crate_box = square(Vec2::new(0.0, 9.5), 5.0);
        let m = collide(&ground, &crate_box).expect("stacked boxes overlap");
        assert!((m.normal - Vec2::Y).length() < 1e-4);
        assert_eq!(m.points.len(), 2);
        for p in &m.points {
            assert!((p.depth - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_triangle_tip_on_segment() {
        let floor = WorldGeometry::Hull {
            verts: vec![Vec2::new(-30.0, 0.0), Vec2::new(30.0, 0.0)],
            radius: 1.0,
        };
        // Craft flipped upside down, nose touching the floor
        let craft = WorldGeometry::Hull {
            verts: vec![Vec2::new(0.0, 0.5), Vec2::new(3.0, 9.5), Vec2::new(-3.0, 9.5)],
            radius: 0.0,
        };
        let m = collide(&craft, &floor).expect("nose inside floor radius");
        assert!(m.normal.y < 0.0);
        assert!(m.points.iter().all(|p| p.depth > 0.0));
    }

    #[test]
    fn test_separated_hulls_miss() {
        let a = square(Vec2::ZERO, 1.0);
        let b = square(Vec2::new(5.0, 0.0), 1.0);
        assert!(collide(&a, &b).is_none());
    }

    #[test]
    fn test_circle_inside_box_pushes_out_shallowest_face() {
        let b = square(Vec2::ZERO, 5.0);
        let c = WorldGeometry::Circle { center: Vec2::new(0.0, 4.0), radius: 1.0 };
        let m = collide(&b, &c).expect("circle inside box");
        assert!((m.normal - Vec2::Y).length() < 1e-5);
        assert!((m.points[0].depth - 2.0).abs() < 1e-4);
    }
}
