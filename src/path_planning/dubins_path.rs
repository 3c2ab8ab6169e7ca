// Dubins Path Generator
//
// Shortest forward-only path between two oriented planar configurations for a
// vehicle with a minimum turning radius. Every candidate is one of six words
// built from left arcs (L), right arcs (R) and straight lines (S).

use std::f64::consts::PI;
use std::fmt;

use crate::common::{mod2pi, Point2D, PlannerError, PlannerResult, Pose2D};

/// Positions and headings closer than this are treated as coincident.
const COINCIDENT_EPS: f64 = 1e-9;

/// Arc parameters this close to 2pi are snapped to zero.
const FULL_TURN_EPS: f64 = 1e-9;

/// Rounding slack for tangent circles, where a word's straight part vanishes.
const TANGENT_EPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    Left,
    Straight,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DubinsWord {
    Lsl,
    Lsr,
    Rsl,
    Rsr,
    Rlr,
    Lrl,
}

impl DubinsWord {
    /// Evaluation order; ties in length keep the earlier word.
    pub const ALL: [DubinsWord; 6] = [
        DubinsWord::Lsl,
        DubinsWord::Lsr,
        DubinsWord::Rsl,
        DubinsWord::Rsr,
        DubinsWord::Rlr,
        DubinsWord::Lrl,
    ];

    pub fn segments(&self) -> [SegmentType; 3] {
        use SegmentType::*;
        match self {
            DubinsWord::Lsl => [Left, Straight, Left],
            DubinsWord::Lsr => [Left, Straight, Right],
            DubinsWord::Rsl => [Right, Straight, Left],
            DubinsWord::Rsr => [Right, Straight, Right],
            DubinsWord::Rlr => [Right, Left, Right],
            DubinsWord::Lrl => [Left, Right, Left],
        }
    }
}

impl fmt::Display for DubinsWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DubinsWord::Lsl => "LSL",
            DubinsWord::Lsr => "LSR",
            DubinsWord::Rsl => "RSL",
            DubinsWord::Rsr => "RSR",
            DubinsWord::Rlr => "RLR",
            DubinsWord::Lrl => "LRL",
        };
        write!(f, "{}", name)
    }
}

/// Quantities shared by all six word formulas, in radius-normalized units.
struct Intermediate {
    alpha: f64,
    beta: f64,
    d: f64,
    sa: f64,
    sb: f64,
    ca: f64,
    cb: f64,
    c_ab: f64,
    d_sq: f64,
}

impl Intermediate {
    fn new(q0: &Pose2D, q1: &Pose2D, rho: f64) -> Self {
        let dx = q1.x - q0.x;
        let dy = q1.y - q0.y;
        let d = (dx * dx + dy * dy).sqrt() / rho;

        // the chord angle is meaningless when the positions coincide
        let theta = if d > 0.0 { mod2pi(dy.atan2(dx)) } else { 0.0 };
        let alpha = mod2pi(q0.yaw - theta);
        let beta = mod2pi(q1.yaw - theta);

        Intermediate {
            alpha,
            beta,
            d,
            sa: alpha.sin(),
            sb: beta.sin(),
            ca: alpha.cos(),
            cb: beta.cos(),
            c_ab: (alpha - beta).cos(),
            d_sq: d * d,
        }
    }
}

fn left_straight_left(i: &Intermediate) -> Option<[f64; 3]> {
    let tmp0 = i.d + i.sa - i.sb;
    let p_sq = 2.0 + i.d_sq - 2.0 * i.c_ab + 2.0 * i.d * (i.sa - i.sb);
    if p_sq < -TANGENT_EPS {
        return None;
    }
    let p_sq = p_sq.max(0.0);
    let tmp1 = (i.cb - i.ca).atan2(tmp0);
    Some([mod2pi(tmp1 - i.alpha), p_sq.sqrt(), mod2pi(i.beta - tmp1)])
}

fn right_straight_right(i: &Intermediate) -> Option<[f64; 3]> {
    let tmp0 = i.d - i.sa + i.sb;
    let p_sq = 2.0 + i.d_sq - 2.0 * i.c_ab + 2.0 * i.d * (i.sb - i.sa);
    if p_sq < -TANGENT_EPS {
        return None;
    }
    let p_sq = p_sq.max(0.0);
    let tmp1 = (i.ca - i.cb).atan2(tmp0);
    Some([mod2pi(i.alpha - tmp1), p_sq.sqrt(), mod2pi(tmp1 - i.beta)])
}

fn left_straight_right(i: &Intermediate) -> Option<[f64; 3]> {
    let p_sq = -2.0 + i.d_sq + 2.0 * i.c_ab + 2.0 * i.d * (i.sa + i.sb);
    if p_sq < -TANGENT_EPS {
        return None;
    }
    let p_sq = p_sq.max(0.0);
    let p = p_sq.sqrt();
    let tmp0 = (-i.ca - i.cb).atan2(i.d + i.sa + i.sb) - (-2.0_f64).atan2(p);
    Some([mod2pi(tmp0 - i.alpha), p, mod2pi(tmp0 - i.beta)])
}

fn right_straight_left(i: &Intermediate) -> Option<[f64; 3]> {
    let p_sq = -2.0 + i.d_sq + 2.0 * i.c_ab - 2.0 * i.d * (i.sa + i.sb);
    if p_sq < -TANGENT_EPS {
        return None;
    }
    let p_sq = p_sq.max(0.0);
    let p = p_sq.sqrt();
    let tmp0 = (i.ca + i.cb).atan2(i.d - i.sa - i.sb) - (2.0_f64).atan2(p);
    Some([mod2pi(i.alpha - tmp0), p, mod2pi(i.beta - tmp0)])
}

fn right_left_right(i: &Intermediate) -> Option<[f64; 3]> {
    let tmp0 = (6.0 - i.d_sq + 2.0 * i.c_ab + 2.0 * i.d * (i.sa - i.sb)) / 8.0;
    if tmp0.abs() > 1.0 + TANGENT_EPS {
        return None;
    }
    let tmp0 = tmp0.max(-1.0).min(1.0);
    let phi = (i.ca - i.cb).atan2(i.d - i.sa + i.sb);
    let p = mod2pi(2.0 * PI - tmp0.acos());
    let t = mod2pi(i.alpha - phi + mod2pi(p / 2.0));
    Some([t, p, mod2pi(i.alpha - i.beta - t + p)])
}

fn left_right_left(i: &Intermediate) -> Option<[f64; 3]> {
    let tmp0 = (6.0 - i.d_sq + 2.0 * i.c_ab + 2.0 * i.d * (i.sb - i.sa)) / 8.0;
    if tmp0.abs() > 1.0 + TANGENT_EPS {
        return None;
    }
    let tmp0 = tmp0.max(-1.0).min(1.0);
    let phi = (i.ca - i.cb).atan2(i.d + i.sa - i.sb);
    let p = mod2pi(2.0 * PI - tmp0.acos());
    let t = mod2pi(-i.alpha - phi + p / 2.0);
    Some([t, p, mod2pi(i.beta - i.alpha - t + p)])
}

fn word_params(word: DubinsWord, i: &Intermediate) -> Option<[f64; 3]> {
    let mut params = match word {
        DubinsWord::Lsl => left_straight_left(i),
        DubinsWord::Lsr => left_straight_right(i),
        DubinsWord::Rsl => right_straight_left(i),
        DubinsWord::Rsr => right_straight_right(i),
        DubinsWord::Rlr => right_left_right(i),
        DubinsWord::Lrl => left_right_left(i),
    }?;
    // a full turn ends where it started, so it is a rounded-up empty arc
    for (param, kind) in params.iter_mut().zip(word.segments().iter()) {
        if *kind != SegmentType::Straight && 2.0 * PI - *param < FULL_TURN_EPS {
            *param = 0.0;
        }
    }
    Some(params)
}

/// Advance a normalized (unit radius) pose by `t` along one segment.
fn segment(t: f64, qi: Pose2D, kind: SegmentType) -> Pose2D {
    let st = qi.yaw.sin();
    let ct = qi.yaw.cos();
    match kind {
        SegmentType::Left => Pose2D::new(
            qi.x + (qi.yaw + t).sin() - st,
            qi.y - (qi.yaw + t).cos() + ct,
            qi.yaw + t,
        ),
        SegmentType::Right => Pose2D::new(
            qi.x - (qi.yaw - t).sin() + st,
            qi.y + (qi.yaw - t).cos() - ct,
            qi.yaw - t,
        ),
        SegmentType::Straight => Pose2D::new(qi.x + ct * t, qi.y + st * t, qi.yaw),
    }
}

/// One exact geometric piece of a path, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathPiece {
    Line { from: Point2D, to: Point2D },
    /// Circular arc starting at `start_angle` around `center`; a positive
    /// `sweep` turns counter-clockwise.
    Arc {
        center: Point2D,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
}

/// A fully determined Dubins path.
///
/// `params` holds the three segment lengths normalized by the turning radius;
/// arc segments are measured in radians, the straight one in radii.
#[derive(Debug, Clone, PartialEq)]
pub struct DubinsPath {
    pub start: Pose2D,
    pub rho: f64,
    pub params: [f64; 3],
    pub word: DubinsWord,
}

impl DubinsPath {
    /// Shortest of the six candidate words from `q0` to `q1`.
    pub fn shortest(q0: Pose2D, q1: Pose2D, rho: f64) -> PlannerResult<DubinsPath> {
        if !(rho > 0.0) || !rho.is_finite() {
            return Err(PlannerError::InvalidParameter(format!(
                "turning radius must be positive, got {}",
                rho
            )));
        }
        let start = Pose2D::new(q0.x, q0.y, mod2pi(q0.yaw));

        if Self::coincident(&q0, &q1) {
            return Ok(DubinsPath {
                start,
                rho,
                params: [0.0; 3],
                word: DubinsWord::Lsl,
            });
        }

        let inter = Intermediate::new(&q0, &q1, rho);
        let mut best: Option<(f64, DubinsWord, [f64; 3])> = None;
        for &word in DubinsWord::ALL.iter() {
            if let Some(params) = word_params(word, &inter) {
                let cost = params[0] + params[1] + params[2];
                if best.map_or(true, |(best_cost, _, _)| cost < best_cost) {
                    best = Some((cost, word, params));
                }
            }
        }

        match best {
            Some((_, word, params)) => Ok(DubinsPath { start, rho, params, word }),
            None => Err(PlannerError::PlanningError(
                "no Dubins word connects the configurations".to_string(),
            )),
        }
    }

    /// Path for one specific word, if that word is feasible.
    pub fn with_word(q0: Pose2D, q1: Pose2D, rho: f64, word: DubinsWord) -> Option<DubinsPath> {
        if !(rho > 0.0) {
            return None;
        }
        let inter = Intermediate::new(&q0, &q1, rho);
        word_params(word, &inter).map(|params| DubinsPath {
            start: Pose2D::new(q0.x, q0.y, mod2pi(q0.yaw)),
            rho,
            params,
            word,
        })
    }

    fn coincident(q0: &Pose2D, q1: &Pose2D) -> bool {
        let dyaw = mod2pi(q1.yaw - q0.yaw);
        q0.position().distance(&q1.position()) < COINCIDENT_EPS
            && dyaw.min(2.0 * PI - dyaw) < COINCIDENT_EPS
    }

    /// Total arclength in world units.
    pub fn length(&self) -> f64 {
        (self.params[0] + self.params[1] + self.params[2]) * self.rho
    }

    /// Arclength of segment `i` in world units.
    pub fn segment_length(&self, i: usize) -> f64 {
        self.params[i] * self.rho
    }

    pub fn segment_types(&self) -> [SegmentType; 3] {
        self.word.segments()
    }

    pub fn is_degenerate(&self) -> bool {
        self.length() <= 0.0
    }

    /// Pose at arclength `t`, or `None` outside [0, length].
    pub fn sample(&self, t: f64) -> Option<Pose2D> {
        let length = self.length();
        if t < 0.0 || t > length {
            return None;
        }

        let types = self.word.segments();
        let tprime = t / self.rho;
        let qi = Pose2D::new(0.0, 0.0, self.start.yaw);
        let p1 = self.params[0];
        let p2 = self.params[1];
        let q1 = segment(p1, qi, types[0]);
        let q2 = segment(p2, q1, types[1]);

        let q = if tprime < p1 {
            segment(tprime, qi, types[0])
        } else if tprime < p1 + p2 {
            segment(tprime - p1, q1, types[1])
        } else {
            segment(tprime - p1 - p2, q2, types[2])
        };

        Some(Pose2D::new(
            q.x * self.rho + self.start.x,
            q.y * self.rho + self.start.y,
            mod2pi(q.yaw),
        ))
    }

    /// Poses every `step` of arclength, always ending with the exact endpoint.
    pub fn sample_many(&self, step: f64) -> Vec<Pose2D> {
        let length = self.length();
        let mut poses = Vec::new();
        if step > 0.0 {
            let mut t = 0.0;
            while t < length {
                if let Some(pose) = self.sample(t) {
                    poses.push(pose);
                }
                t += step;
            }
        }
        poses.push(self.endpoint());
        poses
    }

    pub fn endpoint(&self) -> Pose2D {
        // length() can be off by an ulp from the segment sum used in sample()
        let length = self.length();
        self.sample(length).unwrap_or(self.start)
    }

    /// Sampled positions only, for drawing and stored edge curves.
    pub fn points(&self, step: f64) -> Vec<Point2D> {
        self.sample_many(step).iter().map(Pose2D::position).collect()
    }

    /// The arcs and straight line of the path, zero-length segments skipped.
    pub fn pieces(&self) -> Vec<PathPiece> {
        let world = |x: f64, y: f64| {
            Point2D::new(x * self.rho + self.start.x, y * self.rho + self.start.y)
        };

        let mut pieces = Vec::with_capacity(3);
        let mut q = Pose2D::new(0.0, 0.0, self.start.yaw);
        for (&kind, &param) in self.word.segments().iter().zip(self.params.iter()) {
            let next = segment(param, q, kind);
            if param > 0.0 {
                let (sin, cos) = q.yaw.sin_cos();
                pieces.push(match kind {
                    SegmentType::Straight => PathPiece::Line {
                        from: world(q.x, q.y),
                        to: world(next.x, next.y),
                    },
                    SegmentType::Left => PathPiece::Arc {
                        center: world(q.x - sin, q.y + cos),
                        radius: self.rho,
                        start_angle: q.yaw - PI / 2.0,
                        sweep: param,
                    },
                    SegmentType::Right => PathPiece::Arc {
                        center: world(q.x + sin, q.y - cos),
                        radius: self.rho,
                        start_angle: q.yaw + PI / 2.0,
                        sweep: -param,
                    },
                });
            }
            q = next;
        }
        pieces
    }
}

/// Convenience wrapper returning the shortest path from raw coordinates.
pub fn dubins_path_planning(
    sx: f64,
    sy: f64,
    syaw: f64,
    gx: f64,
    gy: f64,
    gyaw: f64,
    turning_radius: f64,
) -> PlannerResult<DubinsPath> {
    DubinsPath::shortest(
        Pose2D::new(sx, sy, syaw),
        Pose2D::new(gx, gy, gyaw),
        turning_radius,
    )
}
