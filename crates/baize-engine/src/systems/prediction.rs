//! Aim assistance: where will the cue ball go? Advisory only, never used
//! for scoring.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::ball::Ball;
use crate::components::table::Table;
use crate::core::math::{ray_circle, reflect};

/// Cushion bounce used by the coarse fallback simulation.
const BOUNCE_RESTITUTION: f32 = 0.8;
/// Tangential speed kept along a cushion on a bounce.
const BOUNCE_FRICTION: f32 = 0.9;
/// Constant deceleration of the fallback simulation (m/s²).
const BOUNCE_DECEL: f32 = 0.6;
const SIM_DT: f32 = 1.0 / 120.0;
const MAX_SIM_STEPS: usize = 1200;
const MAX_BOUNCES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedHit {
    pub ball: u8,
    /// Cue-ball centre at the moment of contact.
    pub cue_position: Vec2,
    /// Point where the two balls touch.
    pub contact_point: Vec2,
    /// Direction the object ball leaves along (line of centres).
    pub object_direction: Vec2,
    /// Stun-shot tangent line of the cue ball after contact.
    pub cue_direction: Vec2,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prediction {
    /// Cue-ball centre path, starting at its current position.
    pub path: Vec<Vec2>,
    pub hit: Option<PredictedHit>,
}

/// First object ball a centre ray from `origin` along `dir` would strike,
/// with the distance travelled to contact.
fn first_ball_hit(origin: Vec2, dir: Vec2, radius: f32, balls: &[Ball], cue: u8) -> Option<(f32, &Ball)> {
    balls
        .iter()
        .filter(|b| b.number != cue && b.on_table())
        .filter_map(|b| ray_circle(origin, dir, b.pos, radius + b.radius).map(|t| (t, b)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

fn hit_at(origin: Vec2, dir: Vec2, t: f32, radius: f32, ball: &Ball) -> PredictedHit {
    let cue_position = origin + dir * t;
    let object_direction = (ball.pos - cue_position).normalize_or_zero();
    let contact_point = cue_position + object_direction * radius;
    // Stun: the cue ball keeps only the component of its motion
    // perpendicular to the line of centres.
    let tangent = dir - object_direction * dir.dot(object_direction);
    PredictedHit {
        ball: ball.number,
        cue_position,
        contact_point,
        object_direction,
        cue_direction: tangent.normalize_or_zero(),
    }
}

/// Predict the cue ball's path for a shot along `direction` at `power` m/s.
pub fn predict(table: &Table, balls: &[Ball], cue: u8, direction: Vec2, power: f32) -> Prediction {
    let Some(cue_ball) = balls.iter().find(|b| b.number == cue && b.on_table()) else {
        return Prediction::default();
    };
    let dir = direction.normalize_or_zero();
    if dir == Vec2::ZERO {
        return Prediction::default();
    }
    let origin = cue_ball.pos;
    let radius = cue_ball.radius;

    if let Some((t, ball)) = first_ball_hit(origin, dir, radius, balls, cue) {
        let hit = hit_at(origin, dir, t, radius, ball);
        return Prediction {
            path: vec![origin, hit.cue_position],
            hit: Some(hit),
        };
    }

    bounce_path(table, balls, cue, origin, dir * power.max(0.0), radius)
}

/// Coarse rail-bounce simulation, used when the straight line hits nothing.
fn bounce_path(table: &Table, balls: &[Ball], cue: u8, origin: Vec2, vel: Vec2, radius: f32) -> Prediction {
    let min = Vec2::splat(radius);
    let max = Vec2::new(table.length - radius, table.width - radius);
    let mut path = vec![origin];
    let mut pos = origin;
    let mut vel = vel;
    let mut bounces = 0;

    for _ in 0..MAX_SIM_STEPS {
        let speed = vel.length();
        if speed < 1e-3 {
            break;
        }
        let next = pos + vel * SIM_DT;
        let step = next - pos;
        let dir = step / step.length().max(f32::EPSILON);
        if let Some((t, ball)) = first_ball_hit(pos, dir, radius, balls, cue) {
            if t <= step.length() {
                let hit = hit_at(pos, dir, t, radius, ball);
                path.push(hit.cue_position);
                return Prediction { path, hit: Some(hit) };
            }
        }

        pos = next;
        let mut normal = Vec2::ZERO;
        if pos.x < min.x || pos.x > max.x {
            normal.x = if pos.x < min.x { 1.0 } else { -1.0 };
            pos.x = pos.x.clamp(min.x, max.x);
        }
        if pos.y < min.y || pos.y > max.y {
            normal.y = if pos.y < min.y { 1.0 } else { -1.0 };
            pos.y = pos.y.clamp(min.y, max.y);
        }
        if normal != Vec2::ZERO {
            let n = normal.normalize();
            let bounced = reflect(vel, n);
            let normal_part = n * bounced.dot(n);
            vel = normal_part * BOUNCE_RESTITUTION + (bounced - normal_part) * BOUNCE_FRICTION;
            path.push(pos);
            bounces += 1;
            if bounces > MAX_BOUNCES {
                return Prediction { path, hit: None };
            }
        }
        vel -= vel.normalize_or_zero() * (BOUNCE_DECEL * SIM_DT).min(speed);
    }
    path.push(pos);
    Prediction { path, hit: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ball::american_set;
    use crate::components::table::TableStyle;

    fn table_with(positions: &[(u8, Vec2)]) -> (Table, Vec<Ball>) {
        let table = Table::new(TableStyle::AmericanNineFoot);
        let mut balls = american_set(table.ball_radius);
        for b in balls.iter_mut() {
            b.pocket();
        }
        for &(n, pos) in positions {
            balls[n as usize].place(pos);
        }
        (table, balls)
    }

    #[test]
    fn straight_hit_stops_one_diameter_short() {
        let (table, balls) = table_with(&[(0, Vec2::new(0.5, 0.6)), (4, Vec2::new(1.5, 0.6))]);
        let p = predict(&table, &balls, 0, Vec2::X, 2.0);
        let hit = p.hit.expect("should hit ball 4");
        assert_eq!(hit.ball, 4);
        let d = 2.0 * table.ball_radius;
        assert!((hit.cue_position.x - (1.5 - d)).abs() < 1e-4);
        assert!((hit.contact_point.x - (1.5 - table.ball_radius)).abs() < 1e-4);
        assert!((hit.object_direction - Vec2::X).length() < 1e-4);
    }

    #[test]
    fn thin_cut_uses_combined_radius() {
        let r = 0.028575;
        // Centre ray misses the object ball by 1.5 R but the balls still touch.
        let (table, balls) = table_with(&[(0, Vec2::new(0.5, 0.6)), (2, Vec2::new(1.5, 0.6 + 1.5 * r))]);
        let p = predict(&table, &balls, 0, Vec2::X, 2.0);
        let hit = p.hit.expect("thin cut should still register");
        assert_eq!(hit.ball, 2);
        assert!(hit.object_direction.y > 0.5);
        assert!(hit.cue_direction.y < 0.0, "cue ball deflects away from the cut side");
    }

    #[test]
    fn nearest_ball_wins() {
        let (table, balls) = table_with(&[
            (0, Vec2::new(0.5, 0.6)),
            (4, Vec2::new(1.5, 0.6)),
            (9, Vec2::new(1.0, 0.6)),
        ]);
        let p = predict(&table, &balls, 0, Vec2::X, 2.0);
        assert_eq!(p.hit.map(|h| h.ball), Some(9));
    }

    #[test]
    fn miss_falls_back_to_rail_bounces() {
        let (table, balls) = table_with(&[(0, Vec2::new(0.5, 0.6))]);
        let p = predict(&table, &balls, 0, Vec2::new(1.0, 0.3), 3.0);
        assert!(p.hit.is_none());
        assert!(p.path.len() > 2, "expected at least one bounce: {:?}", p.path);
        for point in &p.path {
            assert!(point.x >= table.ball_radius - 1e-4 && point.x <= table.length - table.ball_radius + 1e-4);
            assert!(point.y >= table.ball_radius - 1e-4 && point.y <= table.width - table.ball_radius + 1e-4);
        }
    }

    #[test]
    fn pocketed_cue_predicts_nothing() {
        let (table, balls) = table_with(&[(4, Vec2::new(1.5, 0.6))]);
        assert_eq!(predict(&table, &balls, 0, Vec2::X, 2.0), Prediction::default());
    }
}
