//! Static table geometry: play area, pockets, cushion polylines, zones,
//! spots and rack layouts.
//!
//! Origin is the top-left cushion nose. +x runs from the head (baulk) end to
//! the foot (top) end, +y across the table. Units are metres.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::ball::{Ball, SnookerColor};
use crate::core::math::sample_quadratic;

/// Gap left between racked balls so the rack does not start in contact.
const RACK_GAP: f32 = 0.0005;
/// Step used when searching for a free respot position.
const RESPOT_STEP_FRACTION: f32 = 0.25;
/// Bezier samples per cushion jaw.
const JAW_SEGMENTS: usize = 6;
/// Snooker baulk line distance from the baulk cushion.
const SNOOKER_BAULK: f32 = 0.737;
/// Snooker D radius.
const SNOOKER_D_RADIUS: f32 = 0.292;
/// Snooker black spot distance from the top cushion.
const SNOOKER_BLACK_FROM_TOP: f32 = 0.324;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStyle {
    #[default]
    AmericanNineFoot,
    EnglishSevenFoot,
    SnookerTwelveFoot,
}

/// Per-style dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableDims {
    pub length: f32,
    pub width: f32,
    pub ball_radius: f32,
    pub corner_pocket_radius: f32,
    pub side_pocket_radius: f32,
}

impl TableStyle {
    pub fn dims(self) -> TableDims {
        match self {
            TableStyle::AmericanNineFoot => TableDims {
                length: 2.54,
                width: 1.27,
                ball_radius: 0.028575,
                corner_pocket_radius: 0.058,
                side_pocket_radius: 0.065,
            },
            TableStyle::EnglishSevenFoot => TableDims {
                length: 1.83,
                width: 0.915,
                ball_radius: 0.0254,
                corner_pocket_radius: 0.046,
                side_pocket_radius: 0.048,
            },
            TableStyle::SnookerTwelveFoot => TableDims {
                length: 3.569,
                width: 1.778,
                ball_radius: 0.02625,
                corner_pocket_radius: 0.046,
                side_pocket_radius: 0.05,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PocketKind {
    Corner,
    Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: PocketKind,
}

impl Pocket {
    /// Radius the ball centre must enter to be captured.
    pub fn capture_radius(&self, ball_radius: f32, capture_fraction: f32) -> f32 {
        self.radius - ball_radius * capture_fraction
    }
}

/// Which of the six cushions a rail belongs to. Left and right are as seen
/// by a player standing at the head end looking toward the foot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cushion {
    Head,
    Foot,
    LeftHead,
    LeftFoot,
    RightHead,
    RightFoot,
}

impl Cushion {
    pub const ALL: [Cushion; 6] = [
        Cushion::Head,
        Cushion::Foot,
        Cushion::LeftHead,
        Cushion::LeftFoot,
        Cushion::RightHead,
        Cushion::RightFoot,
    ];

    pub fn is_long(self) -> bool {
        !matches!(self, Cushion::Head | Cushion::Foot)
    }
}

/// One cushion as a chained polyline: jaw, straight nose, jaw.
#[derive(Debug, Clone, PartialEq)]
pub struct Rail {
    pub cushion: Cushion,
    pub points: Vec<Vec2>,
}

/// Where a ball in hand may be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementZone {
    Anywhere,
    /// Behind the head string (American break).
    Kitchen,
    /// Behind the baulk line (UK 8-ball).
    Baulk,
    /// The snooker D.
    D,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub style: TableStyle,
    pub length: f32,
    pub width: f32,
    pub ball_radius: f32,
    pub pockets: Vec<Pocket>,
    pub rails: Vec<Rail>,
}

impl Table {
    pub fn new(style: TableStyle) -> Self {
        let dims = style.dims();
        let pockets = build_pockets(&dims);
        let rails = build_rails(&dims);
        log::debug!(
            "Table {:?}: {}x{} m, {} pockets, {} rails",
            style,
            dims.length,
            dims.width,
            pockets.len(),
            rails.len()
        );
        Self {
            style,
            length: dims.length,
            width: dims.width,
            ball_radius: dims.ball_radius,
            pockets,
            rails,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.length / 2.0, self.width / 2.0)
    }

    /// x of the line used by the break "past centre" rule.
    pub fn center_line_x(&self) -> f32 {
        self.length / 2.0
    }

    /// Whether a ball centred at `pos` fits inside the cushions.
    pub fn contains_ball(&self, pos: Vec2) -> bool {
        let r = self.ball_radius;
        pos.x >= r && pos.x <= self.length - r && pos.y >= r && pos.y <= self.width - r
    }

    /// Whether `pos` has left the play area by more than the deepest pocket,
    /// i.e. the ball tunnelled through a cushion.
    pub fn has_escaped(&self, pos: Vec2) -> bool {
        let margin = self
            .pockets
            .iter()
            .map(|p| p.radius)
            .fold(0.0_f32, f32::max)
            * 1.5;
        pos.x < -margin
            || pos.x > self.length + margin
            || pos.y < -margin
            || pos.y > self.width + margin
    }

    pub fn nearest_pocket(&self, pos: Vec2) -> usize {
        self.pockets
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.pos.distance(pos).total_cmp(&b.pos.distance(pos)))
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    /// Head string (American kitchen line).
    pub fn head_string_x(&self) -> f32 {
        self.length / 4.0
    }

    pub fn baulk_x(&self) -> f32 {
        match self.style {
            TableStyle::SnookerTwelveFoot => SNOOKER_BAULK,
            _ => self.length / 5.0,
        }
    }

    pub fn d_radius(&self) -> f32 {
        match self.style {
            TableStyle::SnookerTwelveFoot => SNOOKER_D_RADIUS,
            _ => self.width / 6.0,
        }
    }

    pub fn head_spot(&self) -> Vec2 {
        Vec2::new(self.head_string_x(), self.width / 2.0)
    }

    pub fn foot_spot(&self) -> Vec2 {
        Vec2::new(self.length * 0.75, self.width / 2.0)
    }

    /// Spot of a snooker colour. Reds have no spot.
    pub fn spot(&self, color: SnookerColor) -> Option<Vec2> {
        let mid_y = self.width / 2.0;
        let baulk = self.baulk_x();
        let pos = match color {
            SnookerColor::Red => return None,
            // Yellow on the right of the D as seen from the baulk end.
            SnookerColor::Yellow => Vec2::new(baulk, mid_y + self.d_radius()),
            SnookerColor::Green => Vec2::new(baulk, mid_y - self.d_radius()),
            SnookerColor::Brown => Vec2::new(baulk, mid_y),
            SnookerColor::Blue => Vec2::new(self.length / 2.0, mid_y),
            SnookerColor::Pink => Vec2::new(self.length * 0.75, mid_y),
            SnookerColor::Black => Vec2::new(self.length - SNOOKER_BLACK_FROM_TOP, mid_y),
        };
        Some(pos)
    }

    pub fn in_zone(&self, zone: PlacementZone, pos: Vec2) -> bool {
        if !self.contains_ball(pos) {
            return false;
        }
        match zone {
            PlacementZone::Anywhere => true,
            PlacementZone::Kitchen => pos.x <= self.head_string_x(),
            PlacementZone::Baulk => pos.x <= self.baulk_x(),
            PlacementZone::D => {
                let centre = Vec2::new(self.baulk_x(), self.width / 2.0);
                pos.x <= centre.x && pos.distance(centre) <= self.d_radius()
            }
        }
    }

    /// A sensible default cue-ball position inside `zone`.
    pub fn default_cue_position(&self, zone: PlacementZone) -> Vec2 {
        let mid_y = self.width / 2.0;
        match zone {
            PlacementZone::Anywhere | PlacementZone::Kitchen => self.head_spot(),
            PlacementZone::Baulk => Vec2::new(self.baulk_x() * 0.5, mid_y),
            PlacementZone::D => Vec2::new(self.baulk_x() - 0.5 * self.d_radius(), mid_y + 0.5 * self.d_radius()),
        }
    }

    /// Whether a ball of this table's radius fits at `pos` without touching
    /// any other ball still on the table. `ignore` is skipped.
    pub fn is_free(&self, pos: Vec2, balls: &[Ball], ignore: Option<u8>) -> bool {
        let min_dist = 2.0 * self.ball_radius;
        self.contains_ball(pos)
            && balls.iter().all(|b| {
                Some(b.number) == ignore || b.is_pocketed() || b.pos.distance(pos) >= min_dist - 1e-6
            })
    }

    /// Nearest free point on the long axis through `preferred`, searching
    /// toward the foot cushion first, then toward the head cushion.
    pub fn respot_point(&self, preferred: Vec2, balls: &[Ball], ignore: Option<u8>) -> Option<Vec2> {
        self.search_axis(preferred, 1.0, balls, ignore)
            .or_else(|| self.search_axis(preferred, -1.0, balls, ignore))
    }

    /// Walk along the long axis from `start` in `direction` (+1 foot, -1 head)
    /// until a free point is found or the cushion is reached.
    pub fn search_axis(&self, start: Vec2, direction: f32, balls: &[Ball], ignore: Option<u8>) -> Option<Vec2> {
        let step = self.ball_radius * RESPOT_STEP_FRACTION;
        let mut pos = start;
        while self.contains_ball(pos) {
            if self.is_free(pos, balls, ignore) {
                return Some(pos);
            }
            pos.x += step * direction;
        }
        None
    }

    fn triangle(&self, apex: Vec2, slots: &[(u8, usize, f32)], balls: &mut [Ball]) {
        let gap = self.ball_radius * 2.0 + RACK_GAP;
        let row_offset = gap * 0.866;
        for &(number, row, v_offset) in slots {
            let pos = Vec2::new(apex.x + row as f32 * row_offset, apex.y + v_offset * gap);
            if let Some(ball) = balls.iter_mut().find(|b| b.number == number) {
                ball.place(pos);
            }
        }
    }

    /// Standard 8-ball triangle on the foot spot: 8 in the centre, a solid and
    /// a stripe on the back corners.
    pub fn rack_eight_ball(&self, balls: &mut [Ball]) {
        // (ball_number, row, vertical_offset)
        const SLOTS: [(u8, usize, f32); 15] = [
            (1, 0, 0.0),
            (9, 1, -0.5), (2, 1, 0.5),
            (3, 2, -1.0), (8, 2, 0.0), (10, 2, 1.0),
            (11, 3, -1.5), (4, 3, -0.5), (5, 3, 0.5), (12, 3, 1.5),
            (6, 4, -2.0), (13, 4, -1.0), (14, 4, 0.0), (7, 4, 1.0), (15, 4, 2.0),
        ];
        self.triangle(self.foot_spot(), &SLOTS, balls);
    }

    /// UK triangle: same shape, black in the centre, colours alternating.
    pub fn rack_uk(&self, balls: &mut [Ball]) {
        const SLOTS: [(u8, usize, f32); 15] = [
            (1, 0, 0.0),
            (9, 1, -0.5), (2, 1, 0.5),
            (10, 2, -1.0), (8, 2, 0.0), (3, 2, 1.0),
            (4, 3, -1.5), (11, 3, -0.5), (12, 3, 0.5), (5, 3, 1.5),
            (13, 4, -2.0), (6, 4, -1.0), (14, 4, 0.0), (15, 4, 1.0), (7, 4, 2.0),
        ];
        self.triangle(self.foot_spot(), &SLOTS, balls);
    }

    /// 9-ball diamond: 1 at the apex on the foot spot, 9 in the centre.
    pub fn rack_nine_ball(&self, balls: &mut [Ball]) {
        const SLOTS: [(u8, usize, f32); 9] = [
            (1, 0, 0.0),
            (2, 1, -0.5), (3, 1, 0.5),
            (4, 2, -1.0), (9, 2, 0.0), (5, 2, 1.0),
            (6, 3, -0.5), (7, 3, 0.5),
            (8, 4, 0.0),
        ];
        self.triangle(self.foot_spot(), &SLOTS, balls);
    }

    /// Reds in a triangle just behind the pink, colours on their spots.
    pub fn rack_snooker(&self, balls: &mut [Ball]) {
        let Some(pink) = self.spot(SnookerColor::Pink) else {
            return;
        };
        let apex = pink + Vec2::new(2.0 * self.ball_radius + RACK_GAP * 4.0, 0.0);
        let mut slots = Vec::with_capacity(15);
        let mut number = 1u8;
        for row in 0..5usize {
            for k in 0..=row {
                slots.push((number, row, k as f32 - row as f32 / 2.0));
                number += 1;
            }
        }
        self.triangle(apex, &slots, balls);
        for ball in balls.iter_mut() {
            if let Some(spot) = ball.snooker_color().and_then(|c| self.spot(c)) {
                ball.place(spot);
            }
        }
    }
}

fn build_pockets(dims: &TableDims) -> Vec<Pocket> {
    let (l, w, r) = (dims.length, dims.width, dims.ball_radius);
    let rc = dims.corner_pocket_radius;
    let rs = dims.side_pocket_radius;
    // Corner centres sit just outside the nose corner so a ball running along
    // a cushion into the corner is still captured.
    let c = (0.5 * (rc - 1.25 * r)).max(0.0);
    let s = 0.4 * rs;
    let corner = |pos| Pocket { pos, radius: rc, kind: PocketKind::Corner };
    let side = |pos| Pocket { pos, radius: rs, kind: PocketKind::Side };
    vec![
        corner(Vec2::new(-c, -c)),
        side(Vec2::new(l / 2.0, -s)),
        corner(Vec2::new(l + c, -c)),
        corner(Vec2::new(-c, w + c)),
        side(Vec2::new(l / 2.0, w + s)),
        corner(Vec2::new(l + c, w + c)),
    ]
}

/// Nose from `a` to `b` with a jaw curving outward (along `normal`) at each end.
fn cushion_polyline(a: Vec2, b: Vec2, normal: Vec2, depth: f32) -> Vec<Vec2> {
    let along = (b - a).normalize_or_zero();
    let start = a - along * depth * 0.4 + normal * depth;
    let start_ctrl = a + normal * depth * 0.2;
    let end = b + along * depth * 0.4 + normal * depth;
    let end_ctrl = b + normal * depth * 0.2;

    let mut points = sample_quadratic(start, start_ctrl, a, JAW_SEGMENTS);
    let mut tail = sample_quadratic(b, end_ctrl, end, JAW_SEGMENTS);
    points.append(&mut tail);
    points
}

fn build_rails(dims: &TableDims) -> Vec<Rail> {
    let (l, w, r) = (dims.length, dims.width, dims.ball_radius);
    // Cushions stop short of every pocket mouth by pocket radius + ball radius.
    let cg = dims.corner_pocket_radius + r;
    let sg = dims.side_pocket_radius + r;
    let depth = 1.5 * r;
    let up = Vec2::new(0.0, -1.0);
    let down = Vec2::new(0.0, 1.0);
    let left = Vec2::new(-1.0, 0.0);
    let right = Vec2::new(1.0, 0.0);
    let rail = |cushion, a, b, n| Rail { cushion, points: cushion_polyline(a, b, n, depth) };
    vec![
        rail(Cushion::Head, Vec2::new(0.0, cg), Vec2::new(0.0, w - cg), left),
        rail(Cushion::Foot, Vec2::new(l, cg), Vec2::new(l, w - cg), right),
        rail(Cushion::LeftHead, Vec2::new(cg, 0.0), Vec2::new(l / 2.0 - sg, 0.0), up),
        rail(Cushion::LeftFoot, Vec2::new(l / 2.0 + sg, 0.0), Vec2::new(l - cg, 0.0), up),
        rail(Cushion::RightHead, Vec2::new(cg, w), Vec2::new(l / 2.0 - sg, w), down),
        rail(Cushion::RightFoot, Vec2::new(l / 2.0 + sg, w), Vec2::new(l - cg, w), down),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ball::{american_set, nine_ball_set, snooker_set};
    use crate::core::math::segment_point_distance;

    #[test]
    fn rails_never_reach_into_pocket_mouths() {
        for style in [TableStyle::AmericanNineFoot, TableStyle::EnglishSevenFoot, TableStyle::SnookerTwelveFoot] {
            let table = Table::new(style);
            for rail in &table.rails {
                for seg in rail.points.windows(2) {
                    for pocket in &table.pockets {
                        let d = segment_point_distance(seg[0], seg[1], pocket.pos);
                        assert!(d > pocket.capture_radius(table.ball_radius, 0.25), "{:?} {:?}", style, rail.cushion);
                    }
                }
            }
        }
    }

    #[test]
    fn ball_along_cushion_reaches_corner_capture() {
        let table = Table::new(TableStyle::SnookerTwelveFoot);
        let pocket = table.pockets[0];
        let capture = pocket.capture_radius(table.ball_radius, 0.25);
        // Ball tight on the left long cushion heading into the head corner.
        let closest = Vec2::new(pocket.pos.x, table.ball_radius);
        assert!(closest.distance(pocket.pos) < capture);
    }

    #[test]
    fn eight_ball_rack_layout() {
        let table = Table::new(TableStyle::AmericanNineFoot);
        let mut balls = american_set(table.ball_radius);
        table.rack_eight_ball(&mut balls);
        assert_eq!(balls[1].pos, table.foot_spot());
        let row_offset = (2.0 * table.ball_radius + RACK_GAP) * 0.866;
        assert!((balls[8].pos - (table.foot_spot() + Vec2::new(2.0 * row_offset, 0.0))).length() < 1e-5);
        // Back corners hold one of each group.
        assert!(balls[6].group() != balls[15].group());
        for a in 1..16 {
            for b in (a + 1)..16 {
                assert!(balls[a].pos.distance(balls[b].pos) >= 2.0 * table.ball_radius);
            }
        }
    }

    #[test]
    fn nine_ball_diamond_has_nine_in_centre() {
        let table = Table::new(TableStyle::AmericanNineFoot);
        let mut balls = nine_ball_set(table.ball_radius);
        table.rack_nine_ball(&mut balls);
        assert_eq!(balls[1].pos, table.foot_spot());
        assert!((balls[9].pos.y - table.width / 2.0).abs() < 1e-6);
        assert!(balls[9].pos.x > balls[1].pos.x);
    }

    #[test]
    fn snooker_rack_uses_spots() {
        let table = Table::new(TableStyle::SnookerTwelveFoot);
        let mut balls = snooker_set(table.ball_radius);
        table.rack_snooker(&mut balls);
        let black = balls.iter().find(|b| b.snooker_color() == Some(SnookerColor::Black)).unwrap();
        assert_eq!(Some(black.pos), table.spot(SnookerColor::Black));
        let pink = table.spot(SnookerColor::Pink).unwrap();
        assert!(balls.iter().filter(|b| b.is_red()).all(|b| b.pos.x > pink.x));
        assert!(balls.iter().all(|b| b.number == 0 || table.contains_ball(b.pos)));
    }

    #[test]
    fn zones() {
        let table = Table::new(TableStyle::SnookerTwelveFoot);
        let brown = table.spot(SnookerColor::Brown).unwrap();
        assert!(table.in_zone(PlacementZone::D, brown - Vec2::new(0.1, 0.0)));
        assert!(!table.in_zone(PlacementZone::D, brown + Vec2::new(0.1, 0.0)));
        assert!(!table.in_zone(PlacementZone::D, Vec2::new(0.1, 0.1)));
        assert!(table.in_zone(PlacementZone::D, table.default_cue_position(PlacementZone::D)));

        let pool = Table::new(TableStyle::AmericanNineFoot);
        assert!(pool.in_zone(PlacementZone::Kitchen, Vec2::new(0.3, 0.6)));
        assert!(!pool.in_zone(PlacementZone::Kitchen, Vec2::new(1.0, 0.6)));
        assert!(!pool.in_zone(PlacementZone::Anywhere, Vec2::new(0.0, 0.6)));
    }

    #[test]
    fn respot_walks_toward_foot_then_head() {
        let table = Table::new(TableStyle::AmericanNineFoot);
        let mut balls = american_set(table.ball_radius);
        for b in balls.iter_mut() {
            b.pocket();
        }
        balls[3].place(table.foot_spot());
        let spot = table.respot_point(table.foot_spot(), &balls, Some(9)).unwrap();
        assert!(spot.x > table.foot_spot().x);
        assert!(spot.distance(balls[3].pos) >= 2.0 * table.ball_radius - 1e-5);

        // Block the whole foot side of the axis.
        let mut x = table.foot_spot().x;
        let mut n = 1u8;
        while x < table.length && (n as usize) < balls.len() {
            balls[n as usize].place(Vec2::new(x, table.width / 2.0));
            x += 2.0 * table.ball_radius;
            n += 1;
        }
        let spot = table.respot_point(table.foot_spot(), &balls, None).unwrap();
        assert!(spot.x < table.foot_spot().x);
    }
}
