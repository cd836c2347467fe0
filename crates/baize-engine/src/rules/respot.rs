//! Putting pocketed balls back on the table.

use glam::Vec2;

use crate::components::ball::{Ball, SnookerColor};
use crate::components::table::Table;
use crate::error::RulesError;

fn place(balls: &mut [Ball], number: u8, pos: Vec2) -> Result<Vec2, RulesError> {
    let ball = balls
        .iter_mut()
        .find(|b| b.number == number)
        .ok_or(RulesError::UnknownBall(number))?;
    ball.place(pos);
    Ok(pos)
}

/// Pool respot: `preferred` if free, else the nearest free point on the
/// long axis (foot side first).
pub fn respot_pool_ball(table: &Table, balls: &mut [Ball], number: u8, preferred: Vec2) -> Result<Vec2, RulesError> {
    let pos = if table.is_free(preferred, balls, Some(number)) {
        preferred
    } else {
        table
            .respot_point(preferred, balls, Some(number))
            .ok_or(RulesError::RespotExhausted(number))?
    };
    place(balls, number, pos)
}

/// Snooker colour respot. Own spot, then the colour spots from black down to
/// yellow, then the centreline through the own spot toward the top cushion,
/// then toward the baulk cushion.
pub fn respot_color(table: &Table, balls: &mut [Ball], number: u8) -> Result<Vec2, RulesError> {
    let color = balls
        .iter()
        .find(|b| b.number == number)
        .and_then(Ball::snooker_color)
        .ok_or(RulesError::UnknownBall(number))?;
    let own = table.spot(color).ok_or(RulesError::RespotExhausted(number))?;

    let candidates = std::iter::once(own).chain(
        SnookerColor::COLORS
            .iter()
            .rev()
            .filter_map(|&c| table.spot(c)),
    );
    for spot in candidates {
        if table.is_free(spot, balls, Some(number)) {
            return place(balls, number, spot);
        }
    }

    let start = Vec2::new(own.x, table.width / 2.0);
    let pos = table
        .search_axis(start, 1.0, balls, Some(number))
        .or_else(|| table.search_axis(start, -1.0, balls, Some(number)))
        .ok_or(RulesError::RespotExhausted(number))?;
    place(balls, number, pos)
}
