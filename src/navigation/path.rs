//! Time-boxed, self-simplifying waypoint sequence

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::core::types::GridPos;

const COLLINEAR_EPSILON: f32 = 0.001;

/// Radii used while consuming a path
#[derive(Debug, Clone, Copy)]
pub struct FollowParams {
    /// Next waypoint is popped before moving when the player is this close
    pub pop_radius: f32,
    /// Waypoint is popped after moving when the player ends up this close
    pub arrival_radius: f32,
}

/// What one `Path::follow` call did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowStep {
    /// TTL elapsed; all waypoints were dropped and the caller must replan
    Expired,
    /// Nothing left to follow
    Finished,
    /// One movement command was issued toward this waypoint
    Moved(GridPos),
}

#[derive(Debug, Clone)]
pub struct Path {
    waypoints: VecDeque<GridPos>,
    created_at: Instant,
    ttl: Duration,
}

impl Path {
    /// Simplify a raw search result and start its TTL
    pub fn new(raw: Vec<GridPos>, node_size: f32, now: Instant, ttl: Duration) -> Self {
        Self {
            waypoints: simplify(&raw, node_size).into(),
            created_at: now,
            ttl,
        }
    }

    /// Use waypoints as given, without simplification
    pub fn from_waypoints(waypoints: Vec<GridPos>, now: Instant, ttl: Duration) -> Self {
        Self {
            waypoints: waypoints.into(),
            created_at: now,
            ttl,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn next(&self) -> Option<GridPos> {
        self.waypoints.front().copied()
    }

    pub fn destination(&self) -> Option<GridPos> {
        self.waypoints.back().copied()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> impl Iterator<Item = &GridPos> {
        self.waypoints.iter()
    }

    pub fn expires_at(&self) -> Instant {
        self.created_at + self.ttl
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at()
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    /// Consume the path by one step.
    ///
    /// `mover` issues a single movement command toward its argument and
    /// returns the player's position afterwards when it can be observed.
    pub fn follow<F>(
        &mut self,
        player: GridPos,
        now: Instant,
        params: FollowParams,
        mut mover: F,
    ) -> FollowStep
    where
        F: FnMut(GridPos) -> Option<GridPos>,
    {
        if self.is_expired(now) {
            self.waypoints.clear();
            return FollowStep::Expired;
        }

        if self.waypoints.len() > 1 {
            if let Some(next) = self.next() {
                if player.distance(next) < params.pop_radius {
                    self.waypoints.pop_front();
                }
            }
        }

        let Some(target) = self.next() else {
            return FollowStep::Finished;
        };

        let after = mover(target).unwrap_or(player);
        if after.distance(target) < params.arrival_radius {
            self.waypoints.pop_front();
        }
        FollowStep::Moved(target)
    }
}

/// Collinearity compaction followed by distance thinning, repeated until
/// neither stage changes the list.
pub fn simplify(points: &[GridPos], node_size: f32) -> Vec<GridPos> {
    let mut current = points.to_vec();
    loop {
        let mut next = current.clone();
        compact_collinear(&mut next);
        let next = thin_by_distance(&next, node_size);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Remove interior points whose incoming and outgoing directions are parallel
fn compact_collinear(points: &mut Vec<GridPos>) {
    if points.len() < 3 {
        return;
    }
    let mut i = points.len() - 2;
    loop {
        if i + 2 < points.len() {
            let incoming = (points[i + 1] - points[i]).normalize_or_zero();
            let outgoing = (points[i + 2] - points[i + 1]).normalize_or_zero();
            if (incoming.dot(outgoing) - 1.0).abs() < COLLINEAR_EPSILON {
                points.remove(i + 1);
            }
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }
}

/// Keep the first point, then only points farther than `node_size` from the
/// last kept one. The final point is always kept.
fn thin_by_distance(points: &[GridPos], node_size: f32) -> Vec<GridPos> {
    let Some((&last, rest)) = points.split_last() else {
        return Vec::new();
    };
    let mut kept: Vec<GridPos> = Vec::with_capacity(points.len());
    for &p in rest {
        match kept.last() {
            Some(prev) if prev.distance(p) <= node_size => {}
            _ => kept.push(p),
        }
    }
    kept.push(last);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn params() -> FollowParams {
        FollowParams {
            pop_radius: 2.0,
            arrival_radius: 20.0,
        }
    }

    #[test]
    fn test_straight_run_collapses_to_endpoints() {
        let raw: Vec<_> = (0..=10).map(|x| Vec2::new(x as f32, 0.0)).collect();
        let simplified = simplify(&raw, 1.0);
        assert_eq!(simplified, vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)]);
    }

    #[test]
    fn test_turn_points_survive_compaction() {
        let mut raw: Vec<_> = (0..=30).map(|x| Vec2::new(x as f32, 0.0)).collect();
        raw.extend((1..=30).map(|y| Vec2::new(30.0, y as f32)));
        let simplified = simplify(&raw, 20.0);
        assert_eq!(
            simplified,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(30.0, 0.0),
                Vec2::new(30.0, 30.0)
            ]
        );
    }

    #[test]
    fn test_thinning_always_keeps_final_point() {
        let raw = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(5.0, 8.0),
        ];
        let simplified = simplify(&raw, 20.0);
        assert_eq!(simplified, vec![Vec2::new(0.0, 0.0), Vec2::new(5.0, 8.0)]);
    }

    #[test]
    fn test_simplify_is_idempotent_on_zigzag() {
        let raw: Vec<_> = (0..40)
            .map(|i| Vec2::new(i as f32, if i % 2 == 0 { 0.0 } else { 1.0 }))
            .collect();
        let once = simplify(&raw, 3.0);
        assert_eq!(simplify(&once, 3.0), once);
    }

    #[test]
    fn test_follow_pops_near_waypoint_then_moves() {
        let now = Instant::now();
        let mut path = Path::from_waypoints(
            vec![Vec2::new(1.0, 0.0), Vec2::new(50.0, 0.0)],
            now,
            Duration::from_secs(5),
        );
        let mut issued = Vec::new();
        let step = path.follow(Vec2::ZERO, now, params(), |t| {
            issued.push(t);
            None
        });
        assert_eq!(step, FollowStep::Moved(Vec2::new(50.0, 0.0)));
        assert_eq!(issued, vec![Vec2::new(50.0, 0.0)]);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_follow_never_pops_last_waypoint_before_moving() {
        let now = Instant::now();
        let mut path =
            Path::from_waypoints(vec![Vec2::new(1.0, 0.0)], now, Duration::from_secs(5));
        let step = path.follow(Vec2::ZERO, now, params(), |_| None);
        // moved, then arrival radius consumed it
        assert_eq!(step, FollowStep::Moved(Vec2::new(1.0, 0.0)));
        assert!(path.is_finished());
        assert_eq!(path.follow(Vec2::ZERO, now, params(), |_| None), FollowStep::Finished);
    }

    #[test]
    fn test_follow_uses_post_move_position() {
        let now = Instant::now();
        let mut path = Path::from_waypoints(
            vec![Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0)],
            now,
            Duration::from_secs(5),
        );
        path.follow(Vec2::ZERO, now, params(), |t| Some(t - Vec2::new(5.0, 0.0)));
        assert_eq!(path.next(), Some(Vec2::new(200.0, 0.0)));
    }

    #[test]
    fn test_expired_path_is_cleared() {
        let now = Instant::now();
        let mut path = Path::from_waypoints(
            vec![Vec2::new(100.0, 0.0)],
            now,
            Duration::from_secs(5),
        );
        let later = now + Duration::from_millis(5001);
        let mut moved = false;
        assert_eq!(
            path.follow(Vec2::ZERO, later, params(), |_| {
                moved = true;
                None
            }),
            FollowStep::Expired
        );
        assert!(!moved);
        assert!(path.is_finished());
    }
}
