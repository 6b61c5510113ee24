use bevy::prelude::*;
use game_helpers::storage;

use crate::levels::LevelCatalog;
use crate::simulation::LevelCompleteEvent;

pub struct ProgressionPlugin;

pub const POINTS_PER_LEVEL: u32 = 100;

const HIGH_SCORE_KEY: &str = "gravity_box_high_score";

/// Points paid out for clearing a level.
pub const fn points_for(level: u32) -> u32 {
    POINTS_PER_LEVEL * level
}

/// The level after `current`, or `None` once the catalog is exhausted and the
/// game should return to the menu.
pub fn next_level(current: u32) -> Option<u32> {
    let next = current + 1;
    (next <= LevelCatalog::max_level()).then_some(next)
}

/// Best score across sessions. Loaded once at startup; overwritten in the
/// store whenever a win beats it.
#[derive(Resource, Debug, Default)]
pub struct HighScore(pub u32);

impl HighScore {
    /// Returns true when `score` set a new record.
    pub fn record(&mut self, score: u32) -> bool {
        if score > self.0 {
            self.0 = score;
            true
        } else {
            false
        }
    }
}

impl Plugin for ProgressionPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(load_high_score())
            .add_systems(Update, record_high_score);
    }
}

fn load_high_score() -> HighScore {
    match storage::load_u32(HIGH_SCORE_KEY) {
        Ok(Some(best)) => HighScore(best),
        Ok(None) => HighScore::default(),
        Err(err) => {
            // Degraded but playable: the best score just won't survive the
            // session.
            warn!("high score store unavailable: {err}");
            HighScore::default()
        }
    }
}

fn record_high_score(mut events: EventReader<LevelCompleteEvent>, mut best: ResMut<HighScore>) {
    for event in events.read() {
        if best.record(event.score) {
            info!("new high score: {}", best.0);
            if let Err(err) = storage::store_u32(HIGH_SCORE_KEY, best.0) {
                warn!("failed to persist high score: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearing_the_first_three_levels_pays_600() {
        let total: u32 = (1..=3).map(points_for).sum();
        assert_eq!(total, 600, "100 + 200 + 300");
    }

    #[test]
    fn next_level_advances_within_the_catalog() {
        assert_eq!(next_level(1), Some(2), "level 1 advances to 2");
    }

    #[test]
    fn next_level_signals_completion_at_the_end() {
        assert_eq!(
            next_level(LevelCatalog::max_level()),
            None,
            "the last level has no successor"
        );
    }

    #[test]
    fn high_score_only_moves_upward() {
        let mut best = HighScore(500);
        assert!(!best.record(300), "lower score is not a record");
        assert_eq!(best.0, 500, "best must be unchanged");
        assert!(best.record(700), "higher score is a record");
        assert_eq!(best.0, 700, "best should be overwritten");
    }
}
