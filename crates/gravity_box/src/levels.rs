use bevy::prelude::*;

/// One fixed deflector that ships with a level.
#[derive(Clone, Copy, Debug)]
pub struct ObstacleSpec {
    pub position: Vec2,
    pub size: Vec2,
    pub angle_degrees: f32,
}

/// Immutable configuration for one level: where the basket sits, which
/// obstacles spawn with it, and how many planks/balls the player gets.
#[derive(Clone, Copy, Debug)]
pub struct LevelConfig {
    pub basket: Vec2,
    pub obstacles: &'static [ObstacleSpec],
    pub plank_quota: u32,
    pub ball_quota: u32,
}

const LEVEL_ONE: LevelConfig = LevelConfig {
    basket: Vec2::new(0.0, -295.0),
    obstacles: &[],
    plank_quota: 1,
    ball_quota: 3,
};

const LEVELS: [LevelConfig; 5] = [
    LEVEL_ONE,
    LevelConfig {
        basket: Vec2::new(68.0, -275.0),
        obstacles: &[ObstacleSpec {
            position: Vec2::new(-45.0, -126.0),
            size: Vec2::new(90.0, 10.0),
            angle_degrees: 15.0,
        }],
        plank_quota: 1,
        ball_quota: 3,
    },
    LevelConfig {
        basket: Vec2::new(-68.0, -275.0),
        obstacles: &[ObstacleSpec {
            position: Vec2::new(22.0, -105.0),
            size: Vec2::new(80.0, 10.0),
            angle_degrees: -20.0,
        }],
        plank_quota: 2,
        ball_quota: 3,
    },
    LevelConfig {
        basket: Vec2::new(90.0, -230.0),
        obstacles: &[
            ObstacleSpec {
                position: Vec2::new(0.0, -52.0),
                size: Vec2::new(100.0, 10.0),
                angle_degrees: 30.0,
            },
            ObstacleSpec {
                position: Vec2::new(-90.0, 0.0),
                size: Vec2::new(55.0, 10.0),
                angle_degrees: -10.0,
            },
        ],
        plank_quota: 2,
        ball_quota: 3,
    },
    LevelConfig {
        basket: Vec2::new(0.0, -230.0),
        obstacles: &[
            ObstacleSpec {
                position: Vec2::new(-45.0, -63.0),
                size: Vec2::new(70.0, 10.0),
                angle_degrees: 0.0,
            },
            ObstacleSpec {
                position: Vec2::new(45.0, 0.0),
                size: Vec2::new(70.0, 10.0),
                angle_degrees: -15.0,
            },
        ],
        plank_quota: 3,
        ball_quota: 3,
    },
];

/// Static table of level configurations, indexed 1..=N.
pub struct LevelCatalog;

impl LevelCatalog {
    pub const fn max_level() -> u32 {
        LEVELS.len() as u32
    }

    /// Looks up a level. Out-of-range numbers are clamped into range, so a
    /// valid configuration always comes back.
    pub fn get(level: u32) -> LevelConfig {
        let index = (level.clamp(1, Self::max_level()) - 1) as usize;
        LEVELS.get(index).copied().unwrap_or(LEVEL_ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_range_clamps_to_first_level() {
        let config = LevelCatalog::get(0);
        assert_eq!(
            config.basket,
            LevelCatalog::get(1).basket,
            "level 0 should resolve to level 1"
        );
    }

    #[test]
    fn above_range_clamps_to_last_level() {
        let last = LevelCatalog::get(LevelCatalog::max_level());
        let beyond = LevelCatalog::get(LevelCatalog::max_level() + 10);
        assert_eq!(
            beyond.basket, last.basket,
            "levels past the end should resolve to the last level"
        );
    }

    #[test]
    fn every_level_grants_at_least_one_plank_and_ball() {
        for level in 1..=LevelCatalog::max_level() {
            let config = LevelCatalog::get(level);
            assert!(config.plank_quota >= 1, "level {level} has no planks");
            assert!(config.ball_quota >= 1, "level {level} has no balls");
        }
    }

    #[test]
    fn difficulty_ramps_up_plank_quota() {
        assert!(
            LevelCatalog::get(LevelCatalog::max_level()).plank_quota
                > LevelCatalog::get(1).plank_quota,
            "later levels should grant more planks than level 1"
        );
    }
}
