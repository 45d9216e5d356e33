use crate::config::GameConfig;
use crate::game::*;
use crate::random::RandomSource;

/// Samples a player spawn in the left half and an enemy spawn in the right
/// half of `grid`.
///
/// The left half is `ceil(W/2)` columns wide and the right half starts at
/// `floor(W/2)`, so on odd widths the middle column belongs to both. Each
/// spawn gets `max_attempts` draws. The enemy spawn must differ from the
/// player spawn and must have at least one passable neighbour, an isolated
/// cell being unreachable in practice.
///
/// Reachability between the two is not checked here, see
/// [`Grid::path_exists`].
pub fn find_spawns<R: RandomSource + ?Sized>(grid: &Grid, rng: &mut R, max_attempts: u32) -> Option<Spawns> {
    let width = grid.width() as usize;
    let height = grid.height() as usize;
    let left_width = width.div_ceil(2);
    let right_start = width / 2;
    let right_width = width - right_start;

    let player = (0..max_attempts)
        .map(|_| {
            let x = rng.below(left_width) as i32;
            let y = rng.below(height) as i32;
            Position(x, y)
        })
        .find(|position| grid.get(position).is_some_and(Tile::is_passable))?;

    let enemy = (0..max_attempts)
        .map(|_| {
            let x = (right_start + rng.below(right_width)) as i32;
            let y = rng.below(height) as i32;
            Position(x, y)
        })
        .find(|position| {
            *position != player
                && grid.get(position).is_some_and(Tile::is_passable)
                && grid.has_passable_neighbor(position)
        })?;

    Some(Spawns { player, enemy })
}

impl Game {
    /// Generates a board whose spawns are connected and deploys both
    /// warriors on it.
    ///
    /// Terrain and spawns are drawn together as one trial; a failed trial
    /// regenerates the whole map. Running out of trials means the terrain
    /// distribution cannot produce a playable board for this configuration.
    pub fn generate<R: RandomSource + ?Sized>(config: GameConfig, rng: &mut R, emit: &mut dyn FnMut(Event)) -> Result<Game, SetupError> {
        config.validate()?;

        for attempt in 1..=config.max_board_attempts {
            let grid = Grid::generate(config.width, config.height, rng);
            let Some(spawns) = find_spawns(&grid, rng, config.max_spawn_attempts) else {
                tracing::debug!(attempt, "no valid spawn positions");
                continue;
            };
            if !grid.path_exists(&spawns.player, &spawns.enemy) {
                tracing::debug!(attempt, ?spawns, "spawns are not connected");
                continue;
            }

            tracing::info!(attempt, ?spawns, conquerable = grid.total_conquerable(), "generated board");
            let mut game = Game::new(grid, config);
            action::deploy(&mut game, spawns, emit)
                .map_err(|_| SetupError::NoPlayableBoard { attempts: attempt })?;
            return Ok(game);
        }

        tracing::warn!(attempts = config.max_board_attempts, "unable to generate a playable board");
        Err(SetupError::NoPlayableBoard { attempts: config.max_board_attempts })
    }
}
