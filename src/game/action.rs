use crate::game::*;
use crate::model::{self, UnitType};
use crate::random::RandomSource;

/// Rejected player actions are reported on the notification channel, the
/// AI's are skipped silently. Either way nothing has been mutated yet.
fn reject<T>(side: Side, error: ActionError, emit: &mut dyn FnMut(Event)) -> ActionResult<T> {
    if side == Side::Player {
        emit(Event::Notification(error.to_string()));
    }
    Err(error)
}

fn finish(game: &mut Game, outcome: Outcome, emit: &mut dyn FnMut(Event)) -> Outcome {
    if game.set_state(GameState::GameOver(outcome)).is_ok() {
        tracing::info!(winner = ?outcome.winner, condition = ?outcome.condition, turn = game.turn, "game over");
        emit(Event::GameOver(outcome));
    }
    outcome
}

/// Places both starting warriors and claims their tiles. The player's
/// surroundings are revealed.
pub fn deploy(game: &mut Game, spawns: Spawns, emit: &mut dyn FnMut(Event)) -> ActionResult<()> {
    let radius = game.config.reveal_radius;

    game.add_unit(UnitType::Warrior, Side::Player, spawns.player)?;
    set_owner(game, spawns.player, Side::Player, emit)?;
    reveal_map(game, spawns.player, radius, emit);

    game.add_unit(UnitType::Warrior, Side::Enemy, spawns.enemy)?;
    set_owner(game, spawns.enemy, Side::Enemy, emit)?;
    Ok(())
}

/// Hands `position` to `owner`. Claiming a tile the owner already holds
/// changes nothing. Every ownership change re-evaluates the domination
/// condition, so a claim in the middle of a turn can end the game.
pub fn claim_tile(game: &mut Game, position: Position, owner: Side, emit: &mut dyn FnMut(Event)) -> ActionResult<()> {
    if game.is_over() {
        return Err(ActionError::GameOver);
    }
    set_owner(game, position, owner, emit)
}

fn set_owner(game: &mut Game, position: Position, owner: Side, emit: &mut dyn FnMut(Event)) -> ActionResult<()> {
    let tile = game.grid.get_mut(&position)?;
    let previous = tile.owner;
    if previous == Some(owner) {
        return Ok(());
    }
    tile.owner = Some(owner);

    if let Some(previous) = previous {
        game.players.get_mut(previous).territory -= 1;
    }
    game.players.get_mut(owner).territory += 1;

    emit(Event::Claim { position, owner, previous });
    check_win_condition(game, emit);
    Ok(())
}

/// Ends the game when either side holds at least half of the conquerable
/// tiles. The player is checked first.
pub fn check_win_condition(game: &mut Game, emit: &mut dyn FnMut(Event)) -> Option<Outcome> {
    if game.is_over() {
        return None;
    }

    let threshold = game.win_threshold();
    let winner = if game.player(Side::Player).territory >= threshold {
        Side::Player
    } else if game.player(Side::Enemy).territory >= threshold {
        Side::Enemy
    } else {
        return None;
    };

    Some(finish(game, Outcome { winner, condition: WinCondition::Domination }, emit))
}

pub fn reveal_map(game: &mut Game, center: Position, radius: i32, emit: &mut dyn FnMut(Event)) {
    game.grid.reveal(&center, radius);
    emit(Event::Reveal(center, radius));
}

/// Moves a unit one step to an adjacent cell and claims it.
pub fn move_unit(game: &mut Game, unit_id: UnitId, target: Position, emit: &mut dyn FnMut(Event)) -> ActionResult<()> {
    let unit = game.units.get(unit_id).ok_or(ActionError::UnitNotFound)?;
    let side = unit.owner;

    if game.is_over() {
        return reject(side, ActionError::GameOver, emit);
    }
    if unit.moves_left == 0 {
        return reject(side, ActionError::NoMovesLeft, emit);
    }

    let Some(tile) = game.grid.get(&target) else {
        return reject(side, ActionError::Impassable, emit);
    };
    let Some(cost) = tile.move_cost() else {
        return reject(side, ActionError::Impassable, emit);
    };
    let occupied = tile.unit.is_some();

    if !unit.position.is_adjacent(&target) {
        return reject(side, ActionError::TooFar, emit);
    }
    if occupied {
        return reject(side, ActionError::TileOccupied, emit);
    }
    if unit.moves_left < cost {
        return reject(side, ActionError::InsufficientMovement, emit);
    }

    let from = unit.position;
    game.grid.get_mut(&from)?.unit = None;
    game.grid.get_mut(&target)?.unit = Some(unit_id);
    let unit = game.units.get_mut(unit_id)?;
    unit.position = target;
    unit.moves_left -= cost;

    emit(Event::Move(unit_id, from, target));
    set_owner(game, target, side, emit)?;

    if side == Side::Player {
        let radius = game.config.reveal_radius;
        reveal_map(game, target, radius, emit);
    }
    Ok(())
}

/// Buys a warrior next to one of `side`'s units.
///
/// Units are tried in random order and the first free passable neighbour
/// of the first unit that has one becomes the spawn point.
pub fn recruit_unit<R: RandomSource + ?Sized>(game: &mut Game, side: Side, rng: &mut R, emit: &mut dyn FnMut(Event)) -> ActionResult<UnitId> {
    if game.is_over() {
        return reject(side, ActionError::GameOver, emit);
    }

    let unit_data = model::unit_type(UnitType::Warrior);
    if game.player(side).gold < unit_data.price {
        return reject(side, ActionError::InsufficientGold(unit_data.price), emit);
    }

    let mut candidates = game.units.ids_owned_by(side);
    rng.shuffle(&mut candidates);
    let Some(position) = candidates.into_iter()
        .find_map(|unit_id| game.unit_spawn_options(unit_id).first().copied()) else {
        return reject(side, ActionError::NoSpawnLocation, emit);
    };

    let unit_id = game.add_unit(UnitType::Warrior, side, position)?;
    game.players.get_mut(side).gold -= unit_data.price;

    emit(Event::Recruit(unit_id, side, position));
    set_owner(game, position, side, emit)?;

    if side == Side::Player {
        let radius = game.config.reveal_radius;
        reveal_map(game, position, radius, emit);
        emit(Event::Notification(format!("Recruited {}!", unit_data.name)));
    }
    Ok(unit_id)
}

/// Credits `side` with the per-turn income and returns the amount.
pub fn credit_income(game: &mut Game, side: Side, emit: &mut dyn FnMut(Event)) -> u32 {
    let income = game.config.income(game.player(side).territory);
    game.players.get_mut(side).gold += income;
    emit(Event::Income(side, income));
    income
}

/// Resolves the end of a turn: movement reset, player income, the enemy's
/// turn, then the encirclement check.
pub fn end_turn<R: RandomSource + ?Sized>(game: &mut Game, rng: &mut R, emit: &mut dyn FnMut(Event)) -> ActionResult<()> {
    if game.is_over() {
        return Err(ActionError::GameOver);
    }
    game.set_state(GameState::TurnResolving)?;

    game.turn += 1;
    emit(Event::StartTurn(game.turn));
    game.units.iter_mut().for_each(Unit::reset_turn);

    let income = credit_income(game, Side::Player, emit);
    bot::enemy_turn(game, rng, emit);
    emit(Event::Notification(format!("Turn {} Started (+{}💰)", game.turn, income)));

    check_encirclement(game, emit);

    if !game.is_over() {
        game.set_state(GameState::AwaitingInput)?;
    }
    tracing::debug!(turn = game.turn, state = ?game.state, "turn resolved");
    Ok(())
}

/// Ends the game in the player's favour when the enemy can neither move
/// nor recruit.
///
/// Runs after movement has been reset, so moves are measured against each
/// unit's maximum. Only the enemy is ever evaluated: a trapped player does
/// not lose.
pub fn check_encirclement(game: &mut Game, emit: &mut dyn FnMut(Event)) -> Option<Outcome> {
    if game.is_over() {
        return None;
    }

    let side = Side::Enemy;
    let units: Vec<(UnitId, u32)> = game.units.owned_by(side)
        .map(|(unit_id, unit)| (unit_id, unit.max_moves))
        .collect();

    let can_move = units.iter()
        .any(|&(unit_id, max_moves)| !game.unit_move_options(unit_id, max_moves).is_empty());
    let can_spawn = game.player(side).gold >= model::unit_type(UnitType::Warrior).price
        && units.iter().any(|&(unit_id, _)| !game.unit_spawn_options(unit_id).is_empty());

    if can_move || can_spawn {
        return None;
    }
    Some(finish(game, Outcome { winner: Side::Player, condition: WinCondition::Encirclement }, emit))
}
