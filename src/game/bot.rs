use crate::game::*;
use crate::model::{self, UnitType};
use crate::random::RandomSource;

/// Plays the enemy side for one turn: income, at most one recruit, then one
/// random step for every enemy unit that has somewhere to go.
///
/// Units recruited this turn move too. The loop stops as soon as a claim
/// ends the game.
pub fn enemy_turn<R: RandomSource + ?Sized>(game: &mut Game, rng: &mut R, emit: &mut dyn FnMut(Event)) {
    let side = Side::Enemy;
    action::credit_income(game, side, emit);

    if game.player(side).gold >= model::unit_type(UnitType::Warrior).price {
        if let Err(error) = action::recruit_unit(game, side, rng, emit) {
            tracing::debug!(%error, "enemy could not recruit");
        }
    }

    for unit_id in game.units.ids_owned_by(side) {
        if game.is_over() {
            break;
        }
        let Some(unit) = game.units.get_ref(&unit_id) else {
            continue;
        };
        let options = game.unit_move_options(unit_id, unit.moves_left);
        if let Some(&target) = rng.choose(&options) {
            if let Err(error) = action::move_unit(game, unit_id, target, emit) {
                tracing::warn!(unit_id, ?target, %error, "enemy move rejected");
            }
        }
    }
}
