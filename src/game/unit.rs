use crate::game::*;
use crate::model::{self, UnitType, UnitTypeData};

impl Unit {
    pub fn new(unit_type: UnitType, owner: Side, position: Position) -> Unit {
        let moves = model::unit_type(unit_type).moves;
        Unit {
            unit_type,
            owner,
            position,
            moves_left: moves,
            max_moves: moves
        }
    }
    pub fn unit_type_data(&self) -> UnitTypeData<'static> {
        model::unit_type(self.unit_type)
    }
    pub fn reset_turn(&mut self) {
        self.moves_left = self.max_moves;
    }
    pub fn has_moved(&self) -> bool {
        self.moves_left < self.max_moves
    }
}
