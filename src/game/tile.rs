use crate::game::*;
use crate::model::{self, TerrainData, TerrainKind};

impl Default for Tile {
    fn default() -> Tile {
        Tile {
            terrain: TerrainKind::Grass,
            owner: None,
            unit: None,
            fog: true,
            explored: false,
            x: 0,
            y: 0
        }
    }
}

impl Tile {
    pub fn new(x: i32, y: i32, terrain: TerrainKind) -> Tile {
        Tile { terrain, x, y, ..Tile::default() }
    }
    pub fn position(&self) -> Position {
        Position(self.x, self.y)
    }
    pub fn terrain_data(&self) -> TerrainData<'static> {
        model::terrain(self.terrain)
    }
    pub fn move_cost(&self) -> Option<u32> {
        self.terrain.move_cost()
    }
    pub fn is_passable(&self) -> bool {
        self.terrain.is_passable()
    }
    /// Passable and not occupied by any unit.
    pub fn is_free(&self) -> bool {
        self.unit.is_none() && self.is_passable()
    }
    /// Free and enterable with the given movement budget.
    pub fn is_reachable_with(&self, budget: u32) -> bool {
        self.unit.is_none() && self.move_cost().is_some_and(|cost| cost <= budget)
    }
}
