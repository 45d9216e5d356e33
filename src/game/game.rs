use crate::game::*;
use crate::model::{self, TerrainKind};

impl Position {
    /// Chebyshev distance, the number of 8-directional steps between cells.
    pub fn distance_to(&self, &Position(x, y): &Position) -> u32 {
        let &Position(sx, sy) = self;
        (sx - x).unsigned_abs().max((sy - y).unsigned_abs())
    }
    pub fn adjacent(&self) -> impl Iterator<Item = Self> + use<> {
        let &Position(x, y) = self;
        [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1)]
            .into_iter()
            .map(move |(dx, dy)| Position(x + dx, y + dy))
    }
    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.distance_to(other) == 1
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Position(x, y)
    }
}

impl From<GameUpdateError> for ActionError {
    fn from(_: GameUpdateError) -> Self {
        ActionError::InternalError
    }
}

impl Units {
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.0.values()
    }
    pub fn iter_with_ids(&self) -> impl Iterator<Item = (&UnitId, &Unit)> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn get_ref(&self, id: &UnitId) -> Option<&Unit> {
        self.0.get(id)
    }
    pub fn get(&self, unit_id: UnitId) -> Option<Unit> {
        self.0.get(&unit_id).cloned()
    }
    pub fn get_mut(&mut self, unit_id: UnitId) -> GameUpdateResult<&mut Unit> {
        self.0.get_mut(&unit_id).ok_or(GameUpdateError::InvalidUnitId)
    }
    pub fn owned_by(&self, side: Side) -> impl Iterator<Item = (UnitId, &Unit)> {
        self.iter_with_ids()
            .filter(move |(_, unit)| unit.owner == side)
            .map(|(unit_id, unit)| (*unit_id, unit))
    }
    pub fn ids_owned_by(&self, side: Side) -> Vec<UnitId> {
        self.owned_by(side).map(|(unit_id, _)| unit_id).collect()
    }
    pub fn insert(&mut self, unit_id: UnitId, unit: Unit) {
        self.0.insert(unit_id, unit);
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.0.values_mut()
    }
}

impl Players {
    pub fn new(starting_gold: u32) -> Players {
        let player = |side| Player { side, gold: starting_gold, territory: 0 };
        Players { player: player(Side::Player), enemy: player(Side::Enemy) }
    }
    pub fn get(&self, side: Side) -> &Player {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy
        }
    }
    pub fn get_mut(&mut self, side: Side) -> &mut Player {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        [&self.player, &self.enemy].into_iter()
    }
}

impl Outcome {
    /// Whether the human player won.
    pub fn victory(&self) -> bool {
        self.winner == Side::Player
    }
    pub fn reason(&self) -> &'static str {
        match (self.winner, self.condition) {
            (Side::Player, WinCondition::Domination) => "Domination Victory! You control 50% of the map.",
            (Side::Player, WinCondition::Encirclement) => "Encirclement Victory! Enemy is trapped.",
            // Encirclement is only evaluated against the enemy, so every
            // enemy win is by domination.
            (Side::Enemy, _) => "Defeat! Enemy controls 50% of the map.",
        }
    }
}

impl Game {
    /// An empty session on `grid`. Units arrive through `action::deploy`.
    pub fn new(grid: Grid, config: GameConfig) -> Game {
        let players = Players::new(config.starting_gold);
        Game {
            state: GameState::AwaitingInput,
            grid,
            units: Units::default(),
            players,
            turn: 1,
            next_unit_id: 0,
            config
        }
    }

    // Mutators

    pub fn set_state(&mut self, state: GameState) -> GameUpdateResult<()> {
        match (&self.state, &state) {
            (GameState::AwaitingInput, GameState::TurnResolving) => Ok(()),
            (GameState::TurnResolving, GameState::AwaitingInput) => Ok(()),
            (GameState::AwaitingInput | GameState::TurnResolving, GameState::GameOver(_)) => Ok(()),
            _ => Err(GameUpdateError::InvalidStateTransition),
        }?;

        self.state = state;
        Ok(())
    }
    /// Places a fresh unit on a free passable tile without claiming it.
    pub fn add_unit(&mut self, unit_type: model::UnitType, owner: Side, position: Position) -> GameUpdateResult<UnitId> {
        let unit_id = self.next_unit_id;
        let tile = self.grid.get_mut(&position)?;
        if !tile.is_free() {
            return Err(GameUpdateError::InvalidPosition);
        }
        tile.unit = Some(unit_id);
        self.units.insert(unit_id, Unit::new(unit_type, owner, position));
        self.next_unit_id += 1;
        Ok(unit_id)
    }
    pub fn as_text(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }
    pub fn from_text(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }
    pub fn as_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(postcard::to_allocvec(self)?)
    }
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(postcard::from_bytes(bytes)?)
    }

    // Selectors

    pub fn is_over(&self) -> bool {
        matches!(self.state, GameState::GameOver(_))
    }
    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            GameState::GameOver(outcome) => Some(outcome),
            _ => None
        }
    }
    pub fn player(&self, side: Side) -> &Player {
        self.players.get(side)
    }
    /// Territory a side needs to win by domination: half the passable
    /// tiles, rounded down.
    pub fn win_threshold(&self) -> u32 {
        self.grid.total_conquerable() / 2
    }
    /// Free neighbours the unit could enter with `budget` movement points.
    pub fn unit_move_options(&self, unit_id: UnitId, budget: u32) -> Vec<Position> {
        let Some(unit) = self.units.get_ref(&unit_id) else {
            return Vec::new();
        };
        self.grid.neighbors(&unit.position)
            .filter(|tile| tile.is_reachable_with(budget))
            .map(Tile::position)
            .collect()
    }
    /// Free passable neighbours where a recruit could appear.
    pub fn unit_spawn_options(&self, unit_id: UnitId) -> Vec<Position> {
        let Some(unit) = self.units.get_ref(&unit_id) else {
            return Vec::new();
        };
        self.grid.neighbors(&unit.position)
            .filter(|tile| tile.is_free())
            .map(Tile::position)
            .collect()
    }
    pub fn unit_at(&self, position: &Position) -> Option<(UnitId, &Unit)> {
        let unit_id = self.grid.get(position)?.unit?;
        Some((unit_id, self.units.get_ref(&unit_id)?))
    }
    /// Territory counters equal owned tiles, and tile occupancy agrees with
    /// unit positions.
    pub fn is_consistent(&self) -> bool {
        let territory = self.players.iter()
            .all(|p| p.territory == self.grid.count_owned(p.side));
        let units = self.units.iter_with_ids().all(|(unit_id, unit)| {
            self.grid.get(&unit.position).and_then(|t| t.unit) == Some(*unit_id)
                && unit.moves_left <= unit.max_moves
        });
        let occupied = self.grid.iter().filter(|t| t.unit.is_some()).count();
        territory && units && occupied == self.units.len()
    }
    pub fn ascii_representation(&self) -> String {
        fn owner_char(side: Option<Side>, unit: bool) -> char {
            match (side, unit) {
                (Some(Side::Player), true) => 'P',
                (Some(Side::Enemy), true) => 'E',
                (Some(Side::Player), false) => 'p',
                (Some(Side::Enemy), false) => 'e',
                (None, _) => ' '
            }
        }

        let map = self.grid.rows()
            .map(|row| row.iter()
                .map(|tile| {
                    let unit_owner = tile.unit
                        .and_then(|u| self.units.get_ref(&u))
                        .map(|u| u.owner);
                    let mark = match unit_owner {
                        Some(side) => owner_char(Some(side), true),
                        None => owner_char(tile.owner, false)
                    };
                    format!("{}{}", tile.terrain_data().symbol, mark)
                })
                .collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");

        let terrain_types: std::collections::BTreeSet<TerrainKind> =
            self.grid.iter().map(|tile| tile.terrain).collect();
        let terrain_names = terrain_types
            .into_iter()
            .map(|t| {
                let data = model::terrain(t);
                format!("{}: {}", data.symbol, data.name)
            })
            .collect::<Vec<String>>()
            .join(", ");

        let standings = self.players.iter()
            .map(|p| format!("{:?}: {} gold, {}/{} tiles", p.side, p.gold, p.territory, self.grid.total_conquerable()))
            .collect::<Vec<String>>()
            .join(", ");

        [map, terrain_names, standings].join("\n")
    }
}
