use std::collections::BTreeMap;
use enum_iterator::Sequence;
use crate::config::{ConfigError, GameConfig};
use crate::model;

mod game;
mod unit;
mod tile;
mod map;
mod spawn;
pub mod action;
pub mod bot;
pub use self::map::*;
pub use self::spawn::*;

pub type UnitId = usize;
pub type TileId = usize;

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, PartialOrd, Ord, Serialize, Deserialize, Sequence)]
pub enum Side { Player, Enemy }

#[derive(PartialEq, Eq, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum WinCondition { Domination, Encirclement }

#[derive(PartialEq, Eq, Copy, Clone, Debug, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Side,
    pub condition: WinCondition
}

#[derive(PartialEq, Eq, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum GameState { AwaitingInput, TurnResolving, GameOver(Outcome) }

/// Grid coordinates, `Position(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position(pub i32, pub i32);

/// Row-major terrain grid. Owns every tile of the board.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    conquerable: u32
}

/// Units in creation order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Units(BTreeMap<UnitId, Unit>);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Players {
    player: Player,
    enemy: Player
}

/// A single game session. Created once per game and discarded on restart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    pub state: GameState,
    pub grid: Grid,
    pub units: Units,
    pub players: Players,
    pub turn: u32,
    pub next_unit_id: UnitId,
    pub config: GameConfig
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub side: Side,
    pub gold: u32,
    pub territory: u32
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: model::TerrainKind,
    pub owner: Option<Side>,
    pub unit: Option<UnitId>,
    pub fog: bool,
    pub explored: bool,
    pub x: i32,
    pub y: i32
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_type: model::UnitType,
    pub owner: Side,
    pub position: Position,
    pub moves_left: u32,
    pub max_moves: u32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawns {
    pub player: Position,
    pub enemy: Position
}

/// Rejected player or AI actions. The message doubles as the player-facing
/// notification text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ActionError {
    #[error("The game is over!")]
    GameOver,
    #[error("No such unit!")]
    UnitNotFound,
    #[error("No moves left!")]
    NoMovesLeft,
    #[error("Cannot move there!")]
    Impassable,
    #[error("Too far! Move one tile at a time.")]
    TooFar,
    #[error("That tile is occupied!")]
    TileOccupied,
    #[error("Not enough movement points.")]
    InsufficientMovement,
    #[error("Not enough Gold ({0})!")]
    InsufficientGold(u32),
    #[error("No valid spawn location!")]
    NoSpawnLocation,
    #[error("Internal error")]
    InternalError
}

pub type ActionResult<T> = Result<T, ActionError>;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum GameUpdateError {
    #[error("Invalid tile position")]
    InvalidPosition,
    #[error("Invalid unit id")]
    InvalidUnitId,
    #[error("Invalid state transition")]
    InvalidStateTransition
}

pub type GameUpdateResult<T> = Result<T, GameUpdateError>;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Unable to generate a playable board with a path to the enemy after {attempts} attempts")]
    NoPlayableBoard { attempts: u32 },
    #[error("Invalid configuration")]
    Config(#[from] ConfigError)
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Text parse error")]
    TextError(#[from] serde_json::Error),
    #[error("Binary parse error")]
    BinaryError(#[from] postcard::Error)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Claim { position: Position, owner: Side, previous: Option<Side> },
    Move(UnitId, Position, Position),
    Recruit(UnitId, Side, Position),
    Reveal(Position, i32),
    Income(Side, u32),
    StartTurn(u32),
    Notification(String),
    GameOver(Outcome)
}
