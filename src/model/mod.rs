mod model;
pub use self::model::*;

use enum_iterator::Sequence;

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, PartialOrd, Ord, Serialize, Deserialize, Sequence)]
pub enum TerrainKind {
    Grass, Water, Mountain, Forest, Sand
}

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, PartialOrd, Ord, Serialize, Deserialize, Sequence)]
pub enum UnitType {
    Warrior
}

pub struct TerrainData<'a> {
    pub name: &'a str,
    pub color: &'a str,
    /// `None` for impassable terrain.
    pub move_cost: Option<u32>,
    /// Single character used by the ASCII map.
    pub symbol: char,
}

pub struct UnitTypeData<'a> {
    pub name: &'a str,
    pub symbol: &'a str,
    pub moves: u32,
    pub price: u32,
    // Carried for completeness, there is no combat.
    pub attack: u32,
    pub defense: u32,
}
