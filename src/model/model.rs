use crate::model::*;

pub const UNIT_PRICE: u32 = 50;
pub const BASE_INCOME: u32 = 10;
pub const INCOME_PER_TERRITORY: u32 = 2;
pub const STARTING_GOLD: u32 = 100;
pub const REVEAL_RADIUS: i32 = 2;

pub fn terrain(x: TerrainKind) -> TerrainData<'static> {
    use crate::model::TerrainKind::*;

    let name = match x {
        Grass => "Grassland",
        Water => "Ocean",
        Mountain => "Mountain",
        Forest => "Forest",
        Sand => "Desert"
    };

    let color = match x {
        Grass => "#4caf50",
        Water => "#2196f3",
        Mountain => "#795548",
        Forest => "#2e7d32",
        Sand => "#fdd835"
    };

    let move_cost = match x {
        Grass | Sand => Some(1),
        Forest => Some(2),
        Water | Mountain => None
    };

    let symbol = match x {
        Grass => '.',
        Water => '~',
        Mountain => '^',
        Forest => 'T',
        Sand => ':'
    };

    TerrainData { name, color, move_cost, symbol }
}

pub fn unit_type(x: UnitType) -> UnitTypeData<'static> {
    use crate::model::UnitType::*;

    let name = match x {
        Warrior => "Warrior"
    };
    let symbol = match x {
        Warrior => "⚔️"
    };
    let moves = match x {
        Warrior => 2
    };
    let price = match x {
        Warrior => UNIT_PRICE
    };
    let (attack, defense) = match x {
        Warrior => (5, 3)
    };

    UnitTypeData { name, symbol, moves, price, attack, defense }
}

impl TerrainKind {
    pub fn move_cost(self) -> Option<u32> {
        terrain(self).move_cost
    }
    pub fn is_passable(self) -> bool {
        self.move_cost().is_some()
    }
}

#[cfg(test)]
mod test {
    use crate::model::*;

    #[test]
    fn terrain_costs() {
        assert_eq!(TerrainKind::Grass.move_cost(), Some(1));
        assert_eq!(TerrainKind::Sand.move_cost(), Some(1));
        assert_eq!(TerrainKind::Forest.move_cost(), Some(2));
        assert_eq!(TerrainKind::Water.move_cost(), None);
        assert_eq!(TerrainKind::Mountain.move_cost(), None);
    }

    #[test]
    fn passable_costs_are_positive() {
        for kind in enum_iterator::all::<TerrainKind>() {
            if let Some(cost) = kind.move_cost() {
                assert!(cost > 0, "{:?} has cost {}", kind, cost);
            }
        }
    }

    #[test]
    fn terrain_symbols_are_unique() {
        let symbols: std::collections::BTreeSet<char> = enum_iterator::all::<TerrainKind>()
            .map(|t| terrain(t).symbol)
            .collect();
        assert_eq!(symbols.len(), enum_iterator::cardinality::<TerrainKind>());
    }

    #[test]
    fn warrior_configuration() {
        let warrior = unit_type(UnitType::Warrior);
        assert!(warrior.name == "Warrior");
        assert!(warrior.moves == 2);
        assert!(warrior.price == UNIT_PRICE);
    }
}
