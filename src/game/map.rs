use std::collections::{HashSet, VecDeque};
use crate::game::*;
use crate::model::{self, TerrainKind};
use crate::random::RandomSource;

/// Cumulative probability bands for terrain draws; anything above the last
/// band is grass.
const TERRAIN_BANDS: [(f64, TerrainKind); 4] = [
    (0.2, TerrainKind::Water),
    (0.3, TerrainKind::Mountain),
    (0.5, TerrainKind::Forest),
    (0.6, TerrainKind::Sand),
];

pub fn terrain_for_draw(r: f64) -> TerrainKind {
    TERRAIN_BANDS.iter()
        .find(|(limit, _)| r < *limit)
        .map(|&(_, kind)| kind)
        .unwrap_or(TerrainKind::Grass)
}

impl Grid {
    /// Draws one terrain value per cell, row by row. Neighbouring cells are
    /// independent.
    pub fn generate<R: RandomSource + ?Sized>(width: i32, height: i32, rng: &mut R) -> Grid {
        let mut tiles = Vec::with_capacity((width.max(0) * height.max(0)) as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(x, y, terrain_for_draw(rng.next_f64())));
            }
        }
        Grid::from_tiles(width, height, tiles)
    }

    pub fn from_rows(rows: &[Vec<TerrainKind>]) -> Option<Grid> {
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }
        let tiles = rows.iter().enumerate()
            .flat_map(|(y, row)| row.iter().enumerate()
                .map(move |(x, &terrain)| Tile::new(x as i32, y as i32, terrain)))
            .collect();
        Some(Grid::from_tiles(width as i32, rows.len() as i32, tiles))
    }

    /// Parses one line per row using the terrain symbols of the catalog,
    /// e.g. `"..~\nT^:"`. Surrounding whitespace is ignored.
    pub fn from_ascii(data: &str) -> Option<Grid> {
        let rows = data.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().map(terrain_for_symbol).collect::<Option<Vec<_>>>())
            .collect::<Option<Vec<_>>>()?;
        Grid::from_rows(&rows)
    }

    fn from_tiles(width: i32, height: i32, tiles: Vec<Tile>) -> Grid {
        let conquerable = tiles.iter().filter(|t| t.is_passable()).count() as u32;
        Grid { width, height, tiles, conquerable }
    }

    pub fn width(&self) -> i32 {
        self.width
    }
    pub fn height(&self) -> i32 {
        self.height
    }
    /// Passable tiles, fixed when the grid is built.
    pub fn total_conquerable(&self) -> u32 {
        self.conquerable
    }
    pub fn contains(&self, &Position(x, y): &Position) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }
    pub fn tile_id(&self, position: &Position) -> Option<TileId> {
        let &Position(x, y) = position;
        self.contains(position).then(|| (y * self.width + x) as TileId)
    }
    pub fn get(&self, position: &Position) -> Option<&Tile> {
        self.tiles.get(self.tile_id(position)?)
    }
    pub fn get_mut(&mut self, position: &Position) -> GameUpdateResult<&mut Tile> {
        let tile_id = self.tile_id(position).ok_or(GameUpdateError::InvalidPosition)?;
        self.tiles.get_mut(tile_id).ok_or(GameUpdateError::InvalidPosition)
    }
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.width.max(1) as usize)
    }
    pub fn owned_by(&self, side: Side) -> impl Iterator<Item = &Tile> {
        self.iter().filter(move |t| t.owner == Some(side))
    }
    pub fn count_owned(&self, side: Side) -> u32 {
        self.owned_by(side).count() as u32
    }

    /// In-bounds tiles among the 8 surrounding cells.
    ///
    /// This is the one neighbour function of the game: spawn validation,
    /// path search, movement, recruitment and encirclement all use it.
    pub fn neighbors(&self, position: &Position) -> impl Iterator<Item = &Tile> {
        position.adjacent().filter_map(move |p| self.get(&p))
    }
    pub fn has_passable_neighbor(&self, position: &Position) -> bool {
        self.neighbors(position).any(Tile::is_passable)
    }

    /// Breadth-first search over passable tiles, 8-directional.
    pub fn path_exists(&self, start: &Position, target: &Position) -> bool {
        let mut queue = VecDeque::from([*start]);
        let mut visited = HashSet::from([*start]);

        while let Some(current) = queue.pop_front() {
            if current == *target {
                return true;
            }
            for tile in self.neighbors(&current) {
                let position = tile.position();
                if tile.is_passable() && visited.insert(position) {
                    queue.push_back(position);
                }
            }
        }
        false
    }

    /// Clears fog on the Chebyshev square around `center`, clipped to the
    /// board. Explored never reverts.
    pub fn reveal(&mut self, center: &Position, radius: i32) {
        let &Position(cx, cy) = center;
        for y in (cy - radius)..=(cy + radius) {
            for x in (cx - radius)..=(cx + radius) {
                if let Ok(tile) = self.get_mut(&Position(x, y)) {
                    tile.fog = false;
                    tile.explored = true;
                }
            }
        }
    }
}

fn terrain_for_symbol(symbol: char) -> Option<TerrainKind> {
    enum_iterator::all::<TerrainKind>().find(|&t| model::terrain(t).symbol == symbol)
}
