use crate::model;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration parse error")]
    Parse(#[from] serde_json::Error),
    #[error("Map must be at least 2x1, got {0}x{1}")]
    MapTooSmall(i32, i32),
    #[error("Attempt budgets must be positive")]
    NoAttempts,
}

/// Tunables for a single game session.
///
/// Every field has a default, so a JSON document only needs to list the
/// values it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: i32,
    pub height: i32,
    /// Whole-map regenerations before giving up.
    pub max_board_attempts: u32,
    /// Draws per spawn point before a map is rejected.
    pub max_spawn_attempts: u32,
    pub starting_gold: u32,
    pub reveal_radius: i32,
    pub base_income: u32,
    pub income_per_territory: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: 9,
            height: 9,
            max_board_attempts: 50,
            max_spawn_attempts: 200,
            starting_gold: model::STARTING_GOLD,
            reveal_radius: model::REVEAL_RADIUS,
            base_income: model::BASE_INCOME,
            income_per_territory: model::INCOME_PER_TERRITORY,
        }
    }
}

impl GameConfig {
    pub fn from_json(data: &str) -> Result<GameConfig, ConfigError> {
        let config: GameConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Two distinct spawn tiles need at least two cells.
        if self.width < 1 || self.height < 1 || self.width * self.height < 2 {
            return Err(ConfigError::MapTooSmall(self.width, self.height));
        }
        if self.max_board_attempts == 0 || self.max_spawn_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        Ok(())
    }
    pub fn income(&self, territory: u32) -> u32 {
        self.base_income + self.income_per_territory * territory
    }
}

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Calendar settings for the cooldown protocol.
///
/// Days are counted in a fixed offset from UTC; daylight saving changes are
/// not followed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub utc_offset_minutes: i32,
}

impl ProtocolConfig {
    pub fn from_json(data: &str) -> Result<ProtocolConfig, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }
    fn offset_ms(&self) -> i64 {
        self.utc_offset_minutes as i64 * MINUTE_MS
    }
    /// Local calendar day of a timestamp, as days since the epoch.
    pub fn day_of(&self, timestamp: i64) -> i64 {
        (timestamp + self.offset_ms()).div_euclid(DAY_MS)
    }
    /// Milliseconds since local midnight.
    pub fn time_of_day(&self, timestamp: i64) -> i64 {
        (timestamp + self.offset_ms()).rem_euclid(DAY_MS)
    }
    /// Last millisecond of the local day containing `timestamp`.
    pub fn end_of_day(&self, timestamp: i64) -> i64 {
        (self.day_of(timestamp) + 1) * DAY_MS - self.offset_ms() - 1
    }
}
