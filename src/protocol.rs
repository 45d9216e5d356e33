use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{DAY_MS, HOUR_MS, MINUTE_MS, ProtocolConfig};
use crate::game::Outcome;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;
/// Local calendar day, see [`ProtocolConfig::day_of`].
pub type Day = i64;

pub const TOP_TIER: u8 = 10;
pub const ABSTINENCE_MS: i64 = 3 * HOUR_MS;
const NOON_MS: i64 = DAY_MS / 2;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("State parse error")]
    Parse(#[from] serde_json::Error),
    #[error("Mandatory delay in effect, {0} ms left")]
    DelayActive(i64),
}

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock shifted by a fixed amount, for manual testing.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock {
    pub offset_ms: i64,
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        since_epoch + self.offset_ms
    }
}

/// Manually driven clock.
#[derive(Clone, Debug, Default)]
pub struct FixedClock(Cell<Timestamp>);

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        FixedClock(Cell::new(now))
    }
    pub fn set(&self, now: Timestamp) {
        self.0.set(now);
    }
    pub fn advance(&self, ms: i64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0.get()
    }
}

/// Persisted protocol state. Missing fields take their defaults, so older
/// saves load cleanly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolState {
    pub tier: u8,
    pub last_game_at: Option<Timestamp>,
    pub delay_started_at: Option<Timestamp>,
    pub delay_duration_ms: i64,
    pub last_tier_played: u8,
    pub last_celebrated_game_at: Option<Timestamp>,
    pub protection_active: bool,
    pub protection_expires_at: Option<Timestamp>,
    pub protection_granted_at: Option<Timestamp>,
    pub protection_celebrated_on: Option<Day>,
    pub last_welcome_shown_on: Option<Day>,
    pub protection_suppressed_on: Option<Day>,
}

impl Default for ProtocolState {
    fn default() -> Self {
        ProtocolState {
            tier: TOP_TIER,
            last_game_at: None,
            delay_started_at: None,
            delay_duration_ms: 0,
            last_tier_played: TOP_TIER,
            last_celebrated_game_at: None,
            protection_active: false,
            protection_expires_at: None,
            protection_granted_at: None,
            protection_celebrated_on: None,
            last_welcome_shown_on: None,
            protection_suppressed_on: None,
        }
    }
}

impl ProtocolState {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }
    pub fn as_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolEvent {
    WelcomeShown,
    ProtectionGranted { expires_at: Timestamp },
    ProtectionCleared { anchored_at: Timestamp },
    Celebration,
    DelayStarted { previous_tier: u8, tier: u8, duration_ms: i64 },
    DelayFinished,
    ConfirmationNeeded { remaining_ms: i64 },
    ConfirmationHidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WelcomeSettings {
    pub should_show: bool,
    pub next_last_shown_on: Day,
    pub suppress_protection: bool,
}

/// Cooldown gate between game sessions.
///
/// Each finished session drops the tier by one and imposes a delay that
/// grows as the tier falls. Three hours without playing grant protection:
/// tier 10 locked in until the end of the local day.
pub struct DecimationProtocol<C: Clock> {
    state: ProtocolState,
    config: ProtocolConfig,
    clock: C,
    show_welcome: bool,
    celebration_visible: bool,
    confirming: bool,
}

impl<C: Clock> DecimationProtocol<C> {
    pub fn new(clock: C, config: ProtocolConfig) -> Self {
        Self::with_state(ProtocolState::default(), clock, config)
    }
    pub fn with_state(state: ProtocolState, clock: C, config: ProtocolConfig) -> Self {
        DecimationProtocol {
            state,
            config,
            clock,
            show_welcome: false,
            celebration_visible: false,
            confirming: false,
        }
    }

    pub fn state(&self) -> &ProtocolState {
        &self.state
    }
    pub fn clock(&self) -> &C {
        &self.clock
    }
    pub fn tier(&self) -> u8 {
        self.state.tier
    }
    pub fn should_show_welcome(&self) -> bool {
        self.show_welcome
    }
    pub fn is_confirming(&self) -> bool {
        self.confirming
    }
    fn today(&self) -> Day {
        self.config.day_of(self.clock.now())
    }

    /// Startup sequence: welcome, expired protection, reset, then the
    /// confirmation gate.
    pub fn initialize(&mut self, emit: &mut dyn FnMut(ProtocolEvent)) {
        self.prepare_welcome(emit);
        self.sync_protection_window(emit);
        self.apply_reset_if_needed(emit);
        self.show_confirmation_if_needed(emit);
        tracing::debug!(tier = self.state.tier, protected = self.state.protection_active, "protocol initialized");
    }

    /// The first launch of a day shows the welcome screen. It also removes any
    /// protection and pending delay, and blocks new protection until the
    /// welcome is dismissed or a session completes.
    pub fn prepare_welcome(&mut self, emit: &mut dyn FnMut(ProtocolEvent)) -> bool {
        let settings = welcome_settings_for_day(self.state.last_welcome_shown_on, self.today());
        self.show_welcome = settings.should_show;
        if settings.should_show {
            self.state.last_welcome_shown_on = Some(settings.next_last_shown_on);
            if settings.suppress_protection {
                self.state.protection_suppressed_on = Some(settings.next_last_shown_on);
            }
            self.state.protection_active = false;
            self.state.protection_expires_at = None;
            self.state.protection_granted_at = None;
            self.state.delay_started_at = None;
            self.state.delay_duration_ms = 0;
            emit(ProtocolEvent::WelcomeShown);
        }
        settings.should_show
    }

    pub fn dismiss_welcome(&mut self) {
        self.show_welcome = false;
        self.state.protection_suppressed_on =
            clear_welcome_suppression(self.state.protection_suppressed_on, self.today());
    }

    pub fn is_protection_suppressed_today(&self) -> bool {
        self.state.protection_suppressed_on == Some(self.today())
    }

    pub fn sync_protection_window(&mut self, emit: &mut dyn FnMut(ProtocolEvent)) {
        let expired = self.state.protection_expires_at.is_some_and(|at| self.clock.now() >= at);
        if self.state.protection_active && expired {
            self.clear_protection(emit);
        }
    }

    pub fn apply_reset_if_needed(&mut self, emit: &mut dyn FnMut(ProtocolEvent)) {
        let now = self.clock.now();
        let last_game_at = self.state.last_game_at;
        let rested = effective_last_game_at(last_game_at, now, &self.config)
            .is_some_and(|at| now - at >= ABSTINENCE_MS);

        if rested && !self.state.protection_active && !self.is_protection_suppressed_today() {
            self.grant_protection(now, emit);
        }

        let celebration_pending = self.reset_remaining_ms() <= 0
            && last_game_at.is_some()
            && self.state.last_celebrated_game_at != last_game_at;
        if celebration_pending {
            self.state.last_celebrated_game_at = last_game_at;
            self.celebration_visible = true;
            emit(ProtocolEvent::Celebration);
        }
    }

    pub fn grant_protection(&mut self, now: Timestamp, emit: &mut dyn FnMut(ProtocolEvent)) {
        let expires_at = self.config.end_of_day(now);
        self.state.tier = TOP_TIER;
        self.state.protection_active = true;
        self.state.protection_granted_at = Some(now);
        self.state.protection_expires_at = Some(expires_at);
        self.state.delay_started_at = None;
        self.state.delay_duration_ms = 0;
        tracing::info!(expires_at, "protection granted");
        emit(ProtocolEvent::ProtectionGranted { expires_at });

        let today = self.config.day_of(now);
        if self.state.protection_celebrated_on != Some(today) {
            self.state.protection_celebrated_on = Some(today);
            self.celebration_visible = true;
            emit(ProtocolEvent::Celebration);
        }
    }

    pub fn dismiss_celebration(&mut self) {
        self.celebration_visible = false;
    }

    /// Whether launching mid-abstinence should ask before breaking the
    /// three-hour window.
    pub fn should_confirm(&self) -> bool {
        self.state.last_game_at.is_some()
            && self.reset_remaining_ms() > 0
            && !self.state.protection_active
            && !self.celebration_visible
    }

    /// Shows the confirmation when needed, or hides one that no longer
    /// applies. Returns whether it is showing.
    pub fn show_confirmation_if_needed(&mut self, emit: &mut dyn FnMut(ProtocolEvent)) -> bool {
        if self.should_confirm() {
            self.confirming = true;
            emit(ProtocolEvent::ConfirmationNeeded { remaining_ms: self.reset_remaining_ms() });
        } else if self.confirming {
            self.confirming = false;
            emit(ProtocolEvent::ConfirmationHidden);
        }
        self.confirming
    }

    /// The player chose to play anyway.
    pub fn dismiss_confirmation(&mut self) {
        self.confirming = false;
    }

    /// The player chose to keep resting. Returns the state to persist before
    /// leaving.
    pub fn preserve_and_exit(&mut self) -> Result<String, Error> {
        self.confirming = false;
        tracing::info!(remaining_ms = self.reset_remaining_ms(), "abstinence preserved");
        self.state.as_json()
    }

    /// Ends protection. The abstinence window restarts from the end of the
    /// protected period.
    pub fn clear_protection(&mut self, emit: &mut dyn FnMut(ProtocolEvent)) {
        let anchored_at = self.state.protection_expires_at.unwrap_or_else(|| {
            let granted_at = self.state.protection_granted_at.unwrap_or_else(|| self.clock.now());
            self.config.end_of_day(granted_at)
        });
        self.state.protection_active = false;
        self.state.protection_expires_at = None;
        self.state.protection_granted_at = None;
        self.state.last_game_at = Some(anchored_at);
        tracing::info!(anchored_at, "protection cleared");
        emit(ProtocolEvent::ProtectionCleared { anchored_at });
    }

    /// Records a finished game and starts the mandatory delay. Returns the
    /// delay length.
    pub fn handle_session_complete(&mut self, outcome: &Outcome, emit: &mut dyn FnMut(ProtocolEvent)) -> i64 {
        let now = self.clock.now();
        self.state.protection_suppressed_on = None;

        let previous_tier = self.state.tier;
        let tier = if self.state.protection_active {
            TOP_TIER
        } else {
            previous_tier.saturating_sub(1).max(1)
        };
        let duration_ms = delay_for_tier(tier);

        self.state.tier = tier;
        self.state.last_tier_played = if self.state.protection_active { TOP_TIER } else { previous_tier };
        self.state.last_game_at = Some(now);
        self.state.delay_started_at = Some(now);
        self.state.delay_duration_ms = duration_ms;

        tracing::info!(victory = outcome.victory(), previous_tier, tier, duration_ms, "session complete");
        emit(ProtocolEvent::DelayStarted { previous_tier, tier, duration_ms });
        duration_ms
    }

    pub fn is_delay_active(&self) -> bool {
        match self.state.delay_started_at {
            Some(started_at) if self.state.delay_duration_ms > 0 => {
                self.clock.now() < started_at + self.state.delay_duration_ms
            }
            _ => false,
        }
    }

    /// Time left on the mandatory delay.
    pub fn remaining_ms(&self) -> i64 {
        match self.state.delay_started_at {
            Some(started_at) if self.state.delay_duration_ms > 0 => {
                (started_at + self.state.delay_duration_ms - self.clock.now()).max(0)
            }
            _ => 0,
        }
    }

    /// Time until three hours have passed since the last game. Zero when no
    /// game has been played or protection is already active.
    pub fn reset_remaining_ms(&self) -> i64 {
        match self.state.last_game_at {
            Some(last_game_at) if !self.state.protection_active => {
                (last_game_at + ABSTINENCE_MS - self.clock.now()).max(0)
            }
            _ => 0,
        }
    }

    pub fn finish_delay(&mut self, emit: &mut dyn FnMut(ProtocolEvent)) {
        self.state.delay_started_at = None;
        self.state.delay_duration_ms = 0;
        emit(ProtocolEvent::DelayFinished);
    }

    /// Periodic tick: finishes an elapsed delay, drops expired protection
    /// and refreshes a showing confirmation.
    pub fn poll(&mut self, emit: &mut dyn FnMut(ProtocolEvent)) {
        if self.state.delay_started_at.is_some() && self.remaining_ms() == 0 {
            self.finish_delay(emit);
        }
        self.sync_protection_window(emit);
        if self.confirming {
            self.show_confirmation_if_needed(emit);
        }
    }

    /// Runs `start` unless the delay is still running.
    pub fn handle_play_again<T>(&self, start: impl FnOnce() -> T) -> Result<T, Error> {
        if self.is_delay_active() {
            return Err(Error::DelayActive(self.remaining_ms()));
        }
        Ok(start())
    }
}

pub fn delay_for_tier(tier: u8) -> i64 {
    match tier {
        7.. => MINUTE_MS,
        4..=6 => 3 * MINUTE_MS,
        2..=3 => 5 * MINUTE_MS,
        _ => 15 * MINUTE_MS,
    }
}

/// After local noon, a last session that is unknown or from an earlier day
/// counts as exactly three hours ago.
pub fn effective_last_game_at(last_game_at: Option<Timestamp>, now: Timestamp, config: &ProtocolConfig) -> Option<Timestamp> {
    if config.time_of_day(now) < NOON_MS {
        return last_game_at;
    }
    match last_game_at {
        Some(at) if config.day_of(at) == config.day_of(now) => Some(at),
        _ => Some(now - ABSTINENCE_MS),
    }
}

pub fn welcome_settings_for_day(last_shown_on: Option<Day>, today: Day) -> WelcomeSettings {
    let new_day = last_shown_on != Some(today);
    WelcomeSettings {
        should_show: new_day,
        next_last_shown_on: today,
        suppress_protection: new_day,
    }
}

pub fn clear_welcome_suppression(suppressed_on: Option<Day>, today: Day) -> Option<Day> {
    suppressed_on.filter(|&day| day != today)
}

/// `mm:ss`, clamped at zero.
pub fn format_duration(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Whole minutes rounded up, e.g. `2 hours 5 minutes`.
pub fn format_hours_minutes(ms: i64) -> String {
    let total_minutes = (ms.max(0) + MINUTE_MS - 1) / MINUTE_MS;
    format!("{} hours {} minutes", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod test {
    use crate::config::{DAY_MS, HOUR_MS, MINUTE_MS, ProtocolConfig};
    use crate::game::{Outcome, Side, WinCondition};
    use crate::protocol::*;

    // 2024-01-02 00:00 UTC
    const JAN_2: Timestamp = 1_704_153_600_000;
    const JAN_3: Timestamp = JAN_2 + DAY_MS;

    const WIN: Outcome = Outcome { winner: Side::Player, condition: WinCondition::Domination };

    fn at(day: Timestamp, hours: i64, minutes: i64) -> Timestamp {
        day + hours * HOUR_MS + minutes * MINUTE_MS
    }

    fn protocol(now: Timestamp) -> DecimationProtocol<FixedClock> {
        DecimationProtocol::new(FixedClock::new(now), ProtocolConfig::default())
    }

    fn collect(events: &mut Vec<ProtocolEvent>) -> impl FnMut(ProtocolEvent) + '_ {
        move |e| events.push(e)
    }

    #[test]
    fn after_noon_unknown_last_game_counts_as_rested() {
        let now = at(JAN_2, 13, 0);
        let config = ProtocolConfig::default();
        assert_eq!(effective_last_game_at(None, now, &config), Some(now - ABSTINENCE_MS));
    }

    #[test]
    fn after_noon_yesterday_counts_as_rested() {
        let now = at(JAN_3, 12, 30);
        let yesterday = at(JAN_2, 22, 0);
        let config = ProtocolConfig::default();
        assert_eq!(effective_last_game_at(Some(yesterday), now, &config), Some(now - ABSTINENCE_MS));
    }

    #[test]
    fn same_day_session_is_kept() {
        let morning = at(JAN_2, 10, 15);
        let config = ProtocolConfig::default();
        assert_eq!(effective_last_game_at(Some(morning), at(JAN_2, 13, 0), &config), Some(morning));
    }

    #[test]
    fn before_noon_is_unchanged() {
        let config = ProtocolConfig::default();
        assert_eq!(effective_last_game_at(None, at(JAN_2, 11, 0), &config), None);
        let yesterday = at(JAN_2, 22, 0);
        assert_eq!(effective_last_game_at(Some(yesterday), at(JAN_3, 9, 0), &config), Some(yesterday));
    }

    #[test]
    fn noon_follows_local_time() {
        // 11:00 UTC is noon at UTC+1.
        let config = ProtocolConfig { utc_offset_minutes: 60 };
        let now = at(JAN_2, 11, 0);
        assert_eq!(effective_last_game_at(None, now, &config), Some(now - ABSTINENCE_MS));
    }

    #[test]
    fn welcome_on_a_new_day() {
        let settings = welcome_settings_for_day(Some(19_724), 19_725);
        assert_eq!(settings, WelcomeSettings { should_show: true, next_last_shown_on: 19_725, suppress_protection: true });
        let settings = welcome_settings_for_day(None, 19_725);
        assert!(settings.should_show);
    }

    #[test]
    fn no_welcome_twice_a_day() {
        let settings = welcome_settings_for_day(Some(19_725), 19_725);
        assert_eq!(settings, WelcomeSettings { should_show: false, next_last_shown_on: 19_725, suppress_protection: false });
    }

    #[test]
    fn dismissal_clears_only_today() {
        assert_eq!(clear_welcome_suppression(Some(19_725), 19_725), None);
        assert_eq!(clear_welcome_suppression(Some(19_724), 19_725), Some(19_724));
        assert_eq!(clear_welcome_suppression(None, 19_725), None);
    }

    #[test]
    fn delays_grow_as_tier_drops() {
        assert_eq!(delay_for_tier(10), MINUTE_MS);
        assert_eq!(delay_for_tier(7), MINUTE_MS);
        assert_eq!(delay_for_tier(6), 3 * MINUTE_MS);
        assert_eq!(delay_for_tier(4), 3 * MINUTE_MS);
        assert_eq!(delay_for_tier(3), 5 * MINUTE_MS);
        assert_eq!(delay_for_tier(2), 5 * MINUTE_MS);
        assert_eq!(delay_for_tier(1), 15 * MINUTE_MS);
    }

    #[test]
    fn sessions_step_the_tier_down_to_one() {
        let mut protocol = protocol(at(JAN_2, 8, 0));
        let mut events = Vec::new();
        let duration = protocol.handle_session_complete(&WIN, &mut collect(&mut events));
        assert_eq!(duration, MINUTE_MS);
        assert_eq!(protocol.tier(), 9);
        assert_eq!(protocol.state().last_tier_played, 10);
        assert_eq!(events, vec![ProtocolEvent::DelayStarted { previous_tier: 10, tier: 9, duration_ms: MINUTE_MS }]);

        for _ in 0..12 {
            protocol.clock().advance(HOUR_MS / 4);
            protocol.handle_session_complete(&WIN, &mut |_| ());
        }
        assert_eq!(protocol.tier(), 1);
        assert_eq!(protocol.state().last_tier_played, 1);
        assert_eq!(protocol.state().delay_duration_ms, 15 * MINUTE_MS);
    }

    #[test]
    fn play_again_waits_for_the_delay() {
        let mut protocol = protocol(at(JAN_2, 8, 0));
        assert_eq!(protocol.handle_play_again(|| 1).unwrap(), 1);

        protocol.handle_session_complete(&WIN, &mut |_| ());
        assert!(protocol.is_delay_active());
        protocol.clock().advance(15 * 1000);
        assert_eq!(protocol.remaining_ms(), 45 * 1000);
        assert!(matches!(protocol.handle_play_again(|| ()), Err(Error::DelayActive(45_000))));

        let mut events = Vec::new();
        protocol.poll(&mut collect(&mut events));
        assert!(events.is_empty());

        protocol.clock().advance(45 * 1000);
        assert!(!protocol.is_delay_active());
        protocol.poll(&mut collect(&mut events));
        assert_eq!(events, vec![ProtocolEvent::DelayFinished]);
        assert_eq!(protocol.state().delay_started_at, None);
        assert!(protocol.handle_play_again(|| ()).is_ok());
    }

    #[test]
    fn three_hours_off_grants_protection() {
        let mut protocol = protocol(at(JAN_2, 7, 0));
        let mut events = Vec::new();
        protocol.initialize(&mut collect(&mut events));
        assert!(protocol.should_show_welcome());
        assert!(protocol.is_protection_suppressed_today());
        assert_eq!(events, vec![ProtocolEvent::WelcomeShown]);
        protocol.dismiss_welcome();
        assert!(!protocol.is_protection_suppressed_today());

        protocol.clock().set(at(JAN_2, 8, 0));
        protocol.handle_session_complete(&WIN, &mut |_| ());
        protocol.handle_session_complete(&WIN, &mut |_| ());
        assert_eq!(protocol.tier(), 8);

        protocol.clock().set(at(JAN_2, 10, 0));
        assert_eq!(protocol.reset_remaining_ms(), HOUR_MS);
        assert_eq!(format_hours_minutes(protocol.reset_remaining_ms()), "1 hours 0 minutes");

        protocol.clock().set(at(JAN_2, 11, 0));
        events.clear();
        protocol.initialize(&mut collect(&mut events));
        let expires_at = JAN_3 - 1;
        assert_eq!(events, vec![
            ProtocolEvent::ProtectionGranted { expires_at },
            ProtocolEvent::Celebration,
            ProtocolEvent::Celebration,
        ]);
        assert!(!protocol.should_show_welcome());
        assert_eq!(protocol.tier(), 10);
        assert_eq!(protocol.reset_remaining_ms(), 0);
        assert_eq!(protocol.state().protection_celebrated_on, Some(ProtocolConfig::default().day_of(JAN_2)));

        // Sessions under protection keep the top tier.
        let duration = protocol.handle_session_complete(&WIN, &mut |_| ());
        assert_eq!(duration, MINUTE_MS);
        assert_eq!(protocol.tier(), 10);
        assert_eq!(protocol.state().last_tier_played, 10);

        // One celebration per game.
        protocol.clock().advance(MINUTE_MS);
        events.clear();
        protocol.apply_reset_if_needed(&mut collect(&mut events));
        assert_eq!(events, vec![ProtocolEvent::Celebration]);
        events.clear();
        protocol.apply_reset_if_needed(&mut collect(&mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn welcome_day_blocks_protection() {
        let mut protocol = protocol(at(JAN_2, 8, 0));
        protocol.handle_session_complete(&WIN, &mut |_| ());

        protocol.clock().set(at(JAN_3, 9, 0));
        let mut events = Vec::new();
        protocol.initialize(&mut collect(&mut events));
        assert!(!protocol.state().protection_active);
        assert_eq!(protocol.state().delay_started_at, None);
        assert_eq!(events, vec![ProtocolEvent::WelcomeShown, ProtocolEvent::Celebration]);

        // A completed session lifts the suppression.
        protocol.handle_session_complete(&WIN, &mut |_| ());
        assert_eq!(protocol.state().protection_suppressed_on, None);
    }

    #[test]
    fn expired_protection_anchors_last_game() {
        let mut protocol = protocol(at(JAN_2, 11, 0));
        protocol.grant_protection(at(JAN_2, 11, 0), &mut |_| ());
        let expires_at = protocol.state().protection_expires_at.unwrap();

        protocol.clock().set(at(JAN_2, 23, 0));
        protocol.sync_protection_window(&mut |_| ());
        assert!(protocol.state().protection_active);

        protocol.clock().set(JAN_3);
        let mut events = Vec::new();
        protocol.poll(&mut collect(&mut events));
        assert!(!protocol.state().protection_active);
        assert_eq!(protocol.state().last_game_at, Some(expires_at));
        assert_eq!(events, vec![ProtocolEvent::ProtectionCleared { anchored_at: expires_at }]);
        assert_eq!(protocol.reset_remaining_ms(), ABSTINENCE_MS - 1);
    }

    #[test]
    fn launching_mid_abstinence_asks_first() {
        let mut protocol = protocol(at(JAN_2, 8, 0));
        protocol.handle_session_complete(&WIN, &mut |_| ());

        protocol.clock().set(at(JAN_2, 9, 0));
        let mut events = Vec::new();
        protocol.initialize(&mut collect(&mut events));
        assert!(protocol.should_confirm());
        assert!(protocol.is_confirming());
        assert_eq!(events, vec![
            ProtocolEvent::WelcomeShown,
            ProtocolEvent::ConfirmationNeeded { remaining_ms: 2 * HOUR_MS },
        ]);

        protocol.clock().set(at(JAN_2, 10, 30));
        events.clear();
        protocol.poll(&mut collect(&mut events));
        assert_eq!(events, vec![ProtocolEvent::ConfirmationNeeded { remaining_ms: 30 * MINUTE_MS }]);

        // Hidden once three hours have passed.
        protocol.clock().set(at(JAN_2, 11, 0));
        events.clear();
        protocol.poll(&mut collect(&mut events));
        assert_eq!(events, vec![ProtocolEvent::ConfirmationHidden]);
        assert!(!protocol.is_confirming());
        events.clear();
        protocol.poll(&mut collect(&mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn preserving_abstinence_saves_state() {
        let mut protocol = protocol(at(JAN_2, 8, 0));
        protocol.handle_session_complete(&WIN, &mut |_| ());
        protocol.clock().set(at(JAN_2, 9, 0));
        protocol.initialize(&mut |_| ());
        assert!(protocol.is_confirming());

        let text = protocol.preserve_and_exit().unwrap();
        assert!(!protocol.is_confirming());
        assert_eq!(&ProtocolState::from_json(&text).unwrap(), protocol.state());

        // Returning shows it again while the window is still open.
        let mut events = Vec::new();
        assert!(protocol.show_confirmation_if_needed(&mut collect(&mut events)));
        assert_eq!(events, vec![ProtocolEvent::ConfirmationNeeded { remaining_ms: 2 * HOUR_MS }]);

        protocol.dismiss_confirmation();
        protocol.clock().advance(MINUTE_MS);
        events.clear();
        protocol.poll(&mut collect(&mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn no_confirmation_without_a_last_game() {
        let mut protocol = protocol(at(JAN_2, 9, 0));
        let mut events = Vec::new();
        protocol.initialize(&mut collect(&mut events));
        assert!(!protocol.should_confirm());
        assert_eq!(events, vec![ProtocolEvent::WelcomeShown]);
    }

    #[test]
    fn no_confirmation_once_rested_or_protected() {
        let mut protocol = protocol(at(JAN_2, 8, 0));
        protocol.handle_session_complete(&WIN, &mut |_| ());
        protocol.clock().set(at(JAN_2, 11, 0));
        assert_eq!(protocol.reset_remaining_ms(), 0);
        assert!(!protocol.should_confirm());

        protocol.grant_protection(at(JAN_2, 11, 0), &mut |_| ());
        protocol.dismiss_celebration();
        protocol.handle_session_complete(&WIN, &mut |_| ());
        assert!(protocol.state().protection_active);
        assert!(!protocol.should_confirm());
    }

    #[test]
    fn no_confirmation_over_a_celebration() {
        let mut protocol = protocol(at(JAN_2, 11, 0));
        protocol.grant_protection(at(JAN_2, 11, 0), &mut |_| ());

        // Expiry restarts the window while the celebration is still up.
        protocol.clock().set(JAN_3);
        protocol.poll(&mut |_| ());
        assert!(protocol.reset_remaining_ms() > 0);
        assert!(!protocol.should_confirm());

        protocol.dismiss_celebration();
        assert!(protocol.should_confirm());
        let mut events = Vec::new();
        protocol.show_confirmation_if_needed(&mut collect(&mut events));
        assert_eq!(events, vec![ProtocolEvent::ConfirmationNeeded { remaining_ms: ABSTINENCE_MS - 1 }]);
    }

    #[test]
    fn state_survives_json() {
        let mut protocol = protocol(at(JAN_2, 8, 0));
        protocol.handle_session_complete(&WIN, &mut |_| ());
        let text = protocol.state().as_json().unwrap();
        assert_eq!(&ProtocolState::from_json(&text).unwrap(), protocol.state());

        let partial = ProtocolState::from_json(r#"{ "tier": 4 }"#).unwrap();
        assert_eq!(partial.tier, 4);
        assert_eq!(partial.last_tier_played, 10);
        assert!(!partial.protection_active);
    }

    #[test]
    fn durations_format() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(-5), "00:00");
        assert_eq!(format_duration(61_999), "01:01");
        assert_eq!(format_duration(15 * MINUTE_MS), "15:00");
        assert_eq!(format_hours_minutes(3 * HOUR_MS), "3 hours 0 minutes");
        assert_eq!(format_hours_minutes(61 * 1000), "0 hours 2 minutes");
        assert_eq!(format_hours_minutes(-1), "0 hours 0 minutes");
    }
}
