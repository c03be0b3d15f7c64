//! Agent configuration with documented defaults
//!
//! Every tunable the decision core reads lives here. The core treats the
//! values as constants for the duration of a tick but re-reads them every
//! tick, so a host can swap the whole config at runtime.

use std::fs;
use std::path::Path;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::skills::{CastType, SkillRole};
use crate::combat::StrategyKind;
use crate::core::error::{AgentError, Result};
use crate::core::types::{GridPos, Key};

fn secs(value: f32) -> Duration {
    Duration::from_secs_f32(value.max(0.0))
}

/// Spatial parameters for grid construction and path following
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Chunks whose centroid is closer than this to the player count as revealed
    pub view_distance: f32,
    /// How close to stand to monsters to fight them
    pub combat_distance: f32,
    /// Minimum spacing between kept waypoints, and the arrival radius
    pub node_size: f32,
    /// Edge length of an exploration chunk, in grid cells
    pub chunk_size: usize,
    /// Grid cells per terrain tile edge
    pub terrain_subdivision: usize,
    /// Lifetime of a planned path before it must be replanned
    pub path_ttl_secs: f32,
    /// Waypoints this close are popped before issuing the next move
    pub waypoint_pop_radius: f32,
    /// A path whose next waypoint is farther than this is considered bogus
    pub max_waypoint_distance: f32,
    /// Search radius used to move a blocked start cell onto walkable ground
    pub start_snap_radius: i32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            view_distance: 80.0,
            combat_distance: 15.0,
            node_size: 20.0,
            chunk_size: 10,
            terrain_subdivision: 23,
            path_ttl_secs: 5.0,
            waypoint_pop_radius: 2.0,
            max_waypoint_distance: 1000.0,
            start_snap_radius: 3,
        }
    }
}

impl NavigationConfig {
    pub fn path_ttl(&self) -> Duration {
        secs(self.path_ttl_secs)
    }
}

/// Time windows. All timeouts in the core are timestamp comparisons
/// against these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum time between two actuating calls
    pub action_interval_ms: u64,
    /// Cooldown after an encounter phase ends before the next may start
    pub min_wave_delay_secs: f32,
    /// Time without player movement before an action counts as stuck
    pub stuck_timeout_secs: f32,
    /// Stuck window while in the staging area (device interaction is slow)
    pub staging_stuck_timeout_secs: f32,
    /// Combat stays selected this long after the last target was seen
    pub combat_hysteresis_secs: f32,
    /// Encounter is forced inactive when its anchor is unseen this long
    pub anchor_stale_secs: f32,
    /// Loot keeps waiting this long for delayed drops before succeeding
    pub loot_settle_ms: u64,
    /// Pause after clicking the stash before checking the panel
    pub stash_open_wait_ms: u64,
    /// Pause after clicking the map device or placing a fragment
    pub device_interact_wait_ms: u64,
    /// Pause after activating the map device
    pub device_activate_wait_ms: u64,
    /// Interval between portal clicks once the device is activated
    pub portal_click_interval_ms: u64,
    /// Pause after clicking the revival prompt
    pub revive_wait_ms: u64,
    /// How long to wait for the cursor to change state during item handling
    pub cursor_wait_ms: u64,
    /// Periodic label toggle interval when loot unstick is enabled
    pub loot_toggle_interval_secs: f32,
    /// Player stillness that triggers a label toggle while looting
    pub loot_stuck_secs: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            action_interval_ms: 100,
            min_wave_delay_secs: 5.0,
            stuck_timeout_secs: 2.0,
            staging_stuck_timeout_secs: 4.0,
            combat_hysteresis_secs: 3.0,
            anchor_stale_secs: 10.0,
            loot_settle_ms: 7500,
            stash_open_wait_ms: 300,
            device_interact_wait_ms: 500,
            device_activate_wait_ms: 5000,
            portal_click_interval_ms: 750,
            revive_wait_ms: 1000,
            cursor_wait_ms: 2000,
            loot_toggle_interval_secs: 5.0,
            loot_stuck_secs: 15.0,
        }
    }
}

impl TimingConfig {
    pub fn action_interval(&self) -> Duration {
        Duration::from_millis(self.action_interval_ms)
    }
    pub fn min_wave_delay(&self) -> Duration {
        secs(self.min_wave_delay_secs)
    }
    pub fn stuck_timeout(&self) -> Duration {
        secs(self.stuck_timeout_secs)
    }
    pub fn staging_stuck_timeout(&self) -> Duration {
        secs(self.staging_stuck_timeout_secs)
    }
    pub fn combat_hysteresis(&self) -> Duration {
        secs(self.combat_hysteresis_secs)
    }
    pub fn anchor_stale(&self) -> Duration {
        secs(self.anchor_stale_secs)
    }
}

/// Run-loop thresholds and retry bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Carried-item count that triggers a trip to the stash
    pub store_item_threshold: usize,
    /// Phase counter at which the run is complete and the area is left
    pub wave_limit: u32,
    /// Apply stash consumables to empty equipment slots while storing
    pub use_consumables: bool,
    /// Store attempts per phase before the run is aborted
    pub max_store_attempts: u32,
    /// Consumable applications attempted per store visit
    pub max_consumable_attempts: u32,
    /// Consecutive exploration path failures before a cycle gives up
    pub max_explore_failures: u32,
    /// Exploration cycles that may exhaust the map without finding the anchor
    pub max_anchorless_cycles: u32,
    /// Periodically toggle loot labels to un-stick hidden labels
    pub loot_unstick: bool,
    /// Clicks on the same label before labels are refreshed
    pub max_failed_loot_clicks: u32,
    /// Ground-item labels with these suffixes are never looted
    pub ignored_item_suffixes: Vec<String>,
    /// Half-extent of the random offset used to shake loose a stuck player
    pub nudge_radius: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            store_item_threshold: 20,
            wave_limit: 15,
            use_consumables: true,
            max_store_attempts: 100,
            max_consumable_attempts: 20,
            max_explore_failures: 100,
            max_anchorless_cycles: 3,
            loot_unstick: false,
            max_failed_loot_clicks: 3,
            ignored_item_suffixes: vec![" Gold".to_string()],
            nudge_radius: 50.0,
        }
    }
}

/// Health/crowd thresholds that decide the recommended response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseThresholds {
    /// Below this health percent the defensive response always wins
    pub defensive_health: f32,
    /// Enemy count considered a dangerous crowd
    pub crowd_size: usize,
    /// Below this health percent a crowd also triggers the defensive response
    pub crowd_health: f32,
    /// Buffs are only maintained above this health percent
    pub buff_min_health: f32,
}

impl Default for ResponseThresholds {
    fn default() -> Self {
        Self {
            defensive_health: 35.0,
            crowd_size: 5,
            crowd_health: 50.0,
            buff_min_health: 35.0,
        }
    }
}

/// Tunables of the aggressive strategy's target lock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggressiveConfig {
    pub thresholds: ResponseThresholds,
    /// Added to combat distance to form the strategy's range
    pub range_bonus: f32,
    /// Upper bound of the strategy's range
    pub range_cap: f32,
    /// Preference window for the area of the previous target
    pub stability_secs: f32,
    /// Preference window when the previous target was rare or unique
    pub elite_stability_secs: f32,
    /// Radius around the previous target that counts as "the same area"
    pub stability_radius: f32,
    /// Radius used to count neighbours when scoring density
    pub density_radius: f32,
    /// Fraction of the range considered "close" when picking new targets
    pub close_fraction: f32,
    /// A locked target must move this far before its tracked position updates
    pub reposition_threshold: f32,
    /// How long a locked target may stay unseen before the lock is released
    pub grace_secs: f32,
    /// A lock is released when its tracked position is this far from the player
    pub max_lock_distance: f32,
    /// Search radius multiplier used to keep sight of a locked target
    pub lock_search_multiplier: f32,
}

impl Default for AggressiveConfig {
    fn default() -> Self {
        Self {
            thresholds: ResponseThresholds {
                defensive_health: 25.0,
                crowd_size: 8,
                crowd_health: 40.0,
                buff_min_health: 70.0,
            },
            range_bonus: 15.0,
            range_cap: 60.0,
            stability_secs: 1.5,
            elite_stability_secs: 5.0,
            stability_radius: 30.0,
            density_radius: 20.0,
            close_fraction: 0.7,
            reposition_threshold: 25.0,
            grace_secs: 3.0,
            max_lock_distance: 150.0,
            lock_search_multiplier: 2.5,
        }
    }
}

/// A display-name pattern that marks a monster as a priority target.
/// Higher rank wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityTarget {
    pub name: String,
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub strategy: StrategyKind,
    /// Prefer single high-value targets over dense groups
    pub focus_fire: bool,
    pub maintain_buffs: bool,
    /// Radius used to count enemies around the player
    pub nearby_radius: f32,
    /// Search range multiplier when nothing is in range but monsters remain
    pub expanded_search_multiplier: f32,
    /// Distance kept from a locked priority target
    pub engage_distance: f32,
    /// Relocate when a spot is this many times heavier than the current one
    pub reposition_ratio: f32,
    pub max_reposition_distance: f32,
    /// Farthest distance the action will chase the last target
    pub max_chase_distance: f32,
    pub standard: ResponseThresholds,
    pub aggressive: AggressiveConfig,
    pub priority_targets: Vec<PriorityTarget>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Standard,
            focus_fire: true,
            maintain_buffs: true,
            nearby_radius: 30.0,
            expanded_search_multiplier: 2.5,
            engage_distance: 30.0,
            reposition_ratio: 1.25,
            max_reposition_distance: 200.0,
            max_chase_distance: 300.0,
            standard: ResponseThresholds::default(),
            aggressive: AggressiveConfig::default(),
            priority_targets: Vec::new(),
        }
    }
}

/// One bound skill slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSlotConfig {
    pub key: Key,
    #[serde(default)]
    pub role: SkillRole,
    #[serde(default)]
    pub cast: CastType,
    /// Used for navigation
    #[serde(default)]
    pub movement: bool,
    /// Minimum time between two uses
    #[serde(default = "default_skill_delay")]
    pub min_delay_ms: u64,
    /// Skip casting while the player already has this buff
    #[serde(default)]
    pub buff: Option<String>,
}

fn default_skill_delay() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Toggles ground-item labels
    pub loot_toggle: Key,
    /// Closes open panels / cancels a held item
    pub close_panels: Key,
    /// Held while clicking to move items between inventories
    pub transfer_modifier: Key,
    /// Movement key used when no movement slot is ready
    pub fallback_move: Key,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            loot_toggle: Key::new("Z"),
            close_panels: Key::new("Escape"),
            transfer_modifier: Key::new("Ctrl"),
            fallback_move: Key::new("E"),
        }
    }
}

/// Identity substrings used to recognise designated entities, plus the
/// names of the anchor's state signals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub progress_anchor: String,
    pub stash: String,
    pub portal: String,
    pub map_device: String,
    pub active_signal: String,
    pub ending_signal: String,
    pub phase_signal: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            progress_anchor: "ProgressAnchor".to_string(),
            stash: "Stash".to_string(),
            portal: "Portal".to_string(),
            map_device: "MapDevice".to_string(),
            active_signal: "active".to_string(),
            ending_signal: "ending".to_string(),
            phase_signal: "phase".to_string(),
        }
    }
}

/// Known centre of an encounter area, used as a fallback navigation anchor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaCenter {
    pub area: String,
    pub center: [f32; 2],
}

/// Complete agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub navigation: NavigationConfig,
    pub timing: TimingConfig,
    pub run: RunConfig,
    pub combat: CombatConfig,
    pub skills: Vec<SkillSlotConfig>,
    pub keys: KeyConfig,
    pub identities: IdentityConfig,
    pub areas: Vec<AreaCenter>,
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AgentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Centre position configured for an area, if any
    pub fn area_center(&self, area_name: &str) -> Option<GridPos> {
        self.areas
            .iter()
            .find(|a| a.area == area_name)
            .map(|a| Vec2::new(a.center[0], a.center[1]))
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let nav = &self.navigation;
        if nav.chunk_size == 0 {
            return Err(AgentError::Config("chunk_size must be positive".into()));
        }
        if nav.terrain_subdivision == 0 {
            return Err(AgentError::Config(
                "terrain_subdivision must be positive".into(),
            ));
        }
        if nav.node_size <= nav.waypoint_pop_radius {
            return Err(AgentError::Config(format!(
                "node_size ({}) should exceed waypoint_pop_radius ({})",
                nav.node_size, nav.waypoint_pop_radius
            )));
        }
        if nav.view_distance <= 0.0 || nav.combat_distance <= 0.0 {
            return Err(AgentError::Config(
                "view_distance and combat_distance must be positive".into(),
            ));
        }

        for (name, t) in [
            ("standard", &self.combat.standard),
            ("aggressive", &self.combat.aggressive.thresholds),
        ] {
            if t.defensive_health > t.crowd_health {
                return Err(AgentError::Config(format!(
                    "{name}: defensive_health ({}) should be <= crowd_health ({})",
                    t.defensive_health, t.crowd_health
                )));
            }
        }

        let aggressive = &self.combat.aggressive;
        if aggressive.lock_search_multiplier < 1.0 {
            return Err(AgentError::Config(
                "lock_search_multiplier must be at least 1.0".into(),
            ));
        }
        if aggressive.elite_stability_secs < aggressive.stability_secs {
            return Err(AgentError::Config(
                "elite_stability_secs should be >= stability_secs".into(),
            ));
        }

        if self.run.wave_limit == 0 {
            return Err(AgentError::Config("wave_limit must be positive".into()));
        }

        Ok(())
    }
}
