//! Application configuration
//!
//! Configuration is layered with the `config` crate: built-in defaults,
//! then `config/default` and `config/{RUN_MODE}` files, then `DEMOBOOK__*`
//! environment variables. `DATABASE_URL` is honoured as a shortcut for
//! `database.url`.

use crate::error::AppError;
use crate::models::{Contractor, Slot, SlotId};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use config::{
    builder::{ConfigBuilder, DefaultState},
    Config, ConfigError, Environment, File,
};
use serde::Deserialize;
use std::env;
use tracing::{debug, warn};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub scheduling: SchedulingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL. Required for the postgres backend.
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply embedded migrations at startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_run_migrations() -> bool {
    true
}

/// Which booking store backs the scheduler
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Contractors registered at startup by the memory backend.
    /// The postgres backend reads the `contractors` table instead.
    #[serde(default)]
    pub contractors: Vec<Contractor>,
}

/// Longest booking horizon accepted
const MAX_HORIZON_DAYS: u32 = 366;

/// Latest local hour the booking window may close
const LATEST_CLOSING_HOUR: u32 = 23;

/// Raw scheduling parameters as read from configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulingConfig {
    /// IANA timezone the business operates in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// First hour of the booking window (local, inclusive)
    #[serde(default = "default_business_start_hour")]
    pub business_start_hour: u32,

    /// Hour the booking window closes (local, exclusive)
    #[serde(default = "default_business_end_hour")]
    pub business_end_hour: u32,

    /// Length of one demo
    #[serde(default = "default_slot_duration")]
    pub slot_duration_minutes: u32,

    /// How many days ahead slots are offered
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_business_start_hour() -> u32 {
    9
}

fn default_business_end_hour() -> u32 {
    17
}

fn default_slot_duration() -> u32 {
    30
}

fn default_horizon_days() -> u32 {
    14
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            business_start_hour: default_business_start_hour(),
            business_end_hour: default_business_end_hour(),
            slot_duration_minutes: default_slot_duration(),
            horizon_days: default_horizon_days(),
        }
    }
}

impl SchedulingConfig {
    /// Validate the raw values into a policy the scheduler can use
    pub fn validate(&self) -> Result<SchedulingPolicy, AppError> {
        let timezone: Tz = self.timezone.parse().map_err(|e| {
            reject(format!("unknown timezone '{}': {}", self.timezone, e))
        })?;

        // Slots must end on the same local day they start
        if self.business_start_hour >= self.business_end_hour
            || self.business_end_hour > LATEST_CLOSING_HOUR
        {
            return Err(reject(format!(
                "business hours {}-{} are not a valid window (closing hour at most {})",
                self.business_start_hour, self.business_end_hour, LATEST_CLOSING_HOUR
            )));
        }

        let window_minutes = (self.business_end_hour - self.business_start_hour) * 60;
        if self.slot_duration_minutes == 0 || self.slot_duration_minutes > window_minutes {
            return Err(reject(format!(
                "slot_duration_minutes {} must be between 1 and {}",
                self.slot_duration_minutes, window_minutes
            )));
        }

        if self.horizon_days == 0 || self.horizon_days > MAX_HORIZON_DAYS {
            return Err(reject(format!(
                "horizon_days {} must be between 1 and {}",
                self.horizon_days, MAX_HORIZON_DAYS
            )));
        }

        debug!(
            timezone = %timezone,
            "Scheduling window {}:00-{}:00, {} minute slots, {} day horizon",
            self.business_start_hour,
            self.business_end_hour,
            self.slot_duration_minutes,
            self.horizon_days
        );

        Ok(SchedulingPolicy {
            timezone,
            business_start_hour: self.business_start_hour,
            business_end_hour: self.business_end_hour,
            slot_duration_minutes: self.slot_duration_minutes,
            horizon_days: self.horizon_days,
        })
    }
}

fn reject(message: String) -> AppError {
    warn!("Rejected scheduling configuration: {}", message);
    AppError::Config(message)
}

/// Validated scheduling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingPolicy {
    timezone: Tz,
    business_start_hour: u32,
    business_end_hour: u32,
    slot_duration_minutes: u32,
    horizon_days: u32,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            business_start_hour: default_business_start_hour(),
            business_end_hour: default_business_end_hour(),
            slot_duration_minutes: default_slot_duration(),
            horizon_days: default_horizon_days(),
        }
    }
}

impl SchedulingPolicy {
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn business_start_hour(&self) -> u32 {
        self.business_start_hour
    }

    pub fn business_end_hour(&self) -> u32 {
        self.business_end_hour
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    pub fn slot_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_duration_minutes))
    }

    /// Minutes after local midnight where the window opens
    pub fn window_start_minutes(&self) -> u32 {
        self.business_start_hour * 60
    }

    /// Minutes after local midnight where the window closes
    pub fn window_end_minutes(&self) -> u32 {
        self.business_end_hour * 60
    }

    /// Today's date in the business timezone
    pub fn local_today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.timezone.from_utc_datetime(&now.naive_utc()).date_naive()
    }

    /// First and last bookable dates. Today is never bookable.
    pub fn bookable_dates(&self, now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
        let today = self.local_today(now);
        (
            today + Duration::days(1),
            today + Duration::days(i64::from(self.horizon_days)),
        )
    }

    /// Slot start offsets in minutes after local midnight.
    ///
    /// A trailing remainder shorter than one slot is dropped.
    pub fn slot_start_minutes(&self) -> impl Iterator<Item = u32> {
        let (start, end, step) = (
            self.window_start_minutes(),
            self.window_end_minutes(),
            self.slot_duration_minutes,
        );
        (0..)
            .map(move |k| start + k * step)
            .take_while(move |m| m + step <= end)
    }

    /// Convert a local business time to UTC; `None` inside a DST gap.
    /// Ambiguous times resolve to the earliest instant.
    pub fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.timezone
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Build the slot starting at `local_start`, not yet checked for conflicts
    pub fn build_slot(&self, local_start: NaiveDateTime) -> Option<Slot> {
        let starts_at = self.to_utc(local_start)?;
        let local_end = local_start + self.slot_duration();

        Some(Slot {
            id: SlotId::new(local_start),
            date: local_start.date(),
            start_time: local_start.time(),
            end_time: local_end.time(),
            starts_at,
            ends_at: starts_at + self.slot_duration(),
            available: true,
        })
    }

    /// Resolve a requested slot id into a slot this policy would generate at `now`.
    ///
    /// Fails with [`AppError::InvalidSlot`] for weekends, dates outside the
    /// bookable range, times off the slot grid and nonexistent local times.
    pub fn resolve_slot(&self, id: &SlotId, now: DateTime<Utc>) -> Result<Slot, AppError> {
        let invalid = |reason: &str| AppError::InvalidSlot(format!("{}: {}", id, reason));
        let date = id.date();
        let time = id.time();

        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Err(invalid("demos are only held on weekdays"));
        }

        let (first, last) = self.bookable_dates(now);
        if date < first || date > last {
            return Err(invalid(&format!(
                "date must be between {} and {}",
                first, last
            )));
        }

        let minutes = time.hour() * 60 + time.minute();
        if time.second() != 0 || !self.slot_start_minutes().any(|m| m == minutes) {
            return Err(invalid("not a slot start within business hours"));
        }

        self.build_slot(id.local_start())
            .ok_or_else(|| invalid("local time does not exist in the business timezone"))
    }

    /// Label such as `9 AM - 5 PM (Weekdays)`
    pub fn business_hours_label(&self) -> String {
        format!(
            "{} - {} (Weekdays)",
            hour_label(self.business_start_hour),
            hour_label(self.business_end_hour)
        )
    }
}

fn hour_label(hour: u32) -> String {
    let suffix = if hour % 24 < 12 { "AM" } else { "PM" };
    let h = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{} {}", h, suffix)
}

impl AppConfig {
    /// Load configuration from environment and optional config files
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Self::defaults()?
            // Load config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables with DEMOBOOK__ prefix
            .add_source(
                Environment::with_prefix("DEMOBOOK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Builder preloaded with every default value
    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.run_migrations", true)?
            .set_default("storage.backend", "postgres")?
            .set_default("scheduling.timezone", "America/New_York")?
            .set_default("scheduling.business_start_hour", 9)?
            .set_default("scheduling.business_end_hour", 17)?
            .set_default("scheduling.slot_duration_minutes", 30)?
            .set_default("scheduling.horizon_days", 14)
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheduling_policy() {
        let policy = SchedulingConfig::default().validate().unwrap();
        assert_eq!(policy, SchedulingPolicy::default());
        assert_eq!(policy.slot_duration(), Duration::minutes(30));
        assert_eq!(policy.window_start_minutes(), 540);
        assert_eq!(policy.window_end_minutes(), 1020);
        assert_eq!(policy.business_hours_label(), "9 AM - 5 PM (Weekdays)");
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let config = SchedulingConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_inverted_window() {
        let config = SchedulingConfig {
            business_start_hour: 17,
            business_end_hour: 9,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SchedulingConfig {
            slot_duration_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_must_close_before_midnight() {
        let config = SchedulingConfig {
            business_start_hour: 23,
            business_end_hour: 24,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let policy = SchedulingConfig {
            business_start_hour: 22,
            business_end_hour: 23,
            ..Default::default()
        }
        .validate()
        .unwrap();

        // Latest slot of the day still ends after it starts
        let last = policy.slot_start_minutes().last().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
        let start = date.and_hms_opt(last / 60, last % 60, 0).unwrap();
        let slot = policy.build_slot(start).unwrap();
        assert_eq!(slot.id.to_string(), "2026-01-13-22:30");
        assert!(slot.end_time > slot.start_time);
        assert_eq!(slot.end_time.hour(), 23);
    }

    #[test]
    fn test_storage_contractors_from_config() {
        let toml = r#"
            [storage]
            backend = "memory"

            [[storage.contractors]]
            id = 1
            email = "office@lakeview-builders.test"
            company_name = "Lakeview Builders"

            [[storage.contractors]]
            id = 2
            email = "dana@acme-roofing.test"
            company_name = "Acme Roofing"
            contact_name = "Dana"
        "#;

        let config: AppConfig = AppConfig::defaults()
            .unwrap()
            .add_source(File::from_str(toml, ::config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.contractors.len(), 2);
        assert_eq!(config.storage.contractors[0].contact_name, None);
        assert_eq!(config.storage.contractors[1].greeting_name(), "Dana");
        assert_eq!(config.server.port, 8080);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_storage_contractors_default_empty() {
        let config: AppConfig = AppConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(config.storage.contractors.is_empty());
    }

    #[test]
    fn test_hour_labels() {
        assert_eq!(hour_label(0), "12 AM");
        assert_eq!(hour_label(12), "12 PM");
        assert_eq!(hour_label(13), "1 PM");
        assert_eq!(hour_label(24), "12 AM");
    }

    #[test]
    fn test_local_today_uses_business_timezone() {
        let policy = SchedulingPolicy::default();
        // 03:00 UTC on the 13th is still the 12th in New York
        let now = Utc.with_ymd_and_hms(2026, 1, 13, 3, 0, 0).unwrap();
        assert_eq!(
            policy.local_today(now),
            NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
        );
    }

    fn friday_noon() -> DateTime<Utc> {
        // Friday 2026-01-09 12:00 in New York
        Utc.with_ymd_and_hms(2026, 1, 9, 17, 0, 0).unwrap()
    }

    fn slot(s: &str) -> SlotId {
        SlotId::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_slot() {
        let policy = SchedulingPolicy::default();
        let resolved = policy
            .resolve_slot(&slot("2026-01-12-09:00"), friday_noon())
            .unwrap();

        // EST is UTC-5 in January
        assert_eq!(
            resolved.starts_at,
            Utc.with_ymd_and_hms(2026, 1, 12, 14, 0, 0).unwrap()
        );
        assert_eq!(resolved.ends_at - resolved.starts_at, Duration::minutes(30));
        assert_eq!(resolved.id.to_string(), "2026-01-12-09:00");
    }

    #[test]
    fn test_resolve_slot_rejections() {
        let policy = SchedulingPolicy::default();
        let now = friday_noon();

        for id in [
            "2026-01-10-09:00", // Saturday
            "2026-01-09-15:00", // today
            "2026-01-26-09:00", // beyond horizon
            "2026-01-12-08:30", // before opening
            "2026-01-12-17:00", // at closing
            "2026-01-12-09:15", // off the grid
        ] {
            let err = policy.resolve_slot(&slot(id), now).unwrap_err();
            assert!(matches!(err, AppError::InvalidSlot(_)), "{id}");
        }

        // Last slot of the day ends exactly at closing
        assert!(policy.resolve_slot(&slot("2026-01-12-16:30"), now).is_ok());
        // Horizon is inclusive
        assert!(policy.resolve_slot(&slot("2026-01-23-09:00"), now).is_ok());
    }

    #[test]
    fn test_slot_start_minutes_drops_partial_tail() {
        let policy = SchedulingConfig {
            slot_duration_minutes: 45,
            ..Default::default()
        }
        .validate()
        .unwrap();

        let starts: Vec<u32> = policy.slot_start_minutes().collect();
        // 8 hours / 45 minutes = 10 full slots, the last ending at 16:30
        assert_eq!(starts.len(), 10);
        assert_eq!(*starts.last().unwrap() + 45, 16 * 60 + 30);
    }

    #[test]
    fn test_dst_gap_is_not_bookable() {
        let policy = SchedulingConfig {
            timezone: "Asia/Jerusalem".to_string(),
            business_start_hour: 0,
            business_end_hour: 6,
            ..Default::default()
        }
        .validate()
        .unwrap();

        // Clocks jump from 02:00 to 03:00 on Friday 2026-03-27
        let now = Utc.with_ymd_and_hms(2026, 3, 24, 12, 0, 0).unwrap();
        let err = policy
            .resolve_slot(&slot("2026-03-27-02:30"), now)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSlot(_)));
        assert!(policy.resolve_slot(&slot("2026-03-27-03:00"), now).is_ok());
    }
}
