use crate::utils::error::MarktError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One ISO-8601 week, `(iso_year, iso_week)`.
///
/// Constructed through [`WeekKey::new`] or [`WeekKey::containing`], so the week
/// always exists in its year. Serialized as `"<isoYear>-<isoWeek>"`, which is
/// also the key format of the persisted activation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey {
    year: i32,
    week: u32,
}

impl WeekKey {
    pub fn new(year: i32, week: u32) -> Result<Self, MarktError> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|_| Self { year, week })
            .ok_or(MarktError::InvalidWeek {
                year,
                week: week as i64,
            })
    }

    /// The ISO week a calendar date belongs to. Early January and late
    /// December dates may land in the neighbouring ISO year.
    pub fn containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.week)
    }
}

impl FromStr for WeekKey {
    type Err = MarktError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MarktError::MalformedPersistedState {
            location: "week key".to_string(),
            message: format!("'{}' is not of the form <year>-<week>", s),
        };

        // rsplit so that negative years ("-44-12") still parse
        let (year, week) = s.rsplit_once('-').ok_or_else(malformed)?;
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let week: u32 = week.parse().map_err(|_| malformed())?;
        WeekKey::new(year, week)
    }
}

impl TryFrom<String> for WeekKey {
    type Error = MarktError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekKey> for String {
    fn from(key: WeekKey) -> Self {
        key.to_string()
    }
}

/// Stable vendor slug, e.g. `metzger`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(String);

impl VendorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VendorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Market stall as configured: id, display name and optional picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub image: Option<String>,
}

/// Sparse `week -> vendor -> active` map. Missing entries mean "not active".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivationRecord {
    weeks: BTreeMap<WeekKey, BTreeMap<VendorId, bool>>,
}

impl ActivationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_active(&self, key: WeekKey, vendor: &VendorId) -> bool {
        self.weeks
            .get(&key)
            .and_then(|vendors| vendors.get(vendor))
            .copied()
            .unwrap_or(false)
    }

    /// Writes one flag and returns the value it had before.
    pub fn set_active(&mut self, key: WeekKey, vendor: &VendorId, value: bool) -> bool {
        self.weeks
            .entry(key)
            .or_default()
            .insert(vendor.clone(), value)
            .unwrap_or(false)
    }

    /// Flips one flag and returns the new value.
    pub fn toggle_active(&mut self, key: WeekKey, vendor: &VendorId) -> bool {
        let value = !self.is_active(key, vendor);
        self.set_active(key, vendor, value);
        value
    }

    pub fn active_vendors(&self, key: WeekKey) -> impl Iterator<Item = &VendorId> {
        self.weeks
            .get(&key)
            .into_iter()
            .flat_map(|vendors| vendors.iter())
            .filter(|(_, active)| **active)
            .map(|(vendor, _)| vendor)
    }
}

/// What a QR scan asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorAction {
    On,
    Off,
}

impl FromStr for VendorAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(VendorAction::On),
            "off" => Ok(VendorAction::Off),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// How a scan is interpreted. Configured once per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// `action=on|off` sets the flag; a scan without a valid action is ignored.
    #[default]
    Explicit,
    /// Every scan flips the flag; any `action` value is ignored.
    Toggle,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Explicit => f.write_str("explicit"),
            ScanMode::Toggle => f.write_str("toggle"),
        }
    }
}

/// The `(uid, action)` pair carried by a scanned QR code URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub uid: String,
    pub action: Option<String>,
}

/// Result of applying a scan to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Applied {
        vendor: VendorId,
        week: WeekKey,
        active: bool,
    },
    UnrecognizedVendor,
    UnrecognizedAction {
        vendor: VendorId,
    },
}

impl ScanOutcome {
    pub fn applied_vendor(&self) -> Option<&VendorId> {
        match self {
            ScanOutcome::Applied { vendor, .. } => Some(vendor),
            _ => None,
        }
    }
}
