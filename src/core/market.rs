use crate::core::activation::{resolve_action, ActivationStore, VendorDirectory};
use crate::core::week_clock::{self, Direction};
use crate::domain::model::{ScanMode, ScanOutcome, ScanRequest, Vendor, WeekKey};
use crate::domain::ports::{ActivationStorage, Clock};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;

/// Everything a page request can ask for, already parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub year: Option<i32>,
    pub week: Option<i64>,
    pub scan: Option<ScanRequest>,
}

/// Data the view layer renders for one week.
#[derive(Debug, Clone)]
pub struct WeekOverview {
    pub displayed: WeekKey,
    pub current: WeekKey,
    pub today: NaiveDate,
    pub days: [NaiveDate; 7],
    pub previous: WeekKey,
    pub next: WeekKey,
    pub active_vendors: Vec<Vendor>,
    pub scan: Option<ScanOutcome>,
    /// `false` when a scan was applied but could not be persisted.
    pub persisted: bool,
}

pub struct MarketService {
    clock: Arc<dyn Clock>,
    directory: VendorDirectory,
    mode: ScanMode,
}

impl MarketService {
    pub fn new(clock: Arc<dyn Clock>, directory: VendorDirectory, mode: ScanMode) -> Self {
        Self {
            clock,
            directory,
            mode,
        }
    }

    pub fn directory(&self) -> &VendorDirectory {
        &self.directory
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Resolves the displayed week, applies a scan to the current week if
    /// one is present, and reads the active vendors of the displayed week.
    pub async fn handle(
        &self,
        storage: &dyn ActivationStorage,
        request: &PageRequest,
    ) -> Result<WeekOverview> {
        let today = self.clock.today();
        let current = week_clock::current_week(today);
        let displayed = week_clock::resolve_display(request.year, request.week, current);

        let store = ActivationStore::new(storage);
        let mut record = store.load().await;
        let mut persisted = true;

        let scan = match &request.scan {
            Some(scan) => {
                let (updated, outcome) =
                    resolve_action(record, &self.directory, scan, current, self.mode);
                record = updated;
                self.log_outcome(scan, &outcome);
                if outcome.applied_vendor().is_some() {
                    persisted = store.save(&record).await;
                }
                Some(outcome)
            }
            None => None,
        };

        let active_vendors = self
            .directory
            .vendors()
            .iter()
            .filter(|vendor| record.is_active(displayed, &vendor.id))
            .cloned()
            .collect();

        Ok(WeekOverview {
            displayed,
            current,
            today,
            days: week_clock::weekdays_of(displayed)?,
            previous: week_clock::adjacent(displayed, Direction::Previous),
            next: week_clock::adjacent(displayed, Direction::Next),
            active_vendors,
            scan,
            persisted,
        })
    }

    fn log_outcome(&self, scan: &ScanRequest, outcome: &ScanOutcome) {
        match outcome {
            ScanOutcome::Applied {
                vendor,
                week,
                active,
            } => {
                tracing::info!(vendor = %vendor, week = %week, active, mode = %self.mode, "✅ Scan applied");
            }
            ScanOutcome::UnrecognizedVendor => {
                tracing::warn!(uid = %scan.uid, "Scan with unknown uid ignored");
            }
            ScanOutcome::UnrecognizedAction { vendor } => {
                tracing::warn!(
                    vendor = %vendor,
                    action = ?scan.action,
                    "Scan without a usable on/off action ignored"
                );
            }
        }
    }
}
