use crate::domain::model::{
    ActivationRecord, ScanMode, ScanOutcome, ScanRequest, Vendor, VendorAction, VendorId, WeekKey,
};
use crate::domain::ports::ActivationStorage;
use std::collections::HashMap;

/// Load/save front for an [`ActivationStorage`] that never fails a request.
///
/// Read problems degrade to an empty record, write problems are logged and
/// reported as `false`.
pub struct ActivationStore<'a> {
    storage: &'a dyn ActivationStorage,
}

impl<'a> ActivationStore<'a> {
    pub fn new(storage: &'a dyn ActivationStorage) -> Self {
        Self { storage }
    }

    pub async fn load(&self) -> ActivationRecord {
        match self.storage.load().await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    location = %self.storage.describe(),
                    category = ?e.category(),
                    "⚠️ Ignoring stored activations: {}",
                    e
                );
                ActivationRecord::default()
            }
        }
    }

    pub async fn save(&self, record: &ActivationRecord) -> bool {
        match self.storage.save(record).await {
            Ok(()) => {
                tracing::debug!(
                    location = %self.storage.describe(),
                    weeks = record.week_count(),
                    "Activations saved"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    location = %self.storage.describe(),
                    severity = ?e.severity(),
                    "❌ Activations not persisted, change only visible in this response: {}",
                    e
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                false
            }
        }
    }
}

/// The configured vendors plus the QR uid that belongs to each of them.
#[derive(Debug, Clone, Default)]
pub struct VendorDirectory {
    vendors: Vec<Vendor>,
    by_uid: HashMap<String, VendorId>,
}

impl VendorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a vendor. `uid` is optional; vendors without one cannot be
    /// switched by scanning.
    pub fn with_vendor(mut self, vendor: Vendor, uid: Option<&str>) -> Self {
        if let Some(uid) = uid.map(str::trim).filter(|uid| !uid.is_empty()) {
            self.by_uid.insert(uid.to_string(), vendor.id.clone());
        }
        self.vendors.push(vendor);
        self
    }

    pub fn lookup_uid(&self, uid: &str) -> Option<&VendorId> {
        self.by_uid.get(uid.trim())
    }

    pub fn vendor(&self, id: &VendorId) -> Option<&Vendor> {
        self.vendors.iter().find(|vendor| &vendor.id == id)
    }

    pub fn vendors(&self) -> &[Vendor] {
        &self.vendors
    }

    pub fn scannable_count(&self) -> usize {
        self.by_uid.len()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for VendorDirectory {
    /// `(uid, vendor id)` pairs; the vendor name defaults to the id.
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(pairs: I) -> Self {
        pairs.into_iter().fold(Self::new(), |directory, (uid, id)| {
            directory.with_vendor(
                Vendor {
                    id: VendorId::from(id),
                    name: id.to_string(),
                    image: None,
                },
                Some(uid),
            )
        })
    }
}

/// Explicit contract: sets the flag to what the scan asked for. Idempotent.
pub fn set_active_explicit(
    record: &mut ActivationRecord,
    key: WeekKey,
    vendor: &VendorId,
    action: VendorAction,
) -> bool {
    let value = action == VendorAction::On;
    record.set_active(key, vendor, value);
    value
}

/// Toggle contract: flips the flag. Not idempotent; a repeated delivery undoes it.
pub fn toggle_active(record: &mut ActivationRecord, key: WeekKey, vendor: &VendorId) -> bool {
    record.toggle_active(key, vendor)
}

/// Applies a QR scan to the record for `current`, the real-world week of the
/// request. The displayed week never matters here.
///
/// Unknown uids and (in explicit mode) unknown actions return the record
/// untouched.
pub fn resolve_action(
    mut record: ActivationRecord,
    directory: &VendorDirectory,
    scan: &ScanRequest,
    current: WeekKey,
    mode: ScanMode,
) -> (ActivationRecord, ScanOutcome) {
    let Some(vendor) = directory.lookup_uid(&scan.uid).cloned() else {
        return (record, ScanOutcome::UnrecognizedVendor);
    };

    let active = match mode {
        ScanMode::Explicit => {
            let parsed = scan
                .action
                .as_deref()
                .map(str::parse::<VendorAction>);
            match parsed {
                Some(Ok(action)) => set_active_explicit(&mut record, current, &vendor, action),
                _ => return (record, ScanOutcome::UnrecognizedAction { vendor }),
            }
        }
        ScanMode::Toggle => {
            if let Some(action) = &scan.action {
                tracing::debug!(action = %action, "Toggle mode ignores the action parameter");
            }
            toggle_active(&mut record, current, &vendor)
        }
    };

    (
        record,
        ScanOutcome::Applied {
            vendor,
            week: current,
            active,
        },
    )
}
