use crate::core::activation::VendorDirectory;
use crate::core::market::WeekOverview;
use crate::domain::model::{ScanOutcome, WeekKey};
use askama::Template;
use url::Url;

const WEEKDAY_NAMES: [&str; 7] = [
    "Montag",
    "Dienstag",
    "Mittwoch",
    "Donnerstag",
    "Freitag",
    "Samstag",
    "Sonntag",
];

#[derive(Debug, Clone)]
pub struct DayView {
    pub name: &'static str,
    pub date: String,
    pub iso: String,
    pub is_today: bool,
}

#[derive(Debug, Clone)]
pub struct VendorCard {
    pub id: String,
    pub name: String,
    pub has_image: bool,
    pub image_url: String,
}

#[derive(Template, Debug)]
#[template(path = "week.html")]
pub struct WeekPage {
    pub title: String,
    pub week: u32,
    pub year: i32,
    pub is_current: bool,
    pub days: Vec<DayView>,
    pub prev_url: String,
    pub next_url: String,
    pub today_url: String,
    pub vendors: Vec<VendorCard>,
    pub has_notice: bool,
    pub notice: String,
}

#[derive(Template, Debug)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub title: String,
}

/// `/Assets/<image>` with every path segment percent-encoded.
pub fn asset_url(image: &str) -> String {
    let segments = image
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."));
    let encoded = Url::parse("http://localhost/Assets").ok().and_then(|mut url| {
        url.path_segments_mut().ok()?.extend(segments);
        Some(url.path().to_string())
    });
    encoded.unwrap_or_else(|| "/Assets/".to_string())
}

pub fn week_url(key: WeekKey) -> String {
    format!("?week={}&year={}", key.week(), key.year())
}

/// Short German message shown after a scan.
pub fn scan_notice(outcome: &ScanOutcome, directory: &VendorDirectory, persisted: bool) -> String {
    let mut notice = match outcome {
        ScanOutcome::Applied {
            vendor,
            week,
            active,
        } => {
            let name = directory
                .vendor(vendor)
                .map(|v| v.name.as_str())
                .unwrap_or(vendor.as_str());
            let state = if *active { "aktiv" } else { "nicht aktiv" };
            format!("{} ist in KW {} / {} {}.", name, week.week(), week.year(), state)
        }
        ScanOutcome::UnrecognizedVendor => "Unbekannter QR-Code.".to_string(),
        ScanOutcome::UnrecognizedAction { .. } => {
            "QR-Code ohne gültige Aktion (on/off).".to_string()
        }
    };
    if !persisted {
        notice.push_str(" Die Änderung konnte nicht gespeichert werden.");
    }
    notice
}

impl WeekPage {
    pub fn new(title: &str, overview: &WeekOverview, directory: &VendorDirectory) -> Self {
        let days = overview
            .days
            .iter()
            .zip(WEEKDAY_NAMES)
            .map(|(date, name)| DayView {
                name,
                date: date.format("%d.%m.%Y").to_string(),
                iso: date.format("%Y-%m-%d").to_string(),
                is_today: *date == overview.today,
            })
            .collect();

        let vendors = overview
            .active_vendors
            .iter()
            .map(|vendor| VendorCard {
                id: vendor.id.to_string(),
                name: vendor.name.clone(),
                has_image: vendor.image.is_some(),
                image_url: vendor.image.as_deref().map(asset_url).unwrap_or_default(),
            })
            .collect();

        let notice = overview
            .scan
            .as_ref()
            .map(|outcome| scan_notice(outcome, directory, overview.persisted));

        Self {
            title: title.to_string(),
            week: overview.displayed.week(),
            year: overview.displayed.year(),
            is_current: overview.displayed == overview.current,
            days,
            prev_url: week_url(overview.previous),
            next_url: week_url(overview.next),
            today_url: week_url(overview.current),
            vendors,
            has_notice: notice.is_some(),
            notice: notice.unwrap_or_default(),
        }
    }
}
