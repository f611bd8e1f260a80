use crate::core::market::PageRequest;
use crate::domain::model::ScanRequest;

/// Raw query string of the week page. Every field is taken as text so that
/// junk values fall back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default)]
pub struct PageParams {
    pub week: Option<String>,
    pub year: Option<String>,
    pub uid: Option<String>,
    pub action: Option<String>,
    /// older QR codes use `status` instead of `action`
    pub status: Option<String>,
    /// older QR codes use `teilnehmer` instead of `uid`
    pub teilnehmer: Option<String>,
}

const MAX_YEAR: i32 = 9999;

/// Digits only, like the printed QR links. Signs, spaces and decimals are
/// treated as absent.
fn parse_digits(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl PageParams {
    /// Builds the params from decoded `key=value` pairs. A repeated key keeps
    /// its last value; unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs.into_iter().fold(Self::default(), |mut params, (key, value)| {
            let slot = match key.as_ref() {
                "week" => Some(&mut params.week),
                "year" => Some(&mut params.year),
                "uid" => Some(&mut params.uid),
                "action" => Some(&mut params.action),
                "status" => Some(&mut params.status),
                "teilnehmer" => Some(&mut params.teilnehmer),
                _ => None,
            };
            if let Some(slot) = slot {
                *slot = Some(value.into());
            }
            params
        })
    }

    pub fn into_request(self) -> PageRequest {
        let week = parse_digits(self.week.as_deref());
        let year = parse_digits(self.year.as_deref())
            .filter(|year| (1..=MAX_YEAR as i64).contains(year))
            .map(|year| year as i32);

        let uid = non_blank(self.uid.as_ref()).or_else(|| non_blank(self.teilnehmer.as_ref()));
        let action = non_blank(self.action.as_ref()).or_else(|| non_blank(self.status.as_ref()));

        PageRequest {
            year,
            week,
            scan: uid.map(|uid| ScanRequest { uid, action }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> PageParams {
        PageParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn numeric_values_are_parsed() {
        let request = params(&[("week", "7"), ("year", "2025")]).into_request();
        assert_eq!(request.week, Some(7));
        assert_eq!(request.year, Some(2025));
        assert!(request.scan.is_none());
    }

    #[test]
    fn non_numeric_values_fall_back() {
        for bad in ["", "abc", "-1", "+3", "4.5", "99999999999999999999"] {
            let request = params(&[("week", bad), ("year", bad)]).into_request();
            assert_eq!(request.week, None, "week {:?}", bad);
            assert_eq!(request.year, None, "year {:?}", bad);
        }
        assert_eq!(params(&[("year", "0")]).into_request().year, None);
        assert_eq!(params(&[("year", "10000")]).into_request().year, None);
        assert_eq!(params(&[("week", "0")]).into_request().week, Some(0));
    }

    #[test]
    fn alternate_parameter_names() {
        let request = params(&[("teilnehmer", "UID_B"), ("status", "off")]).into_request();
        assert_eq!(
            request.scan,
            Some(ScanRequest {
                uid: "UID_B".to_string(),
                action: Some("off".to_string()),
            })
        );

        let request = params(&[
            ("uid", "UID_A"),
            ("teilnehmer", "UID_B"),
            ("action", "on"),
            ("status", "off"),
        ])
        .into_request();
        let scan = request.scan.unwrap();
        assert_eq!(scan.uid, "UID_A");
        assert_eq!(scan.action.as_deref(), Some("on"));
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let request = params(&[
            ("uid", "UID_M"),
            ("action", "off"),
            ("week", "9"),
            ("week", "10"),
            ("action", "on"),
            ("utm_source", "flyer"),
        ])
        .into_request();
        assert_eq!(request.week, Some(10));
        let scan = request.scan.unwrap();
        assert_eq!(scan.uid, "UID_M");
        assert_eq!(scan.action.as_deref(), Some("on"));
    }

    #[test]
    fn blank_uid_is_no_scan() {
        assert!(params(&[("uid", "  "), ("action", "on")]).into_request().scan.is_none());
    }
}
