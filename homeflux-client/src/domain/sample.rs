use serde::{Deserialize, Serialize};
use time::{macros::format_description, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// One sampling pass: the measurements that could be read, plus the time of sampling.
///
/// A `None` field is omitted from the JSON body entirely, so the receiving side can
/// tell "no data this tick" apart from a real zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(with = "ts_format")]
    pub ts: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_w: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv_w: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_import_wh_total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_export_wh_total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv_wh_total: Option<u64>,
}

impl Sample {
    /// Empty sample stamped with `ts`, converted to UTC and truncated to whole seconds.
    pub fn new(ts: OffsetDateTime) -> Self {
        let ts = ts.to_offset(UtcOffset::UTC);
        Self {
            ts: ts - Duration::nanoseconds(i64::from(ts.nanosecond())),
            grid_w: None,
            pv_w: None,
            grid_import_wh_total: None,
            grid_export_wh_total: None,
            pv_wh_total: None,
        }
    }

    /// Sample with every measurement present and zero, used to probe the endpoint.
    pub fn zeroed(ts: OffsetDateTime) -> Self {
        Self {
            grid_w: Some(0),
            pv_w: Some(0),
            grid_import_wh_total: Some(0),
            grid_export_wh_total: Some(0),
            pv_wh_total: Some(0),
            ..Self::new(ts)
        }
    }

    /// Number of measurement fields present (the timestamp is not counted).
    pub fn measurement_count(&self) -> usize {
        [
            self.grid_w.is_some(),
            self.pv_w.is_some(),
            self.grid_import_wh_total.is_some(),
            self.grid_export_wh_total.is_some(),
            self.pv_wh_total.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    pub fn has_measurements(&self) -> bool {
        self.measurement_count() > 0
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SSZ` in UTC.
pub fn format_ts(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    ts.to_offset(UtcOffset::UTC)
        .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))
}

/// Parse a `YYYY-MM-DDTHH:MM:SSZ` timestamp.
pub fn parse_ts(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"),
    )
    .map(PrimitiveDateTime::assume_utc)
}

mod ts_format {
    use serde::{de, ser, Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(ts: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let text = super::format_ts(*ts).map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_ts(&text).map_err(de::Error::custom)
    }
}
