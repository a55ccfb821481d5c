use super::record::Record;

/// 1.0 for peer-reviewed records, 0.0 otherwise.
pub fn refereed_boost(record: &Record) -> f64 {
    if record.refereed {
        1.0
    } else {
        0.0
    }
}
