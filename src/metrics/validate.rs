use super::error::{MetricsError, MetricsResult};
use super::{MAX_TZ_OFFSET_HOURS, MAX_URL_LENGTH, MAX_VISIT_LIMIT, MIN_TZ_OFFSET_HOURS};

pub fn validate_url(url: &str) -> MetricsResult<()> {
    if url.is_empty() {
        return Err(MetricsError::invalid("URL cannot be empty"));
    }
    if url.chars().count() > MAX_URL_LENGTH {
        return Err(MetricsError::invalid(format!(
            "URL exceeds maximum length of {MAX_URL_LENGTH} characters"
        )));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(MetricsError::invalid(
            "URL must start with http:// or https://",
        ));
    }
    Ok(())
}

/// Offsets are whole or fractional hours in [-12, 14].
pub fn validate_timezone_offset(offset: Option<f64>) -> MetricsResult<()> {
    match offset {
        Some(hours) if !(MIN_TZ_OFFSET_HOURS..=MAX_TZ_OFFSET_HOURS).contains(&hours) => {
            Err(MetricsError::invalid(format!(
                "Timezone offset must be between {MIN_TZ_OFFSET_HOURS} and {MAX_TZ_OFFSET_HOURS} hours"
            )))
        }
        _ => Ok(()),
    }
}

pub fn validate_pagination(limit: i64, offset: i64) -> MetricsResult<()> {
    if !(1..=MAX_VISIT_LIMIT).contains(&limit) {
        return Err(MetricsError::invalid(format!(
            "Limit must be between 1 and {MAX_VISIT_LIMIT}"
        )));
    }
    if offset < 0 {
        return Err(MetricsError::invalid("Offset must be non-negative"));
    }
    Ok(())
}

pub fn validate_counts(link_count: i64, word_count: i64, image_count: i64) -> MetricsResult<()> {
    for (name, value) in [
        ("link_count", link_count),
        ("word_count", word_count),
        ("image_count", image_count),
    ] {
        if value < 0 {
            return Err(MetricsError::invalid(format!(
                "{name} must be non-negative"
            )));
        }
    }
    Ok(())
}
