//! Exposition metric name normalization
//!
//! Azure Monitor metric names are CamelCase with free-form units
//! ("AverageResponseTime" / "Seconds"). Exposition names are lowercase
//! underscore-separated tokens ending in the unit, with a handful of fixed
//! cleanup passes for artifacts the mechanical transform produces.

/// Insert an underscore before every interior capital, then lowercase.
/// Already-normalized names pass through unchanged.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Build the full exposition metric name from a kind prefix, a raw (possibly
/// HTTP-collapsed) series name, and the raw unit.
pub fn metric_name(prefix: &str, name: &str, unit: &str) -> String {
    let mut out = format!(
        "{}_{}_{}",
        prefix,
        snake_case(name.trim()),
        unit.trim().to_ascii_lowercase()
    );
    // Cleanup passes, in this order
    out = out.replace("percent_percent", "percent");
    out = out.replace("bytes_bytes", "bytes");
    out = out.replace(' ', "_");
    out = out.replace('/', "_");
    out = out.replace("__", "_");
    // The underscore-insertion rule mis-splits the acronym "CPU"
    out = out.replace("c_p_u", "cpu");
    out
}

/// For series named `Http` followed by a digit ("Http2xx"), return the
/// status suffix after "Http"; such series collapse to a single `Http`
/// family with a status_code label.
pub fn http_status_suffix(name: &str) -> Option<&str> {
    let rest = name.strip_prefix("Http")?;
    match rest.chars().next() {
        Some(c) if c.is_ascii_digit() => Some(rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_splits_on_interior_capitals() {
        assert_eq!(
            metric_name("webapp", "AverageResponseTime", "Seconds"),
            "webapp_average_response_time_seconds"
        );
    }

    #[test]
    fn cpu_acronym_is_fixed_up() {
        assert_eq!(
            metric_name("webapp", "CpuTime", "Seconds"),
            "webapp_cpu_time_seconds"
        );
        assert_eq!(
            metric_name("vm", "Percentage CPU", "Percent"),
            "vm_percentage_cpu_percent"
        );
    }

    #[test]
    fn doubled_unit_tokens_collapse() {
        assert_eq!(
            metric_name("storage", "UsedPercent", "Percent"),
            "storage_used_percent"
        );
        assert_eq!(
            metric_name("webapp", "ReceivedBytes", "Bytes"),
            "webapp_received_bytes"
        );
    }

    #[test]
    fn spaces_and_slashes_become_underscores() {
        assert_eq!(
            metric_name("vm", "Disk Read Bytes/sec", "BytesPerSecond"),
            "vm_disk_read_bytes_sec_bytespersecond"
        );
    }

    #[test]
    fn collapsed_http_name_keeps_unit() {
        assert_eq!(metric_name("webapp", "Http", "Count"), "webapp_http_count");
    }

    #[test]
    fn http_series_with_digit_are_collapsed() {
        assert_eq!(http_status_suffix("Http2xx"), Some("2xx"));
        assert_eq!(http_status_suffix("Http401"), Some("401"));
        assert_eq!(http_status_suffix("HttpQueueLength"), None);
        assert_eq!(http_status_suffix("Requests"), None);
        assert_eq!(http_status_suffix("Http"), None);
    }

    #[test]
    fn snake_case_is_idempotent() {
        let once = snake_case("MemoryWorkingSet");
        assert_eq!(once, "memory_working_set");
        assert_eq!(snake_case(&once), once);
    }
}
