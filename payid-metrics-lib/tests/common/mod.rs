use payid_metrics_lib::MetricsConfig;

/// Configuration used across integration tests
pub fn test_config() -> MetricsConfig {
    MetricsConfig {
        push_metrics: true,
        domain: Some("example.com".to_string()),
        gateway_url: Some("https://push00.mon.payid.tech/".to_string()),
        push_interval_in_seconds: 15,
        payid_count_refresh_interval_in_seconds: 60,
        server_agent: Some("unittest:1.2.3".to_string()),
        payid_protocol_version: "1.0".to_string(),
        host_identifier: None,
    }
}

/// Exposition lines for `name` that carry every label in `labels`, as `(line, value)`
pub fn matching_lines<'a>(text: &'a str, name: &str, labels: &[(&str, &str)]) -> Vec<(&'a str, f64)> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(name)
                .map(|rest| rest.starts_with('{') || rest.starts_with(' '))
                .unwrap_or(false)
        })
        .filter(|line| {
            labels
                .iter()
                .all(|(key, value)| line.contains(&format!("{}=\"{}\"", key, value)))
        })
        .filter_map(|line| {
            let (_, value) = line.rsplit_once(' ')?;
            Some((line, value.parse().ok()?))
        })
        .collect()
}
