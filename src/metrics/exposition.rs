//! Scrape Rendering
//!
//! Turns a Metrics State snapshot into the Prometheus text exposition
//! format. A fresh registry is built per scrape so the output contains
//! exactly the snapshot and nothing registered elsewhere in the process.

use prometheus::{Encoder, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::domain::{StatusSignal, TargetKey};
use crate::error::Result;

/// Gauge name exported for every target
pub const METRIC_NAME: &str = "http_status_code";

/// Help text attached to the gauge
pub const METRIC_HELP: &str = "HTTP status code";

/// Label names, in order
pub const LABELS: [&str; 2] = ["url", "tag"];

/// A rendered scrape body with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exposition {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Render `snapshot` as one gauge family labelled by `url` and `tag`
pub fn render(snapshot: &[(TargetKey, StatusSignal)]) -> Result<Exposition> {
    let registry = Registry::new();
    let gauge = IntGaugeVec::new(Opts::new(METRIC_NAME, METRIC_HELP), &LABELS)?;
    registry.register(Box::new(gauge.clone()))?;

    for (key, signal) in snapshot {
        gauge
            .get_metric_with_label_values(&[key.url.as_str(), key.tag.as_str()])?
            .set(i64::from(signal.value()));
    }

    let encoder = TextEncoder::new();
    let mut body = Vec::new();
    encoder.encode(&registry.gather(), &mut body)?;

    Ok(Exposition {
        content_type: encoder.format_type().to_string(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(snapshot: &[(TargetKey, StatusSignal)]) -> String {
        String::from_utf8(render(snapshot).unwrap().body).unwrap()
    }

    #[test]
    fn test_render_samples() {
        let text = body(&[
            (TargetKey::new("http://a/", "10.0.0.1"), StatusSignal::from_code(200)),
            (TargetKey::new("http://b/", ""), StatusSignal::FAILURE),
        ]);

        assert!(text.contains("# HELP http_status_code HTTP status code"));
        assert!(text.contains("# TYPE http_status_code gauge"));
        assert!(text.contains(r#"http_status_code{tag="10.0.0.1",url="http://a/"} 200"#));
        assert!(text.contains(r#"http_status_code{tag="",url="http://b/"} 0"#));
    }

    #[test]
    fn test_render_empty_snapshot() {
        let exposition = render(&[]).unwrap();
        assert!(exposition.body.is_empty());
        assert!(exposition.content_type.starts_with("text/plain"));
    }

    #[test]
    fn test_render_escapes_label_values() {
        let text = body(&[(
            TargetKey::new("http://a/?q=\"x\"", "tag"),
            StatusSignal::from_code(301),
        )]);

        assert!(text.contains(r#"url="http://a/?q=\"x\"""#));
    }

    #[test]
    fn test_render_is_deterministic() {
        let snapshot = vec![
            (TargetKey::new("http://a/", "1"), StatusSignal::from_code(200)),
            (TargetKey::new("http://b/", "2"), StatusSignal::from_code(404)),
        ];
        assert_eq!(render(&snapshot).unwrap(), render(&snapshot).unwrap());
    }
}
