use std::time::Duration;

use anyhow::{Context, Result, bail};
use kickform::{Landmark, Phase, Quality};
use serde::Deserialize;

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Frame {
        t_ms: u64,
        #[serde(default)]
        landmarks: Option<Vec<Landmark>>,
        #[serde(default)]
        features: Option<Vec<f64>>,
    },
    Capture {
        t_ms: u64,
        phase: Phase,
        quality: Quality,
    },
    Save {
        t_ms: u64,
    },
    Load {
        t_ms: u64,
    },
}

impl ReplayEvent {
    pub fn at(&self) -> Duration {
        let t_ms = match self {
            ReplayEvent::Frame { t_ms, .. }
            | ReplayEvent::Capture { t_ms, .. }
            | ReplayEvent::Save { t_ms }
            | ReplayEvent::Load { t_ms } => *t_ms,
        };
        Duration::from_millis(t_ms)
    }
}

/// Parses a JSON Lines script. Blank lines and `#` comments are skipped.
/// Timestamps must not go backwards.
pub fn parse_script(text: &str) -> Result<Vec<ReplayEvent>> {
    let mut events: Vec<ReplayEvent> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(line)
            .with_context(|| format!("line {}: invalid replay event", index + 1))?;
        if let Some(previous) = events.last() {
            if event.at() < previous.at() {
                bail!("line {}: timestamp goes backwards", index + 1);
            }
        }
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_event_kinds() {
        let script = r#"
# warm-up
{"type": "frame", "t_ms": 0, "features": [0.1, 0.2]}
{"type": "capture", "t_ms": 100, "phase": "plant_foot", "quality": "bad"}
{"type": "frame", "t_ms": 200, "landmarks": [{"x": 0.5, "y": 0.25}]}

{"type": "save", "t_ms": 6000}
{"type": "load", "t_ms": 6000}
"#;
        let events = parse_script(script).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(
            events[1],
            ReplayEvent::Capture {
                t_ms: 100,
                phase: Phase::PlantFoot,
                quality: Quality::Bad
            }
        );
        match &events[2] {
            ReplayEvent::Frame { landmarks: Some(l), features: None, .. } => {
                assert_eq!(l[0], Landmark::new(0.5, 0.25))
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(events[4].at(), Duration::from_secs(6));
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(parse_script(r#"{"type": "jump", "t_ms": 0}"#).is_err());
        let unknown_phase = r#"{"type": "capture", "t_ms": 0, "phase": "run", "quality": "good"}"#;
        assert!(parse_script(unknown_phase).is_err());
        let backwards = "{\"type\": \"save\", \"t_ms\": 10}\n{\"type\": \"save\", \"t_ms\": 5}";
        let err = parse_script(backwards).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
