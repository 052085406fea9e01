//! Plain-text rendering of pipeline output for the terminal.

use std::fmt::Write;
use std::time::Duration;

use kickform::{Evaluation, FeedbackPipeline, Label, Phase, PipelineEvent};

/// One event, prefixed with the stream time it happened at.
pub fn render_event(at: Duration, event: &PipelineEvent) -> String {
    let stamp = format!("[{:>7.3}s]", at.as_secs_f64());
    let mut lines = event.to_string().lines().map(str::to_owned).collect::<Vec<_>>();
    if lines.is_empty() {
        lines.push(String::new());
    }
    let indent = " ".repeat(stamp.len());
    let mut out = format!("{stamp} {}", lines[0]);
    for line in &lines[1..] {
        let _ = write!(out, "\n{indent} {line}");
    }
    out
}

/// Capture counts and progress bars per phase.
pub fn render_progress(pipeline: &FeedbackPipeline) -> String {
    let mut out = String::from("Training progress:");
    for phase in Phase::ALL {
        let counts = pipeline.counters().get(phase);
        let percent = pipeline.progress(phase);
        let filled = (percent / 10.0).round() as usize;
        let _ = write!(
            out,
            "\n  {:<11} [{}{}] {:>3.0}%  good {} / bad {}",
            phase.title(),
            "#".repeat(filled),
            ".".repeat(10 - filled.min(10)),
            percent,
            counts.good,
            counts.bad
        );
    }
    out
}

/// Accuracy line followed by a confusion table over every label.
pub fn render_evaluation(evaluation: &Evaluation) -> String {
    let mut out = format!(
        "k = {}, trained on {}, tested on {}\naccuracy: {:.1}% ({}/{})\n",
        evaluation.k,
        evaluation.train_size,
        evaluation.test_size,
        evaluation.accuracy(),
        evaluation.correct,
        evaluation.test_size
    );

    let labels: Vec<Label> = Label::all().collect();
    let width = labels
        .iter()
        .map(|l| l.to_string().len())
        .max()
        .unwrap_or(0);

    let corner = "actual \\ predicted";
    let first = width.max(corner.len());
    let _ = write!(out, "{corner:<first$}");
    for predicted in &labels {
        let _ = write!(out, " {:>width$}", predicted.to_string());
    }
    for actual in &labels {
        let _ = write!(out, "\n{:<first$}", actual.to_string());
        for predicted in &labels {
            let _ = write!(out, " {:>width$}", evaluation.confusion.get(*actual, *predicted));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kickform::{ConfusionMatrix, Quality};

    #[test]
    fn test_multiline_events_are_indented() {
        let text = render_event(Duration::from_millis(1500), &PipelineEvent::TrainFirst);
        assert_eq!(text, "[  1.500s] Train a few examples of good and bad poses first.");

        let event = PipelineEvent::InvalidFrame("first\nsecond".into());
        let text = render_event(Duration::ZERO, &event);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("           second"));
    }

    #[test]
    fn test_evaluation_table() {
        let good = Label::new(Phase::Stance, Quality::Good);
        let bad = Label::new(Phase::Stance, Quality::Bad);
        let mut confusion = ConfusionMatrix::default();
        confusion.record(good, good);
        confusion.record(bad, good);
        let evaluation = Evaluation {
            k: 3,
            train_size: 8,
            test_size: 2,
            correct: 1,
            confusion,
        };

        let text = render_evaluation(&evaluation);
        assert!(text.contains("accuracy: 50.0% (1/2)"));
        let stance_bad_row = text.lines().find(|l| l.starts_with("stance_bad ")).unwrap();
        let cells: Vec<_> = stance_bad_row.split_whitespace().skip(1).collect();
        assert_eq!(cells, ["1", "0", "0", "0", "0", "0"]);
    }
}
