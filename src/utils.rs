use crate::linearizer::VisibleMessage;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Configuration required to run the export process.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Clone, Debug, Default)]
pub struct ExportConfig {
    /// Write transcripts here instead of next to each input file.
    pub output_dir: Option<PathBuf>,
    pub verbose: bool,
    pub quiet: bool,
}

/// What a verbose run reports about a finished transcript.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranscriptStats {
    pub messages: usize,
    pub first_at: Option<DateTime<Utc>>,
    pub last_at: Option<DateTime<Utc>>,
    pub models: BTreeSet<String>,
}

impl TranscriptStats {
    pub fn collect(messages: &[VisibleMessage]) -> Self {
        let mut times = messages.iter().filter_map(VisibleMessage::created_at);
        let first_at = times.next();
        let last_at = times.last().or(first_at);
        let models = messages.iter().filter_map(|m| m.model.clone()).collect();
        Self {
            messages: messages.len(),
            first_at,
            last_at,
            models,
        }
    }

    /// One line, e.g. `12 messages, 2024-05-01 10:00 → 2024-05-01 10:42, models: gpt-4o`.
    pub fn describe(&self) -> String {
        let mut line = format!("{} messages", self.messages);
        if let (Some(first), Some(last)) = (self.first_at, self.last_at) {
            line.push_str(&format!(
                ", {} → {}",
                first.format("%Y-%m-%d %H:%M"),
                last.format("%Y-%m-%d %H:%M")
            ));
        }
        if !self.models.is_empty() {
            let models: Vec<&str> = self.models.iter().map(String::as_str).collect();
            line.push_str(&format!(", models: {}", models.join(", ")));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::Role;

    fn message(timestamp: Option<f64>, model: Option<&str>) -> VisibleMessage {
        VisibleMessage {
            role: Role::from("assistant"),
            text: "x".into(),
            timestamp,
            model: model.map(str::to_string),
        }
    }

    #[test]
    fn stats_span_and_models() {
        let stats = TranscriptStats::collect(&[
            message(None, None),
            message(Some(1_714_557_600.0), Some("gpt-4o")),
            message(Some(1_714_560_120.0), Some("o1")),
            message(None, Some("gpt-4o")),
        ]);

        assert_eq!(stats.messages, 4);
        assert_eq!(stats.models.len(), 2);
        assert_eq!(
            stats.describe(),
            "4 messages, 2024-05-01 10:00 → 2024-05-01 10:42, models: gpt-4o, o1"
        );
    }

    #[test]
    fn single_timestamp_is_both_ends() {
        let stats = TranscriptStats::collect(&[message(Some(0.0), None)]);
        assert_eq!(stats.first_at, stats.last_at);
        assert_eq!(stats.describe(), "1 messages, 1970-01-01 00:00 → 1970-01-01 00:00");
    }

    #[test]
    fn empty_transcript() {
        assert_eq!(TranscriptStats::collect(&[]).describe(), "0 messages");
    }
}
