//! Output formatting for training reports.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use relatedness_core::training::{NormalizerReport, TrainingReport};
use relatedness_core::MetricSelection;
use serde::Serialize;

/// JSON output structure for a training run
#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub local: Option<&'a str>,
    pub universal: Option<&'a str>,
    pub max_results: Option<usize>,
    pub report: &'a TrainingReport,
}

/// Formats a training report as JSON.
pub fn format_json(selection: &MetricSelection, report: &TrainingReport) -> String {
    let output = JsonOutput {
        local: selection.local.as_deref(),
        universal: selection.universal.as_deref(),
        max_results: selection.max_results,
        report,
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a training report for the terminal.
pub fn format_human(report: &TrainingReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Trained on {} dataset{}:\n",
        report.datasets.len(),
        if report.datasets.len() == 1 { "" } else { "s" }
    ));
    for dataset in &report.datasets {
        output.push_str(&format!(
            "  - {} ({}, {} records)\n",
            dataset.name, dataset.language, dataset.records
        ));
    }

    if report.pairs.is_empty() {
        output.push_str("\nNo normalizers written.\n");
        return output;
    }

    output.push_str(&format!(
        "\n{} training passes, {} observations\n",
        report.trained_passes(),
        report.total_observations()
    ));
    for pair in &report.pairs {
        output.push_str(&format!(
            "\n{} {} [{}] -> {}\n",
            pair.family, pair.metric, pair.scope, pair.directory
        ));
        output.push_str(&describe("similarity", &pair.similarity));
        output.push_str(&describe("most-similar", &pair.most_similar));
    }
    output
}

fn describe(role: &str, normalizer: &NormalizerReport) -> String {
    let status = if normalizer.trained {
        "trained"
    } else {
        "untrained"
    };
    format!(
        "   {:<13} {} ({}, {} observations)\n                 {}\n",
        role, normalizer.kind, status, normalizer.observations, normalizer.dump
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use relatedness_core::training::{DatasetReport, PairReport};

    fn report() -> TrainingReport {
        let normalizer = NormalizerReport {
            kind: "isotonic".to_string(),
            trained: true,
            observations: 3,
            dump: "isotonic: 2 blocks".to_string(),
        };
        TrainingReport {
            datasets: vec![DatasetReport {
                name: "wordsim.txt".to_string(),
                language: "en".to_string(),
                records: 3,
            }],
            passes: Vec::new(),
            pairs: vec![PairReport {
                metric: "trigram".to_string(),
                family: "local".to_string(),
                scope: "en".to_string(),
                directory: "local/trigram/en".to_string(),
                similarity: normalizer.clone(),
                most_similar: NormalizerReport {
                    trained: false,
                    ..normalizer
                },
            }],
        }
    }

    #[test]
    fn test_format_human() {
        let text = format_human(&report());
        assert!(text.contains("Trained on 1 dataset:"));
        assert!(text.contains("wordsim.txt (en, 3 records)"));
        assert!(text.contains("local/trigram/en"));
        assert!(text.contains("untrained"));
    }

    #[test]
    fn test_format_json() {
        let selection = MetricSelection {
            local: Some("trigram".to_string()),
            ..Default::default()
        };
        let json: serde_json::Value =
            serde_json::from_str(&format_json(&selection, &report())).unwrap();
        assert_eq!(json["local"], "trigram");
        assert!(json["universal"].is_null());
        assert_eq!(json["report"]["pairs"][0]["scope"], "en");
    }
}
