//! Batch processing: run the collection workflow over a list of identifiers.

use crate::extractor::ProfileExtractor;
use crate::progress::NullProgress;
use crate::workflow::Collector;
use indicatif::ProgressBar;

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub(crate) struct BatchSummary {
    /// Number of profiles added to the collection.
    pub collected: usize,
    /// Identifiers that failed, with the user-facing reason.
    pub failed: Vec<(String, String)>,
}

/// Reads one identifier per line, skipping blank lines and `#` comments.
pub(crate) fn read_identifiers(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Scrapes and adds each identifier in order. A failure is recorded and the
/// batch moves on; nothing is retried.
pub(crate) fn process_identifiers<E: ProfileExtractor>(
    collector: &mut Collector<E>,
    identifiers: &[String],
    progress_bar: &ProgressBar,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for identifier in identifiers {
        progress_bar.set_message(identifier.clone());
        let result = collector
            .submit(identifier, &mut NullProgress)
            .and_then(|()| collector.confirm_add().map(|_| ()));

        match result {
            Ok(()) => {
                summary.collected += 1;
                tracing::info!(target: "process_task", "✓ Collected {}", identifier);
            }
            Err(e) => {
                tracing::warn!(target: "process_task", "✗ {}: {}", identifier, e);
                summary.failed.push((identifier.clone(), e.user_message()));
            }
        }
        progress_bar.inc(1);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::export::ExportFormat;
    use crate::workflow::tests::MockExtractor;

    #[test]
    fn test_read_identifiers_skips_comments_and_blanks() {
        let text = "# creators\n@alice\n\n  bob  \n# done\nhttps://www.tiktok.com/@carol\n";
        assert_eq!(
            read_identifiers(text),
            ["@alice", "bob", "https://www.tiktok.com/@carol"]
        );
    }

    #[test]
    fn test_process_identifiers_continues_after_failures() {
        let extractor = MockExtractor::default()
            .with("https://www.tiktok.com/@alice", "Alice", "1.2M", "50M")
            .with("https://www.tiktok.com/@bob", "Bob", "10", "20")
            .failing(
                "https://www.tiktok.com/@private",
                ExtractionError::ElementNotFound {
                    selector: "h2".to_string(),
                },
            );
        let mut collector = Collector::new(extractor, ExportFormat::Csv);
        let identifiers = read_identifiers("alice\n!!!\nprivate\n@bob\nalice\n");

        let bar = ProgressBar::hidden();
        let summary = process_identifiers(&mut collector, &identifiers, &bar);

        assert_eq!(summary.collected, 3);
        assert_eq!(
            summary.failed.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
            ["!!!", "private"]
        );
        assert_eq!(
            collector.listing(),
            ["1. Alice (@alice)", "2. Bob (@bob)", "3. Alice (@alice)"]
        );
        assert_eq!(bar.position(), 5);
    }
}
