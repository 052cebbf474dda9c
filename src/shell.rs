//! Line-oriented terminal front end for the collection workflow.

use crate::error::WorkflowError;
use crate::extractor::ProfileExtractor;
use crate::progress::{BarProgress, NullProgress, Progress};
use crate::workflow::{Collector, ExportOutcome, State};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const HELP: &str = "\
Commands:
  scrape <url | @handle | handle>   Scrape a profile and show a preview
  add                               Add the previewed profile to the collection
  discard                           Drop the previewed profile
  remove <n>                        Remove row n of the collection
  list                              Show the collection
  preview                           Show the previewed profile
  export [path]                     Write the collection (.csv, .xlsx or .json)
  help                              Show this message
  quit                              Leave without saving";

/// A parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Scrape(String),
    Add,
    Discard,
    /// Zero-based row, `None` when nothing valid was given.
    Remove(Option<usize>),
    List,
    Preview,
    Export(Option<PathBuf>),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "" => Command::Empty,
        "scrape" | "s" => Command::Scrape(rest.to_string()),
        "add" | "a" => Command::Add,
        "discard" => Command::Discard,
        "remove" | "rm" => Command::Remove(
            rest.parse::<usize>()
                .ok()
                .and_then(|row| row.checked_sub(1)),
        ),
        "list" | "ls" => Command::List,
        "preview" | "p" => Command::Preview,
        "export" | "e" => {
            Command::Export((!rest.is_empty()).then(|| PathBuf::from(rest)))
        }
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

/// Interactive session over any input/output pair.
pub(crate) struct Shell<E: ProfileExtractor, R: BufRead, W: Write> {
    collector: Collector<E>,
    input: R,
    output: W,
    show_progress: bool,
}

impl<E: ProfileExtractor, R: BufRead, W: Write> Shell<E, R, W> {
    pub(crate) fn new(collector: Collector<E>, input: R, output: W, show_progress: bool) -> Self {
        Self {
            collector,
            input,
            output,
            show_progress,
        }
    }

    /// Reads and runs commands until `quit` or end of input.
    pub(crate) fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "TikTok profile scraper. Type 'help' for commands.")?;
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }
            if !self.handle(&line)? {
                break;
            }
        }
        tracing::debug!(target: "shell", "Session ended with {} collected profiles", self.collector.records().len());
        Ok(())
    }

    /// Runs one line. Returns `false` when the session should end.
    fn handle(&mut self, line: &str) -> io::Result<bool> {
        let command = parse_command(line);
        tracing::debug!(target: "shell", "Command: {:?}", command);

        let result = match command {
            Command::Empty => Ok(()),
            Command::Quit => return Ok(false),
            Command::Help => {
                writeln!(self.output, "{}", HELP)?;
                Ok(())
            }
            Command::Unknown(word) => {
                writeln!(self.output, "Unknown command '{}'. Type 'help' for commands.", word)?;
                Ok(())
            }
            Command::Scrape(identifier) => match self.scrape(&identifier) {
                Ok(preview) => {
                    writeln!(self.output, "{}", preview)?;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Command::Add => match self.collector.confirm_add() {
                Ok(record) => {
                    let name = record.name.clone();
                    writeln!(
                        self.output,
                        "Added {} ({} collected)",
                        name,
                        self.collector.records().len()
                    )?;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Command::Discard => match self.collector.discard() {
                Ok(record) => {
                    writeln!(self.output, "Discarded {}", record.name)?;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Command::Remove(selection) => match self.collector.remove_selected(selection) {
                Ok(record) => {
                    writeln!(self.output, "Removed {}", record.name)?;
                    self.print_listing()?;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Command::List => {
                self.print_listing()?;
                Ok(())
            }
            Command::Preview => {
                writeln!(self.output, "{}", self.collector.preview_text())?;
                if *self.collector.state() == State::Idle {
                    writeln!(self.output, "(nothing staged, use 'scrape' first)")?;
                }
                Ok(())
            }
            Command::Export(path) => {
                let path = match path {
                    Some(path) => Some(path),
                    None => self.prompt_path()?,
                };
                match self.collector.export(path.as_deref()) {
                    Ok(ExportOutcome::Written { path, rows, .. }) => {
                        writeln!(self.output, "Exported {} profiles to {}", rows, path.display())?;
                        Ok(())
                    }
                    Ok(ExportOutcome::Cancelled) => Ok(()),
                    Err(e) => Err(e),
                }
            }
        };

        if let Err(e) = result {
            self.report(&e)?;
        }
        Ok(true)
    }

    /// Submits `identifier` and returns the preview of the staged profile.
    fn scrape(&mut self, identifier: &str) -> Result<String, WorkflowError> {
        let mut bar = BarProgress::new();
        let mut quiet = NullProgress;
        let progress: &mut dyn Progress = if self.show_progress {
            &mut bar
        } else {
            &mut quiet
        };
        self.collector.submit(identifier, progress)?;
        Ok(self.collector.preview_text())
    }

    fn prompt_path(&mut self) -> io::Result<Option<PathBuf>> {
        write!(self.output, "Save to (leave empty to cancel): ")?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| PathBuf::from(answer)))
    }

    fn print_listing(&mut self) -> io::Result<()> {
        let listing = self.collector.listing();
        if listing.is_empty() {
            writeln!(self.output, "(no profiles collected)")?;
        }
        for line in listing {
            writeln!(self.output, "{}", line)?;
        }
        Ok(())
    }

    fn report(&mut self, error: &WorkflowError) -> io::Result<()> {
        tracing::debug!(target: "shell", "Reporting error: {}", error);
        writeln!(self.output, "Error: {}", error.user_message())
    }

    /// Hands back the collector, e.g. to inspect it after a session.
    #[cfg(test)]
    fn into_collector(self) -> Collector<E> {
        self.collector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::export::ExportFormat;
    use crate::workflow::tests::MockExtractor;
    use std::io::Cursor;

    fn run_session(
        extractor: MockExtractor,
        script: &str,
    ) -> (String, Collector<MockExtractor>) {
        let collector = Collector::new(extractor, ExportFormat::Csv);
        let mut output = Vec::new();
        let mut shell = Shell::new(collector, Cursor::new(script.as_bytes()), &mut output, false);
        shell.run().unwrap();
        let collector = shell.into_collector();
        (String::from_utf8(output).unwrap(), collector)
    }

    fn alice() -> MockExtractor {
        MockExtractor::default().with("https://www.tiktok.com/@alice", "Alice", "1.2M", "50M")
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("scrape  @alice \n"), Command::Scrape("@alice".to_string()));
        assert_eq!(parse_command("REMOVE 2"), Command::Remove(Some(1)));
        assert_eq!(parse_command("remove 0"), Command::Remove(None));
        assert_eq!(parse_command("remove two"), Command::Remove(None));
        assert_eq!(parse_command("remove"), Command::Remove(None));
        assert_eq!(parse_command("export"), Command::Export(None));
        assert_eq!(
            parse_command("export out.csv"),
            Command::Export(Some(PathBuf::from("out.csv")))
        );
        assert_eq!(parse_command("   "), Command::Empty);
        assert_eq!(parse_command("dance"), Command::Unknown("dance".to_string()));
    }

    #[test]
    fn test_scrape_add_and_list() {
        let (out, collector) = run_session(alice(), "scrape @alice\nadd\nlist\nquit\n");
        assert!(out.contains("Name: Alice\nFollowers: 1.2M\nLikes: 50M"));
        assert!(out.contains("Added Alice (1 collected)"));
        assert!(out.contains("1. Alice (@alice)"));
        assert_eq!(collector.records().len(), 1);
    }

    #[test]
    fn test_errors_are_reported_not_fatal() {
        let extractor = alice().failing(
            "https://www.tiktok.com/@ghost",
            ExtractionError::ElementNotFound {
                selector: "h2".to_string(),
            },
        );
        let (out, collector) =
            run_session(extractor, "scrape !bad\nscrape ghost\nadd\nremove 1\nlist\n");
        assert!(out.contains("Error: Invalid URL format. Please enter a valid TikTok profile."));
        assert!(out.contains("Error: Error occurred while scraping the profile. Please try again."));
        assert!(out.contains("Error: No profile to add. Please scrape a profile first."));
        assert!(out.contains("Error: No profile selected to remove."));
        assert!(out.contains("(no profiles collected)"));
        assert!(collector.records().is_empty());
    }

    #[test]
    fn test_export_prompt_cancel_is_silent() {
        let (out, _) = run_session(alice(), "scrape alice\nadd\nexport\n\nquit\n");
        assert!(out.contains("Save to (leave empty to cancel): "));
        assert!(!out.contains("Error:"));
        assert!(!out.contains("Exported"));
    }

    #[test]
    fn test_export_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.csv");
        let script = format!("scrape alice\nadd\nexport\n{}\n", path.display());
        let (out, _) = run_session(alice(), &script);
        assert!(out.contains("Exported 1 profiles to"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("Alice,alice,1.2M,50M,https://www.tiktok.com/@alice\n"));
    }

    #[test]
    fn test_preview_before_and_after_scrape() {
        let (out, _) = run_session(alice(), "preview\nscrape alice\npreview\n");
        assert!(out.contains("Name:\nFollowers:\nLikes:\n(nothing staged, use 'scrape' first)"));
        assert_eq!(out.matches("Name: Alice").count(), 2);
    }

    /// Accepts everything except the profile preview.
    struct RejectPreview(Vec<u8>);

    impl Write for RejectPreview {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.starts_with(b"Name: Alice") {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_preview_write_failure_ends_session() {
        let collector = Collector::new(alice(), ExportFormat::Csv);
        let mut shell = Shell::new(
            collector,
            Cursor::new("scrape alice\nadd\n".as_bytes()),
            RejectPreview(Vec::new()),
            false,
        );
        let err = shell.run().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        let collector = shell.into_collector();
        assert!(collector.staged().is_some());
        assert!(collector.records().is_empty());
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let (out, _) = run_session(alice(), "help");
        assert!(out.contains("Commands:"));
    }
}
