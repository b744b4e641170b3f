//! Sequential batch conversion.

use super::{ConversionResult, Orchestrator};
use std::path::{Path, PathBuf};
use std::sync::Arc;

impl Orchestrator {
    /// Per-file orchestrator for `input`: a copy of this configuration with
    /// the output next to the input as `<stem>.md`.
    pub fn for_batch_file(&self, input: &Path) -> Orchestrator {
        Orchestrator {
            config: self.config.for_batch_file(input),
            logger: self.logger.clone(),
            router: Arc::clone(&self.router),
            display: Arc::clone(&self.display),
            ocr: self.ocr.clone(),
        }
    }

    /// Convert every input in order. A failing file does not stop the batch;
    /// the result list always has one entry per input.
    pub fn convert_batch(&self, inputs: &[PathBuf]) -> Vec<ConversionResult> {
        self.convert_batch_with(inputs, |_, _| {})
    }

    /// Like [`convert_batch`](Self::convert_batch), calling `on_done` with the
    /// index and result of each file as it finishes.
    pub fn convert_batch_with<F>(&self, inputs: &[PathBuf], mut on_done: F) -> Vec<ConversionResult>
    where
        F: FnMut(usize, &ConversionResult),
    {
        let total = inputs.len();
        self.logger
            .info(format!("Starting batch conversion of {} files", total));

        let mut results = Vec::with_capacity(total);
        for (i, input) in inputs.iter().enumerate() {
            self.logger.info(format!(
                "Processing file {}/{}: {}",
                i + 1,
                total,
                input.display()
            ));

            let result = self.for_batch_file(input).convert();
            if result.is_success() {
                self.logger
                    .info(format!("Successfully converted: {}", input.display()));
            } else {
                self.logger
                    .error(format!("Failed to convert: {}", input.display()));
            }
            on_done(i, &result);
            results.push(result);
        }

        let successful = results.iter().filter(|r| r.is_success()).count();
        self.logger.info(format!(
            "Batch conversion complete: {}/{} successful",
            successful, total
        ));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;
    use crate::logger::Logger;

    #[test]
    fn test_batch_file_config() {
        let orchestrator = Orchestrator::new(
            ConversionConfig::new()
                .with_output("ignored.md")
                .with_heading_offset(2),
            Logger::disabled(),
        );
        let child = orchestrator.for_batch_file(Path::new("docs/a.docx"));

        assert_eq!(child.config().input_path, Some(PathBuf::from("docs/a.docx")));
        assert_eq!(child.config().output_path, Some(PathBuf::from("docs/a.md")));
        assert_eq!(child.config().heading_offset, 2);
        assert!(child.config().batch_mode);
    }

    #[test]
    fn test_batch_keeps_order_and_count() {
        let orchestrator = Orchestrator::new(ConversionConfig::new(), Logger::disabled());
        let inputs = vec![PathBuf::from("nope1.docx"), PathBuf::from("nope2.txt")];
        let mut seen = Vec::new();
        let results = orchestrator.convert_batch_with(&inputs, |i, _| seen.push(i));

        assert_eq!(results.len(), 2);
        assert_eq!(seen, vec![0, 1]);
        assert_eq!(results[0].input_path, inputs[0]);
        assert_eq!(results[1].input_path, inputs[1]);
        assert!(results.iter().all(|r| !r.is_success()));
    }
}
