//! JSON sample to TypeScript interface inference.
//!
//! The pipeline feeds a JSON sample through the key deduplication engine,
//! hands the collision-free tree to an inference engine, then post-processes
//! the emitted declarations: nullable fields become optional-any, the
//! deduplication prefixes are stripped back out, and a final consistency pass
//! rejects any interface left with colliding property names.

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

mod adapter;
mod engine;

pub use adapter::{infer_interface, PREVIEW_LEN};
pub use engine::{InferenceEngine, StructuralEngine};

/// Inference error types.
#[derive(Error, Debug, Clone)]
pub enum InferError {
    /// The caller-supplied sample is not valid JSON. The only variant that
    /// escapes [`infer_interface`]; everything else softens to `None`.
    #[error("invalid JSON sample: {message} (input starts with: {preview})")]
    InvalidJson {
        preview: String,
        message: String,
        offset: usize,
    },

    #[error("inference engine failed: {0}")]
    Engine(String),

    #[error("interface {interface} has duplicate properties after unprefixing: {names:?}")]
    DuplicateProperties {
        interface: String,
        names: Vec<String>,
    },
}

impl InferError {
    /// Returns the byte span of this error in the original input, if known.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            InferError::InvalidJson { offset, .. } => Some(*offset..offset + 1),
            _ => None,
        }
    }

    /// Prints a pretty error report using ariadne.
    pub fn report(&self, filename: &str, source: &str) {
        let offset = self.span().map(|s| s.start).unwrap_or(0);
        let mut builder =
            Report::build(ReportKind::Error, filename, offset).with_message(format!("{}", self));

        if let Some(span) = self.span() {
            let label = match self {
                InferError::InvalidJson { message, .. } => message.clone(),
                other => other.to_string(),
            };
            builder = builder.with_label(
                Label::new((filename, span))
                    .with_message(label)
                    .with_color(Color::Red),
            );
        }

        let report = builder.finish();
        if let Err(err) = report.print((filename, Source::from(source))) {
            tracing::error!(target: "infer", %err, "failed to print error report");
        }
    }
}
