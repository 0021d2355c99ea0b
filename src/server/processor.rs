//! Request pipeline of `/v1/process`

use std::fmt;
use std::time::Instant;

use crate::cas::Document;
use crate::engine::TimexEngine;
use crate::error::Result;
use crate::projector;
use crate::xmi;

/// Stage of the pipeline a [`Processor`] is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Decoding,
    Tagging,
    Projecting,
    Encoding,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Decoding => "decoding",
            Self::Tagging => "tagging",
            Self::Projecting => "projecting",
            Self::Encoding => "encoding",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The reusable document and engine behind `/v1/process`
///
/// One instance serves every request. It is not `Sync`-shared: the server
/// checks it out through a mutex for the whole reset, decode, tag, project
/// and encode sequence.
pub struct Processor {
    document: Document,
    engine: Box<dyn TimexEngine>,
    phase: Phase,
    processed: u64,
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("engine", &self.engine.name())
            .field("phase", &self.phase)
            .field("processed", &self.processed)
            .finish()
    }
}

impl Processor {
    pub fn new(engine: Box<dyn TimexEngine>) -> Self {
        Self {
            document: Document::new(),
            engine,
            phase: Phase::Idle,
            processed: 0,
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of successfully processed documents
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Document of the most recent request
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Decode `body`, tag it, project the results and encode the document
    ///
    /// The processor is back in [`Phase::Idle`] when this returns, whether the
    /// request succeeded or not.
    pub fn process(&mut self, body: &[u8]) -> Result<Vec<u8>> {
        let start = Instant::now();
        let result = self.run(body);

        match &result {
            Ok(encoded) => {
                self.processed += 1;
                tracing::info!(
                    size = body.len(),
                    response_size = encoded.len(),
                    annotations = self.document.annotations().len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Processed document"
                );
            }
            Err(e) => {
                tracing::debug!(phase = %self.phase, error = %e, "Processing failed");
                self.enter(Phase::Failed);
            }
        }

        self.enter(Phase::Idle);
        result
    }

    fn run(&mut self, body: &[u8]) -> Result<Vec<u8>> {
        self.enter(Phase::Decoding);
        self.document.reset();
        let share = xmi::decode_into(&mut self.document, body)?;

        self.enter(Phase::Tagging);
        let timexes = self.engine.process(&mut self.document)?;

        self.enter(Phase::Projecting);
        let times = projector::project(&mut self.document)?;

        self.enter(Phase::Encoding);
        let encoded = xmi::encode(&self.document, &share)?;

        tracing::debug!(timexes, times, foreign = share.foreign_count(), "Pipeline complete");
        Ok(encoded)
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "Processor phase");
        self.phase = phase;
    }
}
