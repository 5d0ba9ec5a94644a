pub mod tesseract;
pub mod types;
pub mod vision;

use anyhow::Result;

pub use types::{EngineDiag, EngineError, RecognizedLine, RecognizedText};

/// One extraction strategy. The caller picks the implementation explicitly
/// per request; the pipeline never switches engines on its own.
pub trait Engine {
    fn name(&self) -> &'static str;
    fn doctor(&self) -> Result<EngineDiag>;
    fn recognize(&self, image: &[u8]) -> Result<RecognizedText, EngineError>;
}
