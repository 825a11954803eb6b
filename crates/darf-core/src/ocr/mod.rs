//! Text recognition for scanned pages.
//!
//! Recognition itself is delegated to an external engine; this module only
//! defines the seam and builds the engine lazily, once per run.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use std::fmt;
use std::sync::{Arc, OnceLock};

use image::DynamicImage;
use tracing::{info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Trait for text recognizers.
pub trait TextRecognizer: Send + Sync {
    /// Recognize text regions in a page image, in the engine's output order.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError>;
}

/// Outcome of building the recognizer.
#[derive(Clone)]
pub enum RecognizerState {
    Ready(Arc<dyn TextRecognizer>),
    /// Initialization failed; the reason is kept and never retried.
    Unavailable(String),
}

impl fmt::Debug for RecognizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

type Factory = Box<dyn Fn() -> Result<Arc<dyn TextRecognizer>, OcrError> + Send + Sync>;

/// Recognizer built on first use and shared across pages and documents.
pub struct LazyRecognizer {
    state: OnceLock<RecognizerState>,
    factory: Factory,
}

impl LazyRecognizer {
    /// Build the recognizer with `factory` the first time it is needed.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn TextRecognizer>, OcrError> + Send + Sync + 'static,
    {
        Self {
            state: OnceLock::new(),
            factory: Box::new(factory),
        }
    }

    /// Already built recognizer.
    pub fn ready<R: TextRecognizer + 'static>(recognizer: R) -> Self {
        let lazy = Self::new(|| Err(OcrError::Unavailable("already initialized".into())));
        let _ = lazy.state.set(RecognizerState::Ready(Arc::new(recognizer)));
        lazy
    }

    /// A recognizer that is known to be missing.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let lazy = Self::new(|| Err(OcrError::Unavailable("unavailable".into())));
        let _ = lazy.state.set(RecognizerState::Unavailable(reason.into()));
        lazy
    }

    /// Current state, initializing on first call.
    pub fn state(&self) -> &RecognizerState {
        self.state.get_or_init(|| match (self.factory)() {
            Ok(recognizer) => RecognizerState::Ready(recognizer),
            Err(e) => {
                warn!("OCR unavailable for this run: {}", e);
                RecognizerState::Unavailable(e.to_string())
            }
        })
    }

    /// The recognizer, or the cached reason it could not be built.
    pub fn get(&self) -> Result<Arc<dyn TextRecognizer>, OcrError> {
        match self.state() {
            RecognizerState::Ready(r) => Ok(Arc::clone(r)),
            RecognizerState::Unavailable(reason) => Err(OcrError::Unavailable(reason.clone())),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }
}

impl fmt::Debug for LazyRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRecognizer")
            .field("state", &self.state.get())
            .finish()
    }
}

/// Lazy recognizer for the given configuration.
///
/// With OCR disabled, or without the `native` feature, the recognizer is
/// unavailable from the start.
pub fn create_recognizer(config: &OcrConfig) -> LazyRecognizer {
    if !config.enabled {
        info!("OCR disabled by configuration");
        return LazyRecognizer::unavailable("OCR disabled");
    }

    #[cfg(feature = "native")]
    {
        let config = config.clone();
        LazyRecognizer::new(move || {
            let engine = PureOcrEngine::from_dir(&config.model_dir, config.keep_unk)?;
            Ok(Arc::new(engine) as Arc<dyn TextRecognizer>)
        })
    }

    #[cfg(not(feature = "native"))]
    {
        LazyRecognizer::unavailable("built without the native OCR engine")
    }
}
