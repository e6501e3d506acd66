//! One-time asynchronous initialization of the detection capability.

use std::path::PathBuf;

use futures_util::future::BoxFuture;
use tokio::sync::OnceCell;

use super::estimator::SharedEstimator;

/// Failure to prepare the inference backend or its model.
///
/// Callers treat this as retryable by re-invoking [`DetectorLoader::ensure_ready`],
/// not as fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityInitError {
    #[error("no inference backend compiled in (rebuild with the `onnx` feature)")]
    BackendUnavailable,
    #[error("failed to load model: {0}")]
    ModelLoadFailed(String),
}

type EstimatorFactory =
    Box<dyn Fn() -> BoxFuture<'static, Result<SharedEstimator, CapabilityInitError>> + Send + Sync>;

/// Lazily initializes the pose-estimation capability exactly once and caches
/// the handle for the process lifetime. Backend resources are never released
/// by this component.
pub struct DetectorLoader {
    cell: OnceCell<SharedEstimator>,
    factory: EstimatorFactory,
}

impl DetectorLoader {
    /// Loader for the default backend, reading model weights from
    /// `model_path` when the `onnx` feature is enabled.
    pub fn new(model_path: PathBuf) -> Self {
        Self::with_factory(Box::new(move || {
            let path = model_path.clone();
            Box::pin(async move { default_backend(path).await })
        }))
    }

    /// Loader over a custom capability factory.
    pub fn with_factory(factory: EstimatorFactory) -> Self {
        Self {
            cell: OnceCell::new(),
            factory,
        }
    }

    /// Return the cached capability handle, initializing it on first call.
    ///
    /// Idempotent: concurrent and repeated calls share one initialization.
    /// A failed initialization leaves nothing cached, so the next call
    /// retries from scratch.
    pub async fn ensure_ready(&self) -> Result<SharedEstimator, CapabilityInitError> {
        self.cell
            .get_or_try_init(|| {
                log::info!("Initializing pose detector");
                (self.factory)()
            })
            .await
            .cloned()
    }

    /// Whether the capability has been initialized.
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(feature = "onnx")]
async fn default_backend(path: PathBuf) -> Result<SharedEstimator, CapabilityInitError> {
    use std::sync::Arc;

    // Session construction reads and prepares the model on disk
    let estimator = tokio::task::spawn_blocking(move || super::movenet::MoveNetEstimator::load(&path))
        .await
        .map_err(|e| CapabilityInitError::ModelLoadFailed(e.to_string()))??;
    Ok(Arc::new(estimator) as SharedEstimator)
}

#[cfg(not(feature = "onnx"))]
async fn default_backend(_path: PathBuf) -> Result<SharedEstimator, CapabilityInitError> {
    Err(CapabilityInitError::BackendUnavailable)
}
