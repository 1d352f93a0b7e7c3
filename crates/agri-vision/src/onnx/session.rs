//! ONNX Runtime session construction and execution.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};

/// Load an ONNX model with automatic execution provider selection.
///
/// - CUDA on Linux (when the `cuda` feature is enabled)
/// - CoreML on macOS
/// - CPU fallback on all platforms
pub fn create_session(model_path: &Path, purpose: &str) -> VisionResult<Session> {
    if !model_path.exists() {
        return Err(VisionError::model_not_found(model_path.display().to_string()));
    }

    let model_bytes = std::fs::read(model_path)
        .map_err(|e| VisionError::internal(format!("Failed to read model file: {}", e)))?;
    debug!(purpose, bytes = model_bytes.len(), "Model file read");

    let builder = Session::builder()
        .map_err(|e| VisionError::internal(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| VisionError::internal(format!("Failed to set optimization level: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!(purpose, "Using CUDA execution provider");
                return Ok(session);
            }
        }
        debug!(purpose, "CUDA execution provider not available, trying alternatives");
    }

    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!(purpose, "Using CoreML execution provider");
                return Ok(session);
            }
        }
        debug!(purpose, "CoreML execution provider not available, using CPU");
    }

    info!(purpose, "Using CPU execution provider");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| VisionError::internal(format!("Failed to load ONNX model: {}", e)))
}

/// Wrap an NCHW array as an ORT input value.
pub fn array_to_value(input: &Array4<f32>) -> VisionResult<Value> {
    let shape = input.shape().to_vec();
    let data: Vec<f32> = input.iter().copied().collect();

    Tensor::from_array((shape, data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| VisionError::internal(format!("ORT tensor: {}", e)))
}

/// Run a single-input model and flatten one named `f32` output.
pub fn run_single_output(
    session: &Mutex<Session>,
    input: &Array4<f32>,
    output_name: &str,
) -> VisionResult<Vec<f32>> {
    let value = array_to_value(input)?;

    let mut session = session
        .lock()
        .map_err(|_| VisionError::internal("ORT session poisoned"))?;

    let outputs = session
        .run(ort::inputs![value])
        .map_err(|e| VisionError::inference(format!("ORT run failed: {}", e)))?;

    let output = outputs
        .get(output_name)
        .ok_or_else(|| VisionError::inference(format!("model has no `{}` output", output_name)))?;

    let (_, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| VisionError::inference(format!("ORT extract: {}", e)))?;

    Ok(data.to_vec())
}
