//! Request → prediction orchestration
//!
//! One parameterized orchestrator serves both classification tasks; the only
//! difference between the cough and breath endpoints is the model bound at
//! construction.
//!
//! **Flow:**
//! 1. Upload already resolved to [`UploadOutcome`] (missing / empty / present)
//! 2. Feature extraction on the blocking pool
//! 3. Reshape to `[1, 13, frames, 1]`
//! 4. Bound model's `predict`
//!
//! The first failing step ends the request.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::model::{Model, ModelInputTensor, PredictionVector};
use crate::audio::AudioBuffer;
use crate::error::{RequestError, RequestResult};
use crate::features::AudioFeatureExtractor;

/// Classification task served by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Cough,
    Breath,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Cough => "cough",
            Task::Breath => "breath",
        }
    }

    /// HTTP route of the task's prediction endpoint
    pub fn route(&self) -> &'static str {
        match self {
            Task::Cough => "/cough_predict",
            Task::Breath => "/breath_predict",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upload state, resolved once from the request before any processing
#[derive(Debug)]
pub enum UploadOutcome {
    /// No file field in the request
    Missing,
    /// File field present with an empty filename
    EmptySelection,
    /// A file was uploaded
    Present(AudioBuffer),
}

/// Drives one task's prediction pipeline
#[derive(Clone)]
pub struct InferenceOrchestrator {
    task: Task,
    model: Arc<dyn Model>,
    extractor: Arc<AudioFeatureExtractor>,
}

impl InferenceOrchestrator {
    pub fn new(task: Task, model: Arc<dyn Model>, extractor: Arc<AudioFeatureExtractor>) -> Self {
        Self {
            task,
            model,
            extractor,
        }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Validate the upload, then run extraction and inference off the async runtime
    pub async fn handle(&self, upload: UploadOutcome) -> RequestResult<PredictionVector> {
        let buffer = self.validate(upload)?;

        let this = self.clone();
        tokio::task::spawn_blocking(move || this.process(buffer))
            .await
            .map_err(|e| {
                error!(task = %self.task, error = %e, "Prediction task aborted");
                RequestError::Processing("request processing aborted".to_string())
            })?
    }

    /// Same pipeline, run on the calling thread
    pub fn handle_blocking(&self, upload: UploadOutcome) -> RequestResult<PredictionVector> {
        let buffer = self.validate(upload)?;
        self.process(buffer)
    }

    fn validate(&self, upload: UploadOutcome) -> RequestResult<AudioBuffer> {
        match upload {
            UploadOutcome::Missing => {
                warn!(task = %self.task, "Rejected request without file part");
                Err(RequestError::MissingFilePart)
            }
            UploadOutcome::EmptySelection => {
                warn!(task = %self.task, "Rejected request with empty filename");
                Err(RequestError::EmptySelection)
            }
            UploadOutcome::Present(buffer) => Ok(buffer),
        }
    }

    fn process(&self, buffer: AudioBuffer) -> RequestResult<PredictionVector> {
        let started = Instant::now();
        debug!(
            task = %self.task,
            bytes = buffer.len(),
            filename = ?buffer.filename(),
            "Extracting features"
        );

        let features = self.extractor.extract(&buffer).map_err(|e| {
            warn!(task = %self.task, error = %e, "Feature extraction failed");
            RequestError::from(e)
        })?;
        drop(buffer);

        let (coefficients, frames) = features.shape();
        let tensor = ModelInputTensor::from_features(features);

        let prediction = self.model.predict(&tensor).map_err(|e| {
            error!(
                task = %self.task,
                model = self.model.name(),
                error = %e,
                "Model inference failed"
            );
            RequestError::Inference(e.to_string())
        })?;

        info!(
            task = %self.task,
            model = self.model.name(),
            coefficients,
            frames,
            rows = prediction.rows().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prediction complete"
        );

        Ok(prediction)
    }
}

impl fmt::Debug for InferenceOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceOrchestrator")
            .field("task", &self.task)
            .field("model", &self.model.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureParams;
    use crate::inference::model::InferenceError;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Records the shape it was called with and returns fixed scores
    struct RecordingModel {
        scores: Vec<f32>,
        seen_shape: Mutex<Option<[usize; 4]>>,
    }

    impl Model for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        fn predict(&self, input: &ModelInputTensor) -> Result<PredictionVector, InferenceError> {
            *self.seen_shape.lock().unwrap() = Some(input.shape());
            Ok(PredictionVector(vec![self.scores.clone()]))
        }
    }

    struct FailingModel;

    impl Model for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict(&self, _input: &ModelInputTensor) -> Result<PredictionVector, InferenceError> {
            Err(InferenceError::Backend("node Gemm_3 exploded".to_string()))
        }
    }

    fn extractor() -> Arc<AudioFeatureExtractor> {
        Arc::new(AudioFeatureExtractor::new(FeatureParams::default()).unwrap())
    }

    fn silent_wav(seconds: f32) -> AudioBuffer {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..(seconds * 22050.0) as usize {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        AudioBuffer::new(cursor.into_inner(), Some("silence.wav".to_string()))
    }

    #[test]
    fn test_missing_upload() {
        let model = Arc::new(FailingModel);
        let orchestrator = InferenceOrchestrator::new(Task::Cough, model, extractor());

        let result = orchestrator.handle_blocking(UploadOutcome::Missing);
        assert!(matches!(result, Err(RequestError::MissingFilePart)));
    }

    #[test]
    fn test_empty_selection() {
        let model = Arc::new(FailingModel);
        let orchestrator = InferenceOrchestrator::new(Task::Breath, model, extractor());

        let result = orchestrator.handle_blocking(UploadOutcome::EmptySelection);
        assert!(matches!(result, Err(RequestError::EmptySelection)));
    }

    #[test]
    fn test_garbage_upload_is_decode_error() {
        let model = Arc::new(FailingModel);
        let orchestrator = InferenceOrchestrator::new(Task::Cough, model, extractor());

        let upload = AudioBuffer::new(b"not audio at all".to_vec(), Some("x.wav".to_string()));
        let result = orchestrator.handle_blocking(UploadOutcome::Present(upload));

        match result {
            Err(RequestError::Decode(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_silent_clip_reaches_model_with_batch_and_channel_axes() {
        let model = Arc::new(RecordingModel {
            scores: vec![0.3, 0.7],
            seen_shape: Mutex::new(None),
        });
        let orchestrator = InferenceOrchestrator::new(Task::Cough, model.clone(), extractor());

        let prediction = orchestrator
            .handle_blocking(UploadOutcome::Present(silent_wav(3.0)))
            .unwrap();

        assert_eq!(prediction.rows(), &[vec![0.3, 0.7]]);
        assert_eq!(*model.seen_shape.lock().unwrap(), Some([1, 13, 216, 1]));
    }

    #[test]
    fn test_model_failure_is_inference_error() {
        let orchestrator = InferenceOrchestrator::new(Task::Breath, Arc::new(FailingModel), extractor());

        let result = orchestrator.handle_blocking(UploadOutcome::Present(silent_wav(1.0)));
        match result {
            Err(RequestError::Inference(detail)) => assert!(detail.contains("Gemm_3")),
            other => panic!("expected inference error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_async_handle_matches_blocking() {
        let model = Arc::new(RecordingModel {
            scores: vec![1.0],
            seen_shape: Mutex::new(None),
        });
        let orchestrator = InferenceOrchestrator::new(Task::Breath, model, extractor());

        let prediction = orchestrator
            .handle(UploadOutcome::Present(silent_wav(0.5)))
            .await
            .unwrap();
        assert_eq!(prediction.rows(), &[vec![1.0]]);
    }

    #[test]
    fn test_task_routes() {
        assert_eq!(Task::Cough.route(), "/cough_predict");
        assert_eq!(Task::Breath.route(), "/breath_predict");
        assert_eq!(Task::Breath.to_string(), "breath");
    }
}
