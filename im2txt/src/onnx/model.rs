use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView1, ArrayViewD, Axis, Ix1, Ix2};
use num_cpus::get_physical;
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{DynValue, TensorRef};

use crate::config::GraphConfig;
use crate::engine::{InferenceEngine, StepOutput};
use crate::error::CaptionError;
use crate::vocabulary::TokenId;

const THREAD_ENV: &str = "ORT_THREADS";

/// LSTM state for one caption. Shared between the children of a hypothesis
/// but never written to after the decoder produced it.
pub type DecoderState = Arc<Array1<f32>>;

fn resolve_thread_count() -> usize {
    if let Ok(value) = std::env::var(THREAD_ENV) {
        match value.parse::<usize>() {
            Ok(parsed) => {
                log::info!("Using ORT_THREADS override: {} threads", parsed);
                return parsed;
            }
            Err(err) => {
                log::warn!("Ignoring invalid ORT_THREADS value '{}': {}", value, err);
            }
        }
    }

    let physical = get_physical();
    log::info!(
        "ORT_THREADS not set; defaulting to {} physical cores",
        physical
    );
    physical
}

/// Show-and-tell model split into an image encoder graph and a single-step
/// LSTM decoder graph, both run through ONNX Runtime.
pub struct OrtEngine {
    encoder: Session,
    decoder: Session,
    graph: GraphConfig,
}

impl Drop for OrtEngine {
    fn drop(&mut self) {
        log::debug!("Dropping ORT captioning engine");
    }
}

impl OrtEngine {
    pub fn new<P: AsRef<Path>>(model_dir: P, graph: GraphConfig) -> Result<Self, CaptionError> {
        let start = Instant::now();
        let threads = resolve_thread_count();
        let encoder = Self::init_session(&model_dir, &graph.encoder_model, threads)?;
        let decoder = Self::init_session(&model_dir, &graph.decoder_model, threads)?;

        Self::require_input(&encoder, &graph.image_feed)?;
        Self::require_input(&decoder, &graph.input_feed)?;
        Self::require_input(&decoder, &graph.state_feed)?;

        log::info!("Captioning engine initialized in {:?}", start.elapsed());
        Ok(Self {
            encoder,
            decoder,
            graph,
        })
    }

    pub fn graph(&self) -> &GraphConfig {
        &self.graph
    }

    fn init_session<P: AsRef<Path>>(
        model_dir: P,
        file_name: &str,
        threads: usize,
    ) -> Result<Session, CaptionError> {
        let path = model_dir.as_ref().join(file_name);
        log::info!("Loading model from {}...", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers(vec![CPUExecutionProvider::default().build()])?
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?
            .commit_from_file(&path)?;

        for input in &session.inputs {
            log::debug!(
                "Model '{}' input: name={}, type={:?}",
                file_name,
                input.name,
                input.input_type
            );
        }
        Ok(session)
    }

    fn require_input(session: &Session, name: &str) -> Result<(), CaptionError> {
        if session.inputs.iter().any(|input| input.name == name) {
            Ok(())
        } else {
            Err(CaptionError::InputNotFound(name.to_string()))
        }
    }

    fn extract_matrix(out: Option<&DynValue>, name: &str) -> Result<Array2<f32>, CaptionError> {
        Ok(out
            .ok_or_else(|| CaptionError::OutputNotFound(name.to_string()))?
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix2>()?
            .to_owned())
    }
}

impl InferenceEngine for OrtEngine {
    type State = DecoderState;

    fn prime_decoder(&mut self, image: &ArrayViewD<f32>) -> Result<DecoderState, CaptionError> {
        let image = image.as_standard_layout();
        let start = Instant::now();
        let outputs = self.encoder.run(inputs![
            self.graph.image_feed.as_str() => TensorRef::from_array_view(image.view())?,
        ])?;
        log::debug!("Encoder inference completed in {:?}", start.elapsed());

        let initial = outputs
            .get(self.graph.initial_state.as_str())
            .ok_or_else(|| CaptionError::OutputNotFound(self.graph.initial_state.clone()))?
            .try_extract_array::<f32>()?;

        // [1, state_size] from a batched export, [state_size] otherwise
        let state = match initial.ndim() {
            2 => initial
                .into_dimensionality::<Ix2>()?
                .index_axis(Axis(0), 0)
                .to_owned(),
            _ => initial.into_dimensionality::<Ix1>()?.to_owned(),
        };
        Ok(Arc::new(state))
    }

    fn step_decoder(
        &mut self,
        tokens: &[TokenId],
        states: &[&DecoderState],
    ) -> Result<StepOutput<DecoderState>, CaptionError> {
        if tokens.len() != states.len() {
            return Err(CaptionError::BatchMismatch {
                expected: tokens.len(),
                actual: states.len(),
            });
        }

        let input_feed = Array1::from_vec(tokens.to_vec());
        let views: Vec<ArrayView1<f32>> = states.iter().map(|s| s.view()).collect();
        let state_feed = ndarray::stack(Axis(0), &views)?;

        let start = Instant::now();
        let outputs = self.decoder.run(inputs![
            self.graph.input_feed.as_str() => TensorRef::from_array_view(input_feed.view())?,
            self.graph.state_feed.as_str() => TensorRef::from_array_view(state_feed.view())?,
        ])?;
        log::trace!("Decoder inference completed in {:?}", start.elapsed());

        let probabilities =
            Self::extract_matrix(outputs.get(self.graph.softmax.as_str()), &self.graph.softmax)?;
        let new_states =
            Self::extract_matrix(outputs.get(self.graph.state.as_str()), &self.graph.state)?;

        Ok(StepOutput {
            probabilities,
            states: new_states
                .outer_iter()
                .map(|row| Arc::new(row.to_owned()))
                .collect(),
        })
    }
}
