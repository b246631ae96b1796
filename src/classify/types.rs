use serde::{Deserialize, Serialize};

// https://huggingface.co/docs/api-inference/tasks/text-generation
#[derive(Debug, Serialize)]
pub(super) struct InferenceRequest {
    pub(super) inputs: String,
    pub(super) parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
pub(super) struct InferenceParameters {
    pub(super) max_new_tokens: u32,
    pub(super) temperature: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct Generation {
    pub(super) generated_text: String,
}
