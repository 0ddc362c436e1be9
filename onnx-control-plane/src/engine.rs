//! Inference engine adapter (C2): wraps the ONNX runtime behind a narrow
//! interface, owns the in-process session cache, and exposes no retry or
//! fallback policy of its own (§4.2).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use ort::session::Session;
use ort::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tokio::sync::Mutex;

use crate::error::EngineError;

/// Canonical dtype vocabulary models are translated into (§4.2a).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Float16,
    Float32,
    Float64,
    Bfloat16,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Bool,
    String,
}

impl DType {
    /// Translate an `ort` tensor element type into the canonical vocabulary.
    fn from_ort(ty: &ort::tensor::TensorElementType) -> Self {
        use ort::tensor::TensorElementType as T;
        match ty {
            T::Float16 => DType::Float16,
            T::Float32 => DType::Float32,
            T::Float64 => DType::Float64,
            T::Bfloat16 => DType::Bfloat16,
            T::Int8 => DType::Int8,
            T::Int16 => DType::Int16,
            T::Int32 => DType::Int32,
            T::Int64 => DType::Int64,
            T::Uint8 => DType::Uint8,
            T::Uint16 => DType::Uint16,
            T::Uint32 => DType::Uint32,
            T::Uint64 => DType::Uint64,
            T::Bool => DType::Bool,
            T::String => DType::String,
            _ => DType::Float32,
        }
    }
}

/// A single tensor's schema entry: name, canonical dtype, and shape (a
/// dynamic axis is represented as `None`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorSchema {
    pub name: String,
    pub dtype: DType,
    pub shape: Vec<Option<i64>>,
}

/// Runtime metadata extracted from the graph (producer, description, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeMetadata {
    pub producer_name: Option<String>,
    pub graph_name: Option<String>,
    pub domain: Option<String>,
    pub description: Option<String>,
    pub version: Option<i64>,
}

/// Result of [`InferenceEngine::validate`].
pub struct ValidationResult {
    pub valid: bool,
    pub error_message: Option<String>,
    pub input_schema: Vec<TensorSchema>,
    pub output_schema: Vec<TensorSchema>,
    pub metadata: RuntimeMetadata,
}

/// Result of [`InferenceEngine::run`].
pub struct RunOutcome {
    pub outputs: HashMap<String, Json>,
    pub elapsed_ms: f64,
}

struct CachedSession {
    session: Session,
    input_names: Vec<(String, DType)>,
}

/// Wraps the opaque ONNX runtime. Validation never mutates catalog state;
/// execution owns the session cache keyed by resolved absolute path (§3).
pub struct InferenceEngine {
    sessions: Mutex<HashMap<PathBuf, Arc<CachedSession>>>,
}

impl InferenceEngine {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// (a) Validation — attempt to load the artifact and extract schemas.
    /// Never touches the session cache and never mutates catalog state.
    /// Graph loading runs on the blocking pool so a large or malformed
    /// artifact never stalls the async runtime (§5).
    pub async fn validate(&self, path: &Path) -> ValidationResult {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || match Session::builder().and_then(|b| b.commit_from_file(&path)) {
            Ok(session) => {
                let input_schema = session
                    .inputs
                    .iter()
                    .map(|i| tensor_schema_from_ort(i))
                    .collect();
                let output_schema = session
                    .outputs
                    .iter()
                    .map(|o| tensor_schema_from_ort(o))
                    .collect();
                let metadata = extract_metadata(&session);
                ValidationResult {
                    valid: true,
                    error_message: None,
                    input_schema,
                    output_schema,
                    metadata,
                }
            }
            Err(e) => ValidationResult {
                valid: false,
                error_message: Some(e.to_string()),
                input_schema: Vec::new(),
                output_schema: Vec::new(),
                metadata: RuntimeMetadata::default(),
            },
        })
        .await
        .unwrap_or_else(|e| ValidationResult {
            valid: false,
            error_message: Some(format!("validation task panicked: {e}")),
            input_schema: Vec::new(),
            output_schema: Vec::new(),
            metadata: RuntimeMetadata::default(),
        })
    }

    /// Evict a cached session (used when an invariant violation is detected,
    /// or when a model is archived/deleted).
    pub async fn evict(&self, path: &Path) {
        self.sessions.lock().await.remove(path);
    }

    /// (b) Execution — §4.2b, steps 1-5.
    pub async fn run(
        &self,
        path: &Path,
        named_inputs: &HashMap<String, Json>,
    ) -> Result<RunOutcome, EngineError> {
        let cached = self.get_or_compile(path).await?;

        // Step 2: post-commitment invariant check.
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            self.sessions.lock().await.remove(path);
            return Err(EngineError::InvariantViolation(format!(
                "cached session references {} which no longer exists",
                path.display()
            )));
        }

        // Step 3: every declared input must be present; extras are ignored.
        for (name, _) in &cached.input_names {
            if !named_inputs.contains_key(name) {
                return Err(EngineError::Input(format!("missing required input '{name}'")));
            }
        }

        let start = Instant::now();
        let named_inputs = named_inputs.clone();
        let outputs = tokio::task::spawn_blocking(move || run_session(&cached, &named_inputs))
            .await
            .map_err(|e| EngineError::Runtime(format!("inference task panicked: {e}")))??;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        Ok(RunOutcome { outputs, elapsed_ms })
    }

    async fn get_or_compile(&self, path: &Path) -> Result<Arc<CachedSession>, EngineError> {
        {
            let sessions = self.sessions.lock().await;
            if let Some(existing) = sessions.get(path) {
                return Ok(existing.clone());
            }
        }

        // The compile step never touches the cache, so it runs on the
        // blocking pool without holding the lock; a racing miss may compile
        // the same graph twice, which is acceptable per §5.
        let owned_path = path.to_path_buf();
        let cached = tokio::task::spawn_blocking(move || -> Result<CachedSession, EngineError> {
            let session = Session::builder()
                .map_err(|e| EngineError::Load(e.to_string()))?
                .commit_from_file(&owned_path)
                .map_err(|e| EngineError::Load(e.to_string()))?;
            let input_names = session
                .inputs
                .iter()
                .map(|i| {
                    let dtype = match &i.input_type {
                        ort::value::ValueType::Tensor { ty, .. } => DType::from_ort(ty),
                        _ => DType::Float32,
                    };
                    (i.name.clone(), dtype)
                })
                .collect();
            Ok(CachedSession { session, input_names })
        })
        .await
        .map_err(|e| EngineError::Load(format!("compile task panicked: {e}")))??;

        let cached = Arc::new(cached);
        let mut sessions = self.sessions.lock().await;
        let cached = sessions.entry(path.to_path_buf()).or_insert(cached).clone();
        Ok(cached)
    }
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn tensor_schema_from_ort(info: &ort::session::input::SessionInputOutputInfo) -> TensorSchema {
    match &info.input_type {
        ort::value::ValueType::Tensor { ty, shape, .. } => TensorSchema {
            name: info.name.clone(),
            dtype: DType::from_ort(ty),
            shape: shape.iter().map(|d| if *d < 0 { None } else { Some(*d) }).collect(),
        },
        _ => TensorSchema {
            name: info.name.clone(),
            dtype: DType::Float32,
            shape: Vec::new(),
        },
    }
}

fn extract_metadata(session: &Session) -> RuntimeMetadata {
    match session.metadata() {
        Ok(meta) => RuntimeMetadata {
            producer_name: meta.producer().ok(),
            graph_name: meta.name().ok(),
            domain: meta.domain().ok(),
            description: meta.description().ok(),
            version: meta.version().ok(),
        },
        Err(_) => RuntimeMetadata::default(),
    }
}

/// Coerce JSON input to the dtype the session declared and call the runtime.
/// Shape correctness is left to the runtime itself, per §4.2b step 4.
fn run_session(
    cached: &CachedSession,
    named_inputs: &HashMap<String, Json>,
) -> Result<HashMap<String, Json>, EngineError> {
    let mut values: Vec<(String, Value)> = Vec::with_capacity(cached.input_names.len());
    for (name, dtype) in &cached.input_names {
        let json_val = &named_inputs[name];
        let value = json_to_ort_value(json_val, *dtype)
            .map_err(|e| EngineError::Input(format!("input '{name}': {e}")))?;
        values.push((name.clone(), value));
    }

    let outputs = cached
        .session
        .run(values)
        .map_err(|e| EngineError::Runtime(e.to_string()))?;

    let mut result = HashMap::new();
    for (name, value) in outputs.iter() {
        result.insert(name.to_string(), ort_value_to_json(value)?);
    }
    Ok(result)
}

fn json_to_ort_value(value: &Json, dtype: DType) -> Result<Value, String> {
    let (shape, flat) = flatten_json_tensor(value)?;
    match dtype {
        DType::Float32 | DType::Float16 | DType::Bfloat16 => {
            let data: Vec<f32> = flat.iter().map(|v| v.as_f64().unwrap_or(0.0) as f32).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Float64 => {
            let data: Vec<f64> = flat.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Int64 => {
            let data: Vec<i64> = flat.iter().map(|v| v.as_i64().unwrap_or(0)).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Int32 => {
            let data: Vec<i32> = flat.iter().map(|v| v.as_i64().unwrap_or(0) as i32).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Int16 => {
            let data: Vec<i16> = flat.iter().map(|v| v.as_i64().unwrap_or(0) as i16).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Int8 => {
            let data: Vec<i8> = flat.iter().map(|v| v.as_i64().unwrap_or(0) as i8).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Uint64 => {
            let data: Vec<u64> = flat.iter().map(|v| v.as_u64().unwrap_or(0)).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Uint32 => {
            let data: Vec<u32> = flat.iter().map(|v| v.as_u64().unwrap_or(0) as u32).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Uint16 => {
            let data: Vec<u16> = flat.iter().map(|v| v.as_u64().unwrap_or(0) as u16).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Uint8 => {
            let data: Vec<u8> = flat.iter().map(|v| v.as_u64().unwrap_or(0) as u8).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::Bool => {
            let data: Vec<bool> = flat.iter().map(|v| v.as_bool().unwrap_or(false)).collect();
            Value::from_array((shape, data)).map_err(|e| e.to_string()).map(Into::into)
        }
        DType::String => Err("string tensor inputs are not supported".to_string()),
    }
}

fn ort_value_to_json(value: &Value) -> Result<Json, EngineError> {
    if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
        return Ok(nest_flat(&shape, data));
    }
    if let Ok((shape, data)) = value.try_extract_tensor::<f64>() {
        return Ok(nest_flat(&shape, data));
    }
    if let Ok((shape, data)) = value.try_extract_tensor::<i64>() {
        return Ok(nest_flat(&shape, data));
    }
    if let Ok((shape, data)) = value.try_extract_tensor::<i32>() {
        return Ok(nest_flat(&shape, data));
    }
    Err(EngineError::Runtime(
        "unsupported output tensor dtype".to_string(),
    ))
}

fn nest_flat<T: Into<Json> + Copy>(shape: &[i64], data: &[T]) -> Json {
    fn build<T: Into<Json> + Copy>(shape: &[i64], data: &[T]) -> Json {
        match shape {
            [] => data.first().map(|v| (*v).into()).unwrap_or(Json::Null),
            [n, rest @ ..] => {
                let n = *n as usize;
                let chunk = if rest.is_empty() { 1 } else { rest.iter().product::<i64>() as usize };
                let items = (0..n)
                    .map(|i| build(rest, &data[i * chunk..(i + 1) * chunk]))
                    .collect();
                Json::Array(items)
            }
        }
    }
    build(shape, data)
}

fn flatten_json_tensor(value: &Json) -> Result<(Vec<i64>, Vec<Json>), String> {
    fn walk(value: &Json, shape: &mut Vec<i64>, out: &mut Vec<Json>, depth: usize) -> Result<(), String> {
        match value {
            Json::Array(items) => {
                if depth == shape.len() {
                    shape.push(items.len() as i64);
                }
                for item in items {
                    walk(item, shape, out, depth + 1)?;
                }
                Ok(())
            }
            scalar => {
                out.push(scalar.clone());
                Ok(())
            }
        }
    }
    let mut shape = Vec::new();
    let mut out = Vec::new();
    walk(value, &mut shape, &mut out, 0)?;
    Ok((shape, out))
}
