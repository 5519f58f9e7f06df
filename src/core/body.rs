use crate::core::table_reader;
use crate::domain::model::Payload;
use crate::domain::ports::Storage;
use crate::utils::error::{CallerError, Result};
use async_trait::async_trait;
use indexmap::IndexMap;

pub const OBJECT_FILE: &str = "object.csv";
pub const INPUT_FILE: &str = "input.csv";
pub const FRAGMENT_PREFIX: &str = "input_";
pub const FRAGMENT_EXTENSION: &str = ".csv";

/// One way of turning local files into a request body.
///
/// `Ok(None)` means the inputs this strategy looks for are absent and the
/// next strategy should be tried; an `Err` stops composition.
#[async_trait]
pub trait InputStrategy<S: Storage>: Send + Sync {
    fn name(&self) -> &str;
    async fn compose(&self, storage: &S) -> Result<Option<Payload>>;
}

/// `object.csv`: header plus one row, sent as a single JSON object.
pub struct SingleObjectInput;

#[async_trait]
impl<S: Storage> InputStrategy<S> for SingleObjectInput {
    fn name(&self) -> &str {
        "single object"
    }

    async fn compose(&self, storage: &S) -> Result<Option<Payload>> {
        let record = table_reader::read_single_object(storage, OBJECT_FILE).await?;
        Ok(record.map(Payload::Object))
    }
}

/// `input.csv`: every row sent as an element of a JSON array.
pub struct RecordListInput;

#[async_trait]
impl<S: Storage> InputStrategy<S> for RecordListInput {
    fn name(&self) -> &str {
        "record list"
    }

    async fn compose(&self, storage: &S) -> Result<Option<Payload>> {
        match table_reader::read_table(storage, INPUT_FILE).await {
            Ok(records) => Ok(Some(Payload::List(records))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// `input_<name>.csv` files, each keyed under `<name>` in one JSON object.
pub struct FragmentInput;

impl FragmentInput {
    fn fragment_key(file_name: &str) -> Option<&str> {
        file_name
            .strip_prefix(FRAGMENT_PREFIX)?
            .strip_suffix(FRAGMENT_EXTENSION)
    }
}

#[async_trait]
impl<S: Storage> InputStrategy<S> for FragmentInput {
    fn name(&self) -> &str {
        "named fragments"
    }

    async fn compose(&self, storage: &S) -> Result<Option<Payload>> {
        let files = storage.list_files().await.map_err(|e| CallerError::Config {
            message: format!("reading input directory: {}", e),
        })?;

        let mut fragments = IndexMap::new();
        for file_name in &files {
            let Some(key) = Self::fragment_key(file_name) else {
                continue;
            };
            let records = table_reader::read_table(storage, file_name).await?;
            fragments.insert(key.to_string(), records);
        }

        Ok(Some(Payload::Fragments(fragments)))
    }
}

/// Tries each input strategy in order; the first one that finds its files wins.
pub struct BodyComposer<S: Storage> {
    strategies: Vec<Box<dyn InputStrategy<S>>>,
}

impl<S: Storage> BodyComposer<S> {
    pub fn new(strategies: Vec<Box<dyn InputStrategy<S>>>) -> Self {
        Self { strategies }
    }

    pub async fn compose(&self, storage: &S) -> Result<Vec<u8>> {
        for strategy in &self.strategies {
            let Some(payload) = strategy.compose(storage).await? else {
                tracing::debug!("No {} input found", strategy.name());
                continue;
            };

            tracing::info!("Request body built from {} input", strategy.name());
            let bytes = serde_json::to_vec(&payload)?;
            tracing::debug!("Body >>> {}", String::from_utf8_lossy(&bytes));
            return Ok(bytes);
        }

        Err(CallerError::FileNotFound {
            path: "request body input".to_string(),
        })
    }
}

impl<S: Storage> Default for BodyComposer<S> {
    fn default() -> Self {
        Self::new(vec![
            Box::new(SingleObjectInput) as Box<dyn InputStrategy<S>>,
            Box::new(RecordListInput),
            Box::new(FragmentInput),
        ])
    }
}
