use std::{path::PathBuf, pin::Pin, sync::Arc};

use futures::{Stream, StreamExt};

/// A row travelling through a pipeline, tagged with the line it was read from.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub line: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("source error: {0}")]
    Source(String),
    /// The row was rejected by a cleaning step. Sinks drop it and carry on.
    #[error("transform error: {0}")]
    Transform(String),
}

pub type RecordStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> RecordStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    type Output: Send;

    async fn run<S>(&self, input: S) -> Result<Self::Output, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

/// Source → cleaning step → sink.
pub struct Pipeline<S, I, O, K> {
    pub source: S,
    pub clean: Arc<dyn Transform<I, O> + Send + Sync>,
    pub sink: K,
}

impl<S, I, O, K> Pipeline<S, I, O, K>
where
    I: Send + 'static,
    O: Send + 'static,
    S: Source<I> + Send + Sync + 'static,
    K: Sink<O> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<K::Output, PipelineError> {
        let raw = self.source.stream().await;

        let clean = self.clean;
        let stream: RecordStream<O> = Box::pin(raw.then(move |item| {
            let clean = clean.clone();
            async move {
                match item {
                    Ok(env) => clean.apply(env).await,
                    Err(e) => Err(e),
                }
            }
        }));

        self.sink.run(stream).await
    }
}
