use std::marker::PhantomData;

use crate::pipeline::{Envelope, PipelineError, Transform};
use energy_client::domain::{ConsumptionRecord, RawConsumption};

/// Pure cleaning of a raw consumption row.
///
/// Rules:
/// - the timestamp must have parsed;
/// - gas, electricity and total must all be present and not NaN.
///
/// Negative values are kept; they are reported by the data-quality panel.
pub fn clean_consumption(env: Envelope<RawConsumption>) -> Result<Envelope<ConsumptionRecord>, PipelineError> {
    let line = env.line;
    let raw = env.payload;

    match raw.complete() {
        Some(record) => Ok(Envelope { payload: record, line }),
        None if raw.ts.is_none() => Err(PipelineError::Transform(format!(
            "line {line}: unparsable or missing timestamp"
        ))),
        None => Err(PipelineError::Transform(format!("line {line}: missing measurement"))),
    }
}

#[derive(Clone, Default)]
pub struct ConsumptionCleaning;

#[async_trait::async_trait]
impl Transform<RawConsumption, ConsumptionRecord> for ConsumptionCleaning {
    async fn apply(
        &self,
        input: Envelope<RawConsumption>,
    ) -> Result<Envelope<ConsumptionRecord>, PipelineError> {
        // Rejections are counted by the sink as dropped rows.
        clean_consumption(input)
    }
}

/// Forwards rows unchanged. Capacity rows need no cleaning beyond parsing.
pub struct Passthrough<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for Passthrough<T> {
    fn default() -> Self {
        Self { _marker: PhantomData }
    }
}

#[async_trait::async_trait]
impl<T: Send + 'static> Transform<T, T> for Passthrough<T> {
    async fn apply(&self, input: Envelope<T>) -> Result<Envelope<T>, PipelineError> {
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn raw(electricity_mw: Option<f64>) -> Envelope<RawConsumption> {
        Envelope {
            payload: RawConsumption {
                ts: Some(datetime!(2012-01-01 00:00)),
                electricity_mw,
                gas_mw: Some(50_000.0),
                total_mw: Some(110_000.0),
            },
            line: 7,
        }
    }

    #[test]
    fn complete_row_is_kept() {
        let env = clean_consumption(raw(Some(60_000.0))).unwrap();
        assert_eq!(env.line, 7);
        assert_eq!(env.payload.electricity_mw, 60_000.0);
    }

    #[test]
    fn negative_value_is_kept() {
        let env = clean_consumption(raw(Some(-5.0))).unwrap();
        assert_eq!(env.payload.electricity_mw, -5.0);
    }

    #[test]
    fn missing_measurement_is_rejected() {
        let res = clean_consumption(raw(None));
        assert!(matches!(res, Err(PipelineError::Transform(_))));
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        let mut env = raw(Some(1.0));
        env.payload.ts = None;
        let res = clean_consumption(env);
        assert!(matches!(res, Err(PipelineError::Transform(msg)) if msg.contains("timestamp")));
    }

    #[tokio::test]
    async fn cleaning_step_leaves_counting_to_the_sink() {
        use crate::sinks::TableSink;
        use crate::pipeline::Sink;

        let rejected = ConsumptionCleaning.apply(raw(None)).await;
        assert!(matches!(rejected, Err(PipelineError::Transform(_))));

        let kept = ConsumptionCleaning.apply(raw(Some(1.0))).await;
        let rows = TableSink::new("consumption")
            .run(futures::stream::iter(vec![rejected, kept]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
