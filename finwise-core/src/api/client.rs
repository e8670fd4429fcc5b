use async_trait::async_trait;
use tracing::{debug, info};

use super::envelope::{CalculationError, Envelope};
use crate::calculators::DynCalculator;
use crate::models::{CalculatorKey, DisplayModel, FormInput, Payload, ShapeContext};

/// Transport to the calculation service. One implementation per backend;
/// the HTTP one lives in `finwise-http`.
#[async_trait]
pub trait CalculationApi: Send + Sync {
    /// POST `payload` to the route for `key` and return the response
    /// envelope. Implementations make a single attempt.
    async fn post(
        &self,
        key: CalculatorKey,
        payload: &Payload,
    ) -> Result<Envelope, CalculationError>;
}

/// Runs one submission end to end: validate, build the payload, post,
/// unwrap the envelope, decode and shape.
///
/// Validation failures return before anything is sent.
pub async fn calculate(
    api: &dyn CalculationApi,
    calculator: &dyn DynCalculator,
    input: &FormInput,
    ctx: &ShapeContext,
) -> Result<DisplayModel, CalculationError> {
    let key = calculator.key();
    calculator.validate(input)?;

    let payload = calculator.payload(input);
    debug!(calculator = %key, ?payload, "posting calculation");

    let data = api.post(key, &payload).await?.into_data()?;
    let model = calculator.shape_value(data, ctx)?;
    info!(
        calculator = %key,
        headlines = model.headlines.len(),
        tables = model.tables.len(),
        charts = model.charts.len(),
        "calculation shaped"
    );
    Ok(model)
}
