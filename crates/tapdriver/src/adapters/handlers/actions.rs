use serde_json::Value;

use super::common::done;
use crate::adapters::command::CommandContext;
use crate::adapters::payload::parse_action_batch;
use crate::usecases::PerformActionsUseCase;
use crate::usecases::ports::DriverError;

pub fn perform_actions(ctx: &CommandContext<'_>) -> Result<Value, DriverError> {
    let batch = parse_action_batch(ctx.body())?;
    ctx.usecases.actions.execute(ctx.session()?, batch)?;
    Ok(done())
}
