use hrdesk_agent::{DispatchError, ToolCatalog, ToolDispatcher};
use hrdesk_core::config::LoadOptions;
use serde_json::{Map, Value};

use crate::commands::{
    async_runtime, executor_for, load_config, open_migrated_pool, CommandResult, StepFailure,
};

/// Prints the tool's `{success, message, data}` envelope as the outcome message.
/// An envelope with `success: false` exits with code 1.
pub fn run(options: &LoadOptions, tool: &str, arguments: Option<&str>) -> CommandResult {
    let arguments = match parse_arguments(arguments.unwrap_or("{}")) {
        Ok(arguments) => arguments,
        Err(message) => return CommandResult::failure("call", "invalid_arguments", message, 2),
    };

    let config = match load_config("call", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match async_runtime("call") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated_pool(&config).await?;
        let dispatcher = ToolDispatcher::new(ToolCatalog::standard(), executor_for(&config, pool.clone()));
        let response = dispatcher.invoke(tool, &arguments).await.map_err(|error| {
            let error_class = match error {
                DispatchError::UnknownTool(_) => "unknown_tool",
                DispatchError::InvalidArgument { .. } => "invalid_argument",
            };
            (error_class, error.to_string(), 2u8)
        });
        pool.close().await;
        Ok::<_, StepFailure>(response?)
    });

    match result {
        Ok(response) => {
            let envelope = serde_json::to_string(&response)
                .unwrap_or_else(|_| response.message.clone());
            if response.success {
                CommandResult::success("call", envelope)
            } else {
                CommandResult::failure("call", "tool_failure", envelope, 1)
            }
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("call", error_class, message, exit_code)
        }
    }
}

fn parse_arguments(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(other) => Err(format!("arguments must be a JSON object, got {other}")),
        Err(error) => Err(format!("arguments are not valid JSON: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_arguments;

    #[test]
    fn arguments_must_be_a_json_object() {
        assert_eq!(parse_arguments(r#"{"name":"张三"}"#).expect("object").len(), 1);
        assert!(parse_arguments("[1]").expect_err("array").contains("JSON object"));
        assert!(parse_arguments("{").expect_err("syntax").contains("not valid JSON"));
    }
}
