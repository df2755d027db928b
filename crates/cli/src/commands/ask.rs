use hrdesk_agent::AgentRuntime;
use hrdesk_core::config::LoadOptions;

use crate::commands::{
    async_runtime, executor_for, load_config, open_migrated_pool, CommandResult, StepFailure,
};

pub fn run(options: &LoadOptions, text: &str) -> CommandResult {
    let config = match load_config("ask", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match async_runtime("ask") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated_pool(&config).await?;
        let agent = AgentRuntime::new(executor_for(&config, pool.clone()));
        let reply = agent.handle_message(text).await;
        pool.close().await;
        Ok::<String, StepFailure>(reply)
    });

    match result {
        Ok(reply) => CommandResult::success("ask", reply),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}
