use hrdesk_core::config::LoadOptions;
use hrdesk_db::SampleRoster;

use crate::commands::{async_runtime, load_config, open_migrated_pool, CommandResult, StepFailure};

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match async_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated_pool(&config).await?;

        let seeded = SampleRoster::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8));
        let outcome: Result<String, StepFailure> = match seeded {
            Ok(seed) if seed.skipped_existing > 0 => Ok(format!(
                "employee table already holds {} records; sample roster not loaded",
                seed.skipped_existing
            )),
            Ok(seed) => match SampleRoster::verify(&pool).await {
                Ok(verification) if verification.all_present => {
                    Ok(format!("sample roster loaded: {}", seed.seeded.join(", ")))
                }
                Ok(verification) => Err((
                    "seed_verification",
                    verification_message(&verification.checks),
                    6u8,
                )),
                Err(error) => Err(("seed_verification", error.to_string(), 6u8)),
            },
            Err(failure) => Err(failure),
        };

        pool.close().await;
        outcome
    });

    match result {
        Ok(message) => CommandResult::success("seed", message),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();

    if failed_checks.is_empty() {
        "some sample records failed to load".to_string()
    } else {
        format!("seed verification failed for: {}", failed_checks.join(", "))
    }
}
