pub mod commands;

use clap::{Parser, Subcommand};
use hrdesk_core::config::{ConfigOverrides, LoadOptions};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "hrdesk",
    about = "hrdesk operator CLI",
    long_about = "Migrate and seed the employee store, talk to the assistant, and call catalog tools.",
    after_help = "Examples:\n  hrdesk migrate\n  hrdesk seed\n  hrdesk ask 查询张三的人事账号\n  hrdesk call get_employee_by_id '{\"employee_id\":\"EMP001\"}'"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Override the configured SQLite database URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the sample roster into an empty employee table and verify it")]
    Seed,
    #[command(about = "Send one free-text message to the assistant and print its reply")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "Message text, e.g. 把李四的部门改为行政部")]
        text: Vec<String>,
    },
    #[command(about = "List the tool catalog with each tool's parameters")]
    Tools,
    #[command(about = "Invoke one catalog tool with a JSON object of arguments")]
    Call {
        #[arg(help = "Tool name, e.g. search_employee")]
        tool: String,
        #[arg(help = "JSON object of arguments; defaults to {}")]
        arguments: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        overrides: ConfigOverrides { database_url: cli.database_url, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    };

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed => commands::seed::run(&options),
        Command::Ask { text } => commands::ask::run(&options, &text.join(" ")),
        Command::Tools => commands::tools::run(),
        Command::Call { tool, arguments } => {
            commands::call::run(&options, &tool, arguments.as_deref())
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
