use hrdesk_agent::{ToolCatalog, ToolDescriptor};

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let catalog = ToolCatalog::standard();
    let lines = catalog.descriptors().iter().map(signature).collect::<Vec<_>>();
    CommandResult::success("tools", lines.join("\n"))
}

/// `name(required, [optional]) - description`
fn signature(tool: &ToolDescriptor) -> String {
    let parameters = tool
        .parameters
        .iter()
        .map(|parameter| {
            if parameter.required {
                parameter.name.to_string()
            } else {
                format!("[{}]", parameter.name)
            }
        })
        .collect::<Vec<_>>();
    format!("{}({}) - {}", tool.name, parameters.join(", "), tool.description)
}
