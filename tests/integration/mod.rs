mod api_contract;
mod cli_commands;
mod workflows;
