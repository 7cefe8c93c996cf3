// Console commands - one line of user input per settings change
use crate::application::fetch_orchestrator::{SessionSnapshot, SettingsChange};
use crate::domain::model::MachineId;
use crate::domain::settings::AggregationOperator;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  server <url>                       change the metrics server (reloads after 1s of quiet)
  product <name>|-                   select a product
  machine <id>|-                     select a machine
  operator median|min|max|quantile|- aggregation for clustered charts
  quantile <0..1>                    quantile used by the quantile operator
  preview on|off                     toggle the scrollbar preview in line charts
  reload                             fetch /info again
  status                             show the current selection
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Change(SettingsChange),
    Reload,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid {what}: {value}")]
    InvalidArgument { what: &'static str, value: String },
}

fn optional(arg: &str) -> Option<&str> {
    (arg != "-").then_some(arg)
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    let require = |name: &'static str| {
        if arg.is_empty() {
            Err(CommandError::MissingArgument(name))
        } else {
            Ok(arg)
        }
    };
    let invalid = |what: &'static str| CommandError::InvalidArgument {
        what,
        value: arg.to_string(),
    };

    let change = match name {
        "server" => SettingsChange::ServerUrl(require("server")?.trim_end_matches('/').to_string()),
        "product" => SettingsChange::Product(optional(require("product")?).map(str::to_string)),
        "machine" => {
            let machine = match optional(require("machine")?) {
                Some(id) => Some(id.parse::<MachineId>().map_err(|_| invalid("machine id"))?),
                None => None,
            };
            SettingsChange::Machine(machine)
        }
        "operator" => {
            let operator = match optional(require("operator")?) {
                Some(op) => Some(op.parse::<AggregationOperator>().map_err(|_| invalid("operator"))?),
                None => None,
            };
            SettingsChange::AggregationOperator(operator)
        }
        "quantile" => {
            let quantile: f64 = require("quantile")?.parse().map_err(|_| invalid("quantile"))?;
            if !(0.0..=1.0).contains(&quantile) {
                return Err(invalid("quantile"));
            }
            SettingsChange::Quantile(quantile)
        }
        "preview" => match require("preview")? {
            "on" => SettingsChange::ShowScrollbarXPreview(true),
            "off" => SettingsChange::ShowScrollbarXPreview(false),
            _ => return Err(invalid("preview option")),
        },
        "reload" => return Ok(Command::Reload),
        "status" => return Ok(Command::Status),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Command::Change(change))
}

pub fn format_status(snapshot: &SessionSnapshot) -> String {
    let settings = &snapshot.settings;
    let machines: Vec<String> = snapshot
        .machines
        .iter()
        .map(|m| {
            let marker = if Some(m.id) == settings.selected_machine { "*" } else { "" };
            if m.name.is_empty() {
                format!("{}{}", marker, m.id)
            } else {
                format!("{}{} ({})", marker, m.id, m.name)
            }
        })
        .collect();
    let operator = settings
        .aggregation_operator
        .map(|op| op.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "server:   {}{}\nproducts: {}\nproduct:  {}\nmachines: {}\noperator: {} (quantile {})",
        settings.server_url,
        if snapshot.is_fetching {
            " (loading)"
        } else if snapshot.info_reload_pending {
            " (reload scheduled)"
        } else {
            ""
        },
        snapshot.products.join(", "),
        settings.product().unwrap_or("-"),
        machines.join(", "),
        operator,
        settings.quantile
    )
}
