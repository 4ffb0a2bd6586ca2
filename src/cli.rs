use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    domain::{chat_list::ChatTypeSelection, dialog::ChatType},
    infra::export::ExportFormat,
};

#[derive(Debug, Parser)]
#[command(
    name = "tgfold",
    about = "Export Telegram chat lists and chat folder membership to CSV or JSON"
)]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Interactive menu
    Menu,
    /// Export the master chat list
    Chats {
        /// Chat types to include, comma separated (default: all)
        #[arg(long, value_enum, value_delimiter = ',')]
        types: Vec<ChatTypeArg>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
    /// Export chat folder membership
    Folders {
        /// 1-based folder positions, comma separated (default: all folders)
        #[arg(long, value_delimiter = ',')]
        select: Vec<usize>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChatTypeArg {
    Personal,
    Group,
    Channel,
    Bot,
}

impl From<ChatTypeArg> for ChatType {
    fn from(arg: ChatTypeArg) -> Self {
        match arg {
            ChatTypeArg::Personal => ChatType::Personal,
            ChatTypeArg::Group => ChatType::Group,
            ChatTypeArg::Channel => ChatType::Channel,
            ChatTypeArg::Bot => ChatType::Bot,
        }
    }
}

/// No `--types` keeps every dialog, unknown ones included.
pub fn chat_type_selection(types: &[ChatTypeArg]) -> ChatTypeSelection {
    if types.is_empty() {
        return ChatTypeSelection::all();
    }

    ChatTypeSelection::only(types.iter().copied().map(ChatType::from))
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command.clone().unwrap_or(Command::Menu)
    }
}
