use std::time::Duration;

use anyhow::{Context, Result};

use crate::{
    cli::{chat_type_selection, Cli, Command},
    domain, infra,
    infra::export::FileExporter,
    telegram::{self, TelegramAdapter, TelegramSettings},
    usecases::{
        self, bootstrap, commands,
        context::{ExtractionSettings, Services},
        contracts::SessionProvider,
        guided_auth::{run_guided_auth, GuidedAuthOutcome, RetryPolicy},
        menu::run_menu,
        startup,
        terminal::{StdTerminal, Terminal},
    },
};

const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Finished,
    Interrupted,
}

pub fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(cli.config.as_deref())?;

    tracing::debug!(
        domain = domain::module_name(),
        telegram = telegram::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    let startup = startup::plan_startup()?;
    let command = cli.command_or_default();
    tracing::info!(command = command_label(&command), "starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let adapter = TelegramAdapter::start(TelegramSettings::new(&context.config, &startup.layout))?;
    let closer = adapter.closer();
    let job = SessionJob {
        settings: ExtractionSettings::from(&context.config),
        exporter: FileExporter::new(context.config.export.output_dir.clone()),
        phone: context.config.telegram.phone_number.clone(),
        command,
    };

    let outcome: Result<SessionEnd> = runtime.block_on(async {
        let mut session = tokio::spawn(job.run(adapter));

        tokio::select! {
            joined = &mut session => joined
                .context("session task failed")?
                .map(|()| SessionEnd::Finished),
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl+C")?;
                eprintln!("Interrupted. Closing the Telegram session...");
                session.abort();
                closer.close().await;
                Ok(SessionEnd::Interrupted)
            }
        }
    });

    // A task blocked on terminal input cannot be cancelled; do not wait on it.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    drop(startup);

    let end = outcome?;
    tracing::info!(?end, "tgfold finished");
    Ok(())
}

/// Everything the session task owns besides the Telegram adapter.
struct SessionJob {
    settings: ExtractionSettings,
    exporter: FileExporter,
    phone: Option<String>,
    command: Command,
}

impl SessionJob {
    async fn run(self, mut adapter: TelegramAdapter) -> Result<()> {
        let result = self.drive(&mut adapter).await;
        adapter.close().await;
        result
    }

    async fn drive(&self, adapter: &mut TelegramAdapter) -> Result<()> {
        let mut terminal = StdTerminal;

        adapter.connect().await?;
        if !adapter.is_authorized().await? {
            let outcome = run_guided_auth(
                &mut terminal,
                adapter,
                self.phone.as_deref(),
                &RetryPolicy::default(),
            )
            .await?;

            if outcome == GuidedAuthOutcome::ExitWithGuidance {
                return Ok(());
            }
        }

        let adapter: &TelegramAdapter = adapter;
        let services = Services {
            dialogs: adapter,
            folders: adapter,
            exporter: &self.exporter,
        };

        match &self.command {
            Command::Menu => run_menu(&mut terminal, services, &self.settings).await?,
            Command::Chats { types, format } => {
                let selection = chat_type_selection(types);
                match commands::export_chats(services, &self.settings, &selection, *format).await? {
                    Some(path) => terminal.print_line(&format!(
                        "Exported master chat list to {}",
                        path.display()
                    ))?,
                    None => terminal.print_line("No chats found matching your criteria.")?,
                }
            }
            Command::Folders { select, format } => {
                match commands::export_folders(services, &self.settings, select, *format).await? {
                    Some(path) => terminal.print_line(&format!(
                        "Exported chat folders to {}",
                        path.display()
                    ))?,
                    None => terminal.print_line("No chat folders found in your account.")?,
                }
            }
        }

        Ok(())
    }
}

fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Menu => "menu",
        Command::Chats { .. } => "chats",
        Command::Folders { .. } => "folders",
    }
}
