use crate::{
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use connectors::query::{
    client::DefaultQueryClient, memory::InMemoryQueryService, poll::FixedInterval,
};
use engine_config::settings::ReaderSettings;
use engine_processing::reader::{PageReader, paging::PagingQueryReader};
use model::records::{decode::PassThrough, row::RowData};
use std::{io::Write, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod shutdown;

#[derive(Parser)]
#[command(name = "pagewise", version = "0.1.0", about = "Paged query result reader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays a clean JSON-lines stream
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli.command, shutdown.cancel_token()).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => ExitCode::ShutdownRequested,
        Err(err) => {
            error!("{}", err);
            ExitCode::GeneralError
        }
    };

    if shutdown.is_shutdown_requested() {
        info!("Stopped on shutdown request");
    }
    std::process::exit(code.as_i32());
}

async fn run(command: Commands, cancel: CancellationToken) -> Result<(), CliError> {
    match command {
        Commands::Read {
            settings,
            fixture,
            page_size,
        } => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let written = read_records(&settings, &fixture, page_size, &cancel, &mut out).await?;
            out.flush()?;
            info!("Read {} records", written);
        }
        Commands::Validate { settings } => {
            let validated = ReaderSettings::from_file(&settings)?.validate()?;
            info!(
                "Settings are valid: database '{}', page size {}, poll interval {:?}",
                validated.query().database,
                validated.page_size(),
                validated.poll_interval()
            );
        }
    }

    Ok(())
}

async fn read_records<W: Write>(
    settings_path: &str,
    fixture_path: &str,
    page_size: Option<usize>,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<usize, CliError> {
    let mut settings = ReaderSettings::from_file(settings_path)?;
    if let Some(page_size) = page_size {
        settings.page_size = page_size;
    }
    let settings = settings.validate()?;

    let service = Arc::new(InMemoryQueryService::from_fixture_file(fixture_path)?);
    let client = DefaultQueryClient::new(service)
        .with_poll_strategy(Arc::new(FixedInterval::new(settings.poll_interval())));
    let reader = PagingQueryReader::from_settings(Arc::new(client), &settings, PassThrough);

    reader.open().await?;
    let result = write_pages(&reader, cancel, out).await;
    reader.close().await?;
    result
}

async fn write_pages<R, W>(
    reader: &R,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<usize, CliError>
where
    R: PageReader<Item = RowData>,
    W: Write,
{
    let mut written = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(CliError::ShutdownRequested);
        }

        let page = reader.read_page().await?;
        if page.is_empty() {
            return Ok(written);
        }

        for row in page.iter() {
            serde_json::to_writer(&mut *out, &row.to_json())?;
            writeln!(out)?;
        }
        written += page.len();
    }
}
