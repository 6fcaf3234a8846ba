use cardvault::application::fraud::FraudDispatcher;
use cardvault::application::payments::PaymentService;
use cardvault::application::tokenization::TokenizationService;
use cardvault::config::VaultConfig;
use cardvault::domain::auth::AuthorizationClaims;
use cardvault::domain::payment::{IncomingEvent, PaymentRequest};
use cardvault::domain::ports::{AlertStoreRef, EventPublisherRef, TokenStoreRef};
use cardvault::error::{ErrorKind, VaultError};
use cardvault::infrastructure::csv_alerts::CsvAlertStore;
use cardvault::infrastructure::event_bus::{ChannelEventBus, JsonLinesOutbox};
use cardvault::infrastructure::in_memory::{InMemoryAlertStore, InMemoryTokenStore};
use cardvault::infrastructure::local_kms::LocalKms;
use cardvault::interfaces::csv::event_reader::EventReader;
use cardvault::interfaces::json::{ErrorResponse, FraudCheckResponse, parse_event_lines, parse_events};
use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: VaultConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a fresh base64 master key
    Keygen,
    /// Tokenize an account number
    Tokenize {
        account_number: String,
    },
    /// Detokenize and approve a payment
    Pay {
        #[arg(long)]
        token: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<Decimal>,
        /// Caller client id, as asserted by the gateway
        #[arg(long)]
        client_id: Option<String>,
        /// Caller scopes, whitespace separated
        #[arg(long)]
        scope: Option<String>,
    },
    /// Evaluate payment events and record fraud alerts
    FraudCheck {
        /// Input file, or `-` for stdin
        input: PathBuf,
        /// Input format. Guessed from the file extension when omitted.
        #[arg(long, value_enum)]
        format: Option<InputFormat>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    Json,
    Jsonl,
    Csv,
}

impl InputFormat {
    fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => InputFormat::Csv,
            Some("jsonl") | Some("ndjson") => InputFormat::Jsonl,
            _ => InputFormat::Json,
        }
    }
}

struct Storage {
    tokens: TokenStoreRef,
    alerts: AlertStoreRef,
}

fn in_memory() -> (TokenStoreRef, AlertStoreRef) {
    (
        Arc::new(InMemoryTokenStore::new()),
        Arc::new(InMemoryAlertStore::new()),
    )
}

fn open_storage(config: &VaultConfig) -> Result<Storage> {
    let (tokens, alerts): (TokenStoreRef, AlertStoreRef) = match &config.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            let store = cardvault::infrastructure::rocksdb::RocksDBStore::open(db_path).map_err(
                |e| miette::miette!("cannot open database: {}", e.detail().unwrap_or_default()),
            )?;
            (
                Arc::new(store.clone()) as TokenStoreRef,
                Arc::new(store) as AlertStoreRef,
            )
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            in_memory()
        }
        None => in_memory(),
    };

    let alerts = match &config.alerts_out {
        Some(path) => Arc::new(CsvAlertStore::new(path)) as AlertStoreRef,
        None => alerts,
    };
    Ok(Storage { tokens, alerts })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn exit_code(kind: ErrorKind) -> ExitCode {
    match kind {
        ErrorKind::Internal => ExitCode::from(1),
        ErrorKind::BadRequest => ExitCode::from(2),
        ErrorKind::Forbidden => ExitCode::from(3),
        ErrorKind::NotFound => ExitCode::from(4),
    }
}

/// Prints the success body on stdout, or the caller-safe error body and
/// a kind-specific exit code.
fn respond<T: Serialize>(outcome: Result<T, VaultError>) -> Result<ExitCode> {
    match outcome {
        Ok(body) => {
            println!("{}", serde_json::to_string(&body).into_diagnostic()?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!(
                "{}",
                serde_json::to_string(&ErrorResponse::from(&e)).into_diagnostic()?
            );
            Ok(exit_code(e.kind()))
        }
    }
}

fn read_events(
    input: &Path,
    format: InputFormat,
) -> Result<Result<Vec<IncomingEvent>, VaultError>> {
    let mut raw = String::new();
    if input == Path::new("-") {
        io::stdin().read_to_string(&mut raw).into_diagnostic()?;
    } else {
        raw = std::fs::read_to_string(input).into_diagnostic()?;
    }

    Ok(match format {
        InputFormat::Json => parse_events(&raw),
        InputFormat::Jsonl => Ok(parse_event_lines(&raw)),
        InputFormat::Csv => Ok(EventReader::new(raw.as_bytes())
            .events()
            .map(|row| {
                row.unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Error reading event");
                    IncomingEvent::default()
                })
            })
            .collect()),
    })
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();
    let config = cli.config;

    match cli.command {
        Command::Keygen => {
            println!("{}", LocalKms::generate_key());
            Ok(ExitCode::SUCCESS)
        }
        Command::Tokenize { account_number } => {
            let storage = open_storage(&config)?;
            let service = TokenizationService::new(
                Arc::new(config.kms()?),
                storage.tokens,
                config.key_id(),
            );
            respond(service.tokenize(&account_number).await)
        }
        Command::Pay {
            token,
            amount,
            client_id,
            scope,
        } => {
            let policy = config.access_policy()?;
            let kms = config.kms()?;
            let storage = open_storage(&config)?;
            let dispatcher = FraudDispatcher::new(config.rules(), storage.alerts);

            // Without an outbox file, events go to an in-process consumer.
            let (publisher, consumer) = match &config.events_out {
                Some(path) => (
                    Arc::new(JsonLinesOutbox::new(path)) as EventPublisherRef,
                    None,
                ),
                None => {
                    let (bus, rx) = ChannelEventBus::new();
                    let consumer = tokio::spawn(async move { dispatcher.consume(rx).await });
                    (Arc::new(bus) as EventPublisherRef, Some(consumer))
                }
            };

            let service = PaymentService::new(
                policy,
                Arc::new(kms),
                storage.tokens,
                publisher,
                config.key_id(),
            );
            let claims = AuthorizationClaims::new(client_id.as_deref(), scope.as_deref());
            let outcome = service
                .process_payment(&claims, PaymentRequest { token, amount })
                .await;

            service.shutdown().await;
            drop(service);
            if let Some(consumer) = consumer {
                match consumer.await.into_diagnostic()? {
                    Ok(created) => tracing::info!(alerts_created = created, "fraud check done"),
                    Err(e) => {
                        tracing::error!(detail = e.detail().unwrap_or_default(), "fraud check failed")
                    }
                }
            }
            respond(outcome)
        }
        Command::FraudCheck { input, format } => {
            let format = format.unwrap_or_else(|| InputFormat::detect(&input));
            let storage = open_storage(&config)?;
            let dispatcher = FraudDispatcher::new(config.rules(), storage.alerts);

            let outcome = match read_events(&input, format)? {
                Ok(events) => dispatcher
                    .dispatch(events)
                    .await
                    .map(|alerts_created| FraudCheckResponse { alerts_created }),
                Err(e) => Err(e),
            };
            if let Err(e) = &outcome {
                tracing::error!(detail = e.detail().unwrap_or_default(), "fraud check failed");
            }
            respond(outcome)
        }
    }
}
