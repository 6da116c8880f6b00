mod api;
mod commands;
mod error;

use api::ApiState;
use clap::Parser;
use colored::Colorize;
use commands::{Cli, Commands, ConfigCommands};
use error::AppError;
use log::{info, warn};
use passkey_pay_core::native::account_watch::run_account_watch;
use passkey_pay_core::native::{KeypairWallet, NativeRpcClient, PortalSender};
use passkey_pay_core::{
    BalanceService, ChunkProgress, RpcClient, Settings, TransactionOptions, TransferRequest,
    TransferService, TransferStatus, WalletCapability,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if let Err(error) = handle_command(cli).await {
        eprintln!("{} {}", "ERROR:".red(), error);
        std::process::exit(1);
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, AppError> {
    let settings = if cli.config.exists() {
        let path = cli
            .config
            .to_str()
            .ok_or_else(|| AppError::Init("Config path is not valid UTF-8".to_string()))?;
        Settings::from_file(path)?
    } else {
        info!(
            "Config file {} not found, using defaults",
            cli.config.display()
        );
        Settings::default()
    };
    settings.validate()?;
    Ok(settings)
}

fn build_rpc(settings: &Settings) -> Arc<dyn RpcClient> {
    Arc::new(NativeRpcClient::new(settings.solana_rpc_urls[0].clone()))
}

fn build_portal(settings: &Settings) -> Result<Arc<PortalSender>, AppError> {
    Ok(Arc::new(PortalSender::new(
        settings.paymaster_url.clone(),
        settings.paymaster_api_key.clone(),
        Duration::from_secs(settings.http_timeout_secs),
    )?))
}

fn build_balances(settings: &Settings) -> Arc<BalanceService> {
    Arc::new(BalanceService::new(
        settings.debounce(),
        settings.cache_capacity,
    ))
}

async fn handle_command(cli: Cli) -> Result<(), AppError> {
    match &cli.command {
        Commands::Balance { address, force } => {
            let settings = load_settings(&cli)?;
            let rpc = build_rpc(&settings);
            let balances = build_balances(&settings);

            let address = match address {
                Some(a) => a.clone(),
                None => {
                    let wallet = KeypairWallet::from_settings(&settings, rpc.clone(), None)?;
                    wallet.address().to_string()
                }
            };

            let snapshot = balances.refresh(&address, *force, rpc.as_ref()).await?;
            println!(
                "{} {:.9} SOL ({} lamports) as of {}",
                address,
                snapshot.sol(),
                snapshot.lamports,
                snapshot.observed_at.to_rfc3339()
            );
            Ok(())
        }

        Commands::Send {
            recipient,
            amount,
            max_chunk,
            no_sponsor,
        } => {
            let settings = load_settings(&cli)?;
            let rpc = build_rpc(&settings);
            let portal = build_portal(&settings)?;
            let balances = build_balances(&settings);

            let wallet = Arc::new(KeypairWallet::from_settings(
                &settings,
                rpc.clone(),
                Some(portal),
            )?);
            wallet.connect().await?;

            let options = TransactionOptions {
                fee_sponsored: settings.fee_sponsored && !no_sponsor,
                commitment: settings.commitment.clone(),
            };
            let max_chunk = max_chunk.unwrap_or(settings.max_chunk_sol);
            let request =
                TransferRequest::new(wallet.address().to_string(), recipient.clone(), *amount);

            let on_progress = |p: ChunkProgress| {
                println!("chunk {}/{} attempted", p.current, p.total);
            };
            let service = TransferService::new();
            let outcome = service
                .submit_transfer(
                    &request,
                    max_chunk,
                    wallet.as_ref(),
                    &options,
                    Some(&on_progress),
                )
                .await?;

            for signature in &outcome.signatures {
                println!("confirmed: {}", signature);
            }

            if outcome.succeeded_chunks > 0 {
                // Settlement lags confirmation; run the forced refreshes
                // before reporting the post-transfer balance.
                let handle = balances.schedule_reconciliation(
                    &request.origin,
                    &settings.reconcile_delays(),
                    rpc.clone(),
                );
                handle.wait().await;
                if let Some(snapshot) = balances.last_known(&request.origin) {
                    println!("wallet balance: {:.9} SOL", snapshot.sol());
                }
            }

            match outcome.status() {
                TransferStatus::Confirmed => {
                    println!(
                        "{} {} SOL sent to {} in {} chunk(s)",
                        "OK:".green(),
                        amount,
                        recipient,
                        outcome.total_chunks
                    );
                    Ok(())
                }
                TransferStatus::Partial => Err(AppError::Init(format!(
                    "partial transfer: {}/{} chunks confirmed ({}); verify the balance before resending the remainder",
                    outcome.succeeded_chunks,
                    outcome.total_chunks,
                    outcome
                        .failure_reason
                        .unwrap_or_else(|| "unknown failure".to_string())
                ))),
                TransferStatus::Failed => Err(AppError::Init(
                    outcome
                        .failure_reason
                        .as_deref()
                        .map(passkey_pay_core::describe_rejection)
                        .unwrap_or_else(|| "transfer failed".to_string()),
                )),
            }
        }

        Commands::Sign { message } => {
            let settings = load_settings(&cli)?;
            let rpc = build_rpc(&settings);

            let wallet = KeypairWallet::from_settings(&settings, rpc, None)?;
            wallet.connect().await?;
            let signed = wallet.sign_message(message).await?;
            println!("{}", signed.signature);
            Ok(())
        }

        Commands::Watch { address } => {
            let settings = load_settings(&cli)?;
            let rpc = build_rpc(&settings);
            let balances = build_balances(&settings);

            let ws_url = settings
                .solana_ws_urls
                .first()
                .cloned()
                .ok_or_else(|| AppError::Init("solana_ws_urls is empty".to_string()))?;
            let address = match address {
                Some(a) => a.clone(),
                None => {
                    let wallet = KeypairWallet::from_settings(&settings, rpc.clone(), None)?;
                    wallet.address().to_string()
                }
            };
            passkey_pay_core::validate_address(&address)?;

            println!("Watching {} (Ctrl+C to stop)", address);
            let watch = {
                let balances = balances.clone();
                let address = address.clone();
                let commitment = settings.commitment.clone();
                tokio::spawn(async move {
                    run_account_watch(&ws_url, &address, &commitment, balances).await
                })
            };

            let mut last_seen = None;
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                if watch.is_finished() {
                    let result = watch.await;
                    return Err(AppError::Init(format!(
                        "account watch stopped: {:?}",
                        result
                    )));
                }
                if let Some(snapshot) = balances.last_known(&address) {
                    if last_seen != Some(snapshot.lamports) {
                        println!(
                            "{} {:.9} SOL ({} lamports)",
                            snapshot.observed_at.to_rfc3339(),
                            snapshot.sol(),
                            snapshot.lamports
                        );
                        last_seen = Some(snapshot.lamports);
                    }
                }
            }
        }

        Commands::Serve { port } => {
            let _ = tracing_subscriber::fmt().try_init();
            let settings = load_settings(&cli)?;
            let rpc = build_rpc(&settings);
            let portal = build_portal(&settings)?;
            let balances = build_balances(&settings);

            let wallet = match KeypairWallet::from_settings(&settings, rpc.clone(), Some(portal)) {
                Ok(wallet) => {
                    wallet.connect().await?;
                    Some(Arc::new(wallet))
                }
                Err(e) => {
                    warn!("No wallet available, /transfer disabled: {}", e);
                    None
                }
            };

            let state = Arc::new(ApiState {
                settings,
                transfers: TransferService::new(),
                balances,
                rpc,
                wallet,
            });
            api::serve(state, *port).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let settings = load_settings(&cli)?;
                print!("{}", toml::to_string(&settings)?);
                Ok(())
            }
            ConfigCommands::Validate { file } => {
                let path = file.as_ref().unwrap_or(&cli.config);
                let path_str = path
                    .to_str()
                    .ok_or_else(|| AppError::Init("Config path is not valid UTF-8".to_string()))?;
                let settings = Settings::from_file(path_str)?;
                settings.validate()?;
                println!("{} {} is valid", "OK:".green(), path.display());
                Ok(())
            }
        },
    }
}
