// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Decksmith CLI entrypoint.
//!
//! By default this serves MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp`.
//!
//! Use `--stdio` to run the MCP server over stdio instead (intended for tool integrations).

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use axum::Router;
use decksmith::config::{ServerConfig, Transport, DEFAULT_MCP_HTTP_PORT};
use decksmith::format::WriteDurability;
use decksmith::mcp::DecksmithMcp;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing_subscriber::EnvFilter;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--port <port>] [options]\n  {program} --stdio [options]\n\nOptions:\n  --durable-writes            fsync document writes (slower)\n  --idle-timeout-secs <secs>  evict sessions idle this long (default 1800)\n  --max-sessions <n>          cap on open sessions (default 64)\n  --max-sessions-per-identity <n>\n                              cap on sessions one caller may hold (default 16)\n  --lock-timeout-secs <secs>  wait for a busy session this long (default 30)\n  --identity-header <name>    HTTP header naming the caller (default x-decksmith-identity)\n\nHTTP mode (default) serves MCP at `http://127.0.0.1:<port>/mcp`.\n--port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\n\nLogs go to stderr; set RUST_LOG to adjust (default decksmith=info)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    stdio: bool,
    port: Option<u16>,
    durable_writes: bool,
    idle_timeout_secs: Option<u64>,
    max_sessions: Option<usize>,
    max_sessions_per_identity: Option<usize>,
    lock_timeout_secs: Option<u64>,
    identity_header: Option<HeaderName>,
}

impl CliOptions {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if self.stdio {
            config.transport = Transport::Stdio;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.durable_writes {
            config.durability = WriteDurability::Durable;
        }
        if let Some(secs) = self.idle_timeout_secs {
            config.session.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(max_sessions) = self.max_sessions {
            config.session.max_sessions = max_sessions;
        }
        if let Some(max_sessions) = self.max_sessions_per_identity {
            config.session.max_sessions_per_identity = max_sessions;
        }
        if let Some(secs) = self.lock_timeout_secs {
            config.session.lock_timeout = Duration::from_secs(secs);
        }
        config.identity_header = self.identity_header;
        config
    }
}

fn parse_value<T: std::str::FromStr>(
    slot: &Option<T>,
    args: &mut impl Iterator<Item = String>,
) -> Result<T, ()> {
    if slot.is_some() {
        return Err(());
    }
    args.next().ok_or(())?.parse().map_err(|_| ())
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stdio" => {
                if options.stdio {
                    return Err(());
                }
                options.stdio = true;
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            "--port" => options.port = Some(parse_value(&options.port, &mut args)?),
            "--idle-timeout-secs" => {
                options.idle_timeout_secs =
                    Some(parse_value(&options.idle_timeout_secs, &mut args)?);
            }
            "--max-sessions" => {
                let max_sessions: usize = parse_value(&options.max_sessions, &mut args)?;
                if max_sessions == 0 {
                    return Err(());
                }
                options.max_sessions = Some(max_sessions);
            }
            "--max-sessions-per-identity" => {
                let max_sessions: usize =
                    parse_value(&options.max_sessions_per_identity, &mut args)?;
                if max_sessions == 0 {
                    return Err(());
                }
                options.max_sessions_per_identity = Some(max_sessions);
            }
            "--lock-timeout-secs" => {
                options.lock_timeout_secs =
                    Some(parse_value(&options.lock_timeout_secs, &mut args)?);
            }
            "--identity-header" => {
                options.identity_header = Some(parse_value(&options.identity_header, &mut args)?);
            }
            _ => return Err(()),
        }
    }

    if options.stdio && (options.port.is_some() || options.identity_header.is_some()) {
        return Err(());
    }

    Ok(options)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("decksmith=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

async fn serve_http(mcp: DecksmithMcp, port: u16) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "serving MCP over streamable HTTP at /mcp");

    let config = StreamableHttpServerConfig {
        stateful_mode: true,
        ..StreamableHttpServerConfig::default()
    };
    let shutdown_token = config.cancellation_token.clone();
    let server_shutdown = shutdown_token.clone();

    let session_manager = Arc::new(LocalSessionManager::default());
    let mcp_service = StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);

    let router = Router::new().nest_service("/mcp", mcp_service);
    let server_handle = tokio::spawn(async move {
        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            server_shutdown.cancelled().await;
        });
        if let Err(err) = serve.await {
            tracing::error!(error = %err, "MCP HTTP server error");
        }
    });

    shutdown_signal().await;
    tracing::info!("shutting down");
    shutdown_token.cancel();
    let _ = server_handle.await;
    Ok(())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "decksmith".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };
        let config = options.into_config();

        init_tracing();

        let mcp = DecksmithMcp::from_config(&config)?;
        let store = mcp.store().clone();
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

        runtime.block_on(async move {
            let sweeper = store.spawn_sweeper();

            let served = match config.transport {
                Transport::Stdio => mcp.serve_stdio().await.map_err(Box::<dyn Error>::from),
                Transport::StreamableHttp => serve_http(mcp, config.port).await,
            };

            sweeper.abort();
            let drained = store.drain();
            if drained > 0 {
                tracing::info!(drained, "closed remaining sessions");
            }
            served
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("decksmith: {err}");
        std::process::exit(1);
    }
}
