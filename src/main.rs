mod cli;

use vidstream::{
    config, server,
    tokenizer::{self, JwtTokenizer, Tokenizer},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use vidstream_common::UserId;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI flags win over the config file
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting vidstream server");
    tracing::info!(
        "Server will listen on {}:{}, chunk size {} bytes",
        config.server.host,
        config.server.port,
        config.reader.chunk_size
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidstream=trace,vidstream_av=debug,tower_http=debug".to_string()
        } else {
            "vidstream=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Probe { file, json } => probe_file(&file, json, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::IssueToken { user, ttl } => issue_token(&user, ttl, cli.config.as_deref()),
        Commands::GenerateSecret => generate_secret(),
        Commands::Version => {
            println!("vidstream {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let ffprobe = vidstream_av::locate_ffprobe(config.tools.ffprobe.as_deref())?;
    let info = vidstream_av::probe::probe_with_ffprobe(&ffprobe, file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", info.file_path.display());
    println!("Start frame: start:{}:{}", info.audio_tag(), info.video_tag());
    println!("\nStreams: {}", info.streams.len());
    for stream in &info.streams {
        println!(
            "  [{}] {:?} {} ({})",
            stream.index,
            stream.kind,
            stream.codec_name.as_deref().unwrap_or("unknown"),
            stream.codec_tag.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = vidstream_av::check_tools(config.tools.ffprobe.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("ffprobe is missing. Streams cannot start without codec detection.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  WebSocket path: {}", config.server.ws_path);
            println!("  Chunk size: {} bytes", config.reader.chunk_size);
            println!(
                "  Auth secret: {}",
                if config.auth.secret.is_empty() {
                    "generated at startup"
                } else {
                    "configured"
                }
            );
            println!("  Videos: {}", config.videos.len());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  WebSocket path: {}", config.server.ws_path);
        }
    }

    Ok(())
}

fn issue_token(user: &str, ttl: Option<u64>, config_path: Option<&Path>) -> Result<()> {
    let user_id: UserId = user
        .parse()
        .with_context(|| format!("Invalid user id: {}", user))?;

    let mut auth = config::load_config_or_default(config_path)?.auth;
    if auth.secret.is_empty() {
        anyhow::bail!("No auth secret configured; a token signed now would be useless");
    }
    if let Some(ttl) = ttl {
        auth.token_ttl_secs = ttl;
    }

    let token = JwtTokenizer::from_config(&auth).issue(user_id)?;
    println!("{}", token);
    Ok(())
}

fn generate_secret() -> Result<()> {
    println!("{}", tokenizer::generate_secret());
    Ok(())
}
