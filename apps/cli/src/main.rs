use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use proxybridge_core_sdk::{
    config::{BridgeConfig, ENV_ENDPOINT},
    input::parse_temperature,
    models::{InputField, RawInputs},
    server, telemetry, Bridge,
};

/**
 * \brief CLI 程序入口：签名并发送一次代理调用。
 */
#[derive(Parser, Debug)]
#[command(name = "proxybridge", version, about = "Signed single-call bridge to an inference proxy")]
struct Cli {
    /// Proxy endpoint; falls back to PROXYBRIDGE_ENDPOINT
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Default temperature when --temperature is not given
    #[arg(long, global = true, value_parser = finite_temperature)]
    default_temperature: Option<f64>,

    #[arg(long, global = true, default_value_t = false)]
    telemetry: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /**
     * \brief 发送一次调用并打印结果文本。
     */
    Ask(InvokeArgs),

    /**
     * \brief 仅打印请求体与签名，不发送。
     */
    Sign(InvokeArgs),

    /**
     * \brief 启动本地 HTTP 服务，暴露 /api/invoke。
     */
    Serve {
        #[arg(long, default_value = "127.0.0.1:5173")]
        addr: String,
    },
}

#[derive(Args, Debug)]
struct InvokeArgs {
    #[arg(long)]
    prompt: Option<String>,
    #[arg(long)]
    column_data: Option<String>,
    /// Shared secret; falls back to PROXYBRIDGE_SECRET_KEY
    #[arg(long)]
    secret_key: Option<String>,
    /// openai | google | anthropic | google-image
    #[arg(long)]
    provider: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    temperature: Option<String>,
    #[arg(long)]
    max_tokens: Option<String>,
    #[arg(long)]
    aspect_ratio: Option<String>,
}

impl InvokeArgs {
    fn into_raw(self) -> RawInputs {
        let secret_key = self
            .secret_key
            .or_else(|| std::env::var("PROXYBRIDGE_SECRET_KEY").ok());
        RawInputs {
            column_data: self.column_data.map(InputField::text),
            prompt: self.prompt.map(InputField::text),
            secret_key: secret_key.map(InputField::text),
            provider: self.provider.map(InputField::text),
            model: self.model.map(InputField::text),
            temperature: self.temperature.map(InputField::text),
            max_tokens: self.max_tokens.map(InputField::text),
            aspect_ratio: self.aspect_ratio.map(InputField::text),
        }
    }
}

fn finite_temperature(raw: &str) -> Result<f64, String> {
    parse_temperature(Some(raw)).ok_or_else(|| format!("invalid temperature: {raw}"))
}

fn load_config(cli: &Cli) -> Result<BridgeConfig> {
    let mut cfg = BridgeConfig::from_env_with(cli.endpoint.as_deref())
        .with_context(|| format!("no usable endpoint, pass --endpoint or set {}", ENV_ENDPOINT))?;
    if let Some(t) = cli.default_temperature {
        cfg.defaults.temperature = t;
    }
    cfg.telemetry |= cli.telemetry;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = load_config(&cli)?;
    telemetry::set_enabled(cfg.telemetry);
    let bridge = Bridge::new(cfg).context("create bridge failed")?;

    match cli.command {
        Commands::Ask(args) => {
            let raw = args.into_raw();
            telemetry::log_event("cli.ask", "invoking proxy");
            println!("{}", bridge.invoke(&raw).await);
        }
        Commands::Sign(args) => {
            let raw = args.into_raw();
            match bridge.prepare(&raw) {
                Ok((input, signed)) => {
                    println!("provider: {}", input.provider);
                    println!("body: {}", signed.body);
                    println!("X-Signature: {}", signed.signature);
                }
                Err(err) => println!("{}", err.to_result_string()),
            }
        }
        Commands::Serve { addr } => {
            server::run(&addr, bridge).await?;
        }
    }

    Ok(())
}
