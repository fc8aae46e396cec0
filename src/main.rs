use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use humansize::{BINARY, format_size};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mycloudx::config::{Config, LogFormat};
use mycloudx::modal::{self, ClickTarget};
use mycloudx::{ClientError, Deletion, FileManagerClient, HttpApi, LocalFile, TerminalPrompter};
use mycloudx::{download, html, view};

/// MyCloudX 文件管理客户端
#[derive(Parser, Debug)]
#[command(name = "mycloudx", version, about, long_about = None)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 服务器地址
    #[arg(long, global = true, env = "MYCLOUDX_URL")]
    url: Option<String>,

    /// 访问令牌
    #[arg(long, global = true, env = "MYCLOUDX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    /// 日志同时写入该文件
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// 验证令牌
    Login,

    /// 列出服务器上的文件
    List {
        #[arg(long, short, value_enum, default_value = "table")]
        format: ListFormat,
    },

    /// 上传文件
    Upload { path: PathBuf },

    /// 下载文件
    Download {
        name: String,

        /// 保存位置（文件或目录），默认当前目录
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// 删除文件
    Delete {
        name: String,

        /// 跳过确认
        #[arg(long, short)]
        yes: bool,
    },

    /// 显示分享二维码
    Qr,

    /// 交互模式，整个进程共用一个会话
    Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ListFormat {
    Table,
    Html,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogFormatArg {
    Pretty,
    Json,
}

type Client = FileManagerClient<HttpApi, TerminalPrompter>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. 读取配置，命令行参数优先
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    config.apply_env_overrides();
    if let Some(url) = &cli.url {
        config.server.url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.auth.token = Some(token.clone());
    }
    if let Some(format) = cli.log_format {
        config.log.format = match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        };
    }
    if let Some(file) = &cli.log_file {
        config.log.file = Some(file.clone());
    }
    config.validate()?;

    // 2. 日志
    let _guard = init_logging(&config, cli.verbose)?;

    // 3. 客户端
    let api = HttpApi::new(&config.server.url, config.timeout())?;
    let assume_yes = matches!(cli.command, Command::Delete { yes: true, .. });
    let mut client = FileManagerClient::new(api, TerminalPrompter::new(assume_yes))
        .with_list_failures(config.ui.list_failures);
    tracing::debug!(url = %config.server.url, "client ready");

    match cli.command {
        Command::Shell => shell(&mut client, config.auth.token.as_deref()).await,
        Command::Qr => {
            show_qr(&mut client)?;
            Ok(())
        }
        command => {
            let token = config
                .auth
                .token
                .clone()
                .ok_or_else(|| anyhow!("no token given: pass --token or set MYCLOUDX_TOKEN"))?;
            client.authenticate(&token).await?;
            run(&mut client, command).await
        }
    }
}

async fn run(client: &mut Client, command: Command) -> Result<()> {
    match command {
        Command::Login => {}
        Command::List { format } => {
            // 登录时已经刷新过一次
            print_table(client, format)?;
        }
        Command::Upload { path } => {
            let file = LocalFile::open(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            client.upload_file(Some(&file)).await?;
            print_table(client, ListFormat::Table)?;
        }
        Command::Download { name, output } => {
            let dest = download::destination(&name, output.as_deref());
            let bytes = client.download_file(&name, &dest).await?;
            println!(
                "Saved {} ({}) to {}",
                name,
                format_size(bytes, BINARY),
                dest.display()
            );
        }
        Command::Delete { name, .. } => match client.delete_file(&name).await? {
            Deletion::Deleted => println!("Deleted {}", name),
            Deletion::Declined => println!("Cancelled"),
            Deletion::Skipped => {}
        },
        Command::Qr => show_qr(client)?,
        Command::Shell => shell(client, None).await?,
    }
    Ok(())
}

fn print_table(client: &Client, format: ListFormat) -> Result<()> {
    let view = client.view();
    match format {
        ListFormat::Table => print!("{}", view::to_text(&view.table)),
        ListFormat::Html => {
            let share = modal::share_url(client.api().base());
            println!("{}", html::render_page(&view, share.as_str()));
        }
        ListFormat::Json => println!("{}", serde_json::to_string_pretty(&view.table)?),
    }
    Ok(())
}

fn show_qr(client: &mut Client) -> Result<()> {
    client.show_qr_modal();
    let share = modal::share_url(client.api().base());
    println!("📱 Scan to Access MyCloudX");
    print!("{}", modal::render_terminal_qr(share.as_str())?);
    println!("{}", share);
    Ok(())
}

const SHELL_HELP: &str = "\
commands:
  login <token>      authenticate
  logout             forget the token
  ls                 refresh and list files
  put <path>         upload a file
  get <name> [path]  download a file
  rm <name>          delete a file (asks first)
  qr                 show the share QR code, enter closes it
  help               this text
  quit               exit";

/// 交互模式：逐行读取命令，会话在整个进程内保持
async fn shell(client: &mut Client, token: Option<&str>) -> Result<()> {
    if let Some(token) = token {
        let _ = client.authenticate(token).await;
    }
    println!("{}", SHELL_HELP);

    let stdin = std::io::stdin();
    loop {
        print!("mycloudx> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else { continue };
        let rest: Vec<&str> = parts.collect();

        let result = match (cmd, rest.as_slice()) {
            ("quit" | "exit", _) => break,
            ("help", _) => {
                println!("{}", SHELL_HELP);
                Ok(())
            }
            ("login", [token]) => client.authenticate(token).await.map(|_| {
                print!("{}", view::to_text(client.table()));
            }),
            ("logout", _) => {
                client.logout();
                Ok(())
            }
            ("ls", _) => client
                .refresh_list()
                .await
                .map(|_| print!("{}", view::to_text(client.table()))),
            ("put", []) => client.upload_file(None).await,
            ("put", [path]) => match LocalFile::open(PathBuf::from(path).as_path()).await {
                Ok(file) => client.upload_file(Some(&file)).await,
                Err(e) => Err(e),
            },
            ("get", [name, rest @ ..]) => {
                let output = rest.first().map(PathBuf::from);
                let dest = download::destination(name, output.as_deref());
                client.download_file(name, &dest).await.map(|bytes| {
                    println!("Saved {} to {}", format_size(bytes, BINARY), dest.display());
                })
            }
            ("rm", [name]) => client.delete_file(name).await.map(|_| ()),
            ("qr", _) => {
                show_qr(client)?;
                let mut ack = String::new();
                stdin.lock().read_line(&mut ack)?;
                client.handle_modal_click(ClickTarget::Backdrop);
                Ok(())
            }
            _ => {
                println!("unknown command, try `help`");
                Ok(())
            }
        };

        // 单个命令失败不退出交互模式
        match result {
            Ok(()) => {}
            Err(ClientError::AuthRejected { .. }) => {}
            Err(e) => eprintln!("error: {}", e),
        }
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: bool) -> Result<Option<WorkerGuard>> {
    let filter = if verbose {
        EnvFilter::new("mycloudx=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("mycloudx={}", config.log.level)))
    };

    let (file_writer, guard) = match &config.log.file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("invalid log file path: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir.unwrap_or(".".as_ref()), name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };
    let file_layer = file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w));

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    match config.log.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(guard)
}
