use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand};
use qrsmith::config::Settings;
use qrsmith::history::describe_age;
use qrsmith::payload::{PaymentMethod, WifiEncryption};
use qrsmith::session::{Generation, Level, Notice, Session};
use qrsmith::store::FileStore;
use qrsmith::{Artifact, Color, ExportFormat, LogoImage, ModulePattern, PayloadRequest, StyleConfig};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "qrsmith")]
#[command(about = "Generate styled QR codes as PNG, SVG or PDF", long_about = None)]
struct Cli {
    #[command(flatten)]
    style: StyleArgs,

    /// JSON settings file with default style and directories
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the history file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// Canvas edge length in pixels
    #[arg(long, global = true)]
    size: Option<u32>,

    /// Foreground color (#RRGGBB, #RGB or a name)
    #[arg(long, global = true)]
    fg: Option<Color>,

    /// Background color (#RRGGBB, #RGB or a name)
    #[arg(long, global = true)]
    bg: Option<Color>,

    /// Module pattern: square, dots or rounded
    #[arg(long, global = true)]
    pattern: Option<ModulePattern>,

    /// Image to place at the centre of the code
    #[arg(long, global = true)]
    logo: Option<PathBuf>,

    /// Output format: png, svg or pdf
    #[arg(long, global = true)]
    format: Option<ExportFormat>,

    /// Directory to write files into
    #[arg(long, global = true)]
    out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a URL (https:// is added when no scheme is given)
    Url { url: String },
    /// Encode free text
    Text { text: String },
    /// Encode WiFi credentials
    Wifi {
        #[arg(long, default_value = "")]
        ssid: String,
        #[arg(long, default_value = "")]
        password: String,
        /// WPA, WEP or nopass
        #[arg(long, default_value = "WPA")]
        encryption: WifiEncryption,
    },
    /// Encode a contact card
    Vcard {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        org: String,
    },
    /// Encode a payment link
    Payment {
        #[arg(long, default_value = "")]
        address: String,
        /// bitcoin, ethereum or paypal
        #[arg(long, default_value = "bitcoin")]
        method: PaymentMethod,
        #[arg(long, default_value = "")]
        amount: String,
    },
    /// Generate one small PNG per row of a `url[,name]` CSV file
    Batch { file: PathBuf },
    /// Inspect or edit past generations
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List entries, newest first
    List,
    /// Re-render an entry with its saved style
    Load { id: i64 },
    /// Remove one entry
    Delete { id: i64 },
    /// Remove every entry
    Clear {
        /// Confirm clearing; this cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    let style = resolve_style(&cli.style, &settings);
    let format = cli.style.format.unwrap_or(settings.format);
    let out_dir = settings.resolve_output_dir(cli.style.out.as_deref());
    let data_dir = settings.resolve_data_dir(cli.data_dir.as_deref());
    log::debug!("history directory: {}", data_dir.display());

    let mut session = Session::new(FileStore::new(data_dir));

    match cli.command {
        Command::Url { url } => {
            generate(&mut session, PayloadRequest::Url { url }, &style, format, &out_dir)
        }
        Command::Text { text } => {
            generate(&mut session, PayloadRequest::Text { text }, &style, format, &out_dir)
        }
        Command::Wifi {
            ssid,
            password,
            encryption,
        } => generate(
            &mut session,
            PayloadRequest::Wifi {
                ssid,
                password,
                encryption,
            },
            &style,
            format,
            &out_dir,
        ),
        Command::Vcard {
            name,
            phone,
            email,
            org,
        } => generate(
            &mut session,
            PayloadRequest::Vcard {
                name,
                phone,
                email,
                org,
            },
            &style,
            format,
            &out_dir,
        ),
        Command::Payment {
            address,
            method,
            amount,
        } => generate(
            &mut session,
            PayloadRequest::Payment {
                method,
                address,
                amount,
            },
            &style,
            format,
            &out_dir,
        ),
        Command::Batch { file } => run_batch(&session, &file, &style, &out_dir),
        Command::History(command) => run_history(&mut session, command, format, &out_dir),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Settings style with command-line overrides applied
fn resolve_style(args: &StyleArgs, settings: &Settings) -> StyleConfig {
    let mut style = settings.style.clone();
    if let Some(size) = args.size {
        style.render_size = size;
    }
    if let Some(fg) = args.fg {
        style.foreground = fg;
    }
    if let Some(bg) = args.bg {
        style.background = bg;
    }
    if let Some(pattern) = args.pattern {
        style.pattern = pattern;
    }
    if let Some(path) = &args.logo {
        // An unreadable logo only costs the logo
        match LogoImage::from_path(path) {
            Ok(logo) => {
                style.logo = Some(logo);
                print_notice(&Notice::success("Logo loaded successfully"));
            }
            Err(e) => print_notice(&Notice::error(e.to_string())),
        }
    }
    style
}

fn generate(
    session: &mut Session<FileStore>,
    request: PayloadRequest,
    style: &StyleConfig,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<()> {
    let generation = session.generate(&request, style)?;
    export_generation(session, &generation, format, out_dir)
}

fn export_generation(
    session: &Session<FileStore>,
    generation: &Generation,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<()> {
    generation.notices.iter().for_each(print_notice);
    let (artifact, notice) = session.export(Some(&generation.handle), format)?;
    let path = write_artifact(out_dir, &artifact)?;
    print_notice(&notice);
    println!("{}", path.display());
    Ok(())
}

fn run_batch(
    session: &Session<FileStore>,
    file: &Path,
    style: &StyleConfig,
    out_dir: &Path,
) -> Result<()> {
    let is_csv = file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        bail!("Batch input must be a .csv file: {}", file.display());
    }

    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let run = session.batch(&text, style)?;
    for item in &run.items {
        let path = write_artifact(out_dir, &item.artifact)?;
        println!("{}\t{}\t{}", path.display(), item.entry.name, item.entry.url);
    }
    run.notices.iter().for_each(print_notice);
    Ok(())
}

fn run_history(
    session: &mut Session<FileStore>,
    command: HistoryCommand,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<()> {
    match command {
        HistoryCommand::List => {
            let entries = session.history().entries();
            if entries.is_empty() {
                println!("No history yet");
                return Ok(());
            }
            let now = Utc::now();
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.id,
                    entry.kind,
                    entry.preview().replace('\n', " "),
                    describe_age(entry.created_at, now)
                );
            }
        }
        HistoryCommand::Load { id } => {
            let (_, generation) = session.restore(id)?;
            export_generation(session, &generation, format, out_dir)?;
        }
        HistoryCommand::Delete { id } => {
            let notice = session.delete(id)?;
            if notice.level == Level::Error {
                bail!("{}", notice.message);
            }
            print_notice(&notice);
        }
        HistoryCommand::Clear { yes } => {
            if !yes {
                bail!("Clear all history? This cannot be undone. Re-run with --yes to confirm.");
            }
            print_notice(&session.clear()?);
        }
    }
    Ok(())
}

fn write_artifact(out_dir: &Path, artifact: &Artifact) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = out_dir.join(&artifact.file_name);
    fs::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn print_notice(notice: &Notice) {
    match notice.level {
        Level::Success => eprintln!("{}", notice.message),
        Level::Error => eprintln!("error: {}", notice.message),
    }
}
