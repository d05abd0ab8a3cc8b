use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use stitchshot::{BrowserFamily, CaptureMode, StitchConfig, Stitcher, WebDriverSession};

#[derive(Parser, Debug)]
#[command(name = "stitchshot", version, about = "Full-page screenshots over a WebDriver session")]
struct Cli {
    /// WebDriver server URL
    #[arg(long, default_value = "http://localhost:4444")]
    server: String,

    /// Attach to an existing session id instead of creating a session
    #[arg(long)]
    session: Option<String>,

    /// Browser to request when creating a session (also names the family of
    /// an attached session)
    #[arg(long, default_value = "firefox")]
    browser: String,

    /// Navigate to this URL before capturing
    #[arg(long)]
    goto: Option<String>,

    /// geckodriver build version of an attached session, for the
    /// full-page RPC gate (created sessions report it themselves)
    #[arg(long)]
    driver_version: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scroll, capture, and stitch the page into a PNG file
    Stitch {
        /// Output path; the file is always written as PNG
        output: PathBuf,

        /// Cap the stitched page height in CSS pixels
        #[arg(long)]
        page_height_limit: Option<u32>,
    },
    /// Print a base64 PNG of the full page to stdout
    Base64 {
        #[arg(long, value_enum, default_value = "canvas")]
        mode: Mode,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// geckodriver's full-page screenshot RPC (Firefox only)
    Gecko,
    /// In-page html2canvas render
    Canvas,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut session = match &cli.session {
        Some(id) => {
            WebDriverSession::attach(&cli.server, id, BrowserFamily::from_name(&cli.browser))?
        }
        None => WebDriverSession::connect(&cli.server, &cli.browser)?,
    };
    if let Some(version) = &cli.driver_version {
        session = session.with_driver_version(version);
    }

    if let Some(url) = &cli.goto {
        session.goto(url)?;
    }

    let result = run(&mut session, &cli.command);
    session.close()?;
    result
}

fn run(session: &mut WebDriverSession, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Stitch {
            output,
            page_height_limit,
        } => {
            let config = StitchConfig {
                page_height_limit: *page_height_limit,
                ..Default::default()
            };
            Stitcher::new(session, config).save_stitch(output)?;
            println!("{}", output.display());
        }
        Command::Base64 { mode } => {
            let mode = match mode {
                Mode::Gecko => CaptureMode::Geckodriver,
                Mode::Canvas => CaptureMode::Canvas,
            };
            let payload = Stitcher::new(session, StitchConfig::default()).full_page_base64(mode)?;
            println!("{}", payload);
        }
    }
    Ok(())
}
