use atelier::{check, config, generate, logging, output, server};
use atelier::logging::Logger;
use atelier::site::Site;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Portfolio and blog server for an artist's studio")]
#[command(long_about = "\
Portfolio and blog server for an artist's studio

Content lives in plain files. Each post or artwork is one file with YAML
front matter and a Markdown body that may use components.

Content structure:

  src/content/
  ├── blog/
  │   ├── first-light.mdx          # /blog/first-light
  │   └── studio-notes.mdx         # isDraft: true → hidden unless previewing
  └── portfolio/
      └── harbour-at-dusk.mdx      # /portfolio/harbour-at-dusk
  public/                          # Served as-is (images, favicon)

Drafts are visible only after enabling preview with
/api/preview?secret=<PREVIEW_SECRET>&slug=<slug>.

Run 'atelier gen-config' to generate a documented atelier.toml.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the site over HTTP
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Export every published page as static HTML
    Build {
        /// Output directory (overrides build.output)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compile every item, drafts included, and report failures
    Check,
    /// Print a stock atelier.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut site_config = config::load_config(&cli.config)?;
    match &cli.command {
        Command::Serve { port: Some(port) } => site_config.server.port = *port,
        Command::Build {
            output: Some(output),
        } => site_config.build.output = output.clone(),
        _ => {}
    }
    site_config.validate()?;

    logging::init(&site_config.log)?;
    let logger = Logger::new(site_config.log.clone());
    let site = Site::new(site_config, logger);

    match cli.command {
        Command::Serve { .. } => server::serve(site)?,
        Command::Build { .. } => {
            let output_dir = site.config().build.output.clone();
            let report = generate::build(&site, &output_dir)?;
            output::print_build_output(&report);
        }
        Command::Check => {
            let report = check::check(&site)?;
            output::print_check_output(&report);
            if !report.is_ok() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}
