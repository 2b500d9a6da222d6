use anyhow::{Context, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use snapgrab_engine::advisor::{AdvisorOptions, advise};
use snapgrab_engine::config::{ConfigLoader, ScrapeConfig};
use snapgrab_engine::http::ReqwestFetcher;
use snapgrab_engine::log::TracingSink;
use snapgrab_engine::session::BrowserSession;
use snapgrab_engine::{Summary, scrape};
use snapgrab_h::HeadlessSession;
use snapgrab_w::WebDriverSession;
use snapgrab_w::webdriver::DEFAULT_WEBDRIVER_URL;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snapgrab", version, about = "Download the product images of a web page")]
struct Args {
    /// Config file (defaults to ./snapgrab.yaml, then ~/.snapgrab/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape with a local headless Chromium via CDP
    Headless {
        /// Show the browser window
        #[arg(long)]
        visible: bool,

        #[command(flatten)]
        scrape: ScrapeArgs,
    },
    /// Scrape through a running WebDriver server
    Webdriver {
        #[arg(long, default_value = DEFAULT_WEBDRIVER_URL)]
        driver_url: String,

        #[command(flatten)]
        scrape: ScrapeArgs,
    },
    /// Suggest CSS selectors for an HTML snippet
    Advise {
        /// HTML file to analyse (stdin when omitted)
        file: Option<PathBuf>,

        /// Minimum declared width and height for suggested images
        #[arg(long, default_value_t = 500)]
        min_size: u32,
    },
}

#[derive(ClapArgs)]
struct ScrapeArgs {
    /// Page to scrape
    #[arg(long, env = "SNAPGRAB_URL")]
    url: String,

    /// CSS selector for the gallery images
    #[arg(long)]
    selector: Option<String>,

    /// Output directory
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Fallback minimum size, e.g. 500x500
    #[arg(long, value_parser = parse_size)]
    min_size: Option<(u32, u32)>,

    /// Retries for transient download failures
    #[arg(long)]
    retries: Option<u32>,

    /// Skip the anti-automation browser hardening
    #[arg(long)]
    no_stealth: bool,
}

impl ScrapeArgs {
    fn apply(&self, config: &mut ScrapeConfig) {
        if let Some(selector) = &self.selector {
            config.selector = selector.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some((width, height)) = self.min_size {
            config.fallback.min_width = width;
            config.fallback.min_height = height;
        }
        if let Some(retries) = self.retries {
            config.download.max_retries = retries;
        }
        if self.no_stealth {
            config.browser.stealth = false;
        }
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid size '{}': {}", v, e))
    };
    Ok((parse(w)?, parse(h)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the summary.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };

    match args.command {
        Command::Headless { visible, scrape } => {
            scrape.apply(&mut config);
            config.browser.visible |= visible;
            let mut session = HeadlessSession::from(&config.browser);
            run_scrape(&mut session, &scrape.url, &config).await
        }
        Command::Webdriver { driver_url, scrape } => {
            scrape.apply(&mut config);
            let mut session = WebDriverSession::configured(driver_url, &config.browser);
            run_scrape(&mut session, &scrape.url, &config).await
        }
        Command::Advise { file, min_size } => run_advise(file, min_size, &config),
    }
}

async fn run_scrape(
    session: &mut dyn BrowserSession,
    url: &str,
    config: &ScrapeConfig,
) -> anyhow::Result<()> {
    let fetcher =
        ReqwestFetcher::new(&config.browser.user_agent).context("building HTTP client")?;
    let summary = scrape(
        session,
        &fetcher,
        url,
        &config.selector,
        &config.output_dir,
        config,
        &TracingSink,
    )
    .await
    .with_context(|| format!("scraping {}", url))?;

    println!("{}", render_summary(&summary));
    Ok(())
}

fn render_summary(summary: &Summary) -> String {
    format!(
        "saved={} skipped={} failed={} fallback={}",
        summary.saved, summary.skipped, summary.failed, summary.used_fallback
    )
}

fn run_advise(file: Option<PathBuf>, min_size: u32, config: &ScrapeConfig) -> anyhow::Result<()> {
    let html = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    if html.trim().is_empty() {
        bail!("no HTML provided");
    }

    let options = AdvisorOptions {
        min_size,
        decoy_classes: config.fallback.decoy_keywords.clone(),
    };
    let advice = advise(&html, &options);
    if advice.is_empty() {
        println!("Nothing recognisable in the snippet.");
    } else {
        print!("{}", advice.render());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("500x400"), Ok((500, 400)));
        assert_eq!(parse_size("300X300"), Ok((300, 300)));
        assert!(parse_size("500").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "snapgrab",
            "headless",
            "--url",
            "https://shop.example/p",
            "--selector",
            ".gallery img",
            "--min-size",
            "500x500",
            "--retries",
            "2",
            "-o",
            "out",
        ]);
        let Command::Headless { scrape, visible } = args.command else {
            panic!("expected headless command");
        };
        let mut config = ScrapeConfig::default();
        scrape.apply(&mut config);

        assert!(!visible);
        assert_eq!(config.selector, ".gallery img");
        assert_eq!(config.fallback.min_width, 500);
        assert_eq!(config.download.max_retries, 2);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.browser.stealth);
    }

    #[test]
    fn summary_line() {
        let summary = Summary {
            saved: 3,
            used_fallback: true,
            ..Summary::default()
        };
        assert_eq!(
            render_summary(&summary),
            "saved=3 skipped=0 failed=0 fallback=true"
        );
    }
}
