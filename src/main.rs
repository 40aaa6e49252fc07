use clap::Parser;
use fragment_loader::{FragmentLoader, LoaderConfig};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Load an HTML fragment into an empty document and print the body markup.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// URL, `file://` path, `data:` URL, or a path resolved against `--base-url`.
    location: String,

    /// Element name of the container wrapping the fragment.
    #[arg(short, long, default_value = "div")]
    container: String,

    #[arg(long)]
    base_url: Option<String>,

    #[arg(long)]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = LoaderConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(user_agent) = cli.user_agent {
        config = config.with_user_agent(user_agent);
    }

    let loader = FragmentLoader::new(config);
    match loader.fetch_into(&cli.location, &cli.container).await {
        Ok(_) => {
            println!("{}", loader.document().body().inner_html());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
