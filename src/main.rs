use albumcmp::app::AlbumCmpApp;
use albumcmp::cli;
use albumcmp::config::AppConfig;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("albumcmp=info".parse().unwrap()),
        )
        .init();

    let args = match cli::parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {:#}", e);
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    let app = AlbumCmpApp::new(AppConfig::from_env(), args);
    std::process::exit(app.run());
}
