use clap::Parser;

#[tokio::main]
async fn main() {
    let args = auction_client::arguments::Arguments::parse();
    let obs_config = observe::Config::new(
        &args.log_filter,
        args.log_stderr_threshold,
        args.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    observe::metrics::setup_registry(Some("auction_client".into()));
    tracing::info!("running auction client with validated arguments:\n{}", args);
    if let Err(err) = auction_client::run(args).await {
        tracing::error!(?err, "auction client failed");
        std::process::exit(1);
    }
}
