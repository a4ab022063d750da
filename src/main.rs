use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use viewbind::app::App;
use viewbind::cli::Cli;
use viewbind::config::EngineConfig;
use viewbind::context::UiContext;
use viewbind::logging::init_tracing;
use viewbind::state::MemoryStore;
use viewbind::stream::Stream;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path).await?,
        None => EngineConfig::default(),
    };
    if cli.debug {
        config.log_filter = "debug".to_string();
    }
    config.validate()?;

    // Logging goes to stderr and to the runtime logs stream
    let logs = Stream::new("runtime_logs", config.stream_capacity);
    init_tracing(&config, &logs)?;

    let state = App::load_state_file(&cli.state).await?;
    let store = Arc::new(MemoryStore::new(state));
    let ctx = UiContext::with_runtime_logs(config, store, logs);

    let mut app = App::new(ctx);
    app.initialize_services();
    app.initialize_views()?;
    app.load_all()?;

    app.render(cli.root.as_deref(), cli.force).await?;
    app.wait_idle().await;
    println!("{}", app.html());

    app.shutdown()?;
    Ok(())
}
