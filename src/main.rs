use video_gateway::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    video_gateway::logging::init_tracing();

    let config = Config::get_config()?;
    video_gateway::run(config).await
}
