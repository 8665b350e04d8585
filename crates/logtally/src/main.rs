use logtally::runtime::{boot, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let config = boot::boot(config_path.as_deref())?;
    run::run(&config).await?;
    Ok(())
}
