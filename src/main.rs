use anyhow::Result;
use greenhouse_autofill::utils::logging;
use greenhouse_autofill::{App, Config, TriggerResponse};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let response = match App::initialize(config).await {
        Ok(app) => app.run().await?,
        Err(e) if e.is_no_active_page() => {
            error!("❌ {}", e);
            TriggerResponse::no_active_tab()
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
