#[allow(unused_imports)]
use anyhow::Result;

#[tokio::test]
#[cfg(feature = "live_capability")]
async fn test_live_assessment() -> Result<()> {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use five_s_audit::{Submission, config::Config, pipeline_from_config};

    dotenvy::dotenv().ok();

    if std::env::var("RUN_LIVE_TESTS").is_err() {
        eprintln!("Skipping live capability test - set RUN_LIVE_TESTS=1 to run");
        return Ok(());
    }
    let Ok(path) = std::env::var("FIVE_S_TEST_IMAGE") else {
        eprintln!("Skipping live capability test - set FIVE_S_TEST_IMAGE to a workspace photo");
        return Ok(());
    };

    let config = Config::load()?;
    let pipeline = pipeline_from_config(&config)?;
    let submission = Submission {
        images: vec![BASE64.encode(std::fs::read(path)?)],
        workspace_name: "live test".to_string(),
    };

    let result = pipeline.run(&submission).await?;
    assert!(result.overall_score <= 100);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
