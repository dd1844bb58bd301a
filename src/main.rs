mod capture;
mod config;
mod engine;
mod error;
mod pipeline;
mod store;
mod types;

use crate::capture::FakeCamera;
use crate::config::Configuration;
use crate::engine::StubFeatureExtractor;
use crate::error::AppError;
use crate::pipeline::PipelineOrchestrator;
use crate::store::{InMemoryBackend, Session, SessionToken};
use std::sync::Arc;
use tracing::{Level, info};

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let configuration = Configuration::load()?;

    // Session bootstrap is an external collaborator; here it is simulated
    // with an anonymous sign-in before the store is touched.
    let session = Session::new();
    session.establish(SessionToken::anonymous());

    let mut pipeline = PipelineOrchestrator::new(
        &configuration,
        Box::new(FakeCamera::new()),
        Box::new(StubFeatureExtractor::new(&configuration)),
        Arc::new(InMemoryBackend::new()),
        session,
    );

    pipeline.capture_from_live_feed().await?;
    info!("{}", pipeline.state().last_message);

    pipeline.save("demo").await?;
    info!("{}", pipeline.state().last_message);

    pipeline.search("demo").await?;
    info!("{}", pipeline.state().last_message);
    for record in &pipeline.state().last_results {
        info!(
            id = %record.id,
            label = %record.label,
            eye_color = ?record.features.eye_color,
            face_shape = ?record.features.face_shape,
            confidence = record.features.confidence,
            created_at = %record.created_at.to_rfc3339(),
            "Retrieved record"
        );
    }

    pipeline.shutdown().await;
    Ok(())
}
