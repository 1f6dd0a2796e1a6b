use super::{Document, OutputFormat, PageDimensions, RenderEngine};
use crate::error::ApiError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Bounded concurrency gate for render calls. Callers suspend while waiting
/// for a permit, so request acceptance elsewhere keeps going; a fixed number
/// of renders run at once to protect the engine and the host.
pub struct RenderPool {
    permits: Arc<Semaphore>,
    render_timeout: Duration,
}

impl RenderPool {
    pub fn new(workers: usize, render_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
            render_timeout,
        }
    }

    /// Runs one render under a pool permit. A call that outlives the
    /// configured timeout is cut off and reported as a render failure rather
    /// than blocking a permit indefinitely.
    pub async fn render(
        &self,
        engine: &dyn RenderEngine,
        doc: &Document,
        dims: PageDimensions,
        format: OutputFormat,
    ) -> Result<Vec<u8>, ApiError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ApiError::Render("render pool is closed".to_string()))?;

        match timeout(self.render_timeout, engine.render(doc, dims, format)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Render(format!(
                "render timed out after {}s",
                self.render_timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedEngine {
        delay: Duration,
        output: Result<Vec<u8>, String>,
    }

    #[async_trait]
    impl RenderEngine for FixedEngine {
        fn build(&self, html: &str) -> Result<Document, ApiError> {
            Ok(Document::new(html.to_string()))
        }

        async fn render(
            &self,
            _doc: &Document,
            _dims: PageDimensions,
            _format: OutputFormat,
        ) -> Result<Vec<u8>, ApiError> {
            tokio::time::sleep(self.delay).await;
            self.output.clone().map_err(ApiError::Render)
        }
    }

    const DIMS: PageDimensions = PageDimensions {
        width: 100.0,
        height: 50.0,
    };

    #[tokio::test]
    async fn passes_rendered_bytes_through() {
        let engine = FixedEngine {
            delay: Duration::ZERO,
            output: Ok(b"%PDF-1.4".to_vec()),
        };
        let pool = RenderPool::new(2, Duration::from_secs(5));
        let doc = engine.build("<p>Hi</p>").unwrap();

        let bytes = pool
            .render(&engine, &doc, DIMS, OutputFormat::Pdf)
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn engine_failure_propagates_unretried() {
        let engine = FixedEngine {
            delay: Duration::ZERO,
            output: Err("engine exploded".to_string()),
        };
        let pool = RenderPool::new(2, Duration::from_secs(5));
        let doc = engine.build("<p>Hi</p>").unwrap();

        let err = pool
            .render(&engine, &doc, DIMS, OutputFormat::Png)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Render(msg) if msg.contains("engine exploded")));
    }

    #[tokio::test]
    async fn hung_render_becomes_bounded_error() {
        let engine = FixedEngine {
            delay: Duration::from_secs(60),
            output: Ok(Vec::new()),
        };
        let pool = RenderPool::new(1, Duration::from_millis(20));
        let doc = engine.build("<p>Hi</p>").unwrap();

        let err = pool
            .render(&engine, &doc, DIMS, OutputFormat::Pdf)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Render(msg) if msg.contains("timed out")));
    }
}
