use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs extract, transform and load; returns where the output went.
    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting scrape");

        // Extract
        let scraped = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", scraped.len());

        // Transform
        let output = self.pipeline.transform(scraped).await?;
        tracing::debug!("Transform finished after {:?}", started.elapsed());

        // Load
        let location = self.pipeline.load(output).await?;
        tracing::info!("Output saved to: {} ({:?})", location, started.elapsed());

        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CountingPipeline {
        stages: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        type Scraped = u32;
        type Output = u32;

        async fn extract(&self) -> Result<Vec<u32>> {
            self.stages.lock().unwrap().push("extract");
            Ok(vec![1, 2, 3])
        }

        async fn transform(&self, scraped: Vec<u32>) -> Result<u32> {
            self.stages.lock().unwrap().push("transform");
            Ok(scraped.iter().sum())
        }

        async fn load(&self, output: u32) -> Result<String> {
            self.stages.lock().unwrap().push("load");
            Ok(format!("sum={}", output))
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let engine = EtlEngine::new(CountingPipeline {
            stages: Mutex::new(Vec::new()),
        });
        assert_eq!(engine.run().await.unwrap(), "sum=6");
        assert_eq!(
            *engine.pipeline().stages.lock().unwrap(),
            vec!["extract", "transform", "load"]
        );
    }
}
