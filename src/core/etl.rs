use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<Vec<String>> {
        tracing::info!("Extracting data...");
        let extracted = self.pipeline.extract().await?;
        tracing::info!("Extracted {} raw rows", extracted.table.rows.len());
        self.monitor.log_stats("Extract");

        tracing::info!("Transforming data...");
        let transformed = self.pipeline.transform(extracted).await?;
        let record_count: usize = transformed.data.values().map(Vec::len).sum();
        tracing::info!("Transformed into {} output records", record_count);
        self.monitor.log_stats("Transform");

        tracing::info!("Loading data...");
        let outputs = self.pipeline.load(transformed).await?;
        tracing::info!("Wrote {} output file(s)", outputs.len());
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(outputs)
    }
}
