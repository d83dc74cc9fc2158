use crate::domain::ports::ErrorSink;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Accumulates non-fatal warnings during a run and reports them once at the
/// end. Identical entries are deduplicated; output order is deterministic.
#[derive(Debug, Default)]
pub struct CollectingErrorSink {
    entries: Mutex<BTreeSet<(String, String, String)>>,
}

impl CollectingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<(String, String, String)> {
        self.entries
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Logs every accumulated entry. Call after the run completes.
    pub fn flush(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }
        tracing::warn!("{} warning(s) accumulated during the run:", entries.len());
        for (component, dataset, message) in entries {
            tracing::warn!("{} - {} - {}", component, dataset, message);
        }
    }
}

impl ErrorSink for CollectingErrorSink {
    fn add_message(&self, component: &str, dataset: &str, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert((
                component.to_string(),
                dataset.to_string(),
                message.to_string(),
            ));
        }
    }

    fn add_missing_value(&self, component: &str, dataset: &str, category: &str, value: &str) {
        self.add_message(
            component,
            dataset,
            &format!("Missing value for {}: {}", category, value),
        );
    }
}
