use std::sync::Arc;

use tokio::time::Instant;

use domain::MetricProvider;

use crate::device::DevicePublisher;

/// Publishes one round of `$stats/*` attributes
pub struct StatsReporter {
    publisher: DevicePublisher,
    boot: Instant,
    cpu_temperature: Option<Arc<dyn MetricProvider>>,
    cpu_load: Option<Arc<dyn MetricProvider>>,
}

impl StatsReporter {
    pub fn new(
        publisher: DevicePublisher,
        boot: Instant,
        cpu_temperature: Option<Arc<dyn MetricProvider>>,
        cpu_load: Option<Arc<dyn MetricProvider>>,
    ) -> Self {
        Self {
            publisher,
            boot,
            cpu_temperature,
            cpu_load,
        }
    }

    /// Whole seconds since boot
    pub fn uptime_secs(&self) -> u64 {
        self.boot.elapsed().as_secs()
    }

    pub async fn report(&self) {
        self.publisher
            .publish("$stats/uptime", &self.uptime_secs().to_string(), true)
            .await;

        if let Some(provider) = &self.cpu_temperature {
            self.publisher
                .publish("$stats/cputemp", &provider.read(), true)
                .await;
        }

        if let Some(provider) = &self.cpu_load {
            self.publisher
                .publish("$stats/cpuload", &provider.read(), true)
                .await;
        }
    }
}
