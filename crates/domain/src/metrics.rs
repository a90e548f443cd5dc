/// Source of an optional device statistic such as CPU temperature or load.
///
/// The value is forwarded verbatim as the MQTT payload.
pub trait MetricProvider: Send + Sync {
    fn read(&self) -> String;
}

impl<F> MetricProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn read(&self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Fixed(&'static str);

    impl MetricProvider for Fixed {
        fn read(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_closure_provider() {
        let provider: Arc<dyn MetricProvider> = Arc::new(|| "42.5".to_string());
        assert_eq!(provider.read(), "42.5");
    }

    #[test]
    fn test_struct_provider() {
        let provider: Box<dyn MetricProvider> = Box::new(Fixed("0.12"));
        assert_eq!(provider.read(), "0.12");
    }
}
