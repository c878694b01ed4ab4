//! Application state: the current config and the scheduler that refreshes it.
//! `init` and `apply_config` are the only places the config changes.

use crate::config::{AppConfig, ConfigError, ConfigStore};
use crate::scheduler::RefreshScheduler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Startup {
    /// A stored config was found and the refresh loop is armed.
    Running(AppConfig),
    /// Nothing stored yet; the caller must collect settings and call `apply_config`.
    NeedsSetup,
}

pub struct Controller {
    store: ConfigStore,
    scheduler: RefreshScheduler,
    current: Option<AppConfig>,
}

impl Controller {
    pub fn new(store: ConfigStore, scheduler: RefreshScheduler) -> Self {
        Self {
            store,
            scheduler,
            current: None,
        }
    }

    pub fn init(&mut self) -> Result<Startup, ConfigError> {
        match self.store.load()? {
            Some(config) => {
                tracing::info!(path = %self.store.path().display(), "loaded config");
                self.scheduler.start(config.clone());
                self.current = Some(config.clone());
                Ok(Startup::Running(config))
            }
            None => Ok(Startup::NeedsSetup),
        }
    }

    /// Persists `config`, makes it current and restarts the refresh loop with it.
    pub fn apply_config(&mut self, config: AppConfig) -> Result<(), ConfigError> {
        self.store.save(&config)?;
        self.scheduler.start(config.clone());
        self.current = Some(config);
        Ok(())
    }

    /// Re-arms the refresh loop with the current config after a `shutdown`.
    pub fn resume(&mut self) -> bool {
        match &self.current {
            Some(config) => {
                self.scheduler.start(config.clone());
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&AppConfig> {
        self.current.as_ref()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn shutdown(&mut self) {
        self.scheduler.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CONFIG_FILE_NAME, Language};
    use crate::testing::{FakeSource, RecordingRenderer, settle};
    use std::sync::Arc;
    use std::time::Duration;

    const PERIOD: Duration = Duration::from_secs(300);

    struct Harness {
        _dir: tempfile::TempDir,
        store: ConfigStore,
        renderer: Arc<RecordingRenderer>,
        controller: Controller,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join(CONFIG_FILE_NAME));
        let renderer = Arc::new(RecordingRenderer::default());
        let scheduler = RefreshScheduler::new(Arc::new(FakeSource::new(3)), renderer.clone(), PERIOD);
        let controller = Controller::new(store.clone(), scheduler);
        Harness {
            _dir: dir,
            store,
            renderer,
            controller,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_needs_setup() {
        let mut h = harness();
        assert_eq!(h.controller.init().unwrap(), Startup::NeedsSetup);
        assert!(h.controller.current().is_none());
        assert!(!h.controller.scheduler().is_armed());

        settle().await;
        assert_eq!(h.renderer.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_config_saves_and_schedules() {
        let mut h = harness();
        let config = AppConfig::new(["Bern", "Thun"], Language::De).unwrap();

        h.controller.apply_config(config.clone()).unwrap();
        settle().await;

        assert_eq!(h.store.load().unwrap(), Some(config.clone()));
        assert_eq!(h.controller.current(), Some(&config));
        assert!(h.controller.scheduler().is_armed());
        assert_eq!(h.renderer.count(), 1);
        assert_eq!(h.renderer.last_stations(), vec!["Bern", "Thun"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_with_stored_config_starts_refreshing() {
        let mut h = harness();
        let config = AppConfig::new(["Olten"], Language::En).unwrap();
        h.store.save(&config).unwrap();

        assert_eq!(h.controller.init().unwrap(), Startup::Running(config));
        settle().await;
        assert_eq!(h.renderer.count(), 1);

        tokio::time::advance(PERIOD).await;
        settle().await;
        assert_eq!(h.renderer.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reapplying_config_does_not_stack_timers() {
        let mut h = harness();
        h.controller
            .apply_config(AppConfig::new(["Bern"], Language::En).unwrap())
            .unwrap();
        settle().await;
        h.controller
            .apply_config(AppConfig::new(["Biel"], Language::En).unwrap())
            .unwrap();
        settle().await;
        assert_eq!(h.renderer.count(), 2);

        tokio::time::advance(PERIOD).await;
        settle().await;
        assert_eq!(h.renderer.count(), 3);
        assert_eq!(h.renderer.last_stations(), vec!["Biel"]);
    }

    #[tokio::test]
    async fn test_init_surfaces_corrupt_config() {
        let mut h = harness();
        std::fs::write(h.store.path(), "[]").unwrap();

        assert!(matches!(h.controller.init(), Err(ConfigError::Corrupt { .. })));
        assert!(!h.controller.scheduler().is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_rejects_stored_config_without_stations() {
        let mut h = harness();
        std::fs::write(h.store.path(), r#"{"stations": [], "language": "en"}"#).unwrap();

        assert!(matches!(h.controller.init(), Err(ConfigError::Corrupt { .. })));
        assert!(!h.controller.scheduler().is_armed());
        settle().await;
        assert_eq!(h.renderer.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_rearms_current_config() {
        let mut h = harness();
        assert!(!h.controller.resume());

        h.controller
            .apply_config(AppConfig::new(["Aarau"], Language::En).unwrap())
            .unwrap();
        settle().await;
        h.controller.shutdown();
        assert!(h.controller.resume());
        settle().await;
        assert_eq!(h.renderer.count(), 2);
        assert_eq!(h.renderer.last_stations(), vec!["Aarau"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_disarms() {
        let mut h = harness();
        h.controller.apply_config(AppConfig::default()).unwrap();
        settle().await;
        h.controller.shutdown();

        tokio::time::advance(PERIOD * 2).await;
        settle().await;
        assert_eq!(h.renderer.count(), 1);
    }
}
