//! Periodic maintenance jobs on tokio-cron-scheduler.

use std::sync::Arc;

use gateway_infra::InMemoryRateLimiter;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

const DEFAULT_SWEEP_SCHEDULE: &str = "0 * * * * *";

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Six-field cron expression, seconds first.
    pub sweep_schedule: String,
}

impl SchedulerConfig {
    /// `SCHEDULER_ENABLED` (default on) and `RATE_LIMIT_SWEEP_CRON`.
    pub fn from_env() -> Self {
        let enabled = match std::env::var("SCHEDULER_ENABLED") {
            Ok(v) => !matches!(v.as_str(), "false" | "0"),
            Err(_) => true,
        };
        let sweep_schedule = std::env::var("RATE_LIMIT_SWEEP_CRON")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SWEEP_SCHEDULE.to_string());

        Self {
            enabled,
            sweep_schedule,
        }
    }
}

pub struct Scheduler {
    jobs: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        Ok(Self {
            jobs: JobScheduler::new().await?,
            config,
        })
    }

    /// Register the job that evicts expired windows from the process-local limiter.
    pub async fn add_rate_limit_sweep(
        &self,
        limiter: Arc<InMemoryRateLimiter>,
    ) -> Result<Uuid, JobSchedulerError> {
        let job = Job::new_async(self.config.sweep_schedule.as_str(), move |run_id, _scheduler| {
            let limiter = limiter.clone();
            Box::pin(async move {
                let evicted = limiter.sweep_expired();
                tracing::debug!(
                    job_id = %run_id,
                    evicted,
                    tracked = limiter.tracked_keys(),
                    "Rate limit sweep finished"
                );
            })
        })?;

        let id = self.jobs.add(job).await?;
        tracing::info!(schedule = %self.config.sweep_schedule, job_id = %id, "Rate limit sweep scheduled");
        Ok(id)
    }

    /// No-op when disabled; registered jobs then never fire.
    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled by SCHEDULER_ENABLED");
            return Ok(());
        }
        self.jobs.start().await
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.jobs.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use gateway_infra::RateLimitConfig;

    use super::*;

    fn config(schedule: &str) -> SchedulerConfig {
        SchedulerConfig {
            enabled: false,
            sweep_schedule: schedule.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sweep_job_registers() {
        let scheduler = Scheduler::new(config(DEFAULT_SWEEP_SCHEDULE)).await.unwrap();
        let limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig::default()));

        assert!(scheduler.add_rate_limit_sweep(limiter).await.is_ok());
        assert!(scheduler.start().await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_cron_is_rejected() {
        let scheduler = Scheduler::new(config("every minute please")).await.unwrap();
        let limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig::default()));

        assert!(scheduler.add_rate_limit_sweep(limiter).await.is_err());
    }
}
