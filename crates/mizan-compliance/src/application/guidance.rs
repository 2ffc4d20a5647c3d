//! Remediation guidance
//!
//! Wraps the external text generator. Results are cached on the task for the
//! configured TTL. The generator call runs under a timeout and outside the
//! task lock; concurrent cache misses for one task share a single call.
//! Generator failures never fail `guidance_for_task`.

use async_trait::async_trait;
use chrono::Utc;
use mizan_common::{Actor, TaskId};
use std::sync::Arc;

use super::dto::{GuidanceSource, GuidanceText};
use crate::config::GuidanceConfig;
use crate::domain::aggregates::RemediationTask;
use crate::domain::catalog::ControlCatalog;
use crate::domain::value_objects::Language;
use crate::infrastructure::AggregateLocks;
use crate::ports::inbound::{GuidanceUseCases, UseCaseError};
use crate::ports::outbound::{GenerationError, GuidanceContext, TaskRepository, TextGenerator};

pub struct GuidanceService {
    catalog: Arc<ControlCatalog>,
    tasks: Arc<dyn TaskRepository>,
    generator: Arc<dyn TextGenerator>,
    config: GuidanceConfig,
    locks: Arc<AggregateLocks>,
}

impl GuidanceService {
    pub fn new(
        catalog: Arc<ControlCatalog>,
        tasks: Arc<dyn TaskRepository>,
        generator: Arc<dyn TextGenerator>,
        config: GuidanceConfig,
        locks: Arc<AggregateLocks>,
    ) -> Self {
        Self {
            catalog,
            tasks,
            generator,
            config,
            locks,
        }
    }

    async fn load(&self, actor: &Actor, id: &TaskId) -> Result<RemediationTask, UseCaseError> {
        self.tasks.find_by_id(id).await?
            .filter(|t| actor.in_org(t.org_id()))
            .ok_or_else(|| UseCaseError::not_found("task", id))
    }

    fn context(&self, task: &RemediationTask, language: Language) -> GuidanceContext {
        let control = self.catalog.get(task.control_id());
        GuidanceContext {
            task_id: task.id().clone(),
            control_id: task.control_id().clone(),
            control_title: control.map(|c| c.title.clone()).unwrap_or_default(),
            risk_level: task.risk_level(),
            gap_type: task.gap_type(),
            legal_basis: task.legal_basis().to_string(),
            evidence_guidance: control.map(|c| c.evidence_guidance.clone()).unwrap_or_default(),
            language,
        }
    }

    fn cached(&self, task: &RemediationTask, language: Language) -> Option<GuidanceText> {
        task.guidance_if_fresh(self.config.ttl(), Utc::now()).map(|text| GuidanceText {
            task_id: task.id().clone(),
            text: text.to_string(),
            source: GuidanceSource::Cached,
            language,
            generated_at: task.ai_generated_at(),
        })
    }

    async fn generate(&self, context: &GuidanceContext) -> Result<String, GenerationError> {
        match tokio::time::timeout(self.config.timeout(), self.generator.generate(context)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.config.timeout_secs)),
        }
    }

    /// Generate fresh text and cache it on the task; errors are surfaced
    pub async fn refresh_guidance(
        &self,
        actor: &Actor,
        task_id: &TaskId,
        language: Language,
    ) -> Result<GuidanceText, UseCaseError> {
        let task = self.load(actor, task_id).await?;
        let context = self.context(&task, language);

        let text = self.generate(&context).await.map_err(|e| {
            tracing::warn!(task_id = %task_id, error = %e, "guidance generation failed");
            UseCaseError::ServiceUnavailable(e.to_string())
        })?;

        let now = Utc::now();
        {
            let _guard = self.locks.acquire(AggregateLocks::task_key(task_id)).await;
            // Re-read so a concurrent status change is not overwritten.
            let mut current = self.load(actor, task_id).await?;
            current.record_guidance(text.clone(), now);
            self.tasks.save(&current).await?;
        }
        tracing::debug!(task_id = %task_id, "guidance cached");

        Ok(GuidanceText {
            task_id: task_id.clone(),
            text,
            source: GuidanceSource::Generated,
            language,
            generated_at: Some(now),
        })
    }
}

/// Clearly labelled placeholder used when generation fails
pub fn fallback_text(task: &RemediationTask) -> String {
    format!(
        "[Automated guidance unavailable] Remediate control {} ({} risk). Legal basis: {}. \
         Review the control's evidence requirements and retry guidance later.",
        task.control_id(),
        task.risk_level(),
        if task.legal_basis().is_empty() { "not recorded" } else { task.legal_basis() },
    )
}

#[async_trait]
impl GuidanceUseCases for GuidanceService {
    async fn guidance_for_task(
        &self,
        actor: &Actor,
        task_id: &TaskId,
        language: Language,
    ) -> Result<GuidanceText, UseCaseError> {
        let task = self.load(actor, task_id).await?;
        if let Some(cached) = self.cached(&task, language) {
            return Ok(cached);
        }

        let _flight = self.locks.acquire(AggregateLocks::guidance_key(task_id)).await;
        // Another caller may have filled the cache while we waited.
        let task = self.load(actor, task_id).await?;
        if let Some(cached) = self.cached(&task, language) {
            return Ok(cached);
        }

        match self.refresh_guidance(actor, task_id, language).await {
            Ok(guidance) => Ok(guidance),
            Err(UseCaseError::ServiceUnavailable(_)) => Ok(GuidanceText {
                task_id: task_id.clone(),
                text: fallback_text(&task),
                source: GuidanceSource::Fallback,
                language,
                generated_at: None,
            }),
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{DeadlinePolicy, GapType};
    use crate::infrastructure::InMemoryTaskRepository;
    use mizan_common::{AssessmentId, OrgId, Role, UserId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingGenerator {
        calls: AtomicUsize,
        fail: bool,
        delay: Option<Duration>,
    }

    impl CountingGenerator {
        fn new(fail: bool, delay: Option<Duration>) -> Self {
            Self { calls: AtomicUsize::new(0), fail, delay }
        }
    }

    #[async_trait]
    impl TextGenerator for CountingGenerator {
        async fn generate(&self, context: &GuidanceContext) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(GenerationError::Unavailable("upstream 502".into()));
            }
            Ok(format!("Steps for {}", context.control_id))
        }
    }

    async fn setup(generator: Arc<CountingGenerator>) -> (GuidanceService, Actor, TaskId) {
        let catalog = Arc::new(ControlCatalog::builtin().unwrap());
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let org = OrgId::new("org-1").unwrap();
        let control = catalog.find("PDPL-T.1").unwrap();
        let task = RemediationTask::from_gap(
            org.clone(),
            AssessmentId::new("a-1").unwrap(),
            control,
            GapType::Gap,
            &DeadlinePolicy::default(),
            Utc::now(),
        );
        tasks.save(&task).await.unwrap();

        let config = GuidanceConfig { ttl_hours: 24, timeout_secs: 1 };
        let service = GuidanceService::new(catalog, tasks, generator, config, Arc::new(AggregateLocks::new()));
        let actor = Actor::new(UserId::new("u-1").unwrap(), org, Role::Staff);
        (service, actor, task.id().clone())
    }

    #[tokio::test]
    async fn test_generated_then_cached() {
        let generator = Arc::new(CountingGenerator::new(false, None));
        let (service, actor, task_id) = setup(generator.clone()).await;

        let first = service.guidance_for_task(&actor, &task_id, Language::Ar).await.unwrap();
        assert_eq!(first.source, GuidanceSource::Generated);
        assert_eq!(first.language, Language::Ar);

        let second = service.guidance_for_task(&actor, &task_id, Language::Ar).await.unwrap();
        assert_eq!(second.source, GuidanceSource::Cached);
        assert_eq!(second.text, first.text);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_fallback() {
        let generator = Arc::new(CountingGenerator::new(true, None));
        let (service, actor, task_id) = setup(generator).await;

        let guidance = service.guidance_for_task(&actor, &task_id, Language::En).await.unwrap();
        assert_eq!(guidance.source, GuidanceSource::Fallback);
        assert!(guidance.text.starts_with("[Automated guidance unavailable]"));

        let err = service.refresh_guidance(&actor, &task_id, Language::En).await.unwrap_err();
        assert_eq!(err.code(), mizan_common::ErrorCode::ServiceUnavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades_to_fallback() {
        let generator = Arc::new(CountingGenerator::new(false, Some(Duration::from_secs(5))));
        let (service, actor, task_id) = setup(generator).await;

        let guidance = service.guidance_for_task(&actor, &task_id, Language::En).await.unwrap();
        assert_eq!(guidance.source, GuidanceSource::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_generation() {
        let generator = Arc::new(CountingGenerator::new(false, Some(Duration::from_millis(200))));
        let (service, actor, task_id) = setup(generator.clone()).await;

        let (a, b) = tokio::join!(
            service.guidance_for_task(&actor, &task_id, Language::En),
            service.guidance_for_task(&actor, &task_id, Language::En),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.text, b.text);
        let sources = [a.source, b.source];
        assert!(sources.contains(&GuidanceSource::Generated));
        assert!(sources.contains(&GuidanceSource::Cached));
    }

    #[tokio::test]
    async fn test_other_org_cannot_see_task() {
        let generator = Arc::new(CountingGenerator::new(false, None));
        let (service, _, task_id) = setup(generator).await;
        let outsider = Actor::new(UserId::new("u-2").unwrap(), OrgId::new("org-2").unwrap(), Role::Admin);

        let err = service.guidance_for_task(&outsider, &task_id, Language::En).await.unwrap_err();
        assert_eq!(err.code(), mizan_common::ErrorCode::NotFound);
    }
}
