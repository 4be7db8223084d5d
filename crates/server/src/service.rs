//! # Recommendation Service
//!
//! Async front of the engine. Owns the shared blender and one blend session.
//!
//! The session lock is held for the whole of a recommendation (counts, both
//! neighbor queries, tracker update) and the whole of a like (attribution
//! check, weight step). A like can therefore never be judged against a
//! half-written tracker, and two recommendations never interleave.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tokio::sync::Mutex;
use tracing::info;

use crate::blender::{HybridBlender, HybridRecommendations, LikeOutcome, ModelRecommendations};
use crate::config::ServiceConfig;
use data_loader::{ModelArtifact, Movie, MovieId, MovieRef, RecsError, Result};
use pipeline::{BlendSession, FeedbackTracker, WeightState};

#[derive(Clone)]
pub struct RecommendationService {
    blender: Arc<HybridBlender>,
    session: Arc<Mutex<BlendSession>>,
}

impl RecommendationService {
    pub fn new(blender: HybridBlender, session: BlendSession) -> Self {
        Self {
            blender: Arc::new(blender),
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Load both artifacts named by `config` and build the service
    pub async fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let session = config.session()?;
        let blender = Self::load_blender(config.cf_path(), config.cbf_path()).await?;
        Ok(Self::new(blender, session))
    }

    async fn load_blender(
        cf_path: impl AsRef<Path>,
        cbf_path: impl AsRef<Path>,
    ) -> anyhow::Result<HybridBlender> {
        let start_time = Instant::now();
        let cf_path = cf_path.as_ref().to_path_buf();
        let cbf_path = cbf_path.as_ref().to_path_buf();
        info!(
            "Loading models from {} and {}",
            cf_path.display(),
            cbf_path.display()
        );

        let blender = tokio::task::spawn_blocking(move || {
            let (cf, cbf) = ModelArtifact::load_pair(&cf_path, &cbf_path)?;
            HybridBlender::from_artifacts(&cf, &cbf)
        })
        .await
        .context("Model loading task panicked")?
        .context("Failed to load model artifacts")?;

        info!("Models loaded in {:.2?}", start_time.elapsed());
        Ok(blender)
    }

    pub fn blender(&self) -> &Arc<HybridBlender> {
        &self.blender
    }

    /// Best fuzzy title match for `query`
    pub async fn search(&self, query: &str) -> Result<Movie> {
        let blender = Arc::clone(&self.blender);
        let query = query.to_string();
        tokio::task::spawn_blocking(move || blender.search(&query))
            .await
            .map_err(|e| RecsError::TaskFailed(format!("title search: {}", e)))?
    }

    /// Canonical title for an id
    pub async fn get_title(&self, movie_id: MovieId) -> Result<Movie> {
        self.blender.get_title(movie_id)
    }

    /// Hybrid recommendation for `movie_ref`
    ///
    /// Runs on the blocking pool with the session lock held until the
    /// tracker has been updated.
    pub async fn recommend(&self, movie_ref: impl Into<MovieRef>) -> Result<HybridRecommendations> {
        let movie_ref = movie_ref.into();
        let mut session = Arc::clone(&self.session).lock_owned().await;
        let blender = Arc::clone(&self.blender);
        tokio::task::spawn_blocking(move || blender.recommend(&mut session, &movie_ref))
            .await
            .map_err(|e| RecsError::TaskFailed(format!("hybrid recommendation: {}", e)))?
    }

    /// `count` neighbors from the single model named by `model` ("cf" or "cbf")
    ///
    /// Does not take the session lock and does not change what a later like
    /// is judged against.
    pub async fn model_recommendations(
        &self,
        model: &str,
        movie_id: MovieId,
        count: usize,
    ) -> Result<ModelRecommendations> {
        let blender = Arc::clone(&self.blender);
        let model = model.to_string();
        tokio::task::spawn_blocking(move || blender.model_recommendations(&model, movie_id, count))
            .await
            .map_err(|e| RecsError::TaskFailed(format!("single-model recommendation: {}", e)))?
    }

    /// Like `movie_id` on behalf of `model` ("cf" or "cbf")
    pub async fn like(&self, model: &str, movie_id: MovieId) -> Result<LikeOutcome> {
        let mut session = self.session.lock().await;
        self.blender.like(&mut session, model, movie_id)
    }

    /// Like judged against the `shown` token of an earlier recommendation
    pub async fn like_with(
        &self,
        model: &str,
        movie_id: MovieId,
        shown: &FeedbackTracker,
    ) -> Result<LikeOutcome> {
        let mut session = self.session.lock().await;
        self.blender.like_with(&mut session, model, movie_id, shown)
    }

    pub async fn weights(&self) -> WeightState {
        self.session.lock().await.weights()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use data_loader::ModelKind;
    use std::collections::HashSet;

    fn create_test_service() -> RecommendationService {
        let blender = HybridBlender::from_artifacts(&cf_artifact(), &cbf_artifact()).unwrap();
        RecommendationService::new(blender, BlendSession::new())
    }

    #[tokio::test]
    async fn test_recommend_by_id() {
        let service = create_test_service();
        let recs = service.recommend(HEAT).await.unwrap();

        assert_eq!(recs.title, "Heat (1995)");
        assert_eq!(recs.cf.len(), 6);
        assert_eq!(recs.cbf.len(), 6);
        let cf: Vec<MovieId> = recs.cf.iter().map(|item| item.id).collect();
        let cbf: Vec<MovieId> = recs.cbf.iter().map(|item| item.id).collect();
        assert_eq!(cf, HEAT_CF);
        assert_eq!(cbf, HEAT_CBF);
    }

    #[tokio::test]
    async fn test_recommend_by_title() {
        let service = create_test_service();
        let recs = service.recommend("terminater").await.unwrap();

        assert_eq!(recs.title, "The Terminator (1984)");
        assert_eq!(recs.movie_id, TERMINATOR);
        assert!(recs.cf.iter().all(|item| item.id != TERMINATOR));
        assert!(recs.cbf.iter().all(|item| item.id != TERMINATOR));
    }

    #[tokio::test]
    async fn test_search_and_get_title() {
        let service = create_test_service();
        assert_eq!(service.search("terminater").await.unwrap().id, TERMINATOR);
        assert_eq!(
            service.get_title(HEAT).await.unwrap().title,
            "Heat (1995)"
        );
        assert!(matches!(
            service.get_title(7).await,
            Err(RecsError::UnknownMovie { .. })
        ));
    }

    #[tokio::test]
    async fn test_like_flow() {
        let service = create_test_service();
        service.recommend(HEAT).await.unwrap();

        let outcome = service.like("cf", HEAT_CF[1]).await.unwrap();
        assert_eq!((outcome.cf_weight, outcome.cbf_weight), (6.2, 5.8));

        let outcome = service.like("cf", HEAT_SHARED).await.unwrap();
        assert!(!outcome.adjusted);

        let outcome = service.like("cbf", HEAT_CBF[0]).await.unwrap();
        assert_eq!((outcome.cf_weight, outcome.cbf_weight), (6.0, 6.0));

        assert!(matches!(
            service.like("hybrid", HEAT).await,
            Err(RecsError::InvalidModelSelector(_))
        ));
        assert!(matches!(
            service.like("cf", 999).await,
            Err(RecsError::UnknownMovie { .. })
        ));
    }

    #[tokio::test]
    async fn test_counts_follow_likes() {
        let service = create_test_service();

        // Five CF likes: 7.0 / 5.0
        for _ in 0..5 {
            let recs = service.recommend(HEAT).await.unwrap();
            let cf_only = recs
                .cf
                .iter()
                .find(|item| !recs.shown.was_shown_by(ModelKind::Cbf, item.id))
                .unwrap();
            assert!(service.like("cf", cf_only.id).await.unwrap().adjusted);
        }
        assert_eq!(service.weights().await.cf_weight(), 7.0);

        let recs = service.recommend(HEAT).await.unwrap();
        assert_eq!(recs.cf.len(), 7);
        assert_eq!(recs.cbf.len(), 5);
    }

    #[tokio::test]
    async fn test_like_with_token() {
        let service = create_test_service();
        let heat = service.recommend(HEAT).await.unwrap();
        service.recommend(TERMINATOR).await.unwrap();

        let outcome = service
            .like_with("cbf", HEAT_CBF[0], &heat.shown)
            .await
            .unwrap();
        assert!(outcome.adjusted);
        assert_eq!(outcome.cbf_weight, 6.2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_keep_invariants() {
        let service = create_test_service();

        let mut handles = Vec::new();
        for k in 0..TITLES.len() {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let recs = service.recommend(movie_id(k)).await?;
                let model = if k % 2 == 0 { "cf" } else { "cbf" };
                let liked = if k % 2 == 0 { &recs.cf } else { &recs.cbf };
                service.like(model, liked[0].id).await?;
                Ok::<_, RecsError>(recs)
            }));
        }

        for handle in handles {
            let recs = handle.await.unwrap().unwrap();
            assert_eq!(recs.cf.len() + recs.cbf.len(), 12);
            let cf: HashSet<MovieId> = recs.cf.iter().map(|item| item.id).collect();
            assert!(!cf.contains(&recs.movie_id));
        }

        let weights = service.weights().await;
        assert_eq!(weights.cf_weight() + weights.cbf_weight(), 12.0);
        assert!((2.0..=10.0).contains(&weights.cf_weight()));
    }

    #[tokio::test]
    async fn test_from_config_missing_files() {
        let config = ServiceConfig {
            models_dir: "does/not/exist".into(),
            ..ServiceConfig::default()
        };
        let err = RecommendationService::from_config(&config).await.err().unwrap();
        let recs_err = err.downcast_ref::<RecsError>().unwrap();
        assert!(matches!(recs_err, RecsError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_from_config_loads_artifacts() {
        let dir = std::env::temp_dir().join(format!("reel-recs-service-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cf.json"), serde_json::to_string(&cf_artifact()).unwrap()).unwrap();
        std::fs::write(dir.join("cbf.json"), serde_json::to_string(&cbf_artifact()).unwrap()).unwrap();

        let config = ServiceConfig {
            models_dir: dir,
            cf_model: "cf.json".to_string(),
            cbf_model: "cbf.json".to_string(),
            initial_cf_weight: 8.0,
            ..ServiceConfig::default()
        };
        let service = RecommendationService::from_config(&config).await.unwrap();

        let recs = service.recommend(HEAT).await.unwrap();
        assert_eq!(recs.cf.len(), 8);
        assert_eq!(recs.cbf.len(), 4);
        assert_eq!(recs.cbf.iter().map(|item| item.id).collect::<Vec<_>>(), HEAT_CBF[..4]);
    }

    #[tokio::test]
    async fn test_model_recommendations() {
        let service = create_test_service();

        for count in [1, 5, 10, TITLES.len() - 1] {
            let recs = service.model_recommendations("cbf", HEAT, count).await.unwrap();
            assert_eq!(recs.recommendations.len(), count);
            assert!(recs.recommendations.iter().all(|item| item.id != HEAT));
        }

        let recs = service.model_recommendations("cf", HEAT, 3).await.unwrap();
        let ids: Vec<MovieId> = recs.recommendations.iter().map(|item| item.id).collect();
        assert_eq!(ids, HEAT_CF[..3]);
        let json = serde_json::to_value(&recs).unwrap();
        assert_eq!(json["model"], "cf");

        assert!(matches!(
            service.model_recommendations("both", HEAT, 3).await,
            Err(RecsError::InvalidModelSelector(_))
        ));
        assert!(matches!(
            service.model_recommendations("cf", 999, 3).await,
            Err(RecsError::UnknownMovie { .. })
        ));
    }

    #[tokio::test]
    async fn test_model_recommendations_leave_feedback_alone() {
        let service = create_test_service();
        let heat = service.recommend(HEAT).await.unwrap();

        // A single-model query in between must not replace the shown sets
        service.model_recommendations("cf", TERMINATOR, 10).await.unwrap();
        assert_eq!(service.weights().await, WeightState::new());

        let outcome = service.like("cbf", HEAT_CBF[0]).await.unwrap();
        assert!(outcome.adjusted);
        assert!(heat.shown.was_shown_by(ModelKind::Cbf, HEAT_CBF[0]));
    }

    #[tokio::test]
    async fn test_service_matches_blender() {
        let service = create_test_service();
        let blender = HybridBlender::from_artifacts(&cf_artifact(), &cbf_artifact()).unwrap();
        let mut session = BlendSession::new();

        for movie_ref in [MovieRef::Id(HEAT), MovieRef::from("terminater")] {
            let direct = blender.recommend(&mut session, &movie_ref).unwrap();
            let served = service.recommend(movie_ref).await.unwrap();
            assert_eq!(served.cf, direct.cf);
            assert_eq!(served.cbf, direct.cbf);
            assert_eq!(served.shown, direct.shown);
        }
    }

    #[tokio::test]
    async fn test_response_serializes() {
        let service = create_test_service();
        let recs = service.recommend(HEAT).await.unwrap();
        let json = serde_json::to_value(&recs).unwrap();

        assert_eq!(json["title"], "Heat (1995)");
        assert_eq!(json["cf"].as_array().unwrap().len(), 6);
        assert_eq!(json["cf"][0]["id"], HEAT_CF[0]);
    }
}
