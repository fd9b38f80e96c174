use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use ragmix_core::error::{Error, Result};
use ragmix_core::settings::{RetrievalSettings, SegmenterSettings, Settings};
use ragmix_core::traits::{Embedder, Generator, TextIndexer, VectorIndexer};
use ragmix_core::types::{Document, RankedResult, ScoredSegment, Segment, SegmentId};
use ragmix_core::Segmenter;
use ragmix_models::{embedder_from_settings, generator_from_settings};
use ragmix_text::SparseIndex;
use ragmix_vector::DenseIndex;

use crate::fusion::{fusion_strategy, FusionStrategy, FusionWeights, ReciprocalRankFusion};
use crate::prompt::{build_prompt, generation_unavailable, NO_INFORMATION};

/// One document or segment that could not be indexed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestFailure {
    /// Position of the document in the ingested batch.
    pub document: usize,
    /// Set when a segment failed; `None` when the document never got as far
    /// as segmentation.
    pub segment: Option<SegmentId>,
    pub reason: String,
}

impl From<IngestFailure> for Error {
    fn from(f: IngestFailure) -> Self {
        Error::Ingestion { document: f.document, reason: f.reason }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    /// Segments now present in both indices.
    pub segments: usize,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Generated (or fallback) answer plus the passages it was built from.
/// `degraded` is set when a collaborator was unavailable on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<RankedResult>,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub segments: usize,
    pub terms: usize,
    pub avg_segment_len: f32,
    pub vectors: usize,
    pub dimension: Option<usize>,
}

struct Retrieval {
    results: Vec<RankedResult>,
    dense_degraded: bool,
}

#[derive(Default)]
struct DocumentOutcome {
    segments: usize,
    failures: Vec<IngestFailure>,
}

/// Ingestion and hybrid retrieval over a lexical and a semantic index.
///
/// Every segment gets a stable `SegmentId` before it reaches either index.
/// Collaborator calls run on the blocking pool under their configured
/// timeouts, and no index lock is held across them.
pub struct HybridSearchEngine<TI = SparseIndex, VI = DenseIndex>
where
    TI: TextIndexer + 'static,
    VI: VectorIndexer + 'static,
{
    sparse: Arc<TI>,
    dense: Arc<VI>,
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn Generator>>,
    segmenter: Segmenter,
    fusion: Box<dyn FusionStrategy>,
    min_score: f32,
    retrieval: RetrievalSettings,
    next_id: AtomicU64,
    closed: AtomicBool,
}

pub struct EngineBuilder<TI, VI> {
    sparse: TI,
    dense: VI,
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn Generator>>,
    segmenter: SegmenterSettings,
    fusion: Box<dyn FusionStrategy>,
    min_score: f32,
    retrieval: RetrievalSettings,
}

impl<TI, VI> EngineBuilder<TI, VI>
where
    TI: TextIndexer + 'static,
    VI: VectorIndexer + 'static,
{
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn maybe_generator(mut self, generator: Option<Arc<dyn Generator>>) -> Self {
        self.generator = generator;
        self
    }

    pub fn segmenter(mut self, settings: SegmenterSettings) -> Self {
        self.segmenter = settings;
        self
    }

    pub fn fusion(mut self, fusion: Box<dyn FusionStrategy>) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn retrieval(mut self, retrieval: RetrievalSettings) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn build(self) -> Result<HybridSearchEngine<TI, VI>> {
        if self.retrieval.ingest_concurrency == 0 || self.retrieval.embed_batch_size == 0 {
            return Err(Error::InvalidConfig("retrieval.ingest_concurrency and embed_batch_size must be > 0".into()));
        }
        let segmenter = Segmenter::from_settings(&self.segmenter)?;
        info!(
            fusion = self.fusion.name(),
            dim = self.embedder.dim(),
            generator = self.generator.as_ref().map_or("none", |g| g.name()),
            "hybrid engine initialized"
        );
        Ok(HybridSearchEngine {
            sparse: Arc::new(self.sparse),
            dense: Arc::new(self.dense),
            embedder: self.embedder,
            generator: self.generator,
            segmenter,
            fusion: self.fusion,
            min_score: self.min_score,
            retrieval: self.retrieval,
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }
}

impl HybridSearchEngine<SparseIndex, DenseIndex> {
    /// Builds both indices and the configured collaborators.
    pub fn init(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let embedder = embedder_from_settings(&settings.embedding).map_err(|e| Error::embedder(format!("{e:#}")))?;
        let generator = generator_from_settings(&settings.generation).map_err(|e| Error::generator(format!("{e:#}")))?;
        Self::builder(SparseIndex::from_settings(&settings.bm25), DenseIndex::from_settings(&settings.dense), embedder)
            .maybe_generator(generator)
            .segmenter(settings.segmenter.clone())
            .fusion(fusion_strategy(&settings.fusion))
            .min_score(settings.dense.min_score)
            .retrieval(settings.retrieval.clone())
            .build()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            segments: self.sparse.len(),
            terms: self.sparse.term_count(),
            avg_segment_len: self.sparse.avg_doc_len(),
            vectors: self.dense.len(),
            dimension: self.dense.dimension(),
        }
    }
}

impl<TI, VI> HybridSearchEngine<TI, VI>
where
    TI: TextIndexer + 'static,
    VI: VectorIndexer + 'static,
{
    /// Starts from default segmenter, RRF fusion and retrieval settings.
    pub fn builder(sparse: TI, dense: VI, embedder: Arc<dyn Embedder>) -> EngineBuilder<TI, VI> {
        EngineBuilder {
            sparse,
            dense,
            embedder,
            generator: None,
            segmenter: SegmenterSettings::default(),
            fusion: Box::new(ReciprocalRankFusion::default()),
            min_score: ragmix_core::settings::DenseSettings::default().min_score,
            retrieval: RetrievalSettings::default(),
        }
    }

    pub fn sparse(&self) -> &TI {
        &self.sparse
    }

    pub fn dense(&self) -> &VI {
        &self.dense
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Drops all indexed content. Every later call fails with
    /// [`Error::Closed`]; calling it twice is harmless.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.sparse.clear();
        self.dense.clear();
        info!("hybrid engine shut down");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() { Err(Error::Closed) } else { Ok(()) }
    }

    /// Segments every document and indexes each segment in both indices.
    /// Documents are processed concurrently and embedded `embed_batch_size`
    /// segments per call. A segment that fails is recorded in the report and
    /// the rest continue.
    pub async fn ingest(&self, documents: Vec<Document>) -> Result<IngestReport> {
        self.ensure_open()?;
        let started = Instant::now();
        let total = documents.len();

        let outcomes: Vec<DocumentOutcome> = stream::iter(documents.into_iter().enumerate())
            .map(|(index, document)| self.ingest_document(index, document))
            .buffer_unordered(self.retrieval.ingest_concurrency)
            .collect()
            .await;

        let mut report = IngestReport { documents: total, ..IngestReport::default() };
        for outcome in outcomes {
            report.segments += outcome.segments;
            report.failures.extend(outcome.failures);
        }
        report.failures.sort_by_key(|f| f.document);
        info!(
            documents = report.documents,
            segments = report.segments,
            failed = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ingest complete"
        );
        Ok(report)
    }

    async fn ingest_document(&self, index: usize, document: Document) -> DocumentOutcome {
        let mut outcome = DocumentOutcome::default();
        if self.is_closed() {
            outcome.failures.push(IngestFailure { document: index, segment: None, reason: Error::Closed.to_string() });
            return outcome;
        }
        let segments: Vec<Segment> = self
            .segmenter
            .segment(&document)
            .map(|mut segment| {
                segment.id = Some(SegmentId(self.next_id.fetch_add(1, Ordering::Relaxed)));
                segment
            })
            .collect();
        if segments.is_empty() {
            debug!(document = index, "blank document, nothing to index");
            return outcome;
        }

        let mut pending = segments.into_iter().peekable();
        while pending.peek().is_some() {
            let batch: Vec<Segment> = pending.by_ref().take(self.retrieval.embed_batch_size).collect();
            let texts: Vec<String> = batch.iter().map(|s| s.text.clone()).collect();
            let vectors = match self.embed(texts).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(document = index, segments = batch.len(), error = %e, "embedding batch skipped");
                    let reason = e.to_string();
                    outcome.failures.extend(batch.iter().map(|segment| IngestFailure {
                        document: index,
                        segment: segment.id,
                        reason: reason.clone(),
                    }));
                    continue;
                }
            };
            for (segment, vector) in batch.into_iter().zip(vectors) {
                self.index_segment(index, segment, vector, &mut outcome);
            }
        }
        outcome
    }

    // dense first: a segment reaches the lexical index only once its vector
    // is stored
    fn index_segment(&self, document: usize, segment: Segment, vector: Vec<f32>, outcome: &mut DocumentOutcome) {
        let id = segment.id;
        if let Err(e) = self.dense.add(segment.clone(), vector) {
            warn!(document, segment = ?id, error = %e, "segment skipped");
            outcome.failures.push(IngestFailure { document, segment: id, reason: e.to_string() });
            return;
        }
        match self.sparse.add(&segment) {
            Ok(_) => outcome.segments += 1,
            Err(e) => {
                warn!(document, segment = ?id, error = %e, "segment skipped");
                outcome.failures.push(IngestFailure { document, segment: id, reason: e.to_string() });
            }
        }
    }

    /// Fused top `max_results` for `query`. Both indices are asked for
    /// `2 * max_results` candidates concurrently. If the query cannot be
    /// embedded the lexical ranking is fused alone.
    pub async fn retrieve_hybrid(&self, query: &str, max_results: usize, bm25_weight: f32, embedding_weight: f32) -> Result<Vec<RankedResult>> {
        let weights = FusionWeights { bm25: bm25_weight, embedding: embedding_weight };
        Ok(self.retrieve(query, max_results, weights).await?.results)
    }

    async fn retrieve(&self, query: &str, max_results: usize, weights: FusionWeights) -> Result<Retrieval> {
        self.ensure_open()?;
        if max_results == 0 {
            return Err(Error::InvalidConfig("max_results must be at least 1".into()));
        }
        let candidates = max_results.saturating_mul(2);

        let sparse = Arc::clone(&self.sparse);
        let owned_query = query.to_string();
        let lexical = async move {
            tokio::task::spawn_blocking(move || sparse.search(&owned_query, candidates))
                .await
                .map_err(|e| Error::Operation(format!("lexical search task failed: {e}")))
                .and_then(|hits| hits)
        };
        let (lexical, semantic) = tokio::join!(lexical, self.semantic_search(query, candidates));
        let lexical = lexical?;
        let (semantic, dense_degraded) = match semantic {
            Ok(hits) => (hits, false),
            Err(e) => {
                warn!(error = %e, "semantic retrieval unavailable, using lexical results only");
                (Vec::new(), true)
            }
        };

        let results = self.fusion.fuse(&lexical, &semantic, max_results, weights);
        debug!(
            lexical = lexical.len(),
            semantic = semantic.len(),
            fused = results.len(),
            fusion = self.fusion.name(),
            "hybrid retrieval"
        );
        Ok(Retrieval { results, dense_degraded })
    }

    async fn semantic_search(&self, query: &str, k: usize) -> Result<Vec<ScoredSegment>> {
        let vector = self
            .embed(vec![query.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::embedder("no vector returned for the query"))?;
        let dense = Arc::clone(&self.dense);
        let min_score = self.min_score;
        tokio::task::spawn_blocking(move || dense.search_vec(&vector, k, min_score))
            .await
            .map_err(|e| Error::Operation(format!("dense search task failed: {e}")))?
    }

    /// Answer text only; see [`ask`](Self::ask).
    pub async fn answer(&self, query: &str) -> Result<String> {
        Ok(self.ask(query).await?.text)
    }

    /// Retrieves `answer_results` passages and has the generator answer from
    /// them alone. Without passages the canned no-information text is
    /// returned; without a working generator, a notice counting the passages.
    pub async fn ask(&self, query: &str) -> Result<Answer> {
        let weights = FusionWeights { bm25: self.retrieval.bm25_weight, embedding: self.retrieval.embedding_weight };
        let Retrieval { results, dense_degraded } = self.retrieve(query, self.retrieval.answer_results, weights).await?;
        if results.is_empty() {
            info!("no passages found");
            return Ok(Answer { text: NO_INFORMATION.to_string(), sources: results, degraded: dense_degraded });
        }
        let Some(generator) = self.generator.clone() else {
            warn!(passages = results.len(), "no generator configured");
            return Ok(Answer { text: generation_unavailable(results.len()), sources: results, degraded: true });
        };

        let prompt = build_prompt(query, &results);
        let timeout = Duration::from_millis(self.retrieval.generate_timeout_ms);
        let call = tokio::task::spawn_blocking(move || generator.generate(&prompt));
        match bounded(call, timeout, Error::generator).await {
            Ok(text) => Ok(Answer { text, sources: results, degraded: dense_degraded }),
            Err(e) => {
                warn!(error = %e, passages = results.len(), "generation failed");
                Ok(Answer { text: generation_unavailable(results.len()), sources: results, degraded: true })
            }
        }
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = texts.len();
        let embedder = Arc::clone(&self.embedder);
        let timeout = Duration::from_millis(self.retrieval.embed_timeout_ms);
        let call = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts));
        let vectors = bounded(call, timeout, Error::embedder).await?;
        if vectors.len() != expected {
            return Err(Error::embedder(format!("asked for {expected} vectors, got {}", vectors.len())));
        }
        Ok(vectors)
    }
}

/// Awaits a blocking collaborator call for at most `timeout`. Timeouts, panics
/// and errors all become the collaborator's unavailability error.
async fn bounded<T>(
    call: impl Future<Output = std::result::Result<anyhow::Result<T>, tokio::task::JoinError>>,
    timeout: Duration,
    unavailable: fn(String) -> Error,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Err(_) => Err(unavailable(format!("timed out after {} ms", timeout.as_millis()))),
        Ok(Err(join)) => Err(unavailable(join.to_string())),
        Ok(Ok(Err(e))) => Err(unavailable(format!("{e:#}"))),
        Ok(Ok(Ok(value))) => Ok(value),
    }
}
