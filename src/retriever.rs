//! Retrieval-augmented Q&A over raw RFP text.
//!
//! All documents are joined into one corpus (`"{name}:\n{text}"` blocks
//! separated by blank lines), split into fixed word chunks, embedded and
//! placed in a flat L2 index. A question is answered from its `top_k`
//! nearest chunks only.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use rfp_analyzer_core::chunk::chunk_words;
use rfp_analyzer_core::index::VectorIndex;

use crate::config::{Config, RetrievalConfig};
use crate::embedding::{create_embedder, embed_query, Embedder};
use crate::intake::{collect_documents, Document};
use crate::llm::{create_generator, TextGenerator};

/// An answer and the chunks it was generated from, closest first.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub context: Vec<String>,
}

pub struct RfpRetriever<'a> {
    embedder: &'a dyn Embedder,
    chunks: Vec<String>,
    index: VectorIndex,
    top_k: usize,
}

impl<'a> RfpRetriever<'a> {
    /// Chunk, embed and index `documents`.
    pub async fn build(
        documents: &[Document],
        embedder: &'a dyn Embedder,
        config: &RetrievalConfig,
    ) -> Result<RfpRetriever<'a>> {
        let corpus = build_corpus(documents);
        let chunks = chunk_words(&corpus, config.chunk_words);
        if chunks.is_empty() {
            bail!("Nothing to index: all documents are empty");
        }

        let vectors = embedder.embed(&chunks).await?;
        if vectors.len() != chunks.len() {
            bail!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }

        let mut index = VectorIndex::new();
        index.add(vectors).context("Failed to index chunk embeddings")?;
        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            model = embedder.model_name(),
            "built retrieval index"
        );

        Ok(Self {
            embedder,
            chunks,
            index,
            top_k: config.top_k,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `top_k` chunks nearest to `question`, closest first.
    pub async fn query(&self, question: &str) -> Result<Vec<String>> {
        let vector = embed_query(self.embedder, question).await?;
        let hits = self
            .index
            .search(&vector, self.top_k)
            .context("Question embedding does not match the index")?;
        Ok(hits
            .into_iter()
            .map(|hit| self.chunks[hit.position].clone())
            .collect())
    }

    /// Answer `question` from the retrieved context.
    pub async fn ask(
        &self,
        question: &str,
        generator: &dyn TextGenerator,
        max_tokens: u32,
    ) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            bail!("question must not be empty");
        }

        let context = self.query(question).await?;
        let prompt = answer_prompt(&context, question);
        let answer = generator.generate(&prompt, max_tokens).await?;
        Ok(Answer { answer, context })
    }
}

fn build_corpus(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| format!("{}:\n{}", doc.file_name, doc.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn answer_prompt(context: &[String], question: &str) -> String {
    format!(
        "You are an AI assistant analyzing multiple RFPs.\n\
         Answer the question using ONLY the provided context.\n\n\
         Context:\n{}\n\n\
         Question:\n{}\n\n\
         Answer:\n",
        context.join("\n\n"),
        question
    )
}

/// CLI entry point for `rfpa ask`.
pub async fn run_ask(config: &Config, question: &str, inputs: &[PathBuf]) -> Result<()> {
    if question.trim().is_empty() {
        bail!("question must not be empty");
    }
    let embedder = create_embedder(&config.embedding)?;
    if !embedder.is_enabled() {
        bail!("ask requires embeddings; set [embedding].provider in the config");
    }
    let generator = create_generator(&config.llm)?;
    let documents = collect_documents(inputs, &config.intake)?;

    let retriever = RfpRetriever::build(&documents, embedder.as_ref(), &config.retrieval).await?;
    let answer = retriever
        .ask(question, generator.as_ref(), config.llm.answer_max_tokens)
        .await?;

    println!("{}", answer.answer.trim());
    println!("\nSupporting context:");
    for (i, chunk) in answer.context.iter().enumerate() {
        println!("[{}] {}", i + 1, preview(chunk, 200));
    }
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Two-dimensional embedding: counts of "budget" and "timeline".
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keywords"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let lower = t.to_lowercase();
                    vec![
                        lower.matches("budget").count() as f32,
                        lower.matches("timeline").count() as f32,
                    ]
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
            assert_eq!(max_tokens, 400);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("The budget is 10 lakh.".to_string())
        }
    }

    fn docs() -> Vec<Document> {
        vec![
            Document {
                file_name: "a.txt".into(),
                text: "budget budget budget".into(),
                path: PathBuf::from("a.txt"),
            },
            Document {
                file_name: "b.txt".into(),
                text: "timeline timeline".into(),
                path: PathBuf::from("b.txt"),
            },
        ]
    }

    fn config(chunk_words: usize, top_k: usize) -> RetrievalConfig {
        RetrievalConfig { chunk_words, top_k }
    }

    #[test]
    fn corpus_prefixes_file_names() {
        assert_eq!(
            build_corpus(&docs()),
            "a.txt:\nbudget budget budget\n\nb.txt:\ntimeline timeline"
        );
    }

    #[tokio::test]
    async fn nearest_chunks_are_returned() {
        let retriever = RfpRetriever::build(&docs(), &KeywordEmbedder, &config(4, 1))
            .await
            .unwrap();
        // Chunks: "a.txt: budget budget budget", "b.txt: timeline timeline"
        assert_eq!(retriever.len(), 2);

        let context = retriever.query("what is the timeline").await.unwrap();
        assert_eq!(context, vec!["b.txt: timeline timeline"]);
    }

    #[tokio::test]
    async fn answer_uses_only_retrieved_context() {
        let retriever = RfpRetriever::build(&docs(), &KeywordEmbedder, &config(4, 1))
            .await
            .unwrap();
        let generator = RecordingGenerator::default();

        let answer = retriever
            .ask("What is the budget?", &generator, 400)
            .await
            .unwrap();
        assert_eq!(answer.answer, "The budget is 10 lakh.");
        assert_eq!(answer.context, vec!["a.txt: budget budget budget"]);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("using ONLY the provided context"));
        assert!(prompts[0].contains("a.txt: budget budget budget"));
        assert!(!prompts[0].contains("timeline timeline"));
        assert!(prompts[0].contains("Question:\nWhat is the budget?"));
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let retriever = RfpRetriever::build(&docs(), &KeywordEmbedder, &config(500, 3))
            .await
            .unwrap();
        let err = retriever
            .ask("   ", &RecordingGenerator::default(), 400)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn empty_corpus_cannot_be_indexed() {
        assert!(build_corpus(&[]).is_empty());
        assert!(RfpRetriever::build(&[], &KeywordEmbedder, &config(500, 3))
            .await
            .is_err());
    }

    #[test]
    fn long_chunks_are_previewed() {
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
    }
}
