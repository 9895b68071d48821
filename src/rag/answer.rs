//! Final answer: retrieved context plus question, sent through the shared client.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::store::DocumentIndex;
use crate::core::config::settings::AnswerSettings;
use crate::core::errors::RagError;
use crate::llm::{CompletionClient, CompletionRequest};

fn filler_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(A resposta é:|Baseado no texto:|Resposta:|Resposta direta:)\s*")
            .expect("valid answer prefix regex")
    })
}

pub struct AnswerService {
    index: Arc<dyn DocumentIndex>,
    client: CompletionClient,
    settings: AnswerSettings,
    top_k: usize,
}

impl AnswerService {
    pub fn new(
        index: Arc<dyn DocumentIndex>,
        client: CompletionClient,
        settings: AnswerSettings,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            client,
            settings,
            top_k,
        }
    }

    pub async fn ask(&self, tenant: &str, question: &str) -> Result<String, RagError> {
        let context = self.index.search(tenant, question, self.top_k).await?;
        if !context.is_found() {
            tracing::debug!("No context for {}; asking anyway", tenant);
        }

        let request = CompletionRequest::prompt(
            build_prompt(context.as_text(), question),
            self.settings.max_tokens,
            self.settings.temperature,
        );
        let reply = self.client.call(&request).await?;
        Ok(clean_answer(&reply))
    }
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Analise o texto e responda a pergunta de forma direta e específica. \
         Responda APENAS com a informação solicitada, sem adicionar frases como \
         \"A resposta é:\" ou \"Baseado no texto:\".\n\n\
         TEXTO: {context}\n\n\
         PERGUNTA: {question}\n\n\
         RESPOSTA DIRETA:"
    )
}

pub fn clean_answer(reply: &str) -> String {
    filler_prefix().replace(reply.trim(), "").trim().to_string()
}
