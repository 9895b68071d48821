//! End-to-end retrieval scenarios over real files in a temp directory.
//!
//! - tenant replacement drops stale remote verdicts
//! - cached verdicts survive a restart
//! - heuristic and remote stores share tenant files

#[cfg(test)]
mod replacement_tests {
    use std::sync::Arc;

    use crate::core::config::settings::RemoteSettings;
    use crate::llm::client::testing::{fast_client, ScriptedProvider};
    use crate::rag::{BatchCache, DocumentIndex, DocumentStore, RemoteBatchScorer};

    fn store(root: &std::path::Path, provider: Arc<ScriptedProvider>) -> DocumentStore {
        let scorer = RemoteBatchScorer::new(
            fast_client(provider),
            Arc::new(BatchCache::new(root.join("cache"))),
            RemoteSettings::default(),
        );
        DocumentStore::remote(root.join("data"), scorer, 1500)
    }

    #[tokio::test]
    async fn replacing_a_document_invalidates_its_verdicts() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::replying(&["1", "1", "1"]));
        let store = store(dir.path(), provider.clone());

        store.add_document("aurora", "Taxa antiga.").await.unwrap();
        store.add_document("boreal", "Outro prédio.").await.unwrap();
        let old = store.search("aurora", "qual a taxa?", 3).await.unwrap();
        store.search("boreal", "qual a taxa?", 3).await.unwrap();
        assert_eq!(old.as_text(), "Taxa antiga.");
        assert_eq!(provider.calls(), 2);

        store.add_document("aurora", "Taxa nova.").await.unwrap();
        let new = store.search("aurora", "qual a taxa?", 3).await.unwrap();

        assert_eq!(new.as_text(), "Taxa nova.");
        assert_eq!(provider.calls(), 3);

        // the other tenant's verdict is still cached
        store.search("boreal", "qual a taxa?", 3).await.unwrap();
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn verdicts_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let first = Arc::new(ScriptedProvider::replying(&["2"]));
        let store_a = store(dir.path(), first.clone());
        store_a
            .add_document("aurora", "Piscina.\n\nGaragem.\n\nSalão.")
            .await
            .unwrap();
        let before = store_a.search("aurora", "garagem", 3).await.unwrap();

        let second = Arc::new(ScriptedProvider::replying(&[]));
        let store_b = store(dir.path(), second.clone());
        let after = store_b.search("aurora", "garagem", 3).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(after.as_text(), "Garagem.");
        assert_eq!(second.calls(), 0);
    }
}

#[cfg(test)]
mod shared_files_tests {
    use std::sync::Arc;

    use crate::rag::store::NOTHING_RELEVANT_MESSAGE;
    use crate::rag::{BatchCache, DocumentIndex, DocumentStore};

    #[tokio::test]
    async fn heuristic_store_reads_what_another_store_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(BatchCache::new(dir.path().join("cache")));
        let writer = DocumentStore::heuristic(dir.path().join("data"), cache.clone(), 1500, 0.05);
        let reader = DocumentStore::heuristic(dir.path().join("data"), cache, 150, 0.05);

        writer
            .add_document(
                "aurora",
                "A multa por atraso é de R$ 50,00.\n\nO salão fecha às 22h.",
            )
            .await
            .unwrap();

        let outcome = reader.search("aurora", "qual o valor da multa?", 5).await.unwrap();
        let text = outcome.as_text();
        assert!(text.starts_with("Valores encontrados: R$ 50,00"), "{text}");
        assert_ne!(text, NOTHING_RELEVANT_MESSAGE);
        assert_eq!(reader.list_tenants().await.unwrap(), vec!["aurora"]);
    }
}
