//! End-to-end properties of dispatch, conversation state and failure isolation.

use std::sync::Arc;
use std::time::Duration;

use relay_core::testing::{MockChatSender, MockCompletionProvider};
use relay_core::{
    CompletionError, ConversationStore, DispatchOutcome, InMemoryConversationStore,
    MemoryUpdateDeduplicator, RelayPipeline, Update, UpdateDispatcher,
};

fn build(
    provider: Arc<MockCompletionProvider>,
    sender: Arc<MockChatSender>,
) -> (UpdateDispatcher, Arc<InMemoryConversationStore>) {
    let store = Arc::new(InMemoryConversationStore::new(1_000, Duration::from_secs(3600)));
    let pipeline = Arc::new(
        RelayPipeline::new(provider, sender, store.clone())
            .with_apology_message("Sorry, something went wrong."),
    );
    let dispatcher = UpdateDispatcher::new(pipeline)
        .with_deduplicator(Arc::new(MemoryUpdateDeduplicator::new(Duration::from_secs(600))));
    (dispatcher, store)
}

#[tokio::test]
async fn test_conversation_continues_across_updates() {
    let provider = Arc::new(MockCompletionProvider::continuation());
    provider.push_reply("Hi! How can I help?", Some("r1")).await;
    provider.push_reply("Paris.", Some("r2")).await;
    let sender = Arc::new(MockChatSender::new());
    let (dispatcher, store) = build(provider.clone(), sender.clone());

    dispatcher.dispatch(&Update::with_text(1, 42, "hello")).await;
    dispatcher
        .dispatch(&Update::with_text(2, 42, "capital of France?"))
        .await;

    let requests = provider.requests().await;
    assert_eq!(requests[0].previous_response_id, None);
    assert_eq!(requests[1].previous_response_id.as_deref(), Some("r1"));
    assert_eq!(store.get(42).await.as_deref(), Some("r2"));
    assert_eq!(
        sender.sent().await,
        vec![
            (42, "Hi! How can I help?".to_string()),
            (42, "Paris.".to_string())
        ]
    );
}

#[tokio::test]
async fn test_failure_reply_is_verbatim_apology() {
    let provider = Arc::new(MockCompletionProvider::continuation());
    provider
        .push_error(CompletionError::ResponseParse("missing output".into()))
        .await;
    let sender = Arc::new(MockChatSender::new());
    let (dispatcher, store) = build(provider, sender.clone());

    let outcome = dispatcher.dispatch(&Update::with_text(1, 42, "hello")).await;

    match outcome {
        DispatchOutcome::Relayed(report) => assert!(report.completion_failed),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(
        sender.sent().await,
        vec![(42, "Sorry, something went wrong.".to_string())]
    );
    assert!(store.get(42).await.is_none());
}

#[tokio::test]
async fn test_interleaved_chats_keep_separate_tokens() {
    let provider = Arc::new(MockCompletionProvider::continuation());
    let sender = Arc::new(MockChatSender::new());
    let (dispatcher, store) = build(provider.clone(), sender);

    let order = [(10, 1), (20, 2), (11, 2), (21, 1), (12, 1), (22, 3), (23, 2)];
    let mut last_token_per_chat = std::collections::HashMap::new();
    for (call_index, (update_id, chat_id)) in order.iter().enumerate() {
        dispatcher
            .dispatch(&Update::with_text(*update_id, *chat_id, format!("m{}", update_id)))
            .await;
        // The mock issues "resp-<call number>" tokens.
        last_token_per_chat.insert(*chat_id, format!("resp-{}", call_index + 1));
    }

    let requests = provider.requests().await;
    let mut expected_previous: std::collections::HashMap<i64, String> =
        std::collections::HashMap::new();
    for (call_index, (_, chat_id)) in order.iter().enumerate() {
        assert_eq!(
            requests[call_index].previous_response_id,
            expected_previous.get(chat_id).cloned(),
            "call {} for chat {}",
            call_index,
            chat_id
        );
        expected_previous.insert(*chat_id, format!("resp-{}", call_index + 1));
    }

    for (chat_id, token) in last_token_per_chat {
        assert_eq!(store.get(chat_id).await, Some(token));
    }
}

#[tokio::test]
async fn test_concurrent_chats_do_not_interfere() {
    let provider = Arc::new(MockCompletionProvider::continuation());
    let sender = Arc::new(MockChatSender::new());
    let (dispatcher, store) = build(provider.clone(), sender.clone());
    let dispatcher = Arc::new(dispatcher);

    let mut handles = Vec::new();
    for chat_id in 1..=20i64 {
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(tokio::spawn(async move {
            dispatcher
                .dispatch(&Update::with_text(chat_id, chat_id, "hi"))
                .await
        }));
    }
    for handle in handles {
        assert!(matches!(handle.await.unwrap(), DispatchOutcome::Relayed(_)));
    }

    assert_eq!(provider.call_count().await, 20);
    assert_eq!(sender.sent().await.len(), 20);
    assert_eq!(store.len().await, 20);
}
