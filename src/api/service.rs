use async_trait::async_trait;

use crate::error::AppResult;

use super::models::{
    AssistantContext, AssistantReply, ChatTurn, Draft, ListRequest, Message, MessagePage, Profile,
    SendReceipt,
};

#[async_trait]
pub trait MailService: Send + Sync {
    async fn list_messages(&self, request: &ListRequest) -> AppResult<MessagePage>;

    async fn send_message(&self, draft: &Draft) -> AppResult<SendReceipt>;

    async fn reply_to_message(
        &self,
        draft: &Draft,
        source_message_id: &str,
        thread_id: &str,
    ) -> AppResult<SendReceipt>;

    async fn save_draft(&self, draft: &Draft) -> AppResult<SendReceipt>;

    /// Messages of a thread, oldest first.
    async fn fetch_thread(&self, thread_id: &str) -> AppResult<Vec<Message>>;

    async fn trash_message(&self, id: &str) -> AppResult<()>;

    async fn search_mailbox(&self, query: &str, max_results: u32) -> AppResult<Vec<Message>>;

    async fn get_profile(&self) -> AppResult<Profile>;

    async fn mark_read(&self, ids: &[String]) -> AppResult<()>;
}

#[async_trait]
pub trait AssistantService: Send + Sync {
    async fn respond(
        &self,
        message: &str,
        history: &[ChatTurn],
        context: &AssistantContext,
    ) -> AppResult<AssistantReply>;
}

#[async_trait]
pub trait SessionService: Send + Sync {
    async fn terminate_session(&self) -> AppResult<()>;
}
