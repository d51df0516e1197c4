//! Language-model providers for the intake engine.

pub mod openai_chat_model;

pub use openai_chat_model::OpenAiChatModel;
