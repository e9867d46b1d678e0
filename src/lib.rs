//! # Context Chat
//!
//! A context-aware chat helper. Documents are embedded into an in-memory
//! store; each question is matched against the store and the single most
//! similar document is injected into the prompt sent to the language model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌────────────────┐
//! │ PDF / text  │──▶│   Ingest    │──▶│ EmbeddingStore │◀──▶ ChatData.json
//! │   files     │   │ Extract+Emb │   │   (in memory)  │
//! └─────────────┘   └─────────────┘   └───────┬────────┘
//!                                             │ best match
//!                    question ──▶ Retriever ──┘
//!                                     │
//!                                     ▼
//!                         compose ──▶ completion ──▶ reply
//! ```
//!
//! The retrieval algorithm itself (vector math, store, retriever, prompt)
//! lives in the `context-chat-core` crate; this crate adds configuration,
//! HTTP providers, file ingestion, the table file, and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! export OPENAI_API_KEY=...
//! ctx-chat ingest ./docs                 # embed documents into ChatData.json
//! ctx-chat ask "what does a cat do?"     # one-shot answer
//! ctx-chat chat                          # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding providers (OpenAI, Ollama, local) |
//! | [`completion`] | Completion providers (OpenAI, Ollama) |
//! | [`extract`] | PDF / text extraction |
//! | [`ingest`] | File selection and batch embedding |
//! | [`table`] | Embeddings table import / export |
//! | [`chat`] | Chat session and interactive loop |

pub mod chat;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod http;
pub mod ingest;
pub mod table;
