//! # chatgpt-chat-export
//!
//! A CLI tool that turns exported [ChatGPT](https://chatgpt.com) conversations into
//! plain-text transcripts.
//!
//! ## What it does
//!
//! A ChatGPT conversation export is not a list of messages but a tree: every edit or
//! regeneration forks a new branch, and the JSON stores all of them in a flat `mapping`
//! of nodes that point at their parents. The record also names the `current_node`, the
//! leaf of the branch that was on screen.
//!
//! This tool walks from that leaf back to the root, keeps the messages a reader actually
//! saw (hidden system context and empty placeholder nodes are dropped), and writes them
//! oldest first:
//!
//! ```text
//! Title: Ray tracing in one weekend
//! ==============================
//!
//! [USER]:
//! How do I start?
//! --------------------
//!
//! [ASSISTANT]:
//! Begin with a ray class...
//! --------------------
//! ```
//!
//! Exports are treated permissively. Nodes with missing or oddly shaped messages are
//! skipped, and a broken parent link ends the transcript where it breaks. Only a record
//! with no mapping or no current node is rejected.
//!
//! ## Usage
//!
//! ```sh
//! # Writes ray_chat.txt next to the input
//! chatgpt-chat-export ray_chat.json
//!
//! # Several files at once, into one directory
//! chatgpt-chat-export exports/*.json -o ~/notes/chatgpt
//! ```
//!
//! Preferences can be persisted in `~/.config/chatgpt-chat-export/config.toml`.

pub mod importer;
pub mod linearizer;
pub mod process;
pub mod renderer;
pub mod utils;
