//! Prompt helpers for hashing prompts and rendering transcripts.

use sha2::{Digest, Sha256};

use crate::history::{HistoryMessage, Role};

/// Compute a stable SHA-256 fingerprint for a prompt string.
pub fn hash_prompt(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Render history as a plain `Customer:` / `Assistant:` transcript.
pub fn format_transcript(history: &[HistoryMessage]) -> String {
    history
        .iter()
        .map(|message| {
            let speaker = match message.role {
                Role::User => "Customer",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}", speaker, message.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
