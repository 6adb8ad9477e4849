//! Engine writers.

use indexmap::IndexMap;

use stratus_core::Architecture;

use crate::block::CodeBlock;

/// Spells blocks in an engine's concrete syntax and decides file layout.
pub trait EngineWriter: Send + Sync {
    /// Engine name used for registry lookups, e.g. `terraform`.
    fn engine(&self) -> &str;

    /// Blocks every project needs regardless of its resources, such as
    /// provider settings.
    fn preamble(&self, architecture: &Architecture) -> Vec<CodeBlock>;

    /// File a block belongs in.
    fn file_for(&self, block: &CodeBlock) -> String;

    /// Preferred order of output files.
    fn file_order(&self) -> Vec<String>;

    /// Render the blocks of one file.
    fn render(&self, blocks: &[CodeBlock]) -> String;

    /// Engine-local identifier for a resource display name.
    fn identifier(&self, name: &str) -> String {
        sanitize_identifier(name)
    }

    /// Group blocks by file, keeping block order within each file.
    ///
    /// Files follow [`file_order`](Self::file_order); files it does not name
    /// come after, in first-seen order. Files without blocks are omitted.
    fn route(&self, blocks: Vec<CodeBlock>) -> Vec<(String, Vec<CodeBlock>)> {
        let mut files: IndexMap<String, Vec<CodeBlock>> =
            self.file_order().into_iter().map(|f| (f, Vec::new())).collect();

        for block in blocks {
            files.entry(self.file_for(&block)).or_default().push(block);
        }

        files.into_iter().filter(|(_, blocks)| !blocks.is_empty()).collect()
    }
}

/// Lowercase `[a-z0-9_]` identifier that never starts with a digit.
pub fn sanitize_identifier(name: &str) -> String {
    let mut replaced = String::with_capacity(name.len());
    let mut in_gap = false;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            replaced.push(c);
            in_gap = false;
        } else if !in_gap {
            // A run of other characters collapses to one underscore.
            replaced.push('_');
            in_gap = true;
        }
    }

    let trimmed = replaced.trim_matches('_');
    match trimmed.chars().next() {
        None => "resource".to_string(),
        Some(c) if c.is_ascii_digit() => format!("r_{}", trimmed),
        Some(_) => trimmed.to_string(),
    }
}
