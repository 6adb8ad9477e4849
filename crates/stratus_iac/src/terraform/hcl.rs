//! HCL rendering for Terraform.

use indexmap::IndexMap;

use stratus_core::{Architecture, CloudProvider};

use crate::block::{AttrValue, CodeBlock};
use crate::writer::EngineWriter;

use super::ENGINE;

const TERRAFORM_VERSION: &str = ">= 1.5.0";

fn provider_version(provider: CloudProvider) -> &'static str {
    match provider {
        CloudProvider::Aws => "~> 5.0",
        CloudProvider::Azure => "~> 3.0",
        CloudProvider::Gcp => "~> 5.0",
    }
}

/// Indented line buffer with two-space indentation.
#[derive(Debug, Default)]
struct HclBuilder {
    level: usize,
    buffer: String,
}

impl HclBuilder {
    fn line(&mut self, s: &str) -> &mut Self {
        for _ in 0..self.level {
            self.buffer.push_str("  ");
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
        self
    }

    fn blank(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    fn dedent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    fn build(self) -> String {
        self.buffer
    }
}

/// Writes Terraform configuration split over the conventional files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerraformWriter;

impl TerraformWriter {
    pub fn new() -> Self {
        Self
    }

    fn write_block(b: &mut HclBuilder, block: &CodeBlock) {
        let mut header = block.block_type.clone();
        for label in &block.labels {
            header.push(' ');
            header.push_str(&quote(label));
        }

        if block.attributes.is_empty() && block.blocks.is_empty() {
            b.line(&format!("{} {{}}", header));
            return;
        }

        b.line(&format!("{} {{", header));
        b.indent();
        Self::write_attributes(b, &block.attributes);
        for (i, nested) in block.blocks.iter().enumerate() {
            if i > 0 || !block.attributes.is_empty() {
                b.blank();
            }
            Self::write_block(b, nested);
        }
        b.dedent();
        b.line("}");
    }

    /// Consecutive single-line attributes share an `=` column; multi-line
    /// values stand alone, separated by blank lines.
    fn write_attributes(b: &mut HclBuilder, attributes: &IndexMap<String, AttrValue>) {
        let mut run: Vec<(String, &AttrValue)> = Vec::new();
        let mut wrote_any = false;

        for (key, value) in attributes {
            if value.is_multiline() {
                Self::flush(b, &mut run, &mut wrote_any);
                if wrote_any {
                    b.blank();
                }
                Self::write_multiline(b, &format_key(key), value);
                wrote_any = true;
            } else {
                if run.is_empty() && wrote_any {
                    b.blank();
                }
                run.push((format_key(key), value));
            }
        }
        Self::flush(b, &mut run, &mut wrote_any);
    }

    fn flush(b: &mut HclBuilder, run: &mut Vec<(String, &AttrValue)>, wrote_any: &mut bool) {
        let width = run.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in run.drain(..) {
            b.line(&format!("{:width$} = {}", key, inline(value), width = width));
            *wrote_any = true;
        }
    }

    fn write_multiline(b: &mut HclBuilder, key: &str, value: &AttrValue) {
        match value {
            AttrValue::Map(map) => {
                b.line(&format!("{} = {{", key));
                b.indent();
                Self::write_attributes(b, map);
                b.dedent();
                b.line("}");
            }
            other => {
                b.line(&format!("{} = {}", key, inline(other)));
            }
        }
    }
}

impl EngineWriter for TerraformWriter {
    fn engine(&self) -> &str {
        ENGINE
    }

    fn preamble(&self, architecture: &Architecture) -> Vec<CodeBlock> {
        let provider = architecture.provider;
        let provider_name = provider.terraform_provider();

        let mut requirement = IndexMap::new();
        requirement.insert("source".to_string(), AttrValue::from(provider.terraform_source()));
        requirement.insert("version".to_string(), AttrValue::from(provider_version(provider)));

        let settings = CodeBlock::new("terraform")
            .attr("required_version", TERRAFORM_VERSION)
            .block(CodeBlock::new("required_providers").attr(provider_name, AttrValue::Map(requirement)));

        let provider_block = match provider {
            CloudProvider::Azure => CodeBlock::new("provider")
                .label(provider_name)
                .block(CodeBlock::new("features")),
            CloudProvider::Aws | CloudProvider::Gcp => CodeBlock::new("provider")
                .label(provider_name)
                .attr("region", AttrValue::reference("var.region")),
        };

        let region = CodeBlock::variable("region")
            .attr("description", "Region to deploy into")
            .attr("type", AttrValue::reference("string"))
            .attr("default", architecture.region.as_str());

        vec![settings, provider_block, region]
    }

    fn file_for(&self, block: &CodeBlock) -> String {
        match block.block_type.as_str() {
            "variable" => "variables.tf",
            "output" => "outputs.tf",
            "terraform" | "provider" => "providers.tf",
            _ => "main.tf",
        }
        .to_string()
    }

    fn file_order(&self) -> Vec<String> {
        ["providers.tf", "variables.tf", "main.tf", "outputs.tf"]
            .iter()
            .map(|f| f.to_string())
            .collect()
    }

    fn render(&self, blocks: &[CodeBlock]) -> String {
        let mut b = HclBuilder::default();
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                b.blank();
            }
            Self::write_block(&mut b, block);
        }
        b.build()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn format_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Quoted HCL string literal with template sequences escaped.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn inline(value: &AttrValue) -> String {
    match value {
        AttrValue::String(s) => quote(s),
        AttrValue::Number(n) => n.to_string(),
        AttrValue::Bool(b) => b.to_string(),
        AttrValue::Reference(expr) => expr.clone(),
        AttrValue::List(items) => {
            let items: Vec<String> = items.iter().map(inline).collect();
            format!("[{}]", items.join(", "))
        }
        AttrValue::Map(map) if map.is_empty() => "{}".to_string(),
        AttrValue::Map(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{} = {}", format_key(k), inline(v)))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
    }
}
