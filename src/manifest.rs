use std::path::PathBuf;
use url::Url;

pub const BASE_URL: &str = "https://agentclientprotocol.com";
pub const OUTPUT_DIR: &str = "docs/acp";

/// Pages needed to implement an ACP client in TypeScript.
///
/// Brand, community/governance, RFDs and the non-TypeScript language
/// libraries are left out.
pub const DOCUMENTS: &[&str] = &[
    // Overview
    "/overview/introduction.md",
    "/overview/architecture.md",
    "/overview/clients.md",
    "/overview/agents.md",
    // TypeScript library reference
    "/libraries/typescript.md",
    // Protocol
    "/protocol/overview.md",
    "/protocol/initialization.md",
    "/protocol/session-setup.md",
    "/protocol/session-modes.md",
    "/protocol/prompt-turn.md",
    "/protocol/content.md",
    "/protocol/tool-calls.md",
    "/protocol/agent-plan.md",
    "/protocol/schema.md",
    "/protocol/transports.md",
    "/protocol/file-system.md",
    "/protocol/terminals.md",
    "/protocol/slash-commands.md",
    "/protocol/extensibility.md",
    // Draft features
    "/protocol/draft/cancellation.md",
    "/protocol/draft/schema.md",
];

/// What to fetch, where from, and where to put it.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub base_url: Url,
    pub output_dir: PathBuf,
    pub documents: &'static [&'static str],
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            base_url: Url::parse(BASE_URL).expect("BASE_URL is a valid URL"),
            output_dir: PathBuf::from(OUTPUT_DIR),
            documents: DOCUMENTS,
        }
    }
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.documents.len()
    }
}
