//! Text grammars for job names, branch names, sign-off comments and
//! ownership files.
//!
//! All patterns live here so a grammar change touches one file. Every parser
//! is a pure function returning `None`/empty on malformed input; nothing here
//! returns an error.
//!
//! # Grammars
//!
//! ```text
//! deploy job   := ... ("deploy" SEP ENV | ENV SEP "deploy") ...   (case-insensitive)
//! SEP          := "-" | "_" | " "
//! ENV          := "dev" | "sit" | "uat" | "prod"
//! ticket key   := [A-Z]+ "-" [0-9]+                                (first occurrence)
//! sign-off     := ^"SIGNOFF:" WS ["v"|"V"] VERSION WS ENV WORD-BOUNDARY ... (column zero)
//! owners line  := (PATTERN)? ("@" USERNAME)*                       ("#" lines skipped)
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::environment::Environment;

static DEPLOY_JOB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^a-z0-9])(?:deploy[-_ ](dev|sit|uat|prod)|(dev|sit|uat|prod)[-_ ]deploy)(?:$|[^a-z0-9])",
    )
    .expect("DEPLOY_JOB_RE regex should compile")
});

static TICKET_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]+-[0-9]+").expect("TICKET_KEY_RE regex should compile"));

static SIGNOFF_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^SIGNOFF:[ \t]+v?(\S+)[ \t]+(dev|sit|uat|prod)\b")
        .expect("SIGNOFF_LINE_RE regex should compile")
});

static OWNER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)@([A-Za-z0-9_.\-]+)").expect("OWNER_RE regex should compile")
});

/// A parsed `SIGNOFF:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignoffClaim {
    /// Version with any `v`/`V` prefix removed.
    pub version: String,
    pub environment: Environment,
}

/// Map a CI job name to the environment it deploys to.
///
/// Requires the token `deploy` adjacent to a supported environment token,
/// joined by `-`, `_` or a space, in either order. Unsupported environments
/// (`staging`, `production`) and a bare `deploy` yield `None`.
pub fn parse_deploy_job_name(name: &str) -> Option<Environment> {
    let caps = DEPLOY_JOB_RE.captures(name)?;
    let token = caps.get(1).or_else(|| caps.get(2))?;
    token.as_str().parse().ok()
}

/// Extract the first issue key (`JIRA-123`) from a branch name.
///
/// Only uppercase project prefixes match.
pub fn extract_jira_key(branch: &str) -> Option<String> {
    TICKET_KEY_RE.find(branch).map(|m| m.as_str().to_string())
}

/// Parse the first valid `SIGNOFF:` line of a comment body.
///
/// The keyword must start at column zero. Indented lines, other keywords,
/// and unsupported environments never match.
pub fn parse_signoff_comment(body: &str) -> Option<SignoffClaim> {
    body.lines().find_map(|line| {
        let caps = SIGNOFF_LINE_RE.captures(line)?;
        let environment = caps[2].parse().ok()?;
        Some(SignoffClaim {
            version: caps[1].to_string(),
            environment,
        })
    })
}

/// Collect every `@username` in an ownership file, skipping `#` comment
/// lines. Duplicates are dropped; first-seen order is kept.
pub fn parse_codeowners(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut owners = Vec::new();

    for line in content.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        for caps in OWNER_RE.captures_iter(line) {
            let name = caps[1].to_string();
            if seen.insert(name.clone()) {
                owners.push(name);
            }
        }
    }

    owners
}
