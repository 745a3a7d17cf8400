//! # shadowdb-primer
//!
//! Assembles the primer-context block from priority-ordered rows, and
//! decides per session whether a given host turn should receive it.

pub mod assembler;
pub mod policy;
pub mod session_cache;

pub use assembler::{assemble, AssembledPrimer};
pub use policy::should_inject;
pub use session_cache::SessionInjectionMap;

/// `<primer-context source="shadowdb" digest="{16-hex}" truncated="true"?>…</primer-context>`
pub fn envelope(assembled: &AssembledPrimer) -> String {
    if assembled.truncated {
        format!(
            "<primer-context source=\"shadowdb\" digest=\"{}\" truncated=\"true\">{}</primer-context>",
            assembled.digest, assembled.text
        )
    } else {
        format!(
            "<primer-context source=\"shadowdb\" digest=\"{}\">{}</primer-context>",
            assembled.digest, assembled.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowdb_core::primer::PrimerRow;

    #[test]
    fn envelope_carries_digest_and_truncated_flag() {
        let rows = vec![PrimerRow::new("fact", "hello world")];
        let assembled = assemble(&rows, 4000).unwrap();
        let env = envelope(&assembled);
        assert!(env.contains(&format!("digest=\"{}\"", assembled.digest)));
        assert!(!env.contains("truncated"));
    }
}
