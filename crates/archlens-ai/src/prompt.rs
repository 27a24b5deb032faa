/// The architecture question posed to the model, with the hard constraints
/// the verifier enforces. Kept next to the prompt builder so the contract
/// between generation and verification lives in one crate.
pub const DEFAULT_ARCH_QUERY: &str = "\
Based on the dependency evidence, identify ONE architectural smell and propose ONE concrete refactoring.

HARD CONSTRAINTS (must follow):
1) Use ONLY the provided EVIDENCE block. Do not assume any classes/files not shown.
2) Pick ONE cycle from the evidence. Quote the cycle path EXACTLY as shown (e.g., `A -> B -> A`) and cite it.
3) Name the exact dependency edge you will break, in the form: `Break edge: EDGE_k (<PkgA> -> <PkgB>)` and cite it.
4) The 'Break edge' MUST be one of the arrows in the quoted cycle path (choose exactly one arrow from that path).
5) Your 'Dependency rule (after)' must be consistent with your steps and rationale. If inconsistent, fix it.
6) Evidence bullets must reference ONLY packages/classes that participate in the chosen smell.
7) Steps MUST reference at least TWO existing file paths that appear in EVIDENCE (verbatim, from *_FILES lines).
8) Prefer the smallest change that breaks the named edge; steps must include at least one explicit 'extract' action.
9) Do NOT invent method names. Only name a method if it appears verbatim in the evidence.
10) If you introduce anything new (package/interface/class), put `[NEW]` immediately before that identifier, every time you mention it.
11) Do NOT claim exact post-refactor fin/fout numbers; acceptance checks must be verifiable from the dependency graph.

ADDITIONAL CHECKABILITY RULES:
A) Produce EXACTLY ONE complete response (no duplicate sections, no draft alternatives).
B) In Evidence bullets, reference evidence IDs (e.g., CYCLE_1 / MAGNET_1 / OVERSIZED_1).
C) The Break edge line MUST reference exactly one EDGE_k ID from the evidence (e.g., EDGE_3).

OUTPUT FORMAT (exact headings):
Smell:
- <name>

Evidence:
- <bullet 1: CYCLE_k: include exact cycle path copied verbatim>
- <bullet 2: include one fin/fout/total line OR total_loc line copied verbatim (must be from cycle participants)>
- <bullet 3: list 2 involved files by full path>

Refactoring:
- Break edge: EDGE_k (<PkgA> -> <PkgB>)
- Dependency rule (after): <forbidden/allowed dependency directions using exact package names>
- Change: <one sentence mentioning BOTH the broken edge AND the concrete mechanism (must include the word 'extract')>
- Steps (3-6, imperative, each mentions a cited existing file path)
- Rationale: <how the steps remove the named edge and break the quoted cycle>
- Expected impact: <maintainability / testability / evolvability, plus verifiable acceptance checks>

Trade-offs / Risks:
- <1-3 bullets; must include one concrete risk such as API churn or refactor bug risk>

Self-check:
- Consistency: 'Dependency rule' matches 'Break edge' and all Steps.
- Evidence coverage: every file path referenced appears in the evidence.";

/// Assemble the full prompt: system framing, the question, the fenced
/// evidence block, and the ID-usage reminder.
pub fn build_architecture_prompt(question: &str, evidence: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a software architecture assistant.\n");
    prompt.push_str("You must answer ONLY using the EVIDENCE block.\n");
    prompt.push_str("Do NOT cite anything outside EVIDENCE.\n");
    prompt.push_str("If EVIDENCE is insufficient, say exactly:\n");
    prompt.push_str("I cannot propose a concrete refactoring from the provided evidence.\n");
    prompt.push('\n');

    prompt.push_str("QUESTION:\n");
    prompt.push_str(question.trim());
    prompt.push_str("\n\n");

    prompt.push_str("EVIDENCE:\n");
    prompt.push_str("```text\n");
    prompt.push_str(evidence.trim());
    prompt.push_str("\n```\n\n");

    prompt.push_str("REMINDER:\n");
    prompt.push_str(
        "- Use evidence IDs (CYCLE_k / EDGE_k / MAGNET_k / OVERSIZED_k) exactly as shown in EVIDENCE.\n",
    );
    prompt.push_str("- Break edge must reference exactly one EDGE_k.\n");
    prompt.push_str(
        "- If you reference any file, copy its path verbatim from a *_FILES line in EVIDENCE.\n",
    );
    prompt.push_str(
        "- Any package/interface/class not present in EVIDENCE must carry [NEW] immediately before it, every time it is mentioned.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_question_and_fenced_evidence() {
        let prompt = build_architecture_prompt("Find the smell.", "SUMMARY: packages=1 edges=0");

        assert!(prompt.contains("QUESTION:\nFind the smell."));
        assert!(prompt.contains("EVIDENCE:\n```text\nSUMMARY: packages=1 edges=0\n```"));
        assert!(prompt.contains("REMINDER:"));
    }

    #[test]
    fn default_query_demands_the_verified_headings() {
        for heading in [
            "Smell:",
            "Evidence:",
            "Refactoring:",
            "Trade-offs / Risks:",
            "Self-check:",
        ] {
            assert!(DEFAULT_ARCH_QUERY.contains(heading), "missing {heading}");
        }
    }
}
