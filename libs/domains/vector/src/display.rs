use std::io::{self, Write};

use crate::lookup::TextResolver;
use crate::models::SearchHit;

pub const RULE_WIDTH: usize = 60;

/// Write the result block for one question.
///
/// Hits are shown in the order given; nothing is re-ranked here.
pub fn write_results<W: Write>(
    out: &mut W,
    question: &str,
    hits: &[SearchHit],
    resolver: &TextResolver,
) -> io::Result<()> {
    writeln!(out, "Question: '{}'", question)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

    if hits.is_empty() {
        writeln!(out, "No similar questions found.")?;
        return Ok(());
    }

    writeln!(out, "Found {} similar questions:", hits.len())?;
    writeln!(out)?;

    for (rank, hit) in hits.iter().enumerate() {
        writeln!(out, "{}. Score: {:.4}", rank + 1, hit.score)?;
        writeln!(out, "   Question: {}", resolver.resolve(hit))?;
        writeln!(out)?;
    }

    Ok(())
}

/// `write_results` into a `String`
pub fn render_results(question: &str, hits: &[SearchHit], resolver: &TextResolver) -> String {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail
    let _ = write_results(&mut buf, question, hits, resolver);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::QuestionLookup;

    #[test]
    fn test_empty_results() {
        let rendered = render_results("Anything?", &[], &TextResolver::new());
        assert_eq!(
            rendered,
            format!(
                "Question: 'Anything?'\n{}\nNo similar questions found.\n",
                "=".repeat(60)
            )
        );
    }

    #[test]
    fn test_score_has_four_decimals() {
        let lookup: QuestionLookup = [("1", "How can I learn Python fast?")].into_iter().collect();
        let resolver = TextResolver::new().with_lookup(lookup);

        let rendered = render_results(
            "How do I learn Python programming?",
            &[SearchHit::new("1", 0.912345)],
            &resolver,
        );

        assert!(rendered.contains("Found 1 similar questions:\n\n"));
        assert!(rendered.contains("1. Score: 0.9123\n   Question: How can I learn Python fast?\n"));
    }
}
