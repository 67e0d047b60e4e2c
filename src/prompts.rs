//! System instruction for the extraction call.
//!
//! The prompt is assembled once from four parts: task framing, the shop-floor
//! glossary, two few-shot examples, and the output rules. Keeping the
//! glossary and examples as data lets tests check them directly and keeps the
//! rules in sync with what [`crate::pipeline::parse`] accepts.
//!
//! Callers can override the whole prompt via
//! [`crate::config::AnnotateConfig::system_prompt`].

use once_cell::sync::Lazy;

/// User-turn text sent alongside the drawing image.
pub const USER_INSTRUCTION: &str = "Extract and translate.";

/// Preferred Japanese rendering of common US drawing terms.
///
/// Where the formal term and the machikoba (shop-floor) term differ, the
/// shop term is listed second so the model can offer both.
pub const GLOSSARY: &[(&str, &str)] = &[
    ("Drill", "キリ (formal: ドリル)"),
    ("Tap", "タップ"),
    ("Thru", "貫通 / 通し"),
    ("Counterbore", "ザグリ"),
    ("Countersink", "皿モミ (formal: 皿ザグリ)"),
    ("Chamfer", "面取り (C面)"),
    ("Fillet / Round", "R (アール)"),
    ("Deburr", "バリ取り"),
    ("Break all sharp edges", "糸面取り"),
    ("Ream", "リーマ仕上げ"),
    ("Typ. (Typical)", "共通 / 同様"),
    ("Surface finish", "面粗さ"),
    ("Anodize", "アルマイト処理"),
    ("Heat treat", "熱処理 / 焼き入れ"),
    ("Unless otherwise specified", "指示なき場合"),
    ("Datum", "データム"),
];

/// Few-shot examples: `(drawing text, expected JSON annotation)`.
pub const FEW_SHOT_EXAMPLES: &[(&str, &str)] = &[
    (
        "Drill 1/4 Thru",
        r#"{"original": "Drill 1/4 Thru", "candidates": [{"ja": "キリ 1/4 通し", "category": "Shop Term", "en_desc": "Machinists say kiri for drilled holes"}, {"ja": "ドリル 1/4 貫通", "category": "Standard", "en_desc": "Formal JIS wording"}], "bbox": [120, 640, 150, 780]}"#,
    ),
    (
        "Break all sharp edges",
        r#"{"original": "Break all sharp edges", "candidates": [{"ja": "糸面取りのこと", "category": "Shop Term", "en_desc": "Common instruction on Japanese shop drawings"}, {"ja": "全ての鋭角部のエッジを除去すること", "category": "Standard", "en_desc": "Literal translation"}, {"ja": "指示なき角部はC0.2", "category": "Alternative", "en_desc": "Explicit chamfer value many shops prefer"}], "bbox": [905, 40, 930, 330]}"#,
    ),
];

const FRAMING: &str = r#"You are an expert translator bridging US design and Japanese manufacturing.
Analyze the drawing image. For every text region, provide up to 3 Japanese translation options with an English rationale.
Prefer the wording a Japanese machine shop (machikoba) would actually use, and label each option with a category such as "Standard" or "Shop Term"."#;

const RULES: &str = r#"Rules:
- Ignore pure numbers (dimensions, tolerances, balloon numbers) unless they are part of a note.
- bbox must be [ymin, xmin, ymax, xmax] on a 0-1000 scale relative to the full image.
- Keep candidates in order of preference; the first one is the default.
- Output exactly one JSON object of the form {"annotations": [...]} and nothing else."#;

static SYSTEM_PROMPT: Lazy<String> = Lazy::new(build_system_prompt);

/// The default system instruction.
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT.as_str()
}

fn build_system_prompt() -> String {
    let mut prompt = String::from(FRAMING);

    prompt.push_str("\n\nGlossary (English → preferred Japanese):\n");
    for (en, ja) in GLOSSARY {
        prompt.push_str(&format!("- {en} → {ja}\n"));
    }

    prompt.push_str("\nExamples:\n");
    for (i, (text, json)) in FEW_SHOT_EXAMPLES.iter().enumerate() {
        prompt.push_str(&format!(
            "Example {}:\nDrawing text: \"{}\"\nAnnotation: {}\n",
            i + 1,
            text,
            json
        ));
    }

    prompt.push_str("\nOutput JSON format:\n");
    prompt.push_str(
        r#"{"annotations": [{"original": "...", "candidates": [{"ja": "...", "category": "...", "en_desc": "..."}], "bbox": [ymin, xmin, ymax, xmax]}]}"#,
    );
    prompt.push_str("\n\n");
    prompt.push_str(RULES);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glossary_has_about_fifteen_entries() {
        assert!((12..=20).contains(&GLOSSARY.len()));
    }

    #[test]
    fn prompt_contains_every_glossary_term() {
        let p = system_prompt();
        for (en, ja) in GLOSSARY {
            assert!(p.contains(en), "missing {en}");
            assert!(p.contains(ja), "missing {ja}");
        }
    }

    #[test]
    fn prompt_states_bbox_order_and_scale() {
        let p = system_prompt();
        assert!(p.contains("[ymin, xmin, ymax, xmax]"));
        assert!(p.contains("0-1000"));
        assert!(p.contains("Ignore pure numbers"));
    }

    #[test]
    fn few_shot_examples_parse_as_annotations() {
        for (text, json) in FEW_SHOT_EXAMPLES {
            let wrapped = format!(r#"{{"annotations": [{json}]}}"#);
            let parsed = crate::pipeline::parse::parse_response(&wrapped).unwrap();
            assert_eq!(parsed.len(), 1);
            assert_eq!(parsed[0].original, *text);
            assert!(!parsed[0].candidates.is_empty());
        }
    }
}
